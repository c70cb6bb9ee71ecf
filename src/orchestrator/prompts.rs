/// Prompt templates for the refinement pipeline
///
/// Fixed system instructions for each stage plus the builders that splice the
/// request, draft and critique into the user turn.
use crate::models::StudyPlanDocument;

/// JSON layout every structured reply must follow
pub const PLAN_TEMPLATE: &str = r#"{
  "studyPlan_Overview": {
    "Week 1": "Overview of the week"
  },
  "studyPlan": {
    "Week 1": [
      {
        "day": "Day 1",
        "topic": "Topic of the day",
        "Time": "2 hours",
        "resources": {
          "YouTube": [
            { "title": "Video title", "link": "https://www.youtube.com/watch?v=VIDEO_ID" }
          ]
        }
      }
    ]
  }
}"#;

/// System instruction for the first draft of a plan
pub fn draft_system_prompt() -> String {
    format!(
        r#"You are a study planner. Build a day-by-day study plan that matches the
learner's proficiency, subject, duration and daily hours.

## Output
Reply with a single fenced ```json block and nothing else. Use exactly this
layout:

{template}

## Rules
- Cover every week and every day in the requested duration
- Keep each day within the stated hours
- Recommend YouTube videos that exist; never invent links
"#,
        template = PLAN_TEMPLATE
    )
}

/// System instruction for the critique stage
pub fn critique_system_prompt() -> &'static str {
    r#"You are reviewing a study plan produced for a learner.

## Rubric
1. **Coverage**: every week and day of the requested duration is present
2. **Pacing**: daily topics fit the stated hours and build on each other
3. **Level**: difficulty suits the learner's proficiency
4. **Resources**: each day has relevant videos with plausible links
5. **Structure**: the plan follows the required JSON layout

## Instructions
Write concise, actionable feedback as a numbered list. Do not rewrite the plan.
"#
}

/// System instruction for the improvement stage
pub fn improve_system_prompt() -> String {
    format!(
        r#"You revise study plans using reviewer feedback.

## Output
Reply with a single fenced ```json block containing the complete revised plan
in this layout:

{template}

## Rules
- Address every point of the feedback
- Keep the weeks and days the original plan covers
- Keep links that are still relevant; never invent links
"#,
        template = PLAN_TEMPLATE
    )
}

/// System instruction for conversational follow-ups
pub fn chat_system_prompt() -> String {
    format!(
        r#"You are a study planning assistant continuing a conversation with a learner.

Answer questions about their plan directly. When the learner asks to change the
plan, reply with the complete updated plan as a single fenced ```json block in
this layout:

{template}
"#,
        template = PLAN_TEMPLATE
    )
}

/// User turn for the critique stage
pub fn critique_user_prompt(draft: &StudyPlanDocument) -> String {
    format!(
        r#"## Study Plan
{plan}

## Task
Critique this plan against the rubric.
"#,
        plan = draft.render_fenced()
    )
}

/// User turn for the improvement stage
pub fn improve_user_prompt(
    request: &str,
    revision: Option<&str>,
    draft: &StudyPlanDocument,
    critique: &str,
) -> String {
    let revision = revision
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(|r| format!("\n## Requested Change\n{}\n", r))
        .unwrap_or_default();

    format!(
        r#"## Original Request
{request}
{revision}
## Current Plan
{plan}

## Feedback
{critique}

## Task
Produce the improved plan.
"#,
        request = request.trim(),
        plan = draft.render_fenced(),
        critique = critique.trim()
    )
}

// =============================================================================
// Learner guidance
// =============================================================================

/// Stand-in for the plan when the participant has no improved plan yet
pub const NO_PLAN_AVAILABLE: &str = "No study plan available.";

const BLOOM_LEVELS: &str = r#"Bloom's taxonomy, lowest to highest:
1. Remembering: retrieve, recognize and recall knowledge
2. Understanding: interpret, exemplify, classify, summarize, infer, compare, explain
3. Applying: carry out or implement a procedure
4. Analyzing: break material into parts and relate them to the whole
5. Evaluating: judge against criteria through checking and critiquing
6. Creating: combine elements into a new, coherent whole

Higher levels depend on the lower ones. Introductory learners need mostly
remembering and understanding outcomes with a few applying or analyzing ones;
learners with a solid foundation should get few low-level outcomes.

Every objective has exactly one measurable verb and is clear and concise."#;

/// System instruction for the background-level explanation
pub fn background_levels_system_prompt() -> &'static str {
    r#"You explain the background expertise a learner can have in the subject they
want to study. Use six levels:

1. Novice: follows context-free rules step by step; slow and effortful; struggles when the situation does not match the instructions
2. Advanced Beginner: recognizes situational cues and applies experience-based maxims; still analytical and easily overwhelmed by unfamiliar cases
3. Competence: chooses goals and a perspective on the situation; deliberate and analytical; may cling to a chosen plan when circumstances change
4. Proficiency: intuitively sees what the situation calls for but still decides the response deliberately
5. Expertise: perception and action are integrated; adapts fluidly without deliberation
6. Mastery: expands the repertoire of intuitive perspectives and can transform the style of the domain

## Output
Start directly with `<table>` and return valid HTML only. Two columns: Level
and Description. Each description is an unordered list (`<ul><li>…</li></ul>`)
with one sentence per bullet. Be concise and include all six levels in order.
"#
}

/// System instruction for week-by-week reasoning about a plan
pub fn plan_reasoning_system_prompt() -> String {
    format!(
        r#"You review a study plan and explain, for every week, three aspects.

## Learning objective
What learners will achieve this week, phrased with measurable verbs.

{bloom}

## Content selection
Why the chosen resources fit: they match the learner's current level and
raise complexity gradually, are easy to access, engage the learner, come from
credible sources, stretch the learner without overwhelming them, and serve the
learner's goals.

## Connection
How the week builds on earlier material and prepares the next, so goals,
activities and resources reinforce each other toward mastery.

## Output
Reply with a JSON object keyed by week, e.g.
{{"Week 1": "- Learning objective: ...\n- Content selection: ...\n- Connection: ..."}}
Write complete, concise sentences and never name the underlying theories.
"#,
        bloom = BLOOM_LEVELS
    )
}

/// User turn for week-by-week reasoning
pub fn plan_reasoning_user_prompt(plan: &StudyPlanDocument) -> String {
    let overview = serde_json::to_string(&plan.overview).unwrap_or_default();
    format!(
        r#"## Study Plan
{plan}

## Weekly Overview
{overview}
"#,
        plan = plan.render_fenced(),
        overview = overview
    )
}

/// System instruction explaining why a topic is worth studying
pub fn topic_explanation_system_prompt(topic: &str) -> String {
    format!(
        r#"You explain why the topic '{topic}' is important in the context of the
learner's study plan, given in the user turn.

Orient the learner: say how the topic fits the scope of the plan, how it
relates to the topics around it and why it matters for their goals, so they
know what to focus on while studying it.

Give only the reasons for studying '{topic}'. Do not repeat the plan, do not
name the underlying theories, and keep it as short as possible.
"#,
        topic = topic.trim()
    )
}

/// System instruction for learning objectives of a single topic
pub fn objectives_system_prompt(topic: &str) -> String {
    format!(
        r#"You write learning objectives for the topic '{topic}' of the study plan
given in the user turn, using as few points as possible.

{bloom}

Check that the objectives can be reached within the hours the learner has for
the topic; drop objectives until they can.

## Output
Only the objectives, as a numbered list:
1. ...
2. ...
"#,
        topic = topic.trim(),
        bloom = BLOOM_LEVELS
    )
}

/// Weeks of the plan as JSON, or a stand-in when there is none
pub fn plan_context(plan: Option<&StudyPlanDocument>) -> String {
    plan.and_then(|p| serde_json::to_string(&p.weeks).ok())
        .unwrap_or_else(|| NO_PLAN_AVAILABLE.to_string())
}
