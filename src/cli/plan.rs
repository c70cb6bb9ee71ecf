use super::common::{build_session, print_output, print_repair_report, spinner};
use crate::models::AppConfig;
use crate::orchestrator::PipelineStage;
use crate::parser::{classify_message, MessageKind};
use crate::Result;
use colored::Colorize;

/// Run the full draft → critique → improve → repair cycle for a plan request
pub async fn run(config: &AppConfig, participant: &str, request: &str) -> Result<()> {
    if classify_message(request) != MessageKind::PlanRequest {
        println!(
            "{}",
            "⚠ Request does not start with \"Create a study plan for a\"; it will be handled as chat"
                .yellow()
        );
    }

    let session = build_session(config)?;

    let pb = spinner("Drafting, critiquing and improving plan...");
    let result = session.handle_message(participant, request).await;
    pb.finish_and_clear();
    let reply = result?;

    let stages: Vec<&str> = reply
        .run
        .trace
        .iter()
        .filter(|s| **s != PipelineStage::Done)
        .map(|s| s.name())
        .collect();
    println!("{}", format!("🤖 Stages: {}", stages.join(" → ")).cyan());

    if let Some(report) = &reply.run.context.repair_report {
        print_repair_report(report);
    }
    print_output(reply.output());
    Ok(())
}
