use super::common::{build_probe, print_repair_report, spinner};
use crate::models::{AppConfig, StudyPlanDocument};
use crate::parser::{parse_structured_response, ParsedResponse};
use crate::services::repair_plan;
use crate::Result;
use anyhow::{bail, Context};
use colored::Colorize;
use std::path::Path;

/// Repair the video resources of a plan file
///
/// The file may hold bare JSON or a model reply with a fenced block.
pub async fn run(
    config: &AppConfig,
    plan_path: &Path,
    request: &str,
    output: Option<&Path>,
) -> Result<()> {
    let content = std::fs::read_to_string(plan_path)
        .with_context(|| format!("Failed to read {}", plan_path.display()))?;

    let plan: StudyPlanDocument = match parse_structured_response(&content) {
        ParsedResponse::Structured(parsed) => {
            for issue in &parsed.issues {
                println!(
                    "{}",
                    format!("⚠ {}: {}", issue.path, issue.message).yellow()
                );
            }
            parsed.plan
        }
        ParsedResponse::NotStructured(_) => {
            bail!("{} does not contain a study plan document", plan_path.display())
        }
    };

    let probe = build_probe(config)?;
    let pb = spinner("Checking video resources...");
    let (repaired, report) = repair_plan(&probe, &config.repair, request, plan).await;
    pb.finish_and_clear();

    print_repair_report(&report);

    let rendered = repaired.render_json();
    match output {
        Some(path) => {
            std::fs::write(path, format!("{}\n", rendered))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{}", format!("✓ Wrote {}", path.display()).green());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}
