//! Stepwise critique and improve commands

use super::common::{build_session, print_output, spinner};
use crate::models::AppConfig;
use crate::Result;
use colored::Colorize;

pub async fn critique(config: &AppConfig, participant: &str) -> Result<()> {
    let session = build_session(config)?;

    let pb = spinner("Critiquing latest draft...");
    let result = session.critique_latest(participant).await;
    pb.finish_and_clear();

    println!("{}", "📝 Critique".cyan());
    println!("{}", result?);
    Ok(())
}

pub async fn improve(config: &AppConfig, participant: &str, request: Option<&str>) -> Result<()> {
    let session = build_session(config)?;

    let pb = spinner("Improving latest draft...");
    let result = session.improve_latest(participant, request).await;
    pb.finish_and_clear();

    print_output(&result?);
    Ok(())
}
