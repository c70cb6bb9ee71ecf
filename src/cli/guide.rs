//! Guidance commands: plan reasoning, topic explanations, objectives, background levels

use super::common::{build_session, spinner};
use crate::models::AppConfig;
use crate::Result;
use colored::Colorize;

pub async fn reasoning(config: &AppConfig, participant: &str) -> Result<()> {
    let session = build_session(config)?;

    let pb = spinner("Explaining the latest plan...");
    let result = session.plan_reasoning(participant).await;
    pb.finish_and_clear();

    let reasoning = result?;
    match reasoning.weeks {
        Some(weeks) => {
            for (week, text) in weeks {
                println!("{}", format!("📅 {}", week).cyan().bold());
                println!("{}\n", text.trim());
            }
        }
        // Not a JSON object; show it as is
        None => println!("{}", reasoning.raw),
    }
    Ok(())
}

pub async fn explain(config: &AppConfig, participant: &str, topic: &str) -> Result<()> {
    let session = build_session(config)?;

    let pb = spinner(format!("Explaining why {} matters...", topic.trim()));
    let result = session.topic_explanation(participant, topic).await;
    pb.finish_and_clear();

    println!("{}", format!("💡 {}", topic.trim()).cyan());
    println!("{}", result?);
    Ok(())
}

pub async fn objectives(config: &AppConfig, participant: &str, topic: &str) -> Result<()> {
    let session = build_session(config)?;

    let pb = spinner("Writing learning objectives...");
    let result = session.learning_objectives(participant, topic).await;
    pb.finish_and_clear();

    println!("{}", format!("🎯 Objectives for {}", topic.trim()).cyan());
    println!("{}", result?);
    Ok(())
}

pub async fn info(config: &AppConfig, message: &str) -> Result<()> {
    let session = build_session(config)?;

    let pb = spinner("Describing background levels...");
    let result = session.background_info(message).await;
    pb.finish_and_clear();

    println!("{}", result?);
    Ok(())
}
