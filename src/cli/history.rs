use super::common::print_turn;
use crate::models::AppConfig;
use crate::state::{ConversationStore, FileConversationStore};
use crate::Result;
use colored::Colorize;

/// Print stored turns without touching the model or the platform
pub async fn run(config: &AppConfig, participant: &str, limit: Option<usize>) -> Result<()> {
    let store = FileConversationStore::new(config.store.resolved_dir());
    let limit = limit.unwrap_or(config.store.recent_limit);
    let turns = store.recent(participant, limit).await?;

    if turns.is_empty() {
        println!("{}", format!("No history for {}", participant).yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!("📜 Last {} turns for {}", turns.len(), participant).cyan()
    );
    for turn in &turns {
        print_turn(turn);
    }
    Ok(())
}
