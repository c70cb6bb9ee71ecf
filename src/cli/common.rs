//! Helpers shared by CLI commands

use crate::models::{AppConfig, ConversationTurn, Role};
use crate::orchestrator::{OpenAiClient, PipelineOutput};
use crate::repair::{RepairReport, YoutubeProbe};
use crate::services::SessionService;
use crate::state::FileConversationStore;
use crate::Result;
use anyhow::Context;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

/// Probe backed by the configured platform keys
pub fn build_probe(config: &AppConfig) -> Result<YoutubeProbe> {
    let probe = YoutubeProbe::from_config(&config.youtube)
        .context("Failed to create video platform client")?;
    Ok(probe)
}

/// Session service wired to the real model, platform and file store
pub fn build_session(config: &AppConfig) -> Result<SessionService> {
    let model = OpenAiClient::from_config(&config.model).with_context(|| {
        format!(
            "Model client unavailable; export {} to enable plan generation",
            config.model.api_key_env
        )
    })?;
    let probe = build_probe(config)?;
    let store = FileConversationStore::new(config.store.resolved_dir());

    tracing::debug!(model = model.model(), store = %store.dir().display(), "session wired");

    Ok(SessionService::new(
        Arc::new(model),
        Arc::new(probe),
        Arc::new(store),
        config,
    ))
}

/// Spinner shown while an external call is in flight
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .map(|s| s.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "))
    {
        pb.set_style(style);
    }
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn print_output(output: &PipelineOutput) {
    match output {
        PipelineOutput::Plan(plan) => {
            let weeks = plan.weeks.len();
            let days: usize = plan.weeks.values().map(Vec::len).sum();
            println!(
                "{}",
                format!("✓ Study plan: {} weeks, {} days", weeks, days).green()
            );
            println!("{}", plan.render_json());
        }
        PipelineOutput::Text(text) => {
            println!("{}", text);
        }
    }
}

pub fn print_repair_report(report: &RepairReport) {
    println!(
        "{}",
        format!(
            "🔗 Resources: {} kept, {} replaced, {} unresolved",
            report.kept,
            report.replaced.len(),
            report.unresolved.len()
        )
        .cyan()
    );
    for replacement in &report.replaced {
        println!(
            "   {} {} / {}: {} → {}",
            "↻".yellow(),
            replacement.week,
            replacement.day,
            replacement.original,
            replacement.replacement
        );
    }
    for unresolved in &report.unresolved {
        println!(
            "   {} {} / {}: {}",
            "✗".red(),
            unresolved.week,
            unresolved.day,
            unresolved.link
        );
    }
}

pub fn print_turn(turn: &ConversationTurn) {
    let who = match turn.role {
        Role::User => turn.role.as_str().blue().bold(),
        Role::Assistant => turn.role.as_str().green().bold(),
    };
    println!(
        "{} {} {}",
        turn.recorded_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
        who,
        format!("[{}]", turn.stage.name()).dimmed()
    );
    println!("{}\n", turn.content.to_text());
}
