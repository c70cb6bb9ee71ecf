use super::common::{build_session, print_output, spinner};
use crate::models::AppConfig;
use crate::services::SessionService;
use crate::Result;
use colored::Colorize;
use dialoguer::Input;

/// Send one message, or start an interactive loop when none is given
pub async fn run(config: &AppConfig, participant: &str, message: Option<&str>) -> Result<()> {
    let session = build_session(config)?;

    if let Some(message) = message {
        return send(&session, participant, message).await;
    }

    println!(
        "{}",
        format!("💬 Chatting as {} (empty line or /quit to exit)", participant).cyan()
    );
    loop {
        let line: String = Input::new()
            .with_prompt("you")
            .allow_empty(true)
            .interact_text()?;
        let line = line.trim();
        if line.is_empty() || line == "/quit" {
            break;
        }
        if let Err(e) = send(&session, participant, line).await {
            eprintln!("{}", format!("Error: {}", e).red());
        }
    }
    Ok(())
}

async fn send(session: &SessionService, participant: &str, message: &str) -> Result<()> {
    let pb = spinner("Waiting for reply...");
    let result = session.handle_message(participant, message).await;
    pb.finish_and_clear();
    let reply = result?;
    print_output(reply.output());
    Ok(())
}
