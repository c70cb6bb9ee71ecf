use super::common::build_session;
use crate::models::AppConfig;
use crate::server::start_server;
use crate::Result;
use colored::Colorize;
use std::sync::Arc;

pub async fn run(config: &AppConfig, port: Option<u16>, host: Option<String>) -> Result<()> {
    let mut server = config.server.clone();
    if let Some(port) = port {
        server.port = port;
    }
    if let Some(host) = host {
        server.host = host;
    }

    let session = Arc::new(build_session(config)?);
    println!("{}", "🚀 Starting study plan server...".cyan());
    start_server(&server, session).await
}
