use super::common::build_probe;
use crate::models::AppConfig;
use crate::services::{check_link, search_similar, search_videos, video_stats};
use crate::Result;
use colored::Colorize;

pub async fn check(config: &AppConfig, url: &str) -> Result<()> {
    let probe = build_probe(config)?;
    let check = check_link(&probe, url).await?;

    let verdict = match check.liveness {
        Some(liveness) => format!("{:?}", liveness).to_lowercase(),
        None => "unknown (platform unavailable)".to_string(),
    };
    if check.live {
        println!("{} {} {}", "✓".green(), check.video_id, verdict.green());
    } else {
        println!("{} {} {}", "✗".red(), check.video_id, verdict.red());
    }
    Ok(())
}

pub async fn search(config: &AppConfig, phrase: &str) -> Result<()> {
    let probe = build_probe(config)?;
    match search_similar(&probe, phrase).await? {
        Some(video) => {
            println!("{} {}", "✓".green(), video.title.bold());
            println!("  {}", video.link);
        }
        None => println!("{}", "No matching video found".yellow()),
    }
    Ok(())
}

pub async fn videos(config: &AppConfig, query: &str) -> Result<()> {
    let probe = build_probe(config)?;
    let videos = search_videos(&probe, query).await?;
    if videos.is_empty() {
        println!("{}", "No matching videos found".yellow());
        return Ok(());
    }
    for (rank, video) in videos.iter().enumerate() {
        println!("{:>2}. {}", rank + 1, video.title.bold());
        println!("    {}", video.link);
    }
    Ok(())
}

pub async fn stats(config: &AppConfig, video: &str) -> Result<()> {
    let probe = build_probe(config)?;
    let report = video_stats(&probe, video).await?;

    let count = |n: Option<u64>| n.map_or_else(|| "N/A".to_string(), |n| n.to_string());
    if !report.fallback {
        println!(
            "{} {} views {} likes {}",
            "✓".green(),
            report.video_id,
            count(report.views),
            count(report.likes)
        );
        return Ok(());
    }

    println!("{}", format!("No statistics for {}", report.video_id).yellow());
    if let Some(similar) = report.similar {
        println!("  similar: {}", similar.title.bold());
        println!("  {}", similar.link);
    }
    Ok(())
}
