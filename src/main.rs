use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use std::io;
use std::path::PathBuf;
use studyplan::models::AppConfig;
use studyplan::Result;

#[derive(Parser)]
#[command(name = "studyplan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Study plan generation with critique loop and video resource repair", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (default: ./studyplan.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a study plan (draft → critique → improve → repair)
    Plan {
        /// Participant ID the conversation is stored under
        participant: String,

        /// Request, e.g. "Create a study plan for a Novice on Python over 1 months, 0 weeks, and 0 days with 2 hours available per day"
        request: String,
    },

    /// Send a follow-up message (interactive when no message is given)
    Chat {
        /// Participant ID
        participant: String,

        /// Message to send
        message: Option<String>,
    },

    /// Critique the latest stored draft
    Critique {
        /// Participant ID
        participant: String,
    },

    /// Improve the latest draft with its critique and repair resources
    Improve {
        /// Participant ID
        participant: String,

        /// Request text to extract search parameters from (default: latest plan request)
        request: Option<String>,
    },

    /// Repair the video resources of a plan file
    Repair {
        /// Plan JSON file (bare or fenced)
        plan: PathBuf,

        /// Request text to extract search parameters from
        #[arg(short, long, default_value = "")]
        request: String,

        /// Write the repaired plan here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check whether a video link is live
    Check {
        /// Video URL
        url: String,
    },

    /// Find the best video for a phrase
    Search {
        /// Search phrase
        phrase: String,
    },

    /// List relevance-ranked videos for a query ("... 2 hours" sets a length filter)
    Videos {
        /// Search query
        query: String,
    },

    /// Show view and like counts for a video
    Stats {
        /// Video URL or 11-character id
        video: String,
    },

    /// Explain each week of the latest improved plan
    Reasoning {
        /// Participant ID
        participant: String,
    },

    /// Explain why a topic matters in the latest improved plan
    Explain {
        /// Participant ID
        participant: String,

        /// Topic, e.g. "Closures"
        topic: String,
    },

    /// Write learning objectives for a topic
    Objectives {
        /// Participant ID
        participant: String,

        /// Topic, e.g. "Closures"
        topic: String,
    },

    /// Describe the six background levels for a subject
    Info {
        /// Subject or question, e.g. "Rust"
        message: String,
    },

    /// Show stored conversation turns
    History {
        /// Participant ID
        participant: String,

        /// Number of turns (default: store.recent_limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Run the HTTP server
    Serve {
        /// Port (default: server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Bind address (default: server.host)
        #[arg(long)]
        host: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{}", format!("Error: failed to create tokio runtime: {}", e).red());
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run_async(cli)) {
        eprintln!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }
}

async fn run_async(cli: Cli) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        generate(shell, &mut Cli::command(), "studyplan", &mut io::stdout());
        return Ok(());
    }

    let config = AppConfig::load(cli.config.as_deref())?;
    studyplan::logging::init_tracing(&config.logging)?;

    match cli.command {
        Commands::Plan {
            participant,
            request,
        } => {
            println!("{}", "🤖 Generating study plan...".cyan());
            studyplan::cli::plan::run(&config, &participant, &request).await?;
        }

        Commands::Chat {
            participant,
            message,
        } => {
            studyplan::cli::chat::run(&config, &participant, message.as_deref()).await?;
        }

        Commands::Critique { participant } => {
            studyplan::cli::stage::critique(&config, &participant).await?;
        }

        Commands::Improve {
            participant,
            request,
        } => {
            println!("{}", format!("✨ Improving plan for {}", participant).cyan());
            studyplan::cli::stage::improve(&config, &participant, request.as_deref()).await?;
        }

        Commands::Repair {
            plan,
            request,
            output,
        } => {
            studyplan::cli::repair::run(&config, &plan, &request, output.as_deref()).await?;
        }

        Commands::Check { url } => {
            studyplan::cli::resource::check(&config, &url).await?;
        }

        Commands::Search { phrase } => {
            studyplan::cli::resource::search(&config, &phrase).await?;
        }

        Commands::Videos { query } => {
            studyplan::cli::resource::videos(&config, &query).await?;
        }

        Commands::Stats { video } => {
            studyplan::cli::resource::stats(&config, &video).await?;
        }

        Commands::Reasoning { participant } => {
            studyplan::cli::guide::reasoning(&config, &participant).await?;
        }

        Commands::Explain { participant, topic } => {
            studyplan::cli::guide::explain(&config, &participant, &topic).await?;
        }

        Commands::Objectives { participant, topic } => {
            studyplan::cli::guide::objectives(&config, &participant, &topic).await?;
        }

        Commands::Info { message } => {
            studyplan::cli::guide::info(&config, &message).await?;
        }

        Commands::History { participant, limit } => {
            studyplan::cli::history::run(&config, &participant, limit).await?;
        }

        Commands::Serve { port, host } => {
            studyplan::cli::server::run(&config, port, host).await?;
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}
