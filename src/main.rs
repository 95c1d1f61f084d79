use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;

use tactician::api::{serve, AppState};
use tactician::Config;
use tactician::TacticsAgent;

#[derive(Parser)]
#[command(name = "tactician")]
#[command(about = "Hybrid cricket tactics analysis agent", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single analysis and print the result
    Analyze {
        #[arg(help = "Tactics query, e.g. \"bowling plan for the death overs\"")]
        query: String,
    },
    /// Serve the HTTP API
    Serve {
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { query } => run_analysis(&query).await?,
        Commands::Serve { port } => run_server(port).await?,
    }

    Ok(())
}

async fn run_analysis(query: &str) -> Result<()> {
    let config = Config::from_env();
    let mut agent = TacticsAgent::from_config(&config);
    agent.initialize().await?;

    let result = agent.analyze(query, None).await?;

    println!("{}", result.response);
    println!();
    println!("generated by: {}", result.metadata.generated_by.as_str());
    if result.sources.is_empty() {
        println!("sources: none");
    } else {
        println!("sources: {}", result.sources.join(", "));
    }

    if let Err(err) = agent.shutdown(Duration::from_secs(5)).await {
        eprintln!("warning: {}", err);
    }

    Ok(())
}

async fn run_server(port: u16) -> Result<()> {
    let config = Config::from_env();
    let mut agent = TacticsAgent::from_config(&config);
    agent.initialize().await?;

    let state = AppState {
        agent: Arc::new(agent),
    };
    serve(state, port).await
}
