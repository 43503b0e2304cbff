//! second-opinion CLI - multi-model second opinions via OpenRouter.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use second_opinion::client::CatalogSource;
use second_opinion::{
    BackendTarget, Config, Dispatcher, McpServer, OpenRouterClient, QueryRequest, ToolOutput,
    Toolbox,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "second-opinion")]
#[command(version)]
#[command(about = "Ask several AI models the same question via OpenRouter")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Optional TOML configuration file (environment variables take precedence)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the MCP tools on stdin/stdout (default)
    Serve,

    /// Send one query to every model and print the merged answers
    Ask {
        /// The question or prompt
        query: String,

        /// Context prepended to the query
        #[arg(long)]
        context: Option<String>,

        /// System prompt sent to every model
        #[arg(long)]
        system: Option<String>,

        /// Model to query instead of the configured ones (repeatable)
        #[arg(short, long = "model")]
        models: Vec<String>,

        /// Sampling temperature (0-2)
        #[arg(short, long)]
        temperature: Option<f64>,

        /// Max response tokens per model
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Also print the structured summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show catalog metadata for the configured models
    Models,

    /// Print the resolved configuration (without the API key)
    ShowConfig,
}

/// Logs go to stderr; stdout belongs to the protocol.
fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
}

fn print_output(output: &ToolOutput, json: bool) -> Result<()> {
    println!("{}", output.markdown);
    if json {
        println!("\n{}", serde_json::to_string_pretty(&output.summary)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let client = Arc::new(
        OpenRouterClient::from_config(&config).context("Failed to create OpenRouter client")?,
    );

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            info!(
                models = config.models.len(),
                timeout_ms = config.timeout_ms,
                "Starting second-opinion server"
            );
            let dispatcher = Dispatcher::from_config(Arc::clone(&client), &config);
            let toolbox = Toolbox::new(dispatcher, client);
            let server = McpServer::new(toolbox, &config);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            server.serve(stdin, tokio::io::stdout()).await?;
        }

        Commands::Ask {
            query,
            context,
            system,
            models,
            temperature,
            max_tokens,
            json,
        } => {
            if let Some(t) = temperature {
                anyhow::ensure!((0.0..=2.0).contains(&t), "temperature must be between 0 and 2");
            }
            anyhow::ensure!(max_tokens != Some(0), "max-tokens must be positive");

            let models: Option<Vec<BackendTarget>> = (!models.is_empty())
                .then(|| models.into_iter().map(BackendTarget::from).collect());
            let request = QueryRequest::new(query)
                .with_context(context)
                .with_system_prompt(system)
                .with_models(models)
                .with_temperature(temperature)
                .with_max_tokens(max_tokens);

            let dispatcher = Dispatcher::from_config(client, &config);
            let outcomes = dispatcher.dispatch(&request).await;
            print_output(&ToolOutput::from_outcomes(&outcomes), json)?;
        }

        Commands::Models => {
            let catalog = client
                .fetch_catalog()
                .await
                .context("Failed to fetch model catalog")?;
            for info in catalog.lookup(&config.models) {
                let max_completion = info
                    .max_completion_tokens
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{}", info.id);
                println!("  Name:        {}", info.name);
                println!("  Context:     {}", info.context_length);
                println!("  Max output:  {max_completion}");
                println!("  Modality:    {}", info.modality);
                println!(
                    "  Price:       ${:.2}/M in, ${:.2}/M out",
                    info.input_cost_per_token * 1_000_000.0,
                    info.output_cost_per_token * 1_000_000.0
                );
            }
        }

        Commands::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&config.resource_json())?);
        }
    }

    Ok(())
}
