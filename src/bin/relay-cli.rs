use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use relay_sdk::{RelayClient, Reply};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Command-line client for the device relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long)]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the node list document
    List,
    /// Print the info document
    Info,
    /// Print the catalog document of one device
    Catalog { device_id: String },
    /// Queue an action request
    Set {
        action_id: u32,
        request_id: u32,
        /// Parameter as id=value, repeatable
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// Fetch (and consume) an action response
    Resp {
        action_id: u32,
        request_id: u32,
        /// Poll up to this many times while the response is not ready
        #[arg(long, default_value_t = 1)]
        attempts: u32,
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
    },
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(id, value)| (id.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected id=value, got [{}]", raw))
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = RelayClient::new(&cli.url, &cli.key);

    let reply = match cli.command {
        Commands::List => client.list().await?,
        Commands::Info => client.info().await?,
        Commands::Catalog { device_id } => client.catalog(&device_id).await?,
        Commands::Set {
            action_id,
            request_id,
            params,
        } => {
            let params: Vec<(&str, &str)> = params
                .iter()
                .map(|(id, value)| (id.as_str(), value.as_str()))
                .collect();
            client.set_action(action_id, request_id, &params).await?
        }
        Commands::Resp {
            action_id,
            request_id,
            attempts,
            interval_ms,
        } => {
            client
                .poll_response(
                    action_id,
                    request_id,
                    Duration::from_millis(interval_ms),
                    attempts.max(1),
                )
                .await?
        }
    };

    Ok(print_reply(reply))
}

fn print_reply(reply: Reply) -> ExitCode {
    match reply {
        Reply::Ok => {
            println!("OK");
            ExitCode::SUCCESS
        }
        Reply::Document(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Reply::Diagnostic(text) => {
            eprintln!("{}", text);
            ExitCode::FAILURE
        }
    }
}
