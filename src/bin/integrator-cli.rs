use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "integrator-cli")]
#[command(about = "Management CLI for the Integrator Gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway status
    Status,
    /// List deployed applications
    Applications,
    /// List resources of an application
    Resources { id: String },
    /// Show one resource by identifier
    Resource { identifier: String },
    /// Deploy an application from a JSON file
    Deploy { file: PathBuf },
    /// Undeploy an application
    Undeploy { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let url = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{url}/status")).send().await?;
            print_response(res).await?;
        }
        Commands::Applications => {
            let res = client.get(format!("{url}/applications")).send().await?;
            print_response(res).await?;
        }
        Commands::Resources { id } => {
            let res = client
                .get(format!("{url}/applications/{id}/resources"))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Resource { identifier } => {
            let res = client
                .get(format!("{url}/applications/resources/{identifier}"))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Deploy { file } => {
            let body: Value = serde_json::from_str(&std::fs::read_to_string(&file)?)?;
            let res = client
                .post(format!("{url}/deploy"))
                .json(&body)
                .send()
                .await?;
            if res.status().is_success() {
                match res.headers().get("proxy-authorization") {
                    Some(token) => println!("Proxy-Authorization: {}", token.to_str()?),
                    None => eprintln!("Error: deploy succeeded but no token was returned"),
                }
            } else {
                print_response(res).await?;
            }
        }
        Commands::Undeploy { id } => {
            let res = client
                .post(format!("{url}/undeploy"))
                .json(&json!({ "application": { "id": id } }))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            if !text.is_empty() {
                eprintln!("Response: {}", text);
            }
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
