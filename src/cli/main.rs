use churn_predictor::models::CustomerRecord;
use clap::{Args, Parser, Subcommand};
use reqwest::{Client, Response};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "churn-cli")]
#[command(about = "Customer Churn Prediction CLI", version, long_about = None)]
struct Cli {
    #[arg(short, long, env = "CHURN_ENDPOINT", default_value = "http://localhost:5000")]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show service status
    Info,

    /// Check server health
    Health,

    /// List the expected input fields
    Features,

    /// Predict churn for one customer
    Predict(PredictInput),
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct PredictInput {
    /// Read the customer record from a JSON file
    #[arg(short, long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Customer record as an inline JSON string
    #[arg(short, long, value_name = "JSON")]
    json: Option<String>,

    /// Send the documented example customer
    #[arg(long)]
    example: bool,
}

impl PredictInput {
    fn into_payload(self) -> anyhow::Result<Value> {
        if let Some(path) = self.file {
            let raw = std::fs::read_to_string(&path)?;
            return Ok(serde_json::from_str(&raw)?);
        }
        if let Some(raw) = self.json {
            return Ok(serde_json::from_str(&raw)?);
        }
        Ok(serde_json::to_value(CustomerRecord::example())?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = Client::new();

    let response = match cli.command {
        Commands::Info => client.get(format!("{}/", cli.endpoint)).send().await?,

        Commands::Health => {
            client
                .get(format!("{}/health", cli.endpoint))
                .send()
                .await?
        }

        Commands::Features => {
            client
                .get(format!("{}/features", cli.endpoint))
                .send()
                .await?
        }

        Commands::Predict(input) => {
            let payload = input.into_payload()?;
            client
                .post(format!("{}/predict", cli.endpoint))
                .json(&payload)
                .send()
                .await?
        }
    };

    print_response(response).await
}

async fn print_response(response: Response) -> anyhow::Result<()> {
    let status = response.status();
    let body: Value = response.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);

    if !status.is_success() {
        anyhow::bail!("request failed with status {}", status);
    }
    Ok(())
}
