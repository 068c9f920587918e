use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Command-line client for the prompt relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Shared secret sent verbatim in the Authorization header
    #[arg(short, long, default_value = "")]
    token: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a prompt and print the reply
    Ask {
        /// Prompt text
        message: String,
    },
    /// Check that the relay is up
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Ask { message } => {
            let mut headers = HeaderMap::new();
            headers.insert(AUTHORIZATION, HeaderValue::from_str(&cli.token)?);

            let res = client
                .post(format!("{base}/api/completions"))
                .headers(headers)
                .json(&json!({ "message": message }))
                .send()
                .await?;

            let status = res.status();
            let text = res.text().await?;
            if !status.is_success() {
                eprintln!("Error: relay returned status {status}");
                eprintln!("Response: {text}");
                std::process::exit(1);
            }

            let json: Value = serde_json::from_str(&text)?;
            match json.get("reply").and_then(Value::as_str) {
                Some(reply) => println!("{reply}"),
                None => println!("{}", serde_json::to_string_pretty(&json)?),
            }
        }
        Commands::Health => {
            let res = client.get(format!("{base}/health")).send().await?;
            let status = res.status();
            println!("{status} {}", res.text().await?);
            if !status.is_success() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
