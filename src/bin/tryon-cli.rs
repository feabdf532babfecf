use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "tryon-cli")]
#[command(about = "Client for the try-on relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check relay health and mode
    Health,
    /// Upload a person and a cloth image and save the result
    Generate {
        /// Photo of the person
        #[arg(long)]
        person: PathBuf,
        /// Photo of the garment
        #[arg(long)]
        cloth: PathBuf,
        /// Where to write the generated image
        #[arg(short, long, default_value = "tryon.png")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/healthz", cli.url)).send().await?;
            print_json(res).await
        }
        Commands::Generate { person, cloth, out } => {
            let form = Form::new()
                .part("person", file_part(&person).await?)
                .part("cloth", file_part(&cloth).await?);

            let res = client
                .post(format!("{}/api/generate", cli.url))
                .multipart(form)
                .send()
                .await?;
            if !res.status().is_success() {
                return print_json(res).await;
            }

            let content_type = res
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown")
                .to_string();
            let bytes = res.bytes().await?;
            tokio::fs::write(&out, &bytes).await?;
            println!("Wrote {} bytes ({}) to {}", bytes.len(), content_type, out.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn file_part(path: &Path) -> Result<Part, Box<dyn std::error::Error>> {
    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.png".to_string());
    Ok(Part::bytes(bytes).file_name(name))
}

async fn print_json(res: reqwest::Response) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{}", rendered);
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("Error: relay returned status {}", status);
        eprintln!("{}", rendered);
        Ok(ExitCode::FAILURE)
    }
}
