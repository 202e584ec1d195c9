use std::path::PathBuf;
use std::process::ExitCode;
use anyhow::{Context, Result};
use bytesize::ByteSize;
use clap::{Parser, Subcommand};

use model_store::ModelStore;

/// Save and load timestamped model artifacts
#[derive(Parser)]
#[command(name = "model-store")]
#[command(version)]
#[command(about = "Save and load timestamped model artifacts locally and in an object store")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Save a JSON model document as a new artifact
    Save {
        /// JSON file holding the model
        #[arg(short, long)]
        input: PathBuf,

        /// Artifact directory (defaults to storage.local_dir)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Load the newest artifact and print it as JSON
    LoadLatest {
        /// Artifact directory (defaults to storage.local_dir)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Write the model to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List artifacts, oldest first
    List {
        /// Artifact directory (defaults to storage.local_dir)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            // Logging may not be up yet when configuration fails to load
            eprintln!("{}", error_message(&e));
            ExitCode::FAILURE
        }
    }
}

fn error_message(e: &anyhow::Error) -> String {
    format!("error: {:#}", e)
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let store = ModelStore::new(cli.config.as_deref())?;

    match cli.command {
        Command::Save { input, dir } => {
            let outcome = store.save_json_file(&input, dir.as_deref()).await?;
            let record = outcome.into_result()?;

            if let Some(path) = &record.local_path {
                println!("saved {}", path.display());
            }
            if let Some(key) = &record.remote_key {
                println!("uploaded {}/{}", store.get_storage_manager().bucket(), key);
            }

            Ok(ExitCode::SUCCESS)
        }
        Command::LoadLatest { dir, output } => {
            let Some(loaded) = store.load_latest(dir.as_deref()).await? else {
                eprintln!("no model found");
                return Ok(ExitCode::FAILURE);
            };

            match output {
                Some(path) => {
                    tokio::fs::write(&path, loaded.model.to_string())
                        .await
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("{} -> {}", loaded.artifact.file_name, path.display());
                }
                None => println!("{}", loaded.model),
            }

            Ok(ExitCode::SUCCESS)
        }
        Command::List { dir } => {
            for record in store.list(dir.as_deref()).await? {
                let modified = record
                    .last_modified
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".to_string());
                let size = record.size.map(|s| ByteSize(s).to_string()).unwrap_or_default();
                let location = record
                    .remote_key
                    .clone()
                    .or_else(|| record.local_path.as_ref().map(|p| p.display().to_string()))
                    .unwrap_or_default();

                println!("{}  {:>10}  {}", modified, size, location);
            }

            Ok(ExitCode::SUCCESS)
        }
    }
}
