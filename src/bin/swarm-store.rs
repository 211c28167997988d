//! Storage node command-line client
//!
//! Upload, download and unpin content, check node liveness and look up feeds.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use swarm_store::{Address, BlobStore, Client, Config, Feed, Owner, Topic};

#[derive(Parser, Debug)]
#[command(name = "swarm-store")]
#[command(about = "Storage network client", long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Node API URL, used when no configuration file is given
    #[arg(short, long, default_value = "http://127.0.0.1:1633")]
    node: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the node is reachable
    Check,

    /// Upload a file as a blob
    Upload {
        file: PathBuf,

        #[arg(long)]
        pin: bool,

        #[arg(long)]
        encrypt: bool,
    },

    /// Download a blob
    Download {
        address: Address,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove the retention pin from a blob
    Unpin { address: Address },

    /// Find the latest feed update
    Lookup {
        #[arg(long)]
        owner: Owner,

        /// Topic name
        #[arg(long)]
        topic: String,

        /// Unix time to look up at (now if omitted)
        #[arg(long)]
        at: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::for_node(&args.node),
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(config.log_level.as_str()))
        .init();

    let client = Arc::new(Client::new(&config)?);

    match args.command {
        Command::Check => {
            if !client.check_connection().await {
                bail!("node at {} is not reachable", client.base_url());
            }
            println!("ok");
        }
        Command::Upload { file, pin, encrypt } => {
            let data = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let address = client.upload_blob(&data, pin, encrypt).await?;
            println!("{}", address);
        }
        Command::Download { address, output } => {
            let (data, _) = client.download_blob(&address).await?;
            match output {
                Some(path) => std::fs::write(&path, &data)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => {
                    use std::io::Write;
                    std::io::stdout().write_all(&data)?;
                }
            }
        }
        Command::Unpin { address } => {
            client.delete_blob(&address).await?;
            log::info!("Unpinned {}", address);
        }
        Command::Lookup { owner, topic, at } => {
            let feed = Feed::reader(client.clone(), owner);
            let at = at.unwrap_or_else(|| feed.now());
            let update = feed
                .lookup(&CancellationToken::new(), &Topic::from_name(&topic), at)
                .await?;
            println!("time:  {}", update.time());
            println!("level: {}", update.epoch.level);
            match update.reference() {
                Some(reference) => println!("reference: {}", reference),
                None => println!("data:  {}", hex::encode(&update.data)),
            }
        }
    }

    Ok(())
}
