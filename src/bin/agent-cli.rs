use std::path::PathBuf;

use clap::{Parser, Subcommand};

use proxy_config_agent::config::load_config;
use proxy_config_agent::local::{file_digest, ContentDigest};
use proxy_config_agent::remote::{decode_item, ConfigClient};
use proxy_config_agent::sync::bootstrap;

#[derive(Parser)]
#[command(name = "agent-cli")]
#[command(about = "Management CLI for the proxy configuration agent", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the agent config and print the endpoints it resolves to
    Check,
    /// Print the value currently held by the authority
    Fetch,
    /// Push the managed file to the authority and publish it
    Push,
    /// Report whether the authority's value differs from the managed file
    Diff,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Check => {
            println!("item:    {}", config.item_url());
            println!("release: {}", config.release_url());
            println!("managed: {}", config.managed_path().display());
            println!("backup:  {}", config.backup_path().display());
        }
        Commands::Fetch => {
            let client = ConfigClient::new(&config)?;
            let item = decode_item(&client.fetch().await?)?;
            print!("{}", item.value);
        }
        Commands::Push => {
            let client = ConfigClient::new(&config)?;
            let release = bootstrap(&config, &client).await?;
            println!("published {}", release.release_title);
        }
        Commands::Diff => {
            let client = ConfigClient::new(&config)?;
            let item = decode_item(&client.fetch().await?)?;
            let remote = ContentDigest::of_bytes(item.value.as_bytes());
            let local = file_digest(config.managed_path()).await?;
            if remote == local {
                println!("in sync ({})", local);
            } else {
                println!("differs: local {} remote {}", local, remote);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
