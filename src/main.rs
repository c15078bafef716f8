use std::path::Path;
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pda_seed::client::program_client::{ProgramClient, derivation_report};
use pda_seed::common::{airdrop, get_rpc_client, load_payer};
use pda_seed::config::{ClientConfig, DEFAULT_CONFIG_PATH};
use pda_seed::transaction::SubmitPolicy;
use solana_sdk::pubkey::Pubkey;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pda-seed")]
#[command(about = "Derive seed-prefix PDAs and call the programs that own them")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Override log level
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Derive the PDA and payload for a profile without sending anything
    Derive {
        #[arg(short, long)]
        profile: String,
    },
    /// Derive, sign and submit the call for a profile
    Submit {
        #[arg(short, long)]
        profile: String,
    },
    /// Create a data account and write the member keys into it
    WriteMembers {
        #[arg(long)]
        program_id: String,
    },
    /// Request an airdrop to the payer (local validators and devnet)
    Airdrop {
        #[arg(long, default_value_t = 1_000_000_000)]
        lamports: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_found = Path::new(&cli.config).exists();
    let config = if config_found {
        ClientConfig::from_file(&cli.config)?
    } else {
        ClientConfig::default()
    };

    let log_level = cli
        .log_level
        .clone()
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    init_logging(&log_level);
    if !config_found {
        warn!("Config file not found, using defaults: {}", cli.config);
    }

    let members = config.member_keys()?;

    match cli.command {
        Command::Derive { profile } => {
            let profile = config.profile(&profile)?;
            print!("{}", derivation_report(profile, &members)?);
        }
        Command::Submit { profile } => {
            let profile = config.profile(&profile)?;
            let client = program_client(&config)?;
            info!(payer = %client.payer(), profile = %profile.name, "submitting");
            let (call, signature) = client.call_profile(profile, &members).await?;
            println!("pda:       {}", call.derived.address);
            println!("signature: {signature}");
        }
        Command::WriteMembers { program_id } => {
            let program_id = Pubkey::from_str(&program_id)?;
            let client = program_client(&config)?;
            let (account, signature) = client.write_member_keys(&program_id, &members).await?;
            println!("account:   {account}");
            println!("signature: {signature}");
        }
        Command::Airdrop { lamports } => {
            let client = program_client(&config)?;
            airdrop(client.rpc(), &client.payer(), lamports).await?;
        }
    }

    Ok(())
}

fn program_client(config: &ClientConfig) -> Result<ProgramClient> {
    let payer = load_payer(&config.signer)?;
    let rpc = get_rpc_client(&config.cluster);
    Ok(ProgramClient::new(
        rpc,
        payer,
        SubmitPolicy::from(&config.cluster),
    ))
}

fn init_logging(log_level: &str) {
    let log_level = log_level.parse().unwrap_or(tracing::Level::INFO);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("pda_seed={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
