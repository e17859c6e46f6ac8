//! `pact-tx`: build, read, submit and poll Pact transactions from the shell.
//!
//! ```text
//! pact-tx [--config txkit.toml] [--network devnet] <command>
//!
//!   build  --code <pact> [--chain N] [--data key=json]...   print the unsigned envelope
//!   local  --code <pact> [--chain N | --all-chains]         dirty read, print the data
//!   send   --code <pact> --signer <account> [--chain N]
//!          [--preflight] [--wait]                           sign and submit
//!   poll   --request-key <key> [--chain N]                  print known results
//! ```

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use pact_txkit::client::TransactionDescriptor;
use pact_txkit::command::ChainId;
use pact_txkit::config::{load_config, TxkitConfig};
use pact_txkit::dispatch::poll_transactions;
use pact_txkit::observability::logging::init_logging;
use pact_txkit::{CommandBuilder, NetworkContext, SubmitOptions};

#[derive(Parser)]
#[command(name = "pact-tx")]
#[command(about = "Build, sign and dispatch Pact transactions", long_about = None)]
struct Cli {
    /// Configuration file (TOML). Built-in networks are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Network name from the configuration.
    #[arg(short, long)]
    network: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct CodeArgs {
    /// Pact code to execute.
    #[arg(long)]
    code: String,

    /// Target chain; defaults to the network's configured chain.
    #[arg(long)]
    chain: Option<String>,

    /// Environment data as key=json (repeatable).
    #[arg(long = "data", value_parser = parse_data)]
    data: Vec<(String, Value)>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the unsigned envelope
    Build(CodeArgs),
    /// Speculative read
    Local {
        #[command(flatten)]
        args: CodeArgs,
        /// Read from every chain of the network
        #[arg(long)]
        all_chains: bool,
    },
    /// Sign with a configured key pair and submit
    Send {
        #[command(flatten)]
        args: CodeArgs,
        /// Account whose key pair signs and pays gas
        #[arg(long)]
        signer: String,
        #[arg(long)]
        preflight: bool,
        /// Wait for the result instead of printing the request key
        #[arg(long)]
        wait: bool,
    },
    /// Poll a request key
    Poll {
        #[arg(long)]
        request_key: String,
        #[arg(long)]
        chain: Option<String>,
    },
}

fn parse_data(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=json, got '{}'", raw))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn builder(context: &Arc<NetworkContext>, args: CodeArgs) -> CommandBuilder {
    let mut builder = context.execution(args.code);
    if let Some(chain) = args.chain {
        builder = builder.with_chain_id(chain);
    }
    for (key, value) in args.data {
        builder = builder.with_data(key, value);
    }
    builder
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => TxkitConfig::default(),
    };
    init_logging(&config.logging)?;

    let context = NetworkContext::from_config(&config, cli.network.as_deref())?;

    match cli.command {
        Commands::Build(args) => {
            let tx = builder(&context, args).build().finalize().await?;
            print_json(&tx)?;
        }
        Commands::Local { args, all_chains } => {
            let dispatcher = builder(&context, args).build();
            if all_chains {
                print_json(&dispatcher.dirty_read_all().await?)?;
            } else {
                print_json(&dispatcher.dirty_read().await?)?;
            }
        }
        Commands::Send {
            args,
            signer,
            preflight,
            wait,
        } => {
            let wallet = Arc::new(context.key_pair(&signer)?);
            let dispatcher = builder(&context, args).sign(wallet);
            let options = SubmitOptions {
                preflight,
                sequence: false,
            };
            if wait {
                print_json(&dispatcher.submit_and_listen(options).await?)?;
            } else {
                print_json(&dispatcher.submit(options).await?)?;
            }
        }
        Commands::Poll { request_key, chain } => {
            let chain_id = chain
                .map(ChainId::from)
                .unwrap_or_else(|| context.meta().chain_id);
            let descriptor = TransactionDescriptor {
                request_key,
                chain_id,
                network_id: context.network_id().to_string(),
            };
            let results = poll_transactions(context.client().as_ref(), &[descriptor]).await?;
            print_json(&results)?;
        }
    }

    Ok(())
}
