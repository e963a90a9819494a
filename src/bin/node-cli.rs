use std::path::PathBuf;
use std::time::Duration;

use alloy::primitives::hex;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use node_client::config::{load_config, validate_config, ClientConfig, ConfigError};
use node_client::observability::{logging, metrics};
use node_client::{Layer2Client, NodeClient, TransportKind};

#[derive(Parser)]
#[command(name = "node-cli")]
#[command(about = "Query a blockchain node over JSON-RPC, REST or WebSocket", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint; any endpoint flag replaces the configured set
    #[arg(long)]
    rpc: Option<String>,

    /// REST endpoint
    #[arg(long)]
    rest: Option<String>,

    /// WebSocket endpoint
    #[arg(long)]
    ws: Option<String>,

    /// Transport to prefer over the default priority order
    #[arg(long, value_parser = parse_kind)]
    prefer: Option<TransportKind>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Current block height
    Height,
    /// Block hash at a height, or the current one
    BlockHash { height: Option<u32> },
    /// Block by height or hash
    Block { id: String },
    /// Transaction by hash
    Tx { hash: String },
    /// Contract events of a transaction, or of a block with --block
    Events {
        hash: Option<String>,
        #[arg(long, conflicts_with = "hash")]
        block: Option<u32>,
    },
    /// Contract storage value (key in hex)
    Storage { contract: String, key: String },
    /// Node version
    Version,
    /// Node network id
    NetworkId,
    /// Verified/unverified mempool counts
    MempoolCount,
    /// Wait for the chain to advance
    Wait {
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
        #[arg(long)]
        blocks: Option<u32>,
    },
    /// Layer-2 store key for a contract (key in hex)
    L2StoreKey {
        #[arg(long, default_value = "")]
        contract: String,
        key: String,
    },
    /// Verify a layer-2 store proof (all arguments in hex)
    L2Verify {
        key: String,
        value: String,
        proof: String,
        state_root: String,
    },
}

fn parse_kind(raw: &str) -> Result<TransportKind, String> {
    match raw.to_ascii_lowercase().as_str() {
        "rpc" => Ok(TransportKind::Rpc),
        "rest" => Ok(TransportKind::Rest),
        "ws" | "websocket" => Ok(TransportKind::WebSocket),
        other => Err(format!("unknown transport '{}'", other)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;

    logging::init_logging(&config.observability.log_level);
    metrics::set_enabled(config.observability.metrics_enabled);

    tracing::debug!(
        rpc = ?config.transports.rpc_url,
        rest = ?config.transports.rest_url,
        ws = ?config.transports.ws_url,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    match cli.command {
        // Offline commands never touch a node.
        Commands::L2StoreKey { contract, key } => {
            let key = Layer2Client::get_layer2_store_key(&contract, &hex::decode(key)?)?;
            print_json(&json!({ "store_key": hex::encode(key) }))?;
            return Ok(());
        }
        Commands::L2Verify {
            key,
            value,
            proof,
            state_root,
        } => {
            Layer2Client::verify_layer2_store_proof(
                &hex::decode(key)?,
                &hex::decode(value)?,
                &hex::decode(proof)?,
                &hex::decode(state_root)?,
            )?;
            print_json(&json!({ "verified": true }))?;
            return Ok(());
        }
        command => run(NodeClient::connect(&config).await?, command).await,
    }
}

async fn run(client: NodeClient, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Height => {
            print_json(&json!({ "height": client.get_current_block_height().await? }))?;
        }
        Commands::BlockHash { height } => {
            let hash = match height {
                Some(height) => client.get_block_hash(height).await?,
                None => client.get_current_block_hash().await?,
            };
            print_json(&json!({ "hash": hash.to_string() }))?;
        }
        Commands::Block { id } => {
            let block = match id.parse::<u32>() {
                Ok(height) => client.get_block_by_height(height).await?,
                Err(_) => client.get_block_by_hash(&id).await?,
            };
            print_json(&block)?;
        }
        Commands::Tx { hash } => print_json(&client.get_transaction(&hash).await?)?,
        Commands::Events { hash, block } => match (hash, block) {
            (_, Some(height)) => {
                print_json(&client.get_smart_contract_events_by_block(height).await?)?
            }
            (Some(hash), None) => print_json(&client.get_smart_contract_event(&hash).await?)?,
            (None, None) => return Err("either a transaction hash or --block is required".into()),
        },
        Commands::Storage { contract, key } => {
            let value = client.get_storage(&contract, &hex::decode(key)?).await?;
            print_json(&json!({ "value": hex::encode(value) }))?;
        }
        Commands::Version => print_json(&json!({ "version": client.get_version().await? }))?,
        Commands::NetworkId => {
            print_json(&json!({ "network_id": client.get_network_id().await? }))?
        }
        Commands::MempoolCount => print_json(&client.get_mempool_tx_count().await?)?,
        Commands::Wait {
            timeout_secs,
            blocks,
        } => {
            let height = client
                .wait_for_blocks(Duration::from_secs(timeout_secs), blocks)
                .await?;
            print_json(&json!({ "height": height }))?;
        }
        Commands::L2StoreKey { .. } | Commands::L2Verify { .. } => {}
    }
    Ok(())
}

fn build_config(cli: &Cli) -> Result<ClientConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };

    if cli.rpc.is_some() || cli.rest.is_some() || cli.ws.is_some() {
        config.transports.rpc_url = cli.rpc.clone();
        config.transports.rest_url = cli.rest.clone();
        config.transports.ws_url = cli.ws.clone();
        config.transports.default = None;
    }
    if cli.prefer.is_some() {
        config.transports.default = cli.prefer;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
