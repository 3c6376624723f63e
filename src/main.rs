//! Lynx rule audit CLI
//!
//! Walks the chain of a running node and reports blocks that break the
//! hard-fork mining rules.

use clap::Parser;
use lynx_audit::cli::{self, AuditOptions};
use lynx_audit::core::{AuditConfig, DEFAULT_PROGRESS_INTERVAL};
use lynx_audit::storage::DEFAULT_CACHE_SIZE;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lynx-audit")]
#[command(version)]
#[command(about = "Audit a Lynx chain against its hard-fork mining rules", long_about = None)]
struct Cli {
    /// Node config file with RPC credentials
    config: PathBuf,

    /// Network to audit: mainnet, testnet or regtest
    network: String,

    /// Print every address balance after the walk
    #[arg(long)]
    print_balances: bool,

    /// Abort when a spend cannot be applied to the balance ledger
    #[arg(long)]
    strict: bool,

    /// Resolved outputs kept in memory (0 disables the cache)
    #[arg(long, default_value_t = DEFAULT_CACHE_SIZE)]
    cache_size: usize,

    /// Log progress every N blocks (0 disables)
    #[arg(long, default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    progress_every: u64,

    /// RPC timeout in seconds, overriding the node config
    #[arg(long)]
    rpc_timeout: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let options = AuditOptions {
        config_path: cli.config,
        network: cli.network,
        print_balances: cli.print_balances,
        rpc_timeout: cli.rpc_timeout,
        audit: AuditConfig {
            strict: cli.strict,
            cache_size: cli.cache_size,
            progress_every: cli.progress_every,
        },
    };

    if let Err(e) = cli::cmd_audit(&options) {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    Ok(())
}
