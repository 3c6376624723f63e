//! CLI commands for the audit
//!
//! Wires the node config, RPC client and auditor together and prints findings
//! and the end-of-run report.

use crate::core::{AuditConfig, AuditSummary, Auditor, BalanceLedger, Rule};
use crate::params::{format_coins, NetworkParams};
use crate::rpc::{NodeClient, NodeConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Options for an audit run
#[derive(Debug, Clone)]
pub struct AuditOptions {
    pub config_path: PathBuf,
    pub network: String,
    pub print_balances: bool,
    /// Overrides `rpctimeout` from the node config
    pub rpc_timeout: Option<u64>,
    pub audit: AuditConfig,
}

/// Audit the chain of the configured node
pub fn cmd_audit(options: &AuditOptions) -> CliResult<()> {
    let params = NetworkParams::from_name(&options.network)?;

    let mut node_config = NodeConfig::load(&options.config_path, &params)?;
    if let Some(secs) = options.rpc_timeout {
        node_config = node_config.with_timeout(Duration::from_secs(secs));
    }
    log::info!("Connecting to node at {}", node_config.url());
    let client = NodeClient::new(&node_config)?;

    println!("🔍 Checking blocks on {}...", params.name());

    let mut auditor = Auditor::new(params, options.audit.clone());
    let summary = auditor.run(&client, |finding| println!("{}", finding))?;

    if options.print_balances {
        print_balances(auditor.ledger_mut(), summary.tip);
    }
    print_summary(&summary);
    println!("Done!");

    Ok(())
}

/// Print mature balances and immature totals as of `tip`
fn print_balances(ledger: &mut BalanceLedger, tip: u64) {
    ledger.fold_all(tip);

    println!("\n💰 Mature coins ({} addresses)", ledger.address_count());
    for (address, amount) in ledger.mature_balances() {
        println!("   {} {}", address, format_coins(amount));
    }

    let immature = ledger.immature_balances();
    println!("\n⏳ Immature coins ({} addresses)", immature.len());
    for (address, amount) in immature {
        println!("   {} {}", address, format_coins(amount));
    }
    println!();
}

fn print_summary(summary: &AuditSummary) {
    println!("📋 Audit summary");
    println!("   ├─ Blocks checked: {} (tip {})", summary.blocks_checked, summary.tip);
    println!(
        "   ├─ Rule 1 (address reuse): {}",
        summary.violations_for(Rule::AddressReuse)
    );
    println!(
        "   ├─ Rule 2 (coin age): {}",
        summary.violations_for(Rule::CoinAge)
    );
    println!(
        "   ├─ Rule 3 (hash affinity): {}",
        summary.violations_for(Rule::HashAffinity)
    );
    println!("   ├─ Ledger errors: {}", summary.ledger_errors);
    println!(
        "   ├─ Output cache hit rate: {:.1}%",
        summary.cache.hit_rate() * 100.0
    );
    println!("   └─ Time: {:.1}s", summary.elapsed.as_secs_f64());
}
