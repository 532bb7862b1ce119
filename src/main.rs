//! Ring Settlement - Binary Entry Point
//!
//! Settles a demonstration two-order ring against in-memory collaborators
//! and logs the resulting transfers.
//!
//! Configuration is read from the TOML file named by
//! `RING_SETTLEMENT_CONFIG`, or from `RING_*` environment variables.

use std::sync::Arc;

use alloy_primitives::{address, Address};
use tracing::{error, info};

use ring_settlement::context::{BalanceLedger, StaticTokenRegistry};
use ring_settlement::types::units::{from_base_units, to_base_units};
use ring_settlement::{Config, OrderRecord, Result, RingSettler};

const TOKEN_A: Address = address!("1111111111111111111111111111111111111111");
const TOKEN_B: Address = address!("2222222222222222222222222222222222222222");
const ALICE: Address = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
const BOB: Address = address!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");
const WALLET: Address = address!("dddddddddddddddddddddddddddddddddddddddd");
const MINER: Address = address!("eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee");

const DECIMALS: u8 = 18;

fn load_config() -> Result<Config> {
    match std::env::var("RING_SETTLEMENT_CONFIG") {
        Ok(path) => Config::from_file(path)?.with_env_overrides(),
        Err(_) => Config::from_env(),
    }
}

async fn run() -> Result<()> {
    let config = load_config()?;
    info!(
        service = %config.service_name,
        fee_token = %config.fee_token,
        wallet_split_percentage = config.wallet_split_percentage,
        "configuration loaded"
    );

    let ledger = Arc::new(BalanceLedger::new());
    ledger.fund(TOKEN_A, ALICE, to_base_units("1000", DECIMALS)?).await;
    ledger.fund(TOKEN_B, BOB, to_base_units("40", DECIMALS)?).await;
    let registry = Arc::new(StaticTokenRegistry::new([TOKEN_A, TOKEN_B, config.fee_token]));

    let settler = RingSettler::from_config(&config, ledger.clone(), registry)?;

    let orders = vec![
        OrderRecord::new(
            ALICE,
            TOKEN_A,
            to_base_units("100", DECIMALS)?,
            to_base_units("50", DECIMALS)?,
            to_base_units("10", DECIMALS)?,
        )
        .with_wallet(WALLET),
        OrderRecord::new(
            BOB,
            TOKEN_B,
            to_base_units("40", DECIMALS)?,
            to_base_units("20", DECIMALS)?,
            to_base_units("4", DECIMALS)?,
        ),
    ];

    let plan = settler.settle(orders, ALICE, MINER).await?;
    info!(ring_hash = %plan.ring_hash_hex(), transfers = plan.transfer_count(), "settlement plan ready");

    for (i, item) in plan.transfers.iter().enumerate() {
        info!(
            index = i,
            token = %item.token,
            from = %item.from,
            to = %item.to,
            amount = %from_base_units(item.amount, DECIMALS),
            "transfer"
        );
    }

    for (token, total) in plan.totals_by_token()? {
        info!(%token, total = %from_base_units(total, DECIMALS), "token total");
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "settlement failed");
        std::process::exit(1);
    }
}
