//! Get Operator Ethereum Address from Config
//!
//! This binary reads the settler configuration and outputs the Ethereum
//! address derived from the operator's ECDSA key. Use it to fund the operator
//! account and to cross-check the configured address.

use anyhow::Result;
use escrow_settler::config::Config;
use escrow_settler::crypto::OperatorSigner;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::load()?;
    let signer = OperatorSigner::new(&config)?;

    println!("{}", signer.address());

    Ok(())
}
