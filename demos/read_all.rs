//! Example: Reading every parameter of a unit
//!
//! Run with: cargo run --example read_all -- 192.168.1.30
//!
//! This example demonstrates:
//! - Identity discovery on connect
//! - Reading all parameters in one frame
//! - Inspecting records that could not be decoded
//!
//! Set `RUST_LOG=ecovent=trace` to see the raw frames.

use ecovent::{Client, ClientConfig};
use std::net::Ipv4Addr;

fn main() -> ecovent::Result<()> {
    env_logger::init();

    let ip: Ipv4Addr = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(Ipv4Addr::new(192, 168, 1, 30));

    // =========================================================================
    // Connect (discovers the identity when none is configured)
    // =========================================================================

    let client = Client::connect(ClientConfig::new(ip))?;
    println!("Connected to {} ({})\n", ip, client.identity());

    // =========================================================================
    // Read everything
    // =========================================================================

    let state = client.read_all()?;
    for (name, value) in state.iter() {
        println!("{:<28} {}", name, value);
    }

    if !state.failures().is_empty() {
        println!("\n=== Skipped records ===\n");
        for failure in state.failures() {
            println!("0x{:04X}: {}", failure.id, failure.error);
        }
    }

    if !state.unsupported().is_empty() {
        println!("\nUnsupported by this unit: {:04X?}", state.unsupported());
    }

    Ok(())
}
