//! Example: Controlling a unit
//!
//! Run with: cargo run --example control -- 192.168.1.30 003A00345758520F
//!
//! This example demonstrates:
//! - Connecting with a known identity
//! - Convenience controls (power, speed, airflow, humidity sensor)
//! - Generic writes with typed values
//! - Write-only actions

use ecovent::{Client, ClientConfig, DomainValue, TimeSpan};
use std::net::Ipv4Addr;

fn main() -> ecovent::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let ip: Ipv4Addr = args
        .next()
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(Ipv4Addr::new(192, 168, 1, 30));

    let mut config = ClientConfig::new(ip);
    if let Some(identity) = args.next() {
        config = config.with_identity(identity);
    }
    let client = Client::connect(config)?;

    // =========================================================================
    // Power and speed
    // =========================================================================

    println!("=== Power and speed ===\n");

    let echoed = client.turn_on()?;
    println!("state -> {}", echoed.get("state").map(|v| v.to_string()).unwrap_or_default());

    client.set_speed(2)?;
    println!("speed -> medium");

    // 60 % manual speed also switches the speed preset to "manual"
    let echoed = client.set_manual_speed(60)?;
    for (name, value) in echoed.iter() {
        println!("{} -> {}", name, value);
    }

    // =========================================================================
    // Airflow and humidity
    // =========================================================================

    println!("\n=== Airflow and humidity ===\n");

    client.set_airflow("heat_recovery")?;
    client.set_humidity_sensor(true)?;
    client.set_humidity_threshold(60)?;
    println!("humidity = {}", client.read("humidity")?);

    // Unknown labels are rejected before anything is sent
    if let Err(e) = client.set_airflow("sideways") {
        println!("rejected: {}", e);
    }

    // =========================================================================
    // Generic writes
    // =========================================================================

    println!("\n=== Timers ===\n");

    let timer = DomainValue::Span(TimeSpan::hours_minutes(8, 30));
    client.write("night_mode_timer", &timer)?;
    println!("night_mode_timer = {}", client.read("night_mode_timer")?);

    // =========================================================================
    // Write-only actions
    // =========================================================================

    if client.read("filter_replacement_status")? == DomainValue::Label("on") {
        client.clear_filter_reminder()?;
        println!("\nfilter reminder cleared");
    }

    Ok(())
}
