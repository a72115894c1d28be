//! Integration tests for the fingerprint terminal firmware.
//!
//! Run after flashing the firmware, with the control UART connected. The
//! unattended tests only need the sensor wired up; `--enroll-slot` adds
//! tests that ask the operator to place a finger and use the keypad.

mod device;
mod lines;

use clap::Parser;
use colored::Colorize;

use device::{resolve_port, DeviceClient};
use tests::{print_results, run_all_tests};

#[derive(Parser)]
#[command(name = "integration-tests")]
#[command(about = "Integration tests for the fingerprint terminal firmware")]
struct Args {
    /// Serial port of the control channel (use "auto" to auto-detect)
    #[arg(short, long, default_value = "auto")]
    port: String,

    /// Baud rate
    #[arg(short, long, default_value = "57600")]
    baud: u32,

    /// Enroll, name and search a finger in this slot (1-98, operator assisted)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..99))]
    enroll_slot: Option<u8>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Resolve port (auto-detect if "auto")
    let port = resolve_port(&args.port)?;

    println!("{}", "Fingerprint Terminal Integration Tests".bold());
    println!("Port: {}", port);
    println!("Baud: {}", args.baud);
    println!();

    println!("Connecting to device...");
    let mut device = DeviceClient::new(&port, args.baud)?;

    // Wait for bootloader output to finish, then clear buffer
    std::thread::sleep(std::time::Duration::from_secs(1));
    device.clear_buffer()?;
    println!("{}", "Connected!".green());

    println!("\nRunning tests...\n");

    let results = run_all_tests(&mut device, args.enroll_slot);
    print_results(&results);

    // Exit with error code if any tests failed
    let failed = results.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod args_tests {
    use super::*;

    #[test]
    fn test_enroll_slot_range() {
        let parse = |slot: &str| Args::try_parse_from(["integration-tests", "--enroll-slot", slot]);
        assert!(parse("0").is_err());
        assert!(parse("99").is_err());
        assert_eq!(parse("1").unwrap().enroll_slot, Some(1));
        assert_eq!(parse("98").unwrap().enroll_slot, Some(98));
    }
}
