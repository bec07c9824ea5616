//! Tests requiring an actual serial device.
//!
//! Ignored by default and only built with the `hardware-tests` feature.
//!
//! ```bash
//! export TEST_PORT=/dev/ttyUSB0          # or COM3 on Windows
//! export TEST_BAUD=9600                  # optional, default: 9600
//! export TEST_LOOPBACK=1                 # if the port has TX-RX loopback
//!
//! cargo test --features hardware-tests -- --ignored
//! ```

#![cfg(feature = "hardware-tests")]

use serialctl::{DeviceLifecycleState, SerialDevice};
use std::env;
use std::time::Duration;

fn get_test_port() -> Option<String> {
    env::var("TEST_PORT").ok()
}

fn get_test_baud() -> u32 {
    env::var("TEST_BAUD")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(9600)
}

fn is_loopback_enabled() -> bool {
    env::var("TEST_LOOPBACK").ok().as_deref() == Some("1")
}

fn skip_without_hardware() -> Option<String> {
    let port = get_test_port();
    if port.is_none() {
        println!("Skipping hardware test: TEST_PORT not set");
    }
    port
}

fn configured_device(port: &str) -> SerialDevice {
    let mut device = SerialDevice::new().expect("host platform supported");
    device.set_device(port).expect("TEST_PORT probes successfully");
    device.set_baud_rate(get_test_baud()).expect("baud rate applied");
    device.set_parity("none").expect("parity applied");
    device.set_character_length(8).expect("data bits applied");
    device.set_stop_bits(1.0).expect("stop bits applied");
    device.set_flow_control("none").expect("flow control applied");
    device
}

#[test]
#[ignore]
fn test_real_port_open_close() {
    let Some(port) = skip_without_hardware() else {
        return;
    };
    let mut device = configured_device(&port);

    for _ in 0..3 {
        device.open_default().unwrap();
        assert_eq!(device.state(), DeviceLifecycleState::Opened);
        device.close().unwrap();
    }
}

#[test]
#[ignore]
fn test_real_port_drain_when_idle() {
    let Some(port) = skip_without_hardware() else {
        return;
    };
    let mut device = configured_device(&port);
    let mut session = device.session("r+b").unwrap();

    session.read_flush().unwrap();
    assert_eq!(session.data_available().unwrap(), 0);
}

#[test]
#[ignore]
fn test_real_port_loopback_line() {
    let Some(port) = skip_without_hardware() else {
        return;
    };
    if !is_loopback_enabled() {
        println!("Skipping loopback test: TEST_LOOPBACK not set");
        return;
    }
    let mut device = configured_device(&port);
    let mut session = device.session("r+b").unwrap();

    session.read_flush().unwrap();
    session.send("LOOPBACK\r\n", Duration::from_millis(100)).unwrap();
    let line = session.read_line_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(line, b"LOOPBACK");
}
