//! Line parameter validation and the commands each platform runs for them.

mod common;

use common::{sample_path, Harness, ALL_VARIANTS};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serialctl::os::OsVariant;
use serialctl::shell::CommandOutcome;
use serialctl::{DeviceLifecycleState, FlowControl, SerialError, SUPPORTED_BAUD_RATES};

#[test]
fn test_windows_baud_rate_uses_short_code() {
    let mut h = Harness::with_device(OsVariant::Windows, "COM3");

    h.device.set_baud_rate(9600).unwrap();
    h.device.set_baud_rate(19200).unwrap();
    h.device.set_baud_rate(115200).unwrap();

    assert_eq!(
        h.shell.commands(),
        vec![
            "mode COM3 BAUD=96",
            "mode COM3 BAUD=19",
            "mode COM3 BAUD=115200",
        ]
    );
}

#[test]
fn test_mac_odd_parity() {
    let mut h = Harness::with_device(OsVariant::Mac, "/dev/tty.usbserial");

    h.device.set_parity("odd").unwrap();

    assert_eq!(
        h.shell.last_command().as_deref(),
        Some("stty -f /dev/tty.usbserial parenb parodd")
    );
}

#[test]
fn test_full_linux_configuration() {
    let mut h = Harness::with_device(OsVariant::Linux, "COM2");

    h.device.set_baud_rate(57600).unwrap();
    h.device.set_parity("none").unwrap();
    h.device.set_character_length(8).unwrap();
    h.device.set_stop_bits(1.0).unwrap();
    h.device.set_flow_control("rts_cts").unwrap();

    assert_eq!(
        h.shell.commands(),
        vec![
            "stty -F /dev/ttyS1 57600",
            "stty -F /dev/ttyS1 -parenb",
            "stty -F /dev/ttyS1 cs8",
            "stty -F /dev/ttyS1 -cstopb",
            "stty -F /dev/ttyS1 -clocal crtscts -ixon -ixoff",
        ]
    );
}

#[test]
fn test_full_windows_configuration() {
    let mut h = Harness::with_device(OsVariant::Windows, "COM1");

    h.device.set_parity("even").unwrap();
    h.device.set_character_length(7).unwrap();
    h.device.set_stop_bits(1.5).unwrap();
    h.device.set_flow_control("none").unwrap();
    h.device.set_flow_control("xon_xoff").unwrap();
    h.device.set_flow_control(FlowControl::RtsCts).unwrap();

    assert_eq!(
        h.shell.commands(),
        vec![
            "mode COM1 PARITY=e",
            "mode COM1 DATA=7",
            "mode COM1 STOP=1.5",
            "mode COM1 xon=off octs=off rts=on",
            "mode COM1 xon=on octs=off rts=on",
            "mode COM1 xon=off octs=on rts=hs",
        ]
    );
}

#[test]
fn test_one_and_a_half_stop_bits_accepted_everywhere() {
    for variant in ALL_VARIANTS {
        let mut h = Harness::with_device(variant, sample_path(variant));
        h.device.set_stop_bits(1.5).unwrap();
        assert_eq!(h.shell.commands().len(), 1);
    }
}

#[test]
fn test_rejected_values_run_nothing() {
    let mut h = Harness::with_device(OsVariant::Linux, "/dev/ttyUSB0");

    assert!(matches!(
        h.device.set_parity("mark"),
        Err(SerialError::UnsupportedParity(_))
    ));
    assert!(matches!(
        h.device.set_stop_bits(3.0),
        Err(SerialError::InvalidStopBits(_))
    ));
    assert!(matches!(
        h.device.set_flow_control("dtr_dsr"),
        Err(SerialError::InvalidFlowControl(_))
    ));
    assert!(matches!(
        h.device.set_baud_rate(250000),
        Err(SerialError::UnsupportedBaudRate(250000))
    ));

    assert!(h.shell.commands().is_empty());
    assert_eq!(h.device.state(), DeviceLifecycleState::Set);
}

#[test]
fn test_configuration_needs_set_state() {
    let mut unset = Harness::new(OsVariant::Mac);
    assert!(matches!(
        unset.device.set_character_length(8),
        Err(SerialError::DeviceNotConfigurable)
    ));

    let mut opened = Harness::opened(OsVariant::Windows, "COM3");
    opened.device.set_auto_flush(false);
    opened.device.send("pending", std::time::Duration::ZERO).unwrap();

    assert!(matches!(
        opened.device.set_flow_control("none"),
        Err(SerialError::DeviceNotConfigurable)
    ));
    assert!(opened.shell.commands().is_empty());
    assert_eq!(opened.device.buffered(), b"pending");
    assert_eq!(opened.device.state(), DeviceLifecycleState::Opened);
}

#[test]
fn test_failed_command_can_be_retried() {
    let mut h = Harness::with_device(OsVariant::Mac, "/dev/tty.usbserial");
    h.shell.push_outcome(CommandOutcome::failure(
        1,
        "stty: tcsetattr: Inappropriate ioctl for device",
    ));

    let err = h.device.set_baud_rate(9600).unwrap_err();
    match err {
        SerialError::ConfigurationCommandFailed {
            command, stderr, ..
        } => {
            assert_eq!(command, "stty -f /dev/tty.usbserial 9600");
            assert_eq!(stderr, "stty: tcsetattr: Inappropriate ioctl for device");
        }
        other => panic!("unexpected error: {other}"),
    }

    h.device.set_baud_rate(9600).unwrap();
    assert_eq!(h.shell.commands().len(), 2);
}

proptest! {
    #[test]
    fn baud_rate_accepted_iff_supported(rate in prop_oneof![
        any::<u32>(),
        prop::sample::select(SUPPORTED_BAUD_RATES.to_vec()),
    ]) {
        let mut h = Harness::with_device(OsVariant::Linux, "/dev/ttyUSB0");
        let result = h.device.set_baud_rate(rate);

        if SUPPORTED_BAUD_RATES.contains(&rate) {
            prop_assert!(result.is_ok());
            let expected = format!("stty -F /dev/ttyUSB0 {rate}");
            prop_assert_eq!(h.shell.last_command(), Some(expected));
        } else {
            prop_assert!(matches!(result, Err(SerialError::UnsupportedBaudRate(r)) if r == rate));
            prop_assert!(h.shell.commands().is_empty());
        }
    }

    #[test]
    fn character_length_is_clamped(bits in any::<i32>()) {
        let clamped = bits.clamp(5, 8);

        let mut direct = Harness::with_device(OsVariant::Linux, "/dev/ttyUSB0");
        let mut reference = Harness::with_device(OsVariant::Linux, "/dev/ttyUSB0");
        direct.device.set_character_length(bits).unwrap();
        reference.device.set_character_length(clamped).unwrap();

        prop_assert_eq!(direct.shell.commands(), reference.shell.commands());
        prop_assert_eq!(
            direct.shell.last_command(),
            Some(format!("stty -F /dev/ttyUSB0 cs{clamped}"))
        );
    }
}
