//! `mode` translation for Windows.

use super::{com_port_number, DeviceIdentity, OsStrategy, OsVariant};
use crate::error::{Result, SerialError};
use crate::settings::{ConfigurationValue, FlowControl, Parity};

/// Strategy for Windows hosts. Devices are addressed by `COM<N>` label.
#[derive(Debug, Clone, Default)]
pub struct ModeStrategy;

impl ModeStrategy {
    pub fn new() -> Self {
        Self
    }
}

fn flow_flags(flow: FlowControl) -> &'static str {
    match flow {
        FlowControl::None => "xon=off octs=off rts=on",
        FlowControl::RtsCts => "xon=off octs=on rts=hs",
        FlowControl::XonXoff => "xon=on octs=off rts=on",
    }
}

fn parity_letter(parity: Parity) -> char {
    match parity {
        Parity::None => 'n',
        Parity::Odd => 'o',
        Parity::Even => 'e',
    }
}

impl OsStrategy for ModeStrategy {
    fn variant(&self) -> OsVariant {
        OsVariant::Windows
    }

    fn resolve_device(&self, requested: &str) -> Result<DeviceIdentity> {
        let n = com_port_number(requested).ok_or_else(|| SerialError::invalid_device(requested))?;
        Ok(DeviceIdentity {
            path: format!(r"\\.\COM{n}"),
            windows_alias: Some(format!("COM{n}")),
        })
    }

    /// Probing also resets the port to 9600 baud with XON enabled.
    fn probe_command(&self, requested: &str, _identity: &DeviceIdentity) -> String {
        format!("mode {requested} xon=on BAUD=9600")
    }

    fn configuration_flags(&self, value: &ConfigurationValue) -> String {
        match value {
            ConfigurationValue::BaudRate(rate) => format!("BAUD={}", rate.windows_code()),
            ConfigurationValue::Parity(parity) => format!("PARITY={}", parity_letter(*parity)),
            ConfigurationValue::CharacterLength(length) => format!("DATA={}", length.get()),
            ConfigurationValue::StopBits(bits) => format!("STOP={}", bits.as_str()),
            ConfigurationValue::FlowControl(flow) => flow_flags(*flow).to_string(),
        }
    }

    fn configure_command(&self, identity: &DeviceIdentity, value: &ConfigurationValue) -> String {
        format!(
            "mode {} {}",
            identity.command_target(),
            self.configuration_flags(value)
        )
    }
}
