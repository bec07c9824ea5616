//! `stty` translation for Linux and macOS.

use super::{
    com_port_number, is_plain_path, is_setserial_word, DeviceIdentity, OsStrategy, OsVariant,
};
use crate::error::{Result, SerialError};
use crate::settings::{ConfigurationValue, FlowControl, Parity, StopBits};

/// Strategy for Unix-family hosts.
///
/// GNU `stty` selects the device with `-F`, BSD `stty` with `-f`. Both share
/// the same flag vocabulary.
#[derive(Debug, Clone)]
pub struct SttyStrategy {
    variant: OsVariant,
    device_flag: &'static str,
}

impl SttyStrategy {
    pub fn linux() -> Self {
        Self {
            variant: OsVariant::Linux,
            device_flag: "-F",
        }
    }

    pub fn mac() -> Self {
        Self {
            variant: OsVariant::Mac,
            device_flag: "-f",
        }
    }

    fn prefix(&self, path: &str) -> String {
        format!("stty {} {}", self.device_flag, path)
    }
}

fn parity_flags(parity: Parity) -> &'static str {
    match parity {
        Parity::None => "-parenb",
        Parity::Odd => "parenb parodd",
        Parity::Even => "parenb -parodd",
    }
}

fn flow_flags(flow: FlowControl) -> &'static str {
    match flow {
        FlowControl::None => "clocal -crtscts -ixon -ixoff",
        FlowControl::RtsCts => "-clocal crtscts -ixon -ixoff",
        FlowControl::XonXoff => "-clocal -crtscts ixon ixoff",
    }
}

impl OsStrategy for SttyStrategy {
    fn variant(&self) -> OsVariant {
        self.variant
    }

    fn availability_check(&self) -> Option<&'static str> {
        // BSD stty has no --version and fails when stdin is not a terminal.
        match self.variant {
            OsVariant::Linux => Some("stty --version"),
            _ => None,
        }
    }

    fn resolve_device(&self, requested: &str) -> Result<DeviceIdentity> {
        if self.variant == OsVariant::Linux {
            if let Some(n) = com_port_number(requested) {
                // COM1 is the first UART, /dev/ttyS0.
                let index = n
                    .checked_sub(1)
                    .ok_or_else(|| SerialError::invalid_device(requested))?;
                return Ok(DeviceIdentity::unix(format!("/dev/ttyS{index}")));
            }
        }
        // The path is spliced into `sh -c` command lines.
        if !is_plain_path(requested) {
            return Err(SerialError::invalid_device(requested));
        }
        Ok(DeviceIdentity::unix(requested))
    }

    fn probe_command(&self, _requested: &str, identity: &DeviceIdentity) -> String {
        self.prefix(&identity.path)
    }

    fn configuration_flags(&self, value: &ConfigurationValue) -> String {
        match value {
            ConfigurationValue::BaudRate(rate) => rate.to_string(),
            ConfigurationValue::Parity(parity) => parity_flags(*parity).to_string(),
            ConfigurationValue::CharacterLength(length) => format!("cs{}", length.get()),
            ConfigurationValue::StopBits(StopBits::One) => "-cstopb".to_string(),
            // 1.5 has no stty representation and maps to two stop bits.
            ConfigurationValue::StopBits(_) => "cstopb".to_string(),
            ConfigurationValue::FlowControl(flow) => flow_flags(*flow).to_string(),
        }
    }

    fn configure_command(&self, identity: &DeviceIdentity, value: &ConfigurationValue) -> String {
        format!(
            "{} {}",
            self.prefix(&identity.path),
            self.configuration_flags(value)
        )
    }

    fn setserial_command(
        &self,
        identity: &DeviceIdentity,
        param: &str,
        arg: &str,
    ) -> Result<String> {
        if self.variant != OsVariant::Linux {
            return Err(SerialError::UnsupportedOperation {
                operation: "setserial",
                platform: self.variant.name(),
            });
        }
        if !is_setserial_word(param) || !(arg.is_empty() || is_setserial_word(arg)) {
            return Err(SerialError::SetSerialFailed("Invalid flag".to_string()));
        }
        let command = format!("setserial {} {} {}", identity.path, param, arg);
        Ok(command.trim_end().to_string())
    }
}
