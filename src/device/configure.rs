//! Line configuration.
//!
//! Every setter requires the device to be set and not opened. Values are
//! validated, translated by the platform strategy and executed through the
//! shell runner. A rejected value or a failed command leaves the device state
//! untouched, so the caller may simply retry.

use super::{DeviceState, SerialDevice};
use crate::config::SerialConfig;
use crate::error::{Result, SerialError};
use crate::os::DeviceIdentity;
use crate::settings::{
    BaudRate, CharacterLength, ConfigurationValue, FlowControl, LineSettings, Parity, StopBits,
};
use tracing::{debug, warn};

impl SerialDevice {
    fn configurable_identity(&self) -> Result<&DeviceIdentity> {
        match &self.state {
            DeviceState::Set(identity) => Ok(identity),
            _ => Err(SerialError::DeviceNotConfigurable),
        }
    }

    /// Apply one validated line parameter.
    ///
    /// # Errors
    ///
    /// - `DeviceNotConfigurable` unless the device is set and not opened
    /// - `ConfigurationCommandFailed` if the platform command fails
    pub fn apply(&mut self, value: ConfigurationValue) -> Result<()> {
        let identity = self.configurable_identity()?;
        let command = self.strategy.configure_command(identity, &value);

        let outcome = self
            .shell
            .run(&command)
            .map_err(|e| SerialError::ConfigurationCommandFailed {
                command: command.clone(),
                exit_code: -1,
                stderr: e.to_string(),
            })?;

        if !outcome.is_success() {
            warn!("Unable to set {}: `{}` exited with {}", value, command, outcome.exit_code);
            return Err(SerialError::ConfigurationCommandFailed {
                command,
                exit_code: outcome.exit_code,
                stderr: outcome.stderr_lossy(),
            });
        }

        debug!("Set {} with `{}`", value, command);
        Ok(())
    }

    /// Apply every parameter present in `settings`, stopping at the first
    /// failure.
    pub fn apply_settings(&mut self, settings: &LineSettings) -> Result<()> {
        self.configurable_identity()?;
        for value in settings.values() {
            self.apply(value)?;
        }
        Ok(())
    }

    /// Build a device for the running host and apply `config` to it.
    pub fn from_config(config: &SerialConfig) -> Result<Self> {
        let mut device = Self::new()?;
        device.apply_config(config)?;
        Ok(device)
    }

    /// Take over the write behaviour from `config`, then set its default
    /// device (if any) and apply its line parameters.
    ///
    /// # Errors
    ///
    /// - `DeviceNotConfigurable` if line parameters are given but no device
    ///   is set
    /// - any error of [`SerialDevice::set_device`] or
    ///   [`SerialDevice::apply_settings`]
    pub fn apply_config(&mut self, config: &SerialConfig) -> Result<()> {
        self.auto_flush = config.auto_flush;
        self.flush_policy = config.flush_policy;

        if let Some(device) = config.default_device() {
            self.set_device(&device)?;
        }
        if !config.line.is_empty() {
            self.apply_settings(&config.line)?;
        }
        Ok(())
    }

    /// Set the baud rate.
    ///
    /// # Errors
    ///
    /// - `DeviceNotConfigurable` unless the device is set and not opened
    /// - `UnsupportedBaudRate` if `rate` is not in
    ///   [`SUPPORTED_BAUD_RATES`](crate::settings::SUPPORTED_BAUD_RATES)
    /// - `ConfigurationCommandFailed` if the platform command fails
    pub fn set_baud_rate(&mut self, rate: u32) -> Result<()> {
        self.configurable_identity()?;
        let rate = BaudRate::new(rate)?;
        self.apply(ConfigurationValue::BaudRate(rate))
    }

    /// Set parity from a [`Parity`] or its name (`none`, `odd`, `even`).
    pub fn set_parity<P>(&mut self, parity: P) -> Result<()>
    where
        P: TryInto<Parity>,
        SerialError: From<P::Error>,
    {
        self.configurable_identity()?;
        let parity = parity.try_into()?;
        self.apply(ConfigurationValue::Parity(parity))
    }

    /// Set the character length; values outside 5..=8 are clamped.
    pub fn set_character_length(&mut self, bits: i32) -> Result<()> {
        self.configurable_identity()?;
        self.apply(ConfigurationValue::CharacterLength(CharacterLength::new(bits)))
    }

    /// Set the stop bit length from a [`StopBits`], a float or its text.
    ///
    /// 1.5 is accepted on every platform; `stty` renders it as two stop bits.
    pub fn set_stop_bits<S>(&mut self, length: S) -> Result<()>
    where
        S: TryInto<StopBits>,
        SerialError: From<S::Error>,
    {
        self.configurable_identity()?;
        let length = length.try_into()?;
        self.apply(ConfigurationValue::StopBits(length))
    }

    /// Set flow control from a [`FlowControl`] or its name (`none`,
    /// `rts_cts`, `xon_xoff`).
    pub fn set_flow_control<F>(&mut self, mode: F) -> Result<()>
    where
        F: TryInto<FlowControl>,
        SerialError: From<F::Error>,
    {
        self.configurable_identity()?;
        let mode = mode.try_into()?;
        self.apply(ConfigurationValue::FlowControl(mode))
    }

    /// Pass a raw flag to `setserial`. Linux only, device must be opened.
    ///
    /// # Errors
    ///
    /// - `DeviceNotOpened` if the device is not opened
    /// - `UnsupportedOperation` off Linux
    /// - `SetSerialFailed` if the flag is not a plain word, or `setserial`
    ///   rejects the flag or the device file
    pub fn set_setserial_flag(&mut self, param: &str, arg: &str) -> Result<()> {
        let identity = match &self.state {
            DeviceState::Opened { identity, .. } => identity,
            _ => return Err(SerialError::DeviceNotOpened),
        };
        let command = self.strategy.setserial_command(identity, param, arg)?;

        let outcome = self
            .shell
            .run(&command)
            .map_err(|e| SerialError::SetSerialFailed(e.to_string()))?;

        // setserial reports problems on either stream, exit code is unreliable.
        let mut output = outcome.stdout_lossy();
        output.push_str(&outcome.stderr_lossy());
        match output.trim_start().chars().next() {
            Some('I') => Err(SerialError::SetSerialFailed("Invalid flag".to_string())),
            Some('/') => Err(SerialError::SetSerialFailed(
                "Error with device file".to_string(),
            )),
            _ => {
                debug!("Ran `{}`", command);
                Ok(())
            }
        }
    }
}
