//! Line parameters accepted by the configuration operations.
//!
//! Each parameter is validated when it is built, so the platform strategies
//! only ever translate values that are known to be legal.

use crate::error::SerialError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Baud rates accepted on every platform.
pub const SUPPORTED_BAUD_RATES: [u32; 25] = [
    110, 150, 300, 600, 1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200, 230400, 460800,
    500000, 576000, 921600, 1000000, 1152000, 1500000, 2000000, 2500000, 3000000, 3500000,
    4000000,
];

/// A baud rate from [`SUPPORTED_BAUD_RATES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct BaudRate(u32);

impl BaudRate {
    /// Validate `rate` against the supported list.
    pub fn new(rate: u32) -> Result<Self, SerialError> {
        if SUPPORTED_BAUD_RATES.contains(&rate) {
            Ok(Self(rate))
        } else {
            Err(SerialError::UnsupportedBaudRate(rate))
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// The value `mode BAUD=` expects. Rates up to 19200 use the legacy
    /// two-digit codes, faster rates are passed through.
    pub fn windows_code(self) -> u32 {
        match self.0 {
            110 => 11,
            150 => 15,
            300 => 30,
            600 => 60,
            1200 => 12,
            2400 => 24,
            4800 => 48,
            9600 => 96,
            19200 => 19,
            rate => rate,
        }
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = SerialError;

    fn try_from(rate: u32) -> Result<Self, Self::Error> {
        Self::new(rate)
    }
}

impl From<BaudRate> for u32 {
    fn from(rate: BaudRate) -> Self {
        rate.0
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl Parity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Odd => "odd",
            Self::Even => "even",
        }
    }
}

impl FromStr for Parity {
    type Err = SerialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "odd" => Ok(Self::Odd),
            "even" => Ok(Self::Even),
            other => Err(SerialError::UnsupportedParity(other.to_string())),
        }
    }
}

impl TryFrom<&str> for Parity {
    type Error = SerialError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data bits per character, always within 5..=8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub struct CharacterLength(u8);

impl CharacterLength {
    pub const MIN: u8 = 5;
    pub const MAX: u8 = 8;

    /// Out-of-range lengths are clamped, never rejected.
    pub fn new(bits: i32) -> Self {
        Self(bits.clamp(Self::MIN as i32, Self::MAX as i32) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl From<i32> for CharacterLength {
    fn from(bits: i32) -> Self {
        Self::new(bits)
    }
}

impl From<CharacterLength> for i32 {
    fn from(length: CharacterLength) -> Self {
        length.0 as i32
    }
}

/// Stop bit length.
///
/// `OneAndHalf` is accepted everywhere, but `stty` cannot express it and
/// renders it the same as `Two`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum StopBits {
    One,
    OneAndHalf,
    Two,
}

impl StopBits {
    /// Textual length as `mode STOP=` expects it.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::One => "1",
            Self::OneAndHalf => "1.5",
            Self::Two => "2",
        }
    }
}

impl TryFrom<f64> for StopBits {
    type Error = SerialError;

    fn try_from(length: f64) -> Result<Self, Self::Error> {
        if length == 1.0 {
            Ok(Self::One)
        } else if length == 1.5 {
            Ok(Self::OneAndHalf)
        } else if length == 2.0 {
            Ok(Self::Two)
        } else {
            Err(SerialError::InvalidStopBits(length.to_string()))
        }
    }
}

impl TryFrom<f32> for StopBits {
    type Error = SerialError;

    fn try_from(length: f32) -> Result<Self, Self::Error> {
        Self::try_from(f64::from(length))
    }
}

impl TryFrom<&str> for StopBits {
    type Error = SerialError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<StopBits> for f64 {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => 1.0,
            StopBits::OneAndHalf => 1.5,
            StopBits::Two => 2.0,
        }
    }
}

impl FromStr for StopBits {
    type Err = SerialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let length: f64 = s
            .trim()
            .parse()
            .map_err(|_| SerialError::InvalidStopBits(s.to_string()))?;
        Self::try_from(length)
    }
}

impl fmt::Display for StopBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flow control modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowControl {
    None,
    #[serde(alias = "rts/cts")]
    RtsCts,
    #[serde(alias = "xon/xoff")]
    XonXoff,
}

impl FlowControl {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::RtsCts => "rts_cts",
            Self::XonXoff => "xon_xoff",
        }
    }
}

impl FromStr for FlowControl {
    type Err = SerialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "rts_cts" | "rts/cts" => Ok(Self::RtsCts),
            "xon_xoff" | "xon/xoff" => Ok(Self::XonXoff),
            other => Err(SerialError::InvalidFlowControl(other.to_string())),
        }
    }
}

impl TryFrom<&str> for FlowControl {
    type Error = SerialError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for FlowControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validated line parameter, ready to be translated into a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ConfigurationValue {
    BaudRate(BaudRate),
    Parity(Parity),
    CharacterLength(CharacterLength),
    StopBits(StopBits),
    FlowControl(FlowControl),
}

impl fmt::Display for ConfigurationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BaudRate(rate) => write!(f, "baud rate {rate}"),
            Self::Parity(parity) => write!(f, "parity {parity}"),
            Self::CharacterLength(length) => write!(f, "character length {}", length.get()),
            Self::StopBits(bits) => write!(f, "stop bits {bits}"),
            Self::FlowControl(flow) => write!(f, "flow control {flow}"),
        }
    }
}

/// A set of optional line parameters, applied in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baud_rate: Option<BaudRate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parity: Option<Parity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_length: Option<CharacterLength>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_bits: Option<StopBits>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_control: Option<FlowControl>,
}

impl LineSettings {
    /// The parameters that are present, in application order.
    pub fn values(&self) -> Vec<ConfigurationValue> {
        [
            self.baud_rate.map(ConfigurationValue::BaudRate),
            self.parity.map(ConfigurationValue::Parity),
            self.character_length.map(ConfigurationValue::CharacterLength),
            self.stop_bits.map(ConfigurationValue::StopBits),
            self.flow_control.map(ConfigurationValue::FlowControl),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }
}
