use clap::{Parser, Subcommand};
use serde_json::json;
use serialctl::config::{Config, ConfigLoader};
use serialctl::logging::init_tracing;
use serialctl::{BaudRate, CharacterLength, FlowControl, Parity, SerialDevice, StopBits};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Configure and drive RS-232 serial devices.",
    long_about = "Sets line parameters with the platform's own tools (stty on Linux and \
                  macOS, mode on Windows) and exchanges data through the device file."
)]
struct Cli {
    /// Configuration file. Defaults to the standard resolution order.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Device path, COM label or configured alias.
    #[arg(short, long, global = true)]
    device: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List serial ports known to the system.
    List {
        /// Print JSON instead of one port per line.
        #[arg(long)]
        json: bool,
    },
    /// Check that the device exists and can be configured.
    Probe,
    /// Set line parameters. Unset options keep their configured value.
    Configure {
        #[arg(long, value_parser = parse_baud)]
        baud: Option<BaudRate>,
        /// none, odd or even
        #[arg(long)]
        parity: Option<Parity>,
        /// 5 to 8; other values are clamped
        #[arg(long, allow_negative_numbers = true)]
        data_bits: Option<i32>,
        /// 1, 1.5 or 2
        #[arg(long)]
        stop_bits: Option<StopBits>,
        /// none, rts_cts or xon_xoff
        #[arg(long)]
        flow: Option<FlowControl>,
    },
    /// Open the device, send TEXT and close it again.
    Send {
        text: String,
        /// Pause after sending. Defaults to `reply_wait_ms`.
        #[arg(long)]
        wait_ms: Option<u64>,
        /// Append "\r\n".
        #[arg(long)]
        crlf: bool,
    },
    /// Open the device and print the next non-empty line.
    ReadLine {
        /// Give up after this long. Defaults to `line_timeout_ms`, or waits
        /// forever.
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Open the device and discard pending input.
    Drain,
}

fn parse_baud(value: &str) -> Result<BaudRate, String> {
    let rate: u32 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    BaudRate::new(rate).map_err(|e| e.to_string())
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(ConfigLoader::load_from(path)?.into_config());
    }

    Ok(match ConfigLoader::load() {
        Ok(loader) => loader.into_config(),
        Err(e) => {
            eprintln!("Warning: Failed to load config, using defaults: {}", e);
            ConfigLoader::with_defaults().into_config()
        }
    })
}

fn list_ports(as_json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ports = serialport::available_ports()?;

    if as_json {
        let port_info: Vec<_> = ports
            .iter()
            .map(|p| match &p.port_type {
                serialport::SerialPortType::UsbPort(usb) => json!({
                    "port_name": p.port_name,
                    "type": "usb",
                    "vid": usb.vid,
                    "pid": usb.pid,
                    "manufacturer": usb.manufacturer,
                    "product": usb.product,
                }),
                other => json!({
                    "port_name": p.port_name,
                    "type": format!("{other:?}"),
                }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json!({ "ports": port_info }))?);
        return Ok(());
    }

    if ports.is_empty() {
        eprintln!("No serial ports found");
    }
    for port in ports {
        println!("{}", port.port_name);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;
    init_tracing(&config.logging);

    if let Command::List { json } = cli.command {
        return list_ports(json);
    }

    if let Some(device) = cli.device {
        config.serial.device = Some(device);
    }
    if config.serial.device.is_none() {
        return Err("no device given; pass --device or set serial.device".into());
    }

    if let Command::Configure {
        baud,
        parity,
        data_bits,
        stop_bits,
        flow,
    } = &cli.command
    {
        let line = &mut config.serial.line;
        line.baud_rate = baud.or(line.baud_rate);
        line.parity = parity.or(line.parity);
        line.character_length = data_bits.map(CharacterLength::new).or(line.character_length);
        line.stop_bits = stop_bits.or(line.stop_bits);
        line.flow_control = flow.or(line.flow_control);
        if line.is_empty() {
            warn!("Nothing to configure");
        }
    }

    let serial = &config.serial;
    let mut device = SerialDevice::from_config(serial)?;
    debug!("Using {:?}", device.device_path());

    match cli.command {
        // Listing needs no device and returned above.
        Command::List { .. } => {}
        Command::Probe => {
            println!("{}: ok", device.device_path().unwrap_or_default());
        }
        Command::Configure { .. } => {
            println!("{}: configured", device.device_path().unwrap_or_default());
        }
        Command::Send {
            text,
            wait_ms,
            crlf,
        } => {
            let wait = wait_ms.map(Duration::from_millis).unwrap_or(serial.reply_wait());
            let mut session = device.session(&serial.open_mode)?;
            session.send(text.as_bytes(), Duration::ZERO)?;
            if crlf {
                session.send(b"\r\n", Duration::ZERO)?;
            }
            if !session.auto_flush() {
                session.flush()?;
            }
            std::thread::sleep(wait);
            session.close()?;
        }
        Command::ReadLine { timeout_ms } => {
            let timeout = timeout_ms.map(Duration::from_millis).or(serial.line_timeout());
            let mut session = device.session(&serial.open_mode)?;
            let line = match timeout {
                Some(timeout) => session.read_line_timeout(timeout)?,
                None => session.read_line()?,
            };
            println!("{}", String::from_utf8_lossy(&line));
            session.close()?;
        }
        Command::Drain => {
            let mut session = device.session(&serial.open_mode)?;
            let discarded = session.read_flush()?;
            println!("Discarded {discarded} bytes");
            session.close()?;
        }
    }

    Ok(())
}
