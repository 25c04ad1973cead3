// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration module.
//!
//! Settings come from built-in defaults, an optional TOML file and the
//! command line, in increasing order of precedence.

use anyhow::{anyhow, Context, Result};
use bluer::Address;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bluetooth::ConnectionTarget;

/// Default HTTP listen address.
pub const DEFAULT_LISTEN: &str = "[::]:8500";

/// Default RFCOMM channel of the receiver's serial port service.
pub const DEFAULT_RFCOMM_CHANNEL: u8 = 2;

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "denonbt")]
#[command(version, about = "Control a Denon AV receiver over Bluetooth RFCOMM")]
pub struct Cli {
    /// Configuration file (default: <config dir>/denonbt/config.toml)
    #[arg(long, env = "DENONBT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listen to this IP:port
    #[arg(long, env = "DENONBT_LISTEN")]
    pub listen: Option<String>,

    /// RFCOMM channel of the receiver
    #[arg(long, env = "DENONBT_RFCOMM_CHANNEL")]
    pub rfcomm_channel: Option<u8>,

    /// Hardware MAC address of the receiver
    #[arg(long, env = "DENONBT_HWADDR")]
    pub hwaddr: Option<String>,

    /// Interval between keepalive frames, e.g. 30s or 500ms (0 disables them)
    #[arg(long, env = "DENONBT_PING_INTERVAL", value_parser = parse_interval)]
    pub ping_interval: Option<Duration>,
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,

    /// Bluetooth settings.
    pub bluetooth: BluetoothConfig,

    /// Link maintenance settings.
    pub link: LinkConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the command interface listens on.
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BluetoothConfig {
    /// Receiver MAC address. Required.
    pub hwaddr: Option<String>,

    /// RFCOMM channel.
    pub rfcomm_channel: u8,
}

impl Default for BluetoothConfig {
    fn default() -> Self {
        Self {
            hwaddr: None,
            rfcomm_channel: DEFAULT_RFCOMM_CHANNEL,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Interval between keepalive frames, zero disables them.
    #[serde(with = "interval")]
    pub ping_interval: Duration,
}

/// Parse an interval such as `30s`, `500ms` or `1m30s`.
///
/// Units are `ms`, `s`, `m` and `h`. A bare number is taken as seconds.
pub fn parse_interval(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty interval".to_string());
    }
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("missing unit in interval '{}'", s))?;
        let (number, tail) = rest.split_at(digits);
        let units = tail.find(|c: char| !c.is_ascii_alphabetic()).unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(units);

        let value: f64 = number
            .parse()
            .map_err(|_| format!("invalid interval '{}'", s))?;
        let millis = match unit {
            "ms" => 1.0,
            "s" => 1_000.0,
            "m" => 60_000.0,
            "h" => 3_600_000.0,
            _ => return Err(format!("unknown unit '{}' in interval '{}'", unit, s)),
        };
        total = Duration::try_from_secs_f64(value * millis / 1_000.0)
            .ok()
            .and_then(|part| total.checked_add(part))
            .ok_or_else(|| format!("interval '{}' out of range", s))?;
        rest = tail;
    }
    Ok(total)
}

mod interval {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{}ms", value.as_millis()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_interval(&raw).map_err(de::Error::custom)
    }
}

impl Config {
    /// Default location of the configuration file.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("denonbt")
            .join("config.toml")
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one the default location is
    /// used if present, otherwise built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Parse a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Override settings with those given on the command line.
    pub fn with_cli(mut self, cli: &Cli) -> Self {
        if let Some(listen) = &cli.listen {
            self.server.listen = listen.clone();
        }
        if let Some(channel) = cli.rfcomm_channel {
            self.bluetooth.rfcomm_channel = channel;
        }
        if let Some(hwaddr) = &cli.hwaddr {
            self.bluetooth.hwaddr = Some(hwaddr.clone());
        }
        if let Some(interval) = cli.ping_interval {
            self.link.ping_interval = interval;
        }
        self
    }

    /// Connection target, `None` if no hardware address is set.
    pub fn target(&self) -> Result<Option<ConnectionTarget>> {
        let hwaddr = match self.bluetooth.hwaddr.as_deref().map(str::trim) {
            None | Some("") => return Ok(None),
            Some(hwaddr) => hwaddr,
        };

        let address: Address = hwaddr
            .parse()
            .map_err(|e| anyhow!("invalid hardware address '{}': {}", hwaddr, e))?;

        Ok(Some(ConnectionTarget::new(
            address,
            self.bluetooth.rfcomm_channel,
        )))
    }

    /// Keepalive interval, `None` when disabled.
    pub fn ping_interval(&self) -> Option<Duration> {
        let interval = self.link.ping_interval;
        (!interval.is_zero()).then_some(interval)
    }
}
