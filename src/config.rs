//! Server configuration.
//!
//! Loads configuration from environment variables. `main` calls
//! `dotenvy::dotenv()` first, so a `.env` file in the working directory is
//! honoured.

use std::env;
use std::fmt;
use std::net::SocketAddr;

use anyhow::{Context, Result, bail};

use crate::bot::BotConfig;

pub const WEBHOOK_SECRET_VAR: &str = "HOOKWIRE_WEBHOOK_SECRET";
pub const BIND_ADDRESS_VAR: &str = "HOOKWIRE_BIND_ADDRESS";
pub const LENIENT_EVENTS_VAR: &str = "HOOKWIRE_LENIENT_EVENTS";
pub const LOG_TRIGGERS_VAR: &str = "HOOKWIRE_LOG_TRIGGERS";

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Server configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Address the HTTP listener binds to (default `0.0.0.0:8080`).
    pub bind_address: SocketAddr,

    /// Shared webhook secret. Empty disables signature verification.
    pub webhook_secret: String,

    /// Accept unrecognised event types instead of rejecting them at decode.
    pub lenient_events: bool,

    /// Emit one tracing record per delivery (default: true).
    pub log_triggers: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, which returns the value of a
    /// variable if set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_address: SocketAddr = lookup(BIND_ADDRESS_VAR)
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.into())
            .parse()
            .with_context(|| format!("{BIND_ADDRESS_VAR} must be a socket address"))?;

        Ok(Self {
            bind_address,
            webhook_secret: lookup(WEBHOOK_SECRET_VAR).unwrap_or_default(),
            lenient_events: parse_flag(LENIENT_EVENTS_VAR, lookup(LENIENT_EVENTS_VAR), false)?,
            log_triggers: parse_flag(LOG_TRIGGERS_VAR, lookup(LOG_TRIGGERS_VAR), true)?,
        })
    }

    /// The part of the configuration the [`Bot`](crate::bot::Bot) needs.
    pub fn bot_config(&self) -> BotConfig {
        BotConfig {
            webhook_secret: self.webhook_secret.clone().into_bytes(),
            lenient_events: self.lenient_events,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("webhook_secret", &"<redacted>")
            .field("lenient_events", &self.lenient_events)
            .field("log_triggers", &self.log_triggers)
            .finish()
    }
}

fn parse_flag(name: &str, value: Option<String>, default: bool) -> Result<bool> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{name} must be a boolean, got {other:?}"),
    }
}
