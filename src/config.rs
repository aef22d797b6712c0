// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup. A missing
//! or malformed encryption key is fatal: the process refuses to start rather
//! than store anything unencrypted.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `ENCRYPTION_KEY` | Base64 of the 32-byte AES-256 key | Required |
//! | `DATA_DIR` | Root directory for documents, objects and audit logs | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `PUBLIC_BASE_URL` | Base for share URLs handed to owners | `http://localhost:8080` |
//! | `SHARE_EXPOSE_CVV` | Include the CVV in public share views | `true` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;
use url::Url;

use crate::crypto::{CryptoError, EncryptionKey};
use crate::storage::paths::DATA_ROOT;

/// Environment variable holding the base64-encoded encryption key.
pub const ENCRYPTION_KEY_ENV: &str = "ENCRYPTION_KEY";

/// Environment variable name for the data directory path.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const PUBLIC_BASE_URL_ENV: &str = "PUBLIC_BASE_URL";
pub const SHARE_EXPOSE_CVV_ENV: &str = "SHARE_EXPOSE_CVV";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080";

/// Default `RUST_LOG` filter.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Startup configuration errors. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ENCRYPTION_KEY is not set")]
    MissingEncryptionKey,

    #[error("ENCRYPTION_KEY is invalid: {0}")]
    InvalidEncryptionKey(#[source] CryptoError),

    #[error("{name} is invalid: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Settings the request handlers read.
#[derive(Debug, Clone)]
pub struct ShareSettings {
    /// Base URL share links are built on; always ends with `/`.
    pub public_base_url: Url,
    /// Whether public share views include the CVV.
    pub expose_cvv: bool,
}

/// Complete process configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub encryption_key: EncryptionKey,
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub share: ShareSettings,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to read variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_key = lookup(ENCRYPTION_KEY_ENV)
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::MissingEncryptionKey)?;
        let encryption_key =
            EncryptionKey::from_base64(&raw_key).map_err(ConfigError::InvalidEncryptionKey)?;

        let data_dir = PathBuf::from(lookup(DATA_DIR_ENV).unwrap_or_else(|| DATA_ROOT.to_string()));

        let host = lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup(PORT_ENV) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                name: PORT_ENV,
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };
        let bind_addr: SocketAddr =
            format!("{host}:{port}")
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
                    name: HOST_ENV,
                    reason: e.to_string(),
                })?;

        let public_base_url = parse_base_url(
            &lookup(PUBLIC_BASE_URL_ENV).unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_string()),
        )
        .map_err(|reason| ConfigError::InvalidValue {
            name: PUBLIC_BASE_URL_ENV,
            reason,
        })?;

        let expose_cvv = match lookup(SHARE_EXPOSE_CVV_ENV) {
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::InvalidValue {
                name: SHARE_EXPOSE_CVV_ENV,
                reason: format!("expected true or false, got {raw:?}"),
            })?,
            None => true,
        };

        let log_format = match lookup(LOG_FORMAT_ENV).as_deref().map(str::trim) {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            encryption_key,
            data_dir,
            bind_addr,
            share: ShareSettings {
                public_base_url,
                expose_cvv,
            },
            log_format,
        })
    }
}

/// Parse an absolute http(s) URL and make sure joins append to its path.
pub fn parse_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme {}", url.scheme()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
