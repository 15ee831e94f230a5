//! Parsing and validation of proxy input strings.
//!
//! The canonical input is `HOST:PORT` or `HOST:PORT:USERNAME:PASSWORD`;
//! three fields means a username without a password and is rejected.

use crate::error::{PoolError, Result};

/// Plaintext credentials parsed from an input string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainCredentials {
    pub username: String,
    pub password: String,
}

/// A validated proxy input string, not yet persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedProxy {
    pub host: String,
    pub port: u16,
    pub credentials: Option<PlainCredentials>,
}

/// Parse a `HOST:PORT[:USERNAME:PASSWORD]` string
pub fn parse_proxy_string(input: &str) -> Result<ParsedProxy> {
    let parts: Vec<&str> = input.trim().split(':').map(str::trim).collect();

    match parts.len() {
        2 | 4 => {}
        3 => {
            return Err(PoolError::InvalidProxyFormat {
                field: "password",
                reason: "username provided without password".to_string(),
            })
        }
        _ => {
            return Err(PoolError::InvalidProxyFormat {
                field: "format",
                reason: "expected HOST:PORT or HOST:PORT:USERNAME:PASSWORD".to_string(),
            })
        }
    }

    let host = parts[0];
    if host.is_empty() {
        return Err(PoolError::InvalidProxyFormat {
            field: "host",
            reason: "host must not be empty".to_string(),
        });
    }

    let port: u32 = parts[1].parse().map_err(|_| PoolError::InvalidProxyFormat {
        field: "port",
        reason: "port must be a valid integer".to_string(),
    })?;
    if port < 1 || port > 65535 {
        return Err(PoolError::InvalidProxyFormat {
            field: "port",
            reason: "port must be between 1 and 65535".to_string(),
        });
    }

    let credentials = if parts.len() == 4 {
        if parts[2].is_empty() {
            return Err(PoolError::InvalidProxyFormat {
                field: "username",
                reason: "username must not be empty".to_string(),
            });
        }
        if parts[3].is_empty() {
            return Err(PoolError::InvalidProxyFormat {
                field: "password",
                reason: "password must not be empty".to_string(),
            });
        }
        Some(PlainCredentials {
            username: parts[2].to_string(),
            password: parts[3].to_string(),
        })
    } else {
        None
    };

    Ok(ParsedProxy {
        host: host.to_string(),
        port: port as u16,
        credentials,
    })
}
