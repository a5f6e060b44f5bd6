// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

use clap::builder::FalseyValueParser;
use clap::Parser;
use url::Url;

use crate::credentials::Credentials;
use crate::error::ClientError;

/// Base URL of the API service under test.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Base URL of the admin service under test.
pub const DEFAULT_ADMIN_URL: &str = "http://localhost:8081";

/// Where the services under test live and how to talk to them.
#[derive(Clone, Parser)]
#[command(name = "e2e-client")]
pub struct ClientConfig {
    /// Base URL of the API service.
    #[arg(long, env = "E2E_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Base URL of the admin service.
    #[arg(long, env = "E2E_ADMIN_URL", default_value = DEFAULT_ADMIN_URL)]
    pub admin_url: String,

    /// Username for HTTP Basic auth. If unset, no Authorization header is sent.
    #[arg(long, env = "E2E_USERNAME")]
    pub username: Option<String>,

    /// Password for HTTP Basic auth.
    #[arg(long, env = "E2E_PASSWORD", hide_env_values = true, requires = "username")]
    pub password: Option<String>,

    /// Log every request and response body. `0`, `false`, `no`, `off` and empty are off.
    #[arg(long, env = "E2E_DEBUG", value_parser = FalseyValueParser::new())]
    pub debug: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "E2E_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("admin_url", &self.admin_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("debug", &self.debug)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            admin_url: DEFAULT_ADMIN_URL.to_owned(),
            username: None,
            password: None,
            debug: false,
            log_level: "warn".to_owned(),
        }
    }
}

impl ClientConfig {
    /// Read configuration from `E2E_*` environment variables only.
    ///
    /// The test binary's own argv belongs to the test harness and is ignored.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::try_parse_from(["e2e-client"]).map_err(|e| ClientError::Config(e.to_string()))
    }

    /// Both base URLs must be absolute.
    pub fn validate(&self) -> Result<(), ClientError> {
        for base in [&self.api_url, &self.admin_url] {
            Url::parse(base).map_err(|source| ClientError::Url {
                base: base.clone(),
                path: String::new(),
                source,
            })?;
        }
        Ok(())
    }

    /// Configured credentials. A username without a password uses an empty one.
    pub fn credentials(&self) -> Option<Credentials> {
        let username = self.username.as_deref()?;
        Some(Credentials::new(username, self.password.as_deref().unwrap_or_default()))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
