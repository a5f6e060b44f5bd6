// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

use reqwest::{Method, StatusCode};
use url::Url;

/// Everything that can go wrong issuing a request from a test.
///
/// Tests propagate these with `?`, which fails the current test case only.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration could not be parsed from flags or environment.
    Config(String),
    /// A base URL or a path joined onto it did not form a valid URL.
    Url { base: String, path: String, source: url::ParseError },
    /// The shared HTTP client could not be constructed.
    Build(reqwest::Error),
    /// The request could not be sent or no response was received.
    Transport { method: Method, url: String, source: reqwest::Error },
    /// The request payload could not be serialized to JSON.
    Encode(serde_json::Error),
    /// The response body was not valid JSON for the requested type.
    Decode { url: Url, body: String, source: serde_json::Error },
    /// The response status did not match the expected one.
    Status { method: Method, url: Url, expected: StatusCode, actual: StatusCode, body: String },
}

impl ClientError {
    /// Actual status of a mismatched response, if this is a status error.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { actual, .. } => Some(*actual),
            _ => None,
        }
    }

    pub fn is_status(&self) -> bool {
        matches!(self, Self::Status { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Url { .. } => "URL",
            Self::Build(_) => "BUILD",
            Self::Transport { .. } => "TRANSPORT",
            Self::Encode(_) => "ENCODE",
            Self::Decode { .. } => "DECODE",
            Self::Status { .. } => "STATUS",
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Url { base, path, source } => {
                write!(f, "cannot resolve {path:?} against {base:?}: {source}")
            }
            Self::Build(e) => write!(f, "cannot build http client: {e}"),
            Self::Transport { method, url, source } => {
                write!(f, "{method} {url} failed: {source}")
            }
            Self::Encode(e) => write!(f, "cannot encode request body: {e}"),
            Self::Decode { url, body, source } => {
                write!(f, "cannot decode response from {url}: {source}; body: {body}")
            }
            Self::Status { method, url, expected, actual, body } => {
                write!(f, "{method} {url}: expected status {expected}, got {actual}; body: {body}")
            }
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(_) | Self::Status { .. } => None,
            Self::Url { source, .. } => Some(source),
            Self::Build(e) => Some(e),
            Self::Transport { source, .. } => Some(source),
            Self::Encode(e) => Some(e),
            Self::Decode { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
