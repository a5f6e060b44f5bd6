// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fully buffered HTTP responses.
//!
//! The body is read off the wire exactly once. Every accessor hands out a
//! fresh view over the same bytes, so decoding or logging never consumes
//! what the caller later reads.

use std::io::Read;

use bytes::{Buf, Bytes};
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::ClientError;

/// A response whose body has been read into memory.
#[derive(Debug, Clone)]
pub struct BufferedResponse {
    method: Method,
    url: Url,
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl BufferedResponse {
    pub(crate) fn new(
        method: Method,
        url: Url,
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        Self { method, url, status, headers, body }
    }

    /// Method of the request that produced this response.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Final URL, after any redirects the client followed.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of `name`, if present and visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Shared handle to the body bytes.
    pub fn bytes(&self) -> Bytes {
        self.body.clone()
    }

    /// A reader positioned at the start of the body. Each call starts over.
    pub fn reader(&self) -> impl Read {
        self.body.clone().reader()
    }

    /// Body as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_slice(&self.body).map_err(|source| ClientError::Decode {
            url: self.url.clone(),
            body: self.text(),
            source,
        })
    }

    /// Pass the response through if its status is `expected`.
    pub fn expect_status(self, expected: StatusCode) -> Result<Self, ClientError> {
        if self.status == expected {
            return Ok(self);
        }
        Err(ClientError::Status {
            body: self.text(),
            method: self.method,
            url: self.url,
            expected,
            actual: self.status,
        })
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
