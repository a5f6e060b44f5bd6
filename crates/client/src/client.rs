// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request execution against the API and admin services.

use std::fmt;
use std::sync::Once;

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};
use url::{Position, Url};

use crate::config::ClientConfig;
use crate::credentials::Credentials;
use crate::error::ClientError;
use crate::response::BufferedResponse;
use crate::trace::{init_tracing, WIRE_TARGET};

static CRYPTO_INIT: Once = Once::new();

/// Install the ring crypto provider for reqwest/rustls.
/// Only the first call has any effect.
pub fn ensure_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Which service a request goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Api,
    Admin,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Port spelled out in the authority of `base`, even a scheme default like `:80`.
fn explicit_port(base: &str) -> Option<u16> {
    let rest = base.split_once("://")?.1;
    let authority = rest.split(['/', '?', '#']).next()?;
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    let (host, port) = host_port.rsplit_once(':')?;
    // `[::1]` has colons but no port.
    if host.starts_with('[') && !host.ends_with(']') {
        return None;
    }
    port.parse().ok()
}

/// Join `path` onto `base` with standard URL reference resolution.
///
/// The authority is kept as the base wrote it: `http://localhost:80` joined
/// with `/widgets/1` is `http://localhost:80/widgets/1`.
pub fn resolve(base: &str, path: &str) -> Result<String, ClientError> {
    let err = |source| ClientError::Url { base: base.to_owned(), path: path.to_owned(), source };
    let base_url = Url::parse(base).map_err(err)?;
    let joined = base_url.join(path).map_err(err)?;

    let same_origin = joined.scheme() == base_url.scheme()
        && joined.host_str() == base_url.host_str()
        && joined.port() == base_url.port();
    match explicit_port(base) {
        Some(port) if same_origin && joined.port().is_none() => Ok(format!(
            "{}:{port}{}",
            &joined[..Position::AfterHost],
            &joined[Position::AfterHost..]
        )),
        _ => Ok(joined.into()),
    }
}

/// Blocking client for one pair of API/admin services.
///
/// Credentials are fixed at construction and read by every request.
pub struct TestClient {
    config: ClientConfig,
    credentials: Option<Credentials>,
    http: Client,
}

impl TestClient {
    /// Build a client for `config`. With `debug` on, also installs tracing so
    /// the request/response dump reaches stdout.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        if config.debug {
            init_tracing(&config);
        }
        ensure_crypto();
        let http = Client::builder().build().map_err(ClientError::Build)?;
        let credentials = config.credentials();
        Ok(Self { config, credentials, http })
    }

    /// Build from `E2E_*` environment variables and install tracing.
    pub fn from_env() -> Result<Self, ClientError> {
        let config = ClientConfig::from_env()?;
        init_tracing(&config);
        Self::new(config)
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn without_credentials(mut self) -> Self {
        self.credentials = None;
        self
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self, target: Target) -> &str {
        match target {
            Target::Api => &self.config.api_url,
            Target::Admin => &self.config.admin_url,
        }
    }

    pub fn resolve(&self, target: Target, path: &str) -> Result<String, ClientError> {
        resolve(self.base_url(target), path)
    }

    pub fn endpoint(&self, target: Target) -> Endpoint<'_> {
        Endpoint { client: self, target }
    }

    /// Requests against the API service.
    pub fn api(&self) -> Endpoint<'_> {
        self.endpoint(Target::Api)
    }

    /// Requests against the admin service.
    pub fn admin(&self) -> Endpoint<'_> {
        self.endpoint(Target::Admin)
    }

    /// Perform one round trip and buffer the whole response body.
    ///
    /// Non-2xx statuses are not errors here; the wrappers on [`Endpoint`]
    /// decide what status is acceptable.
    pub fn execute(
        &self,
        target: Target,
        method: Method,
        path: &str,
        payload: Option<&[u8]>,
    ) -> Result<BufferedResponse, ClientError> {
        let url = self.resolve(target, path)?;

        if self.config.debug {
            let body = payload.map(String::from_utf8_lossy).unwrap_or_default();
            info!(target: WIRE_TARGET, %method, %url, %body, "request");
        }

        let mut req =
            self.http.request(method.clone(), url.as_str()).header(CONTENT_TYPE, "application/json");
        if let Some(ref creds) = self.credentials {
            req = req.header(AUTHORIZATION, creds.authorization());
        }
        if let Some(body) = payload {
            req = req.body(body.to_vec());
        }

        let transport = |source| ClientError::Transport {
            method: method.clone(),
            url: url.clone(),
            source,
        };
        let resp = req.send().map_err(transport)?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let final_url = resp.url().clone();
        let body = resp.bytes().map_err(transport)?;

        debug!(service = %target, %method, %url, %status, bytes = body.len(), "request complete");
        if self.config.debug {
            info!(target: WIRE_TARGET, %status, body = %String::from_utf8_lossy(&body), "response");
        }

        Ok(BufferedResponse::new(method, final_url, status, headers, body))
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Vec<u8>, ClientError> {
    serde_json::to_vec(body).map_err(ClientError::Encode)
}

/// Request helpers bound to one service.
///
/// Each method comes in three flavours: the bare name asserts `200 OK` (and
/// decodes the body where there is one), `*_status` asserts a caller-chosen
/// status, and `*_raw` asserts nothing.
#[derive(Clone, Copy)]
pub struct Endpoint<'a> {
    client: &'a TestClient,
    target: Target,
}

impl Endpoint<'_> {
    pub fn target(&self) -> Target {
        self.target
    }

    pub fn url(&self, path: &str) -> Result<String, ClientError> {
        self.client.resolve(self.target, path)
    }

    /// Send raw bytes with an arbitrary method.
    pub fn send(
        &self,
        method: Method,
        path: &str,
        payload: Option<&[u8]>,
    ) -> Result<BufferedResponse, ClientError> {
        self.client.execute(self.target, method, path, payload)
    }

    pub fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.get_status(path, StatusCode::OK)?.json()
    }

    pub fn get_status(
        &self,
        path: &str,
        expected: StatusCode,
    ) -> Result<BufferedResponse, ClientError> {
        self.get_raw(path)?.expect_status(expected)
    }

    pub fn get_raw(&self, path: &str) -> Result<BufferedResponse, ClientError> {
        self.send(Method::GET, path, None)
    }

    pub fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.post_status(path, body, StatusCode::OK)?.json()
    }

    pub fn post_status<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        expected: StatusCode,
    ) -> Result<BufferedResponse, ClientError> {
        self.post_raw(path, body)?.expect_status(expected)
    }

    pub fn post_raw<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<BufferedResponse, ClientError> {
        self.send(Method::POST, path, Some(encode(body)?.as_slice()))
    }

    pub fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.put_status(path, body, StatusCode::OK)?.json()
    }

    pub fn put_status<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        expected: StatusCode,
    ) -> Result<BufferedResponse, ClientError> {
        self.put_raw(path, body)?.expect_status(expected)
    }

    pub fn put_raw<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<BufferedResponse, ClientError> {
        self.send(Method::PUT, path, Some(encode(body)?.as_slice()))
    }

    pub fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.delete_status(path, StatusCode::OK).map(|_| ())
    }

    pub fn delete_status(
        &self,
        path: &str,
        expected: StatusCode,
    ) -> Result<BufferedResponse, ClientError> {
        self.delete_raw(path)?.expect_status(expected)
    }

    pub fn delete_raw(&self, path: &str) -> Result<BufferedResponse, ClientError> {
        self.send(Method::DELETE, path, None)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
