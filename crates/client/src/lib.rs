// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blocking HTTP helpers for end-to-end tests.
//!
//! A [`TestClient`] talks to two services under test, the public API and the
//! admin API, each at a fixed base URL. Requests always carry
//! `Content-Type: application/json` and, when credentials are configured,
//! HTTP Basic authorization. Responses come back fully buffered so tests can
//! read the body as many times as they like.

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod response;
pub mod trace;


pub use client::{Endpoint, Target, TestClient};
pub use config::ClientConfig;
pub use credentials::Credentials;
pub use error::ClientError;
pub use response::BufferedResponse;
pub use trace::init_tracing;
