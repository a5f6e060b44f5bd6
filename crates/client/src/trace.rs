// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

use crate::config::ClientConfig;

/// Target of the request/response dump emitted when `debug` is on.
pub const WIRE_TARGET: &str = "e2e_client::wire";

/// Filter directives for `config`: its log level, plus the wire dump when debugging.
pub fn filter_directives(config: &ClientConfig) -> String {
    if config.debug {
        format!("{},{WIRE_TARGET}=info", config.log_level)
    } else {
        config.log_level.clone()
    }
}

/// Install a stdout subscriber that the test harness captures per test.
///
/// Only the first call in a process installs anything.
pub fn init_tracing(config: &ClientConfig) {
    let filter = EnvFilter::try_new(filter_directives(config))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt::fmt().with_env_filter(filter).with_test_writer().try_init();
}
