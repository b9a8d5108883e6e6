/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! In-memory rendition of a vendor broker-client library, used by the
//! `cnx-manager` integration tests and demo binaries. Servers can be taken
//! down, lookups and connections can be scripted to fail, and faults can be
//! injected into live connections.

mod cluster;
pub use cluster::{InMemoryBrokerCluster, InMemoryBrokerServer};

mod connector;
pub use connector::{
    InMemoryBrokerConnector, InMemoryConnection, InMemoryConsumer, InMemorySession,
};

mod resolver;
pub use resolver::{InMemoryDirectoryContext, InMemoryDirectoryResolver};

use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

/// One-time `tracing` subscriber initialization for binaries and tests.
/// Safe to call from every test; only the first call installs the subscriber.
pub fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}
