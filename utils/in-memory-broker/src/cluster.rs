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

//! Cluster of simulated broker servers, addressable by provider URL.

use cnx_manager::{BrokerFault, ConnectionListener};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// One simulated broker process. Holds the fault-notification targets of
/// every connection established against it, so tests can inject faults the
/// way a real broker client would raise them.
pub struct InMemoryBrokerServer {
    provider_url: String,
    available: AtomicBool,
    listeners: Mutex<Vec<Arc<dyn ConnectionListener>>>,
}

impl InMemoryBrokerServer {
    pub(crate) fn new(provider_url: &str) -> Arc<Self> {
        Arc::new(Self {
            provider_url: provider_url.to_string(),
            available: AtomicBool::new(true),
            listeners: Mutex::new(Vec::new()),
        })
    }

    pub fn provider_url(&self) -> &str {
        &self.provider_url
    }

    /// Marks the server reachable or unreachable for future lookups and
    /// connection attempts. Existing connections are untouched; pair with
    /// [`inject_fault`](Self::inject_fault) to simulate a dropped link.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    pub(crate) fn register_listener(&self, listener: Arc<dyn ConnectionListener>) {
        self.listeners
            .lock()
            .expect("listener registry poisoned")
            .push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .expect("listener registry poisoned")
            .len()
    }

    /// Delivers a fault to every listener registered on this server and
    /// waits for each notification to finish, which makes test sequencing
    /// deterministic: when this returns, any recovery the fault triggered
    /// has completed.
    pub async fn inject_fault(&self, fault: BrokerFault) {
        let listeners: Vec<Arc<dyn ConnectionListener>> = self
            .listeners
            .lock()
            .expect("listener registry poisoned")
            .clone();

        debug!(
            provider_url = self.provider_url.as_str(),
            listeners = listeners.len(),
            fault = %fault,
            "injecting fault"
        );
        for listener in listeners {
            listener.on_fault(fault.clone()).await;
        }
    }

    /// Fire-and-forget variant of [`inject_fault`](Self::inject_fault),
    /// notifying from a task the manager does not control, the way a real
    /// vendor client does.
    pub fn inject_fault_detached(self: &Arc<Self>, fault: BrokerFault) {
        let server = self.clone();
        tokio::spawn(async move {
            server.inject_fault(fault).await;
        });
    }
}

/// Directory of simulated servers keyed by provider URL.
#[derive(Default)]
pub struct InMemoryBrokerCluster {
    servers: Mutex<HashMap<String, Arc<InMemoryBrokerServer>>>,
}

impl InMemoryBrokerCluster {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Adds (or replaces) a server for the given provider URL and returns its
    /// handle.
    pub fn add_server(&self, provider_url: &str) -> Arc<InMemoryBrokerServer> {
        let server = InMemoryBrokerServer::new(provider_url);
        self.servers
            .lock()
            .expect("server registry poisoned")
            .insert(provider_url.to_string(), server.clone());
        server
    }

    pub fn server(&self, provider_url: &str) -> Option<Arc<InMemoryBrokerServer>> {
        self.servers
            .lock()
            .expect("server registry poisoned")
            .get(provider_url)
            .cloned()
    }
}
