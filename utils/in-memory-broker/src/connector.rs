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

//! Broker connector over the in-memory cluster, plus the recording
//! connection, session, and consumer handles it produces.

use crate::cluster::InMemoryBrokerCluster;
use async_trait::async_trait;
use cnx_manager::{
    BrokerConnection, BrokerConnector, BrokerContext, BrokerFault, BrokerSession,
    ConnectionListener, Credentials, DirectoryContext, MessageConsumer,
};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// Recording connection handle.
pub struct InMemoryConnection {
    id: String,
    started: AtomicBool,
    closed: AtomicBool,
    fail_close: bool,
}

impl InMemoryConnection {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4().to_string(),
            started: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            fail_close: false,
        })
    }

    /// A connection whose `close` call always fails, for teardown-tolerance
    /// tests.
    pub fn failing_close() -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4().to_string(),
            started: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            fail_close: true,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrokerConnection for InMemoryConnection {
    async fn start(&self) -> Result<(), BrokerFault> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BrokerFault::from_text("connection already closed"));
        }
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<(), BrokerFault> {
        self.started.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<(), BrokerFault> {
        if self.fail_close {
            return Err(BrokerFault::from_text("connection close refused"));
        }
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Recording session handle. Every `unsubscribe` call is kept for
/// assertions.
pub struct InMemorySession {
    closed: AtomicBool,
    fail_close: bool,
    unsubscribes: Mutex<Vec<String>>,
}

impl InMemorySession {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            closed: AtomicBool::new(false),
            fail_close: false,
            unsubscribes: Mutex::new(Vec::new()),
        })
    }

    /// A session whose `close` call always fails, for teardown-tolerance
    /// tests.
    pub fn failing_close() -> Arc<Self> {
        Arc::new(Self {
            closed: AtomicBool::new(false),
            fail_close: true,
            unsubscribes: Mutex::new(Vec::new()),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn unsubscribe_calls(&self) -> Vec<String> {
        self.unsubscribes
            .lock()
            .expect("unsubscribe record poisoned")
            .clone()
    }

    pub fn unsubscribe_count(&self, subscription_name: &str) -> usize {
        self.unsubscribe_calls()
            .iter()
            .filter(|name| name.as_str() == subscription_name)
            .count()
    }
}

#[async_trait]
impl BrokerSession for InMemorySession {
    async fn close(&self) -> Result<(), BrokerFault> {
        if self.fail_close {
            return Err(BrokerFault::from_text("session close refused"));
        }
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn unsubscribe(&self, subscription_name: &str) -> Result<(), BrokerFault> {
        self.unsubscribes
            .lock()
            .expect("unsubscribe record poisoned")
            .push(subscription_name.to_string());
        Ok(())
    }
}

/// Recording consumer handle.
pub struct InMemoryConsumer {
    closed: AtomicBool,
    close_calls: AtomicU32,
    fail_close: bool,
}

impl InMemoryConsumer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            closed: AtomicBool::new(false),
            close_calls: AtomicU32::new(0),
            fail_close: false,
        })
    }

    /// A consumer whose `close` call always fails.
    pub fn failing_close() -> Arc<Self> {
        Arc::new(Self {
            closed: AtomicBool::new(false),
            close_calls: AtomicU32::new(0),
            fail_close: true,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> u32 {
        self.close_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageConsumer for InMemoryConsumer {
    async fn close(&self) -> Result<(), BrokerFault> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(BrokerFault::from_text("consumer close refused"));
        }
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Connects against the cluster, registering the manager's fault listener on
/// the target server so injected faults reach it. Keeps the handles it
/// creates for assertions.
pub struct InMemoryBrokerConnector {
    cluster: Arc<InMemoryBrokerCluster>,
    attempts: AtomicU32,
    scripted_failures: AtomicU32,
    established: Mutex<Vec<(String, Arc<InMemoryConnection>, Arc<InMemorySession>)>>,
}

impl InMemoryBrokerConnector {
    pub fn new(cluster: Arc<InMemoryBrokerCluster>) -> Arc<Self> {
        Arc::new(Self {
            cluster,
            attempts: AtomicU32::new(0),
            scripted_failures: AtomicU32::new(0),
            established: Mutex::new(Vec::new()),
        })
    }

    /// Makes the next `count` connect calls fail regardless of server state.
    pub fn fail_next_attempts(&self, count: u32) {
        self.scripted_failures.store(count, Ordering::SeqCst);
    }

    /// Total connect calls observed.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Handles of the most recently established connection, if any.
    pub fn last_established(&self) -> Option<(String, Arc<InMemoryConnection>, Arc<InMemorySession>)> {
        self.established
            .lock()
            .expect("establishment record poisoned")
            .last()
            .cloned()
    }

    /// Number of connections established against the given provider URL.
    pub fn established_to(&self, provider_url: &str) -> usize {
        self.established
            .lock()
            .expect("establishment record poisoned")
            .iter()
            .filter(|(url, _, _)| url == provider_url)
            .count()
    }

    fn take_scripted_failure(&self) -> bool {
        self.scripted_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                left.checked_sub(1)
            })
            .is_ok()
    }
}

#[async_trait]
impl BrokerConnector for InMemoryBrokerConnector {
    async fn connect(
        &self,
        directory: Arc<dyn DirectoryContext>,
        factory_name: &str,
        client_id: &str,
        _credentials: &Credentials,
        listener: Arc<dyn ConnectionListener>,
    ) -> Result<BrokerContext, BrokerFault> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self.take_scripted_failure() {
            return Err(BrokerFault::from_text("broker refused connection"));
        }

        let provider_url = directory.provider_url();
        let server = match self.cluster.server(provider_url) {
            Some(server) if server.is_available() => server,
            _ => {
                return Err(BrokerFault::from_text(format!(
                    "connection refused by {provider_url}"
                )))
            }
        };

        server.register_listener(listener);

        let connection = InMemoryConnection::new();
        let session = InMemorySession::new();
        debug!(
            provider_url,
            factory_name,
            client_id,
            connection_id = connection.id(),
            "connection established"
        );

        self.established
            .lock()
            .expect("establishment record poisoned")
            .push((provider_url.to_string(), connection.clone(), session.clone()));

        Ok(BrokerContext::new(connection, session))
    }
}
