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

//! Directory resolver over the in-memory cluster, with scriptable failures.

use crate::cluster::InMemoryBrokerCluster;
use async_trait::async_trait;
use cnx_manager::{BrokerFault, DirectoryContext, DirectoryResolver, Endpoint};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

pub struct InMemoryDirectoryContext {
    provider_url: String,
}

impl InMemoryDirectoryContext {
    pub fn new(provider_url: &str) -> Self {
        Self {
            provider_url: provider_url.to_string(),
        }
    }
}

impl DirectoryContext for InMemoryDirectoryContext {
    fn provider_url(&self) -> &str {
        &self.provider_url
    }
}

/// Resolves endpoints against the cluster. Lookups fail while the target
/// server is absent or unavailable, and additional failures can be scripted
/// up front to exercise the retry loop.
pub struct InMemoryDirectoryResolver {
    cluster: Arc<InMemoryBrokerCluster>,
    attempts: AtomicU32,
    scripted_failures: AtomicU32,
}

impl InMemoryDirectoryResolver {
    pub fn new(cluster: Arc<InMemoryBrokerCluster>) -> Arc<Self> {
        Arc::new(Self {
            cluster,
            attempts: AtomicU32::new(0),
            scripted_failures: AtomicU32::new(0),
        })
    }

    /// Makes the next `count` resolve calls fail regardless of server state.
    pub fn fail_next_attempts(&self, count: u32) {
        self.scripted_failures.store(count, Ordering::SeqCst);
    }

    /// Total resolve calls observed.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
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
impl DirectoryResolver for InMemoryDirectoryResolver {
    async fn resolve(&self, endpoint: &Endpoint) -> Result<Arc<dyn DirectoryContext>, BrokerFault> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self.take_scripted_failure() {
            return Err(BrokerFault::from_text("directory lookup timed out"));
        }

        let provider_url = endpoint.provider_url();
        match self.cluster.server(provider_url) {
            Some(server) if server.is_available() => {
                Ok(Arc::new(InMemoryDirectoryContext::new(provider_url)))
            }
            Some(_) => Err(BrokerFault::from_text(format!(
                "directory lookup timed out for {provider_url}"
            ))),
            None => Err(BrokerFault::from_text(format!(
                "no directory service at {provider_url}"
            ))),
        }
    }
}
