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

//! Collaborator traits implemented by the vendor broker client.

use crate::broker::context::BrokerContext;
use crate::broker::fault::BrokerFault;
use crate::credentials::Credentials;
use crate::endpoint::Endpoint;
use async_trait::async_trait;
use std::sync::Arc;

/// Directory-style lookup service mapping an endpoint descriptor to a usable
/// directory context. One `resolve` call per retry attempt; it may fail or
/// time out.
#[async_trait]
pub trait DirectoryResolver: Send + Sync {
    async fn resolve(&self, endpoint: &Endpoint) -> Result<Arc<dyn DirectoryContext>, BrokerFault>;
}

/// A resolved directory handle. Opaque to the manager apart from the provider
/// URL it was resolved against, which is exposed for diagnostics.
pub trait DirectoryContext: Send + Sync {
    fn provider_url(&self) -> &str;
}

/// Factory creating broker connections and sessions from a resolved
/// directory context.
///
/// Implementations must register the supplied `listener` as the connection's
/// asynchronous fault-notification target at creation time, before returning.
#[async_trait]
pub trait BrokerConnector: Send + Sync {
    async fn connect(
        &self,
        directory: Arc<dyn DirectoryContext>,
        factory_name: &str,
        client_id: &str,
        credentials: &Credentials,
        listener: Arc<dyn ConnectionListener>,
    ) -> Result<BrokerContext, BrokerFault>;
}

/// A live broker connection.
#[async_trait]
pub trait BrokerConnection: Send + Sync {
    /// Begins message delivery for subscriptions attached to this connection.
    async fn start(&self) -> Result<(), BrokerFault>;

    /// Pauses message delivery.
    async fn stop(&self) -> Result<(), BrokerFault>;

    /// Releases the connection and all resources attached to it.
    async fn close(&self) -> Result<(), BrokerFault>;
}

/// A live broker session created alongside a connection.
#[async_trait]
pub trait BrokerSession: Send + Sync {
    async fn close(&self) -> Result<(), BrokerFault>;

    /// Drops the broker-side state of a named subscription.
    async fn unsubscribe(&self, subscription_name: &str) -> Result<(), BrokerFault>;
}

/// Consumer handle attached to one subscription.
#[async_trait]
pub trait MessageConsumer: Send + Sync {
    async fn close(&self) -> Result<(), BrokerFault>;
}

/// Asynchronous fault-notification target registered with a live connection.
///
/// Invoked on a task owned by the vendor client; fire-and-forget, nothing is
/// returned to the vendor side.
#[async_trait]
pub trait ConnectionListener: Send + Sync {
    async fn on_fault(&self, fault: BrokerFault);
}
