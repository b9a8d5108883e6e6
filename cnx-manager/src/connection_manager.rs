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

//! Stateful management of one logical broker connection, handling failover
//! and reconnection.

use crate::broker::{
    BrokerConnector, BrokerContext, BrokerFault, BrokerSession, ConnectionContext,
    ConnectionListener, DirectoryContext, DirectoryResolver,
};
use crate::control_plane::endpoint_registry::EndpointRegistry;
use crate::control_plane::lifecycle::{LifecycleState, StateCell};
use crate::credentials::Credentials;
use crate::endpoint::Endpoint;
use crate::observability::events;
use crate::recovery::connect_retry::connect_with_retry;
use crate::recovery::fault_monitor::FaultMonitor;
use crate::recovery::policy::{RetryExhausted, RetryPolicy};
use crate::recovery::resolve_retry::resolve_with_retry;
use crate::subscription::SubscriptionContext;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

const COMPONENT: &str = "connection_manager";

/// Identity and policy of a managed connection, fixed at construction.
#[derive(Clone, Debug)]
pub struct ManagerConfig {
    /// Logical connection name, used in every log line.
    pub name: String,
    /// Client identity presented to the broker.
    pub client_id: String,
    /// Lookup name of the connection factory within the resolved directory.
    pub connection_factory: String,
    pub credentials: Credentials,
    pub retry: RetryPolicy,
}

/// Construction failures.
#[derive(Debug)]
pub enum ManagerCreationError {
    EmptyEndpointSet,
}

impl fmt::Display for ManagerCreationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagerCreationError::EmptyEndpointSet => {
                write!(f, "endpoint set must contain at least one endpoint")
            }
        }
    }
}

impl Error for ManagerCreationError {}

/// Failures starting message delivery.
#[derive(Debug)]
pub enum StartError {
    /// `start()` was invoked while no connection exists. Caller error.
    NotConnected,
    /// The vendor client rejected the start call.
    Broker(BrokerFault),
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartError::NotConnected => {
                write!(f, "start() requires an established connection")
            }
            StartError::Broker(fault) => write!(f, "unable to start delivery: {fault}"),
        }
    }
}

impl Error for StartError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StartError::Broker(fault) => Some(fault),
            StartError::NotConnected => None,
        }
    }
}

/// Serializes failover entry. Holding this lock is what makes a resolve +
/// connect cycle atomic with respect to concurrent fault notifications; the
/// epoch names the connection generation currently installed.
struct RecoveryGate {
    epoch: u64,
}

///
/// [`ConnectionManager`] owns the lifecycle of one logical connection to a
/// pub/sub broker: it resolves the active [`Endpoint`] through a
/// [`DirectoryResolver`], establishes a connection/session through a
/// [`BrokerConnector`], listens for asynchronous faults, and on a dropped
/// broker link fails over to another candidate endpoint and reconnects.
///
/// Resolution and connection each retry with a fixed backoff, indefinitely by
/// default; see [`RetryPolicy`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use cnx_manager::{
///     ConnectionManager, Credentials, Endpoint, LifecycleState, ManagerConfig, RetryPolicy,
/// };
///
/// # pub mod vendor_stub {
/// #     use std::sync::Arc;
/// #     use async_trait::async_trait;
/// #     use cnx_manager::{
/// #         BrokerConnection, BrokerConnector, BrokerContext, BrokerFault, BrokerSession,
/// #         ConnectionListener, Credentials, DirectoryContext, DirectoryResolver, Endpoint,
/// #     };
/// #
/// #     pub struct StubDirectory(pub String);
/// #
/// #     impl DirectoryContext for StubDirectory {
/// #         fn provider_url(&self) -> &str {
/// #             &self.0
/// #         }
/// #     }
/// #
/// #     pub struct StubResolver;
/// #
/// #     #[async_trait]
/// #     impl DirectoryResolver for StubResolver {
/// #         async fn resolve(
/// #             &self,
/// #             endpoint: &Endpoint,
/// #         ) -> Result<Arc<dyn DirectoryContext>, BrokerFault> {
/// #             Ok(Arc::new(StubDirectory(endpoint.provider_url().to_string())))
/// #         }
/// #     }
/// #
/// #     pub struct StubConnection;
/// #
/// #     #[async_trait]
/// #     impl BrokerConnection for StubConnection {
/// #         async fn start(&self) -> Result<(), BrokerFault> {
/// #             Ok(())
/// #         }
/// #         async fn stop(&self) -> Result<(), BrokerFault> {
/// #             Ok(())
/// #         }
/// #         async fn close(&self) -> Result<(), BrokerFault> {
/// #             Ok(())
/// #         }
/// #     }
/// #
/// #     pub struct StubSession;
/// #
/// #     #[async_trait]
/// #     impl BrokerSession for StubSession {
/// #         async fn close(&self) -> Result<(), BrokerFault> {
/// #             Ok(())
/// #         }
/// #         async fn unsubscribe(&self, _subscription_name: &str) -> Result<(), BrokerFault> {
/// #             Ok(())
/// #         }
/// #     }
/// #
/// #     pub struct StubConnector;
/// #
/// #     #[async_trait]
/// #     impl BrokerConnector for StubConnector {
/// #         async fn connect(
/// #             &self,
/// #             _directory: Arc<dyn DirectoryContext>,
/// #             _factory_name: &str,
/// #             _client_id: &str,
/// #             _credentials: &Credentials,
/// #             _listener: Arc<dyn ConnectionListener>,
/// #         ) -> Result<BrokerContext, BrokerFault> {
/// #             Ok(BrokerContext::new(Arc::new(StubConnection), Arc::new(StubSession)))
/// #         }
/// #     }
/// # }
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let endpoints = vec![
///     Endpoint::new("primary", "tcp://broker-a.example:61616"),
///     Endpoint::new("standby", "tcp://broker-b.example:61616"),
/// ];
///
/// let manager = ConnectionManager::new(
///     ManagerConfig {
///         name: "orders-feed".to_string(),
///         client_id: "orders-client".to_string(),
///         connection_factory: "ConnectionFactory".to_string(),
///         credentials: Credentials::new("svc", "secret"),
///         retry: RetryPolicy::default(),
///     },
///     endpoints,
///     Some("primary"),
///     Arc::new(vendor_stub::StubResolver),
///     Arc::new(vendor_stub::StubConnector),
/// )
/// .unwrap();
///
/// manager.connect(Duration::from_secs(2)).await.unwrap();
/// assert_eq!(manager.lifecycle_state().await, LifecycleState::Connected);
///
/// manager.start().await.unwrap();
/// manager.disconnect().await;
/// assert_eq!(manager.lifecycle_state().await, LifecycleState::Closed);
/// # });
/// ```
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<ManagerInner>,
}

pub(crate) struct ManagerInner {
    name: String,
    client_id: String,
    connection_factory: String,
    credentials: Credentials,
    retry: RetryPolicy,
    resolver: Arc<dyn DirectoryResolver>,
    connector: Arc<dyn BrokerConnector>,
    registry: Mutex<EndpointRegistry>,
    state: StateCell,
    context: Mutex<Option<ConnectionContext>>,
    recovery_gate: Mutex<RecoveryGate>,
}

impl ConnectionManager {
    /// Builds a manager over the candidate endpoint set. The preferred
    /// endpoint (matched by name) starts active; no I/O happens until
    /// [`connect`](Self::connect).
    pub fn new(
        config: ManagerConfig,
        endpoints: Vec<Endpoint>,
        preferred_endpoint: Option<&str>,
        resolver: Arc<dyn DirectoryResolver>,
        connector: Arc<dyn BrokerConnector>,
    ) -> Result<Self, ManagerCreationError> {
        let registry = EndpointRegistry::new(endpoints, preferred_endpoint)
            .map_err(|_| ManagerCreationError::EmptyEndpointSet)?;

        info!(
            event = events::MANAGER_CREATED,
            component = COMPONENT,
            manager = config.name.as_str(),
            provider_url = registry.active().provider_url(),
            candidates = registry.len(),
            "connection manager created"
        );

        Ok(Self {
            inner: Arc::new(ManagerInner {
                name: config.name,
                client_id: config.client_id,
                connection_factory: config.connection_factory,
                credentials: config.credentials,
                retry: config.retry,
                resolver,
                connector,
                registry: Mutex::new(registry),
                state: StateCell::new(),
                context: Mutex::new(None),
                recovery_gate: Mutex::new(RecoveryGate { epoch: 0 }),
            }),
        })
    }

    /// Resolves the active endpoint and establishes the connection, retrying
    /// each phase with `delay` between attempts. Suspends the caller until
    /// the connection is live; with the default unbounded [`RetryPolicy`]
    /// that wait has no limit. Serialized against fault-driven recovery.
    pub async fn connect(&self, delay: Duration) -> Result<(), RetryExhausted> {
        let mut gate = self.inner.recovery_gate.lock().await;
        let endpoint = self.inner.registry.lock().await.active().clone();
        ManagerInner::connect_cycle(&self.inner, &mut gate, endpoint, delay).await
    }

    /// Starts message delivery for subscriptions attached to the live
    /// connection. Calling this without an established connection is a caller
    /// error.
    pub async fn start(&self) -> Result<(), StartError> {
        if self.inner.state.get().await != LifecycleState::Connected {
            warn!(
                event = events::DELIVERY_START_REJECTED,
                component = COMPONENT,
                manager = self.inner.name.as_str(),
                "start() invoked while not connected"
            );
            return Err(StartError::NotConnected);
        }

        let connection = {
            let context = self.inner.context.lock().await;
            context
                .as_ref()
                .and_then(|ctx| ctx.broker.connection().cloned())
        };

        let Some(connection) = connection else {
            warn!(
                event = events::DELIVERY_START_REJECTED,
                component = COMPONENT,
                manager = self.inner.name.as_str(),
                "start() invoked without an established connection"
            );
            return Err(StartError::NotConnected);
        };

        connection.start().await.map_err(StartError::Broker)?;
        info!(
            event = events::DELIVERY_STARTED,
            component = COMPONENT,
            manager = self.inner.name.as_str(),
            "message delivery started"
        );
        Ok(())
    }

    /// Releases one subscription: closes its consumer handle when present,
    /// then issues the explicit broker-side unsubscribe when (and only when)
    /// the teardown policy requires it. Every failure is logged and
    /// swallowed; teardown always runs to completion.
    pub async fn unsubscribe(
        &self,
        subscription: &SubscriptionContext,
        session: Option<&Arc<dyn BrokerSession>>,
    ) {
        let name = self.inner.name.as_str();
        let descriptor = subscription.descriptor();

        debug!(
            event = events::UNSUBSCRIBE_START,
            component = COMPONENT,
            manager = name,
            subscription = descriptor.name(),
            destination = %descriptor.destination(),
            durable = descriptor.is_durable(),
            "about to unsubscribe"
        );

        // Consumer first, so no delivery races the unsubscribe below.
        if let Some(consumer) = subscription.consumer() {
            if let Err(fault) = consumer.close().await {
                warn!(
                    event = events::CONSUMER_CLOSE_FAILED,
                    component = COMPONENT,
                    manager = name,
                    subscription = descriptor.name(),
                    err = %fault,
                    "unable to close consumer"
                );
            }
        }

        if !descriptor.requires_explicit_unsubscribe() {
            debug!(
                event = events::UNSUBSCRIBE_SKIPPED,
                component = COMPONENT,
                manager = name,
                subscription = descriptor.name(),
                "subscription kind keeps its broker-side state"
            );
            return;
        }

        let Some(session) = session else {
            debug!(
                event = events::UNSUBSCRIBE_SKIPPED,
                component = COMPONENT,
                manager = name,
                subscription = descriptor.name(),
                "no session supplied"
            );
            return;
        };

        // Dropping the subscription record prevents a shadow queue from
        // accumulating and lets the client identity be reused later.
        match session.unsubscribe(descriptor.name()).await {
            Ok(()) => {
                info!(
                    event = events::UNSUBSCRIBE_OK,
                    component = COMPONENT,
                    manager = name,
                    subscription = descriptor.name(),
                    "unsubscribed"
                );
            }
            Err(fault) => {
                error!(
                    event = events::UNSUBSCRIBE_FAILED,
                    component = COMPONENT,
                    manager = name,
                    subscription = descriptor.name(),
                    err = %fault,
                    "unable to unsubscribe"
                );
            }
        }
    }

    /// Tears the logical connection down: session first, then the connection
    /// (stopped before closed). Either handle may already be absent, and a
    /// failure on one step never prevents the remaining steps.
    pub async fn disconnect(&self) {
        let name = self.inner.name.as_str();
        info!(
            event = events::DISCONNECT_START,
            component = COMPONENT,
            manager = name,
            "disconnecting"
        );
        self.inner
            .state
            .transition_to(name, LifecycleState::Disconnecting)
            .await;

        let context = self.inner.context.lock().await.take();

        if let Some(context) = context {
            debug!(
                component = COMPONENT,
                manager = name,
                epoch = context.epoch,
                provider_url = context.directory.provider_url(),
                "releasing connection generation"
            );

            if let Some(session) = context.broker.session() {
                if let Err(fault) = session.close().await {
                    warn!(
                        event = events::SESSION_CLOSE_FAILED,
                        component = COMPONENT,
                        manager = name,
                        err = %fault,
                        "unable to close session"
                    );
                }
            }

            if let Some(connection) = context.broker.connection() {
                if let Err(fault) = connection.stop().await {
                    warn!(
                        event = events::CONNECTION_STOP_FAILED,
                        component = COMPONENT,
                        manager = name,
                        err = %fault,
                        "unable to stop connection"
                    );
                }
                if let Err(fault) = connection.close().await {
                    warn!(
                        event = events::CONNECTION_CLOSE_FAILED,
                        component = COMPONENT,
                        manager = name,
                        err = %fault,
                        "unable to close connection"
                    );
                }
            }
        }

        self.inner
            .state
            .transition_to(name, LifecycleState::Closed)
            .await;
        info!(
            event = events::DISCONNECT_COMPLETE,
            component = COMPONENT,
            manager = name,
            "disconnected"
        );
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn client_id(&self) -> &str {
        &self.inner.client_id
    }

    pub fn connection_factory_name(&self) -> &str {
        &self.inner.connection_factory
    }

    pub async fn active_endpoint(&self) -> Endpoint {
        self.inner.registry.lock().await.active().clone()
    }

    pub async fn lifecycle_state(&self) -> LifecycleState {
        self.inner.state.get().await
    }

    pub async fn directory_context(&self) -> Option<Arc<dyn DirectoryContext>> {
        self.inner
            .context
            .lock()
            .await
            .as_ref()
            .map(|ctx| ctx.directory.clone())
    }

    pub async fn broker_context(&self) -> Option<BrokerContext> {
        self.inner
            .context
            .lock()
            .await
            .as_ref()
            .map(|ctx| ctx.broker.clone())
    }
}

impl ManagerInner {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// One resolve + connect cycle against `endpoint`, run under the recovery
    /// gate. Installs the new context and advances the gate epoch on success.
    async fn connect_cycle(
        inner: &Arc<ManagerInner>,
        gate: &mut RecoveryGate,
        endpoint: Endpoint,
        delay: Duration,
    ) -> Result<(), RetryExhausted> {
        let name = inner.name.as_str();

        inner.state.transition_to(name, LifecycleState::Resolving).await;
        let directory = resolve_with_retry(
            name,
            inner.resolver.clone(),
            endpoint,
            delay,
            &inner.retry,
        )
        .await?;
        info!(
            component = COMPONENT,
            manager = name,
            provider_url = directory.provider_url(),
            "directory service provider URL"
        );

        inner
            .state
            .transition_to(name, LifecycleState::Connecting)
            .await;
        let epoch = gate.epoch + 1;
        let monitor: Arc<dyn ConnectionListener> =
            Arc::new(FaultMonitor::new(Arc::downgrade(inner), epoch));
        let broker = connect_with_retry(
            name,
            inner.connector.clone(),
            directory.clone(),
            &inner.connection_factory,
            &inner.client_id,
            &inner.credentials,
            monitor,
            delay,
            &inner.retry,
        )
        .await?;

        gate.epoch = epoch;
        *inner.context.lock().await = Some(ConnectionContext {
            directory,
            broker,
            epoch,
        });
        inner
            .state
            .transition_to(name, LifecycleState::Connected)
            .await;
        Ok(())
    }

    /// Recovery path entered from the fault monitor for a classified
    /// disconnect. Entry is serialized through the recovery gate; a
    /// notification for a generation that was already replaced, or one
    /// arriving during teardown, is dropped.
    pub(crate) async fn recover_from_disconnect(
        self: Arc<Self>,
        observed_epoch: u64,
        fault: &BrokerFault,
    ) {
        let name = self.name.clone();
        let mut gate = self.recovery_gate.lock().await;

        if gate.epoch != observed_epoch {
            debug!(
                event = events::FAULT_STALE,
                component = COMPONENT,
                manager = name.as_str(),
                observed_epoch,
                current_epoch = gate.epoch,
                "fault outlived its connection generation, dropped"
            );
            return;
        }

        let state = self.state.get().await;
        if matches!(
            state,
            LifecycleState::Disconnecting | LifecycleState::Closed
        ) {
            debug!(
                event = events::RECOVERY_SKIPPED_CLOSING,
                component = COMPONENT,
                manager = name.as_str(),
                state = %state,
                "fault during teardown, no recovery"
            );
            return;
        }

        let endpoint = {
            let mut registry = self.registry.lock().await;
            error!(
                event = events::FAILOVER_START,
                component = COMPONENT,
                manager = name.as_str(),
                provider_url = registry.active().provider_url(),
                err = %fault,
                "active server no longer reachable"
            );

            match registry.failover() {
                Some(next) => {
                    let next = next.clone();
                    info!(
                        event = events::FAILOVER_SELECTED,
                        component = COMPONENT,
                        manager = name.as_str(),
                        provider_url = next.provider_url(),
                        "failing over"
                    );
                    next
                }
                None => {
                    // Single-endpoint pool: keep hammering the only server.
                    warn!(
                        event = events::FAILOVER_NO_ALTERNATIVE,
                        component = COMPONENT,
                        manager = name.as_str(),
                        "no eligible alternative endpoint"
                    );
                    registry.active().clone()
                }
            }
        };

        let delay = self.retry.failover_backoff();
        if let Err(exhausted) =
            Self::connect_cycle(&self, &mut gate, endpoint, delay).await
        {
            error!(
                event = events::RECOVERY_ABANDONED,
                component = COMPONENT,
                manager = name.as_str(),
                err = %exhausted,
                "recovery abandoned, attempt cap exhausted"
            );
        }
    }
}
