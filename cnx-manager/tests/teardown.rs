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

mod support;

use async_trait::async_trait;
use cnx_manager::{
    BrokerConnection, BrokerConnector, BrokerContext, BrokerFault, BrokerSession,
    ConnectionListener, Credentials, DestinationKind, DirectoryContext, Endpoint, LifecycleState,
    MessageConsumer, SubscriptionContext, SubscriptionDescriptor,
};
use in_memory_broker::{InMemoryConsumer, InMemorySession};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const PRIMARY_URL: &str = "tcp://broker-a.example:61616";

fn one_endpoint() -> Vec<Endpoint> {
    vec![Endpoint::new("primary", PRIMARY_URL)]
}

fn session_handle(session: &Arc<InMemorySession>) -> Arc<dyn BrokerSession> {
    session.clone()
}

#[tokio::test(flavor = "multi_thread")]
async fn non_durable_topic_subscription_unsubscribes_exactly_once() {
    in_memory_broker::init_logging();

    let fixture = support::broker_fixture();
    fixture.cluster.add_server(PRIMARY_URL);
    let manager = support::build_manager(&fixture, "teardown", one_endpoint(), None);
    manager.connect(Duration::from_millis(5)).await.unwrap();

    let session = InMemorySession::new();
    let consumer = InMemoryConsumer::new();
    let subscription = SubscriptionContext::with_consumer(
        SubscriptionDescriptor::new("updates", DestinationKind::Topic, false),
        consumer.clone(),
    );

    manager
        .unsubscribe(&subscription, Some(&session_handle(&session)))
        .await;

    assert_eq!(session.unsubscribe_count("updates"), 1);
    assert!(consumer.is_closed());
}

#[tokio::test(flavor = "multi_thread")]
async fn durable_topic_subscription_is_never_unsubscribed() {
    in_memory_broker::init_logging();

    let fixture = support::broker_fixture();
    fixture.cluster.add_server(PRIMARY_URL);
    let manager = support::build_manager(&fixture, "teardown-durable", one_endpoint(), None);
    manager.connect(Duration::from_millis(5)).await.unwrap();

    let session = InMemorySession::new();
    let consumer = InMemoryConsumer::new();
    let subscription = SubscriptionContext::with_consumer(
        SubscriptionDescriptor::new("audit-trail", DestinationKind::Topic, true),
        consumer.clone(),
    );

    manager
        .unsubscribe(&subscription, Some(&session_handle(&session)))
        .await;

    assert!(session.unsubscribe_calls().is_empty());
    assert!(consumer.is_closed());
}

#[tokio::test(flavor = "multi_thread")]
async fn queue_subscription_is_never_unsubscribed() {
    in_memory_broker::init_logging();

    let fixture = support::broker_fixture();
    fixture.cluster.add_server(PRIMARY_URL);
    let manager = support::build_manager(&fixture, "teardown-queue", one_endpoint(), None);
    manager.connect(Duration::from_millis(5)).await.unwrap();

    let session = InMemorySession::new();
    let subscription = SubscriptionContext::new(SubscriptionDescriptor::new(
        "orders",
        DestinationKind::Queue,
        false,
    ));

    manager
        .unsubscribe(&subscription, Some(&session_handle(&session)))
        .await;

    assert!(session.unsubscribe_calls().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_consumer_close_does_not_stop_the_unsubscribe() {
    in_memory_broker::init_logging();

    let fixture = support::broker_fixture();
    fixture.cluster.add_server(PRIMARY_URL);
    let manager = support::build_manager(&fixture, "teardown-tolerant", one_endpoint(), None);
    manager.connect(Duration::from_millis(5)).await.unwrap();

    let session = InMemorySession::new();
    let consumer = InMemoryConsumer::failing_close();
    let subscription = SubscriptionContext::with_consumer(
        SubscriptionDescriptor::new("updates", DestinationKind::Topic, false),
        consumer.clone(),
    );

    manager
        .unsubscribe(&subscription, Some(&session_handle(&session)))
        .await;

    assert_eq!(consumer.close_calls(), 1);
    assert_eq!(session.unsubscribe_count("updates"), 1);
}

// Ordered teardown needs one record shared by both handles, so these small
// stubs live here instead of in the in-memory broker.
struct OrderRecordingConsumer {
    record: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl MessageConsumer for OrderRecordingConsumer {
    async fn close(&self) -> Result<(), BrokerFault> {
        self.record.lock().unwrap().push("consumer_close");
        Ok(())
    }
}

struct OrderRecordingSession {
    record: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl BrokerSession for OrderRecordingSession {
    async fn close(&self) -> Result<(), BrokerFault> {
        self.record.lock().unwrap().push("session_close");
        Ok(())
    }

    async fn unsubscribe(&self, _subscription_name: &str) -> Result<(), BrokerFault> {
        self.record.lock().unwrap().push("unsubscribe");
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn consumer_closes_before_the_unsubscribe_call() {
    in_memory_broker::init_logging();

    let fixture = support::broker_fixture();
    fixture.cluster.add_server(PRIMARY_URL);
    let manager = support::build_manager(&fixture, "teardown-order", one_endpoint(), None);
    manager.connect(Duration::from_millis(5)).await.unwrap();

    let record = Arc::new(Mutex::new(Vec::new()));
    let session: Arc<dyn BrokerSession> = Arc::new(OrderRecordingSession {
        record: record.clone(),
    });
    let subscription = SubscriptionContext::with_consumer(
        SubscriptionDescriptor::new("updates", DestinationKind::Topic, false),
        Arc::new(OrderRecordingConsumer {
            record: record.clone(),
        }),
    );

    manager.unsubscribe(&subscription, Some(&session)).await;

    assert_eq!(*record.lock().unwrap(), vec!["consumer_close", "unsubscribe"]);
}

// Vendor stub handing back partially built contexts for disconnect-tolerance
// tests.
struct PartialContextConnector {
    context: Mutex<Option<BrokerContext>>,
}

impl PartialContextConnector {
    fn with_context(context: BrokerContext) -> Arc<Self> {
        Arc::new(Self {
            context: Mutex::new(Some(context)),
        })
    }
}

#[async_trait]
impl BrokerConnector for PartialContextConnector {
    async fn connect(
        &self,
        _directory: Arc<dyn DirectoryContext>,
        _factory_name: &str,
        _client_id: &str,
        _credentials: &Credentials,
        _listener: Arc<dyn ConnectionListener>,
    ) -> Result<BrokerContext, BrokerFault> {
        self.context
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| BrokerFault::from_text("no context scripted"))
    }
}

struct RecordingConnection {
    closed: Arc<Mutex<bool>>,
}

#[async_trait]
impl BrokerConnection for RecordingConnection {
    async fn start(&self) -> Result<(), BrokerFault> {
        Ok(())
    }

    async fn stop(&self) -> Result<(), BrokerFault> {
        Ok(())
    }

    async fn close(&self) -> Result<(), BrokerFault> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}

async fn manager_with_scripted_context(
    fixture: &support::BrokerFixture,
    name: &str,
    context: BrokerContext,
) -> cnx_manager::ConnectionManager {
    let manager = cnx_manager::ConnectionManager::new(
        cnx_manager::ManagerConfig {
            name: name.to_string(),
            client_id: format!("{name}-client"),
            connection_factory: "ConnectionFactory".to_string(),
            credentials: Credentials::new("svc", "secret"),
            retry: support::fast_retry(),
        },
        one_endpoint(),
        None,
        fixture.resolver.clone(),
        PartialContextConnector::with_context(context),
    )
    .unwrap();
    manager.connect(Duration::from_millis(5)).await.unwrap();
    manager
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_session_close_does_not_prevent_connection_close() {
    in_memory_broker::init_logging();

    let fixture = support::broker_fixture();
    fixture.cluster.add_server(PRIMARY_URL);

    let closed = Arc::new(Mutex::new(false));
    let context = BrokerContext::new(
        Arc::new(RecordingConnection {
            closed: closed.clone(),
        }),
        InMemorySession::failing_close(),
    );

    let manager = manager_with_scripted_context(&fixture, "teardown-session-fail", context).await;
    manager.disconnect().await;

    assert!(*closed.lock().unwrap());
    assert_eq!(manager.lifecycle_state().await, LifecycleState::Closed);
}

#[tokio::test(flavor = "multi_thread")]
async fn absent_session_still_attempts_connection_close() {
    in_memory_broker::init_logging();

    let fixture = support::broker_fixture();
    fixture.cluster.add_server(PRIMARY_URL);

    let closed = Arc::new(Mutex::new(false));
    let context = BrokerContext::from_parts(
        Some(Arc::new(RecordingConnection {
            closed: closed.clone(),
        })),
        None,
    );

    let manager = manager_with_scripted_context(&fixture, "teardown-no-session", context).await;
    manager.disconnect().await;

    assert!(*closed.lock().unwrap());
    assert_eq!(manager.lifecycle_state().await, LifecycleState::Closed);
}

#[tokio::test(flavor = "multi_thread")]
async fn disconnect_with_nothing_live_completes_without_fault() {
    in_memory_broker::init_logging();

    let fixture = support::broker_fixture();
    fixture.cluster.add_server(PRIMARY_URL);

    let empty_context = BrokerContext::from_parts(None, None);
    let manager =
        manager_with_scripted_context(&fixture, "teardown-empty-context", empty_context).await;
    manager.disconnect().await;
    assert_eq!(manager.lifecycle_state().await, LifecycleState::Closed);

    // Never-connected manager tears down just as quietly.
    let never_connected = support::build_manager(&fixture, "teardown-new", one_endpoint(), None);
    never_connected.disconnect().await;
    assert_eq!(
        never_connected.lifecycle_state().await,
        LifecycleState::Closed
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn fault_arriving_after_disconnect_does_not_resurrect_the_connection() {
    in_memory_broker::init_logging();

    let fixture = support::broker_fixture();
    let primary = fixture.cluster.add_server(PRIMARY_URL);
    let manager = support::build_manager(&fixture, "teardown-race", one_endpoint(), None);
    manager.connect(Duration::from_millis(5)).await.unwrap();
    manager.disconnect().await;

    let attempts_before = fixture.connector.attempts();
    primary
        .inject_fault(BrokerFault::from_text("Connection disconnected"))
        .await;

    assert_eq!(manager.lifecycle_state().await, LifecycleState::Closed);
    assert_eq!(fixture.connector.attempts(), attempts_before);
}
