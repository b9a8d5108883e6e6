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

use cnx_manager::{
    ConnectionManager, Credentials, Endpoint, LifecycleState, ManagerConfig, RetryPolicy,
};
use std::time::Duration;

const PRIMARY_URL: &str = "tcp://broker-a.example:61616";

fn one_endpoint() -> Vec<Endpoint> {
    vec![Endpoint::new("primary", PRIMARY_URL)]
}

#[tokio::test(flavor = "multi_thread")]
async fn scripted_resolver_failures_take_exactly_n_plus_one_attempts() {
    in_memory_broker::init_logging();

    let fixture = support::broker_fixture();
    fixture.cluster.add_server(PRIMARY_URL);
    fixture.resolver.fail_next_attempts(3);

    let manager = support::build_manager(&fixture, "resolve-retry", one_endpoint(), None);
    manager.connect(Duration::ZERO).await.unwrap();

    assert_eq!(fixture.resolver.attempts(), 4);
    assert_eq!(fixture.connector.attempts(), 1);
    assert_eq!(manager.lifecycle_state().await, LifecycleState::Connected);
}

#[tokio::test(flavor = "multi_thread")]
async fn connection_retries_reuse_the_resolved_directory() {
    in_memory_broker::init_logging();

    let fixture = support::broker_fixture();
    fixture.cluster.add_server(PRIMARY_URL);
    fixture.connector.fail_next_attempts(5);

    let manager = support::build_manager(&fixture, "connect-retry", one_endpoint(), None);
    manager.connect(Duration::ZERO).await.unwrap();

    // One lookup serves all six connection attempts.
    assert_eq!(fixture.resolver.attempts(), 1);
    assert_eq!(fixture.connector.attempts(), 6);
    assert_eq!(manager.lifecycle_state().await, LifecycleState::Connected);
}

#[tokio::test(flavor = "multi_thread")]
async fn a_thousand_failures_do_not_exhaust_the_default_policy() {
    in_memory_broker::init_logging();

    let fixture = support::broker_fixture();
    fixture.cluster.add_server(PRIMARY_URL);
    fixture.resolver.fail_next_attempts(1_000);

    let manager = support::build_manager(&fixture, "long-retry", one_endpoint(), None);
    manager.connect(Duration::ZERO).await.unwrap();

    assert_eq!(fixture.resolver.attempts(), 1_001);
    assert_eq!(manager.lifecycle_state().await, LifecycleState::Connected);
}

#[tokio::test(flavor = "multi_thread")]
async fn capped_policy_surfaces_exhaustion_to_the_caller() {
    in_memory_broker::init_logging();

    let fixture = support::broker_fixture();
    // No server at all: every lookup fails.

    let manager = ConnectionManager::new(
        ManagerConfig {
            name: "capped".to_string(),
            client_id: "capped-client".to_string(),
            connection_factory: "ConnectionFactory".to_string(),
            credentials: Credentials::new("svc", "secret"),
            retry: RetryPolicy::new(Duration::ZERO).with_max_attempts(3),
        },
        one_endpoint(),
        None,
        fixture.resolver.clone(),
        fixture.connector.clone(),
    )
    .unwrap();

    let exhausted = manager.connect(Duration::ZERO).await.unwrap_err();
    assert_eq!(exhausted.attempts(), 3);
    assert_eq!(fixture.resolver.attempts(), 3);
    assert_eq!(fixture.connector.attempts(), 0);
}
