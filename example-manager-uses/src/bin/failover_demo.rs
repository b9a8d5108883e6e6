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

//! Demonstrates failover end to end against the in-memory broker: connect to
//! the preferred endpoint, kill it, and watch the manager re-home onto the
//! standby.

use clap::Parser;
use cnx_manager::{
    BrokerFault, ConnectionManager, Credentials, Endpoint, LifecycleState, ManagerConfig,
    RetryPolicy,
};
use in_memory_broker::{InMemoryBrokerCluster, InMemoryBrokerConnector, InMemoryDirectoryResolver};
use serde::Deserialize;
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::time::Duration;
use tracing::info;

#[derive(Deserialize)]
struct EndpointConfig {
    name: String,
    provider_url: String,
}

#[derive(Deserialize)]
struct DemoConfig {
    connection_name: String,
    client_id: String,
    connection_factory: String,
    login: String,
    passcode: String,
    endpoints: Vec<EndpointConfig>,
    preferred_endpoint: Option<String>,
    retry_delay_ms: u64,
}

#[derive(Parser)]
#[command()]
struct DemoArgs {
    #[arg(short, long, value_name = "FILE")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    in_memory_broker::init_logging();

    info!("Started failover-demo");

    let args = DemoArgs::parse();
    let mut file = File::open(args.config)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    let config: DemoConfig = json5::from_str(&contents)?;

    // One in-memory server per configured endpoint.
    let cluster = InMemoryBrokerCluster::new();
    for endpoint in &config.endpoints {
        cluster.add_server(&endpoint.provider_url);
    }
    let resolver = InMemoryDirectoryResolver::new(cluster.clone());
    let connector = InMemoryBrokerConnector::new(cluster.clone());

    let endpoints: Vec<Endpoint> = config
        .endpoints
        .iter()
        .map(|e| Endpoint::new(&e.name, &e.provider_url))
        .collect();
    let retry_delay = Duration::from_millis(config.retry_delay_ms);

    let manager = ConnectionManager::new(
        ManagerConfig {
            name: config.connection_name.clone(),
            client_id: config.client_id.clone(),
            connection_factory: config.connection_factory.clone(),
            credentials: Credentials::new(&config.login, &config.passcode),
            retry: RetryPolicy::new(retry_delay),
        },
        endpoints,
        config.preferred_endpoint.as_deref(),
        resolver,
        connector,
    )?;

    manager.connect(retry_delay).await?;
    manager.start().await?;
    let active = manager.active_endpoint().await;
    info!(endpoint = %active, "connected and delivering");

    // Take the active server down and drop the link the way a real broker
    // client would report it.
    let server = cluster
        .server(active.provider_url())
        .expect("active endpoint has a server");
    server.set_available(false);
    server
        .inject_fault(BrokerFault::from_text("Connection disconnected"))
        .await;

    let rehomed = manager.active_endpoint().await;
    info!(
        endpoint = %rehomed,
        state = %manager.lifecycle_state().await,
        "recovered after broker loss"
    );
    assert_eq!(manager.lifecycle_state().await, LifecycleState::Connected);

    manager.disconnect().await;
    info!("demo complete");
    Ok(())
}
