use cnx_manager::{ConnectionManager, Credentials, Endpoint, ManagerConfig, RetryPolicy};
use in_memory_broker::{InMemoryBrokerCluster, InMemoryBrokerConnector, InMemoryDirectoryResolver};
use std::sync::Arc;
use std::time::Duration;

pub(crate) struct BrokerFixture {
    pub(crate) cluster: Arc<InMemoryBrokerCluster>,
    pub(crate) resolver: Arc<InMemoryDirectoryResolver>,
    pub(crate) connector: Arc<InMemoryBrokerConnector>,
}

pub(crate) fn broker_fixture() -> BrokerFixture {
    let cluster = InMemoryBrokerCluster::new();
    let resolver = InMemoryDirectoryResolver::new(cluster.clone());
    let connector = InMemoryBrokerConnector::new(cluster.clone());
    BrokerFixture {
        cluster,
        resolver,
        connector,
    }
}

pub(crate) fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(Duration::from_millis(5))
}

pub(crate) fn build_manager(
    fixture: &BrokerFixture,
    name: &str,
    endpoints: Vec<Endpoint>,
    preferred: Option<&str>,
) -> ConnectionManager {
    ConnectionManager::new(
        ManagerConfig {
            name: name.to_string(),
            client_id: format!("{name}-client"),
            connection_factory: "ConnectionFactory".to_string(),
            credentials: Credentials::new("svc", "secret"),
            retry: fast_retry(),
        },
        endpoints,
        preferred,
        fixture.resolver.clone(),
        fixture.connector.clone(),
    )
    .expect("manager creation should succeed")
}

#[allow(dead_code)]
pub(crate) async fn wait_until<F, Fut>(what: &str, timeout: Duration, mut probe: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if probe().await {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
