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

//! Connection retry loop: same shape as resolution, but every attempt issues
//! a fresh connector call so no failed handle is ever reused. Keeping the two
//! loops separate lets one resolved directory context serve many connection
//! attempts and keeps the backoff of each phase independently tunable.

use crate::broker::{BrokerConnector, BrokerContext, ConnectionListener, DirectoryContext};
use crate::credentials::Credentials;
use crate::observability::events;
use crate::recovery::policy::{RetryExhausted, RetryPolicy};
use crate::runtime::attempt::run_scheduled_attempt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

const COMPONENT: &str = "connect_retry";

/// Establishes a broker connection/session against the resolved directory,
/// retrying until the connector hands back a context. The listener is
/// registered with every connection the connector creates.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn connect_with_retry(
    manager: &str,
    connector: Arc<dyn BrokerConnector>,
    directory: Arc<dyn DirectoryContext>,
    factory_name: &str,
    client_id: &str,
    credentials: &Credentials,
    listener: Arc<dyn ConnectionListener>,
    delay: Duration,
    policy: &RetryPolicy,
) -> Result<BrokerContext, RetryExhausted> {
    let mut failed_attempts: u32 = 0;

    loop {
        if failed_attempts > 0 {
            sleep(delay).await;
        }

        debug!(
            event = events::CONNECT_ATTEMPT,
            component = COMPONENT,
            manager,
            provider_url = directory.provider_url(),
            attempt = failed_attempts + 1,
            "connecting to broker"
        );

        let attempt = {
            let connector = connector.clone();
            let directory = directory.clone();
            let factory_name = factory_name.to_string();
            let client_id = client_id.to_string();
            let credentials = credentials.clone();
            let listener = listener.clone();
            async move {
                connector
                    .connect(directory, &factory_name, &client_id, &credentials, listener)
                    .await
            }
        };

        match run_scheduled_attempt(attempt).await {
            Ok(context) => {
                info!(
                    event = events::CONNECT_OK,
                    component = COMPONENT,
                    manager,
                    provider_url = directory.provider_url(),
                    attempts = failed_attempts + 1,
                    "broker connection established"
                );
                return Ok(context);
            }
            Err(fault) => {
                warn!(
                    event = events::CONNECT_ATTEMPT_FAILED,
                    component = COMPONENT,
                    manager,
                    provider_url = directory.provider_url(),
                    err = %fault,
                    "connection attempt failed"
                );
                failed_attempts += 1;

                if policy.is_exhausted(failed_attempts) {
                    warn!(
                        event = events::RETRY_EXHAUSTED,
                        component = COMPONENT,
                        manager,
                        provider_url = directory.provider_url(),
                        attempts = failed_attempts,
                        "connection attempt cap exhausted"
                    );
                    return Err(RetryExhausted::new(failed_attempts, fault));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::connect_with_retry;
    use crate::broker::{
        BrokerConnection, BrokerConnector, BrokerContext, BrokerFault, BrokerSession,
        ConnectionListener, DirectoryContext,
    };
    use crate::credentials::Credentials;
    use crate::recovery::policy::RetryPolicy;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct FixedContext;

    impl DirectoryContext for FixedContext {
        fn provider_url(&self) -> &str {
            "tcp://broker-1:61616"
        }
    }

    struct NoopConnection;

    #[async_trait]
    impl BrokerConnection for NoopConnection {
        async fn start(&self) -> Result<(), BrokerFault> {
            Ok(())
        }

        async fn stop(&self) -> Result<(), BrokerFault> {
            Ok(())
        }

        async fn close(&self) -> Result<(), BrokerFault> {
            Ok(())
        }
    }

    struct NoopSession;

    #[async_trait]
    impl BrokerSession for NoopSession {
        async fn close(&self) -> Result<(), BrokerFault> {
            Ok(())
        }

        async fn unsubscribe(&self, _subscription_name: &str) -> Result<(), BrokerFault> {
            Ok(())
        }
    }

    struct NoopListener;

    #[async_trait]
    impl ConnectionListener for NoopListener {
        async fn on_fault(&self, _fault: BrokerFault) {}
    }

    struct FlakyConnector {
        failures_left: AtomicU32,
        attempts: AtomicU32,
    }

    impl FlakyConnector {
        fn failing(times: u32) -> Arc<Self> {
            Arc::new(Self {
                failures_left: AtomicU32::new(times),
                attempts: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl BrokerConnector for FlakyConnector {
        async fn connect(
            &self,
            _directory: Arc<dyn DirectoryContext>,
            _factory_name: &str,
            _client_id: &str,
            _credentials: &Credentials,
            _listener: Arc<dyn ConnectionListener>,
        ) -> Result<BrokerContext, BrokerFault> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                    left.checked_sub(1)
                })
                .is_ok()
            {
                Err(BrokerFault::from_text("broker refused connection"))
            } else {
                Ok(BrokerContext::new(
                    Arc::new(NoopConnection),
                    Arc::new(NoopSession),
                ))
            }
        }
    }

    async fn run(connector: Arc<FlakyConnector>, policy: &RetryPolicy) -> Result<(), u32> {
        connect_with_retry(
            "mgr",
            connector.clone(),
            Arc::new(FixedContext),
            "ConnectionFactory",
            "client-1",
            &Credentials::new("login", "passcode"),
            Arc::new(NoopListener),
            Duration::ZERO,
            policy,
        )
        .await
        .map(|_| ())
        .map_err(|e| e.attempts())
    }

    #[tokio::test]
    async fn n_failures_take_exactly_n_plus_one_attempts() {
        for n in [0u32, 2, 9] {
            let connector = FlakyConnector::failing(n);
            assert!(run(connector.clone(), &RetryPolicy::default()).await.is_ok());
            assert_eq!(connector.attempts.load(Ordering::SeqCst), n + 1);
        }
    }

    #[tokio::test]
    async fn long_failure_run_is_not_capped_by_default() {
        let connector = FlakyConnector::failing(1_000);
        assert!(run(connector.clone(), &RetryPolicy::default()).await.is_ok());
        assert_eq!(connector.attempts.load(Ordering::SeqCst), 1_001);
    }

    #[tokio::test]
    async fn configured_cap_stops_the_loop() {
        let connector = FlakyConnector::failing(u32::MAX);
        let attempts = run(
            connector.clone(),
            &RetryPolicy::default().with_max_attempts(5),
        )
        .await
        .unwrap_err();

        assert_eq!(attempts, 5);
        assert_eq!(connector.attempts.load(Ordering::SeqCst), 5);
    }
}
