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

//! Resolver retry loop: immediate first attempt, fixed backoff, unbounded by
//! default.

use crate::broker::{DirectoryContext, DirectoryResolver};
use crate::endpoint::Endpoint;
use crate::observability::events;
use crate::recovery::policy::{RetryExhausted, RetryPolicy};
use crate::runtime::attempt::run_scheduled_attempt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

const COMPONENT: &str = "resolve_retry";

/// Resolves the endpoint into a directory context, retrying until a context
/// is obtained. Each attempt runs as an independent scheduled task; the
/// caller suspends for up to `delay` between attempts. Only returns an error
/// when the policy carries an explicit attempt cap and it is exhausted.
pub(crate) async fn resolve_with_retry(
    manager: &str,
    resolver: Arc<dyn DirectoryResolver>,
    endpoint: Endpoint,
    delay: Duration,
    policy: &RetryPolicy,
) -> Result<Arc<dyn DirectoryContext>, RetryExhausted> {
    let mut failed_attempts: u32 = 0;

    loop {
        if failed_attempts > 0 {
            sleep(delay).await;
        }

        debug!(
            event = events::RESOLVE_ATTEMPT,
            component = COMPONENT,
            manager,
            endpoint = %endpoint,
            attempt = failed_attempts + 1,
            "resolving endpoint"
        );

        let attempt = {
            let resolver = resolver.clone();
            let endpoint = endpoint.clone();
            async move { resolver.resolve(&endpoint).await }
        };

        match run_scheduled_attempt(attempt).await {
            Ok(directory) => {
                info!(
                    event = events::RESOLVE_OK,
                    component = COMPONENT,
                    manager,
                    provider_url = directory.provider_url(),
                    attempts = failed_attempts + 1,
                    "endpoint resolved"
                );
                return Ok(directory);
            }
            Err(fault) => {
                warn!(
                    event = events::RESOLVE_ATTEMPT_FAILED,
                    component = COMPONENT,
                    manager,
                    endpoint = %endpoint,
                    err = %fault,
                    "resolution attempt failed"
                );
                failed_attempts += 1;

                if policy.is_exhausted(failed_attempts) {
                    warn!(
                        event = events::RETRY_EXHAUSTED,
                        component = COMPONENT,
                        manager,
                        endpoint = %endpoint,
                        attempts = failed_attempts,
                        "resolution attempt cap exhausted"
                    );
                    return Err(RetryExhausted::new(failed_attempts, fault));
                }
            }
        }
    }
}
