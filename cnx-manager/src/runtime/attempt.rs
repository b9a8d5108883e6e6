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

//! Runtime helper running one retry attempt as an independent scheduled task.

use crate::broker::BrokerFault;
use std::future::Future;

/// Spawns the attempt on the runtime and awaits its outcome.
///
/// Each attempt is its own unit of work: attempts share no stack with the
/// retry loop and a panicking or aborted attempt surfaces as an ordinary
/// failed attempt instead of tearing the loop down.
pub(crate) async fn run_scheduled_attempt<T, Fut>(attempt: Fut) -> Result<T, BrokerFault>
where
    T: Send + 'static,
    Fut: Future<Output = Result<T, BrokerFault>> + Send + 'static,
{
    match tokio::spawn(attempt).await {
        Ok(outcome) => outcome,
        Err(join_error) => Err(BrokerFault::from_text(format!(
            "attempt task did not complete: {join_error}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::run_scheduled_attempt;
    use crate::broker::BrokerFault;

    #[tokio::test]
    async fn successful_attempt_passes_its_value_through() {
        let outcome = run_scheduled_attempt(async { Ok::<_, BrokerFault>(7usize) }).await;
        assert_eq!(outcome.unwrap(), 7);
    }

    #[tokio::test]
    async fn failed_attempt_surfaces_the_fault() {
        let outcome = run_scheduled_attempt(async {
            Err::<usize, _>(BrokerFault::from_text("lookup timed out"))
        })
        .await;
        assert_eq!(outcome.unwrap_err().message(), "lookup timed out");
    }

    #[tokio::test]
    async fn panicking_attempt_becomes_a_failed_attempt() {
        let outcome: Result<(), BrokerFault> =
            run_scheduled_attempt(async { panic!("attempt blew up") }).await;
        assert!(outcome.is_err());
    }
}
