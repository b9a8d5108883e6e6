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

//! Lifecycle state machine for one logical broker connection.

use crate::observability::events;
use std::fmt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const COMPONENT: &str = "lifecycle";

/// Lifecycle of a managed connection.
///
/// `Connected -> Resolving` is the failover edge: recovery re-enters the
/// resolve/connect cycle without passing through `Disconnecting`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    New,
    Resolving,
    Connecting,
    Connected,
    Disconnecting,
    Closed,
}

impl LifecycleState {
    /// Legality of a transition edge. `Disconnecting` is reachable from every
    /// live state; `Closed` only follows `Disconnecting`.
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (New, Resolving)
                | (Resolving, Connecting)
                | (Connecting, Connected)
                | (Connected, Resolving)
                | (New, Disconnecting)
                | (Resolving, Disconnecting)
                | (Connecting, Disconnecting)
                | (Connected, Disconnecting)
                | (Disconnecting, Closed)
        )
    }

    fn as_str(self) -> &'static str {
        match self {
            LifecycleState::New => "new",
            LifecycleState::Resolving => "resolving",
            LifecycleState::Connecting => "connecting",
            LifecycleState::Connected => "connected",
            LifecycleState::Disconnecting => "disconnecting",
            LifecycleState::Closed => "closed",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shared cell owning the current state and logging every transition.
pub(crate) struct StateCell {
    state: Mutex<LifecycleState>,
}

impl StateCell {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(LifecycleState::New),
        }
    }

    pub(crate) async fn get(&self) -> LifecycleState {
        *self.state.lock().await
    }

    /// Applies a transition and returns the previous state. Transitions are
    /// driven internally, so an illegal edge is a bug; it is logged loudly
    /// but still applied rather than wedging recovery.
    pub(crate) async fn transition_to(&self, manager: &str, next: LifecycleState) -> LifecycleState {
        let mut state = self.state.lock().await;
        let previous = *state;

        if previous.can_transition_to(next) {
            debug!(
                event = events::STATE_TRANSITION,
                component = COMPONENT,
                manager,
                from = previous.as_str(),
                to = next.as_str(),
                "lifecycle transition"
            );
        } else {
            warn!(
                event = events::STATE_TRANSITION,
                component = COMPONENT,
                manager,
                from = previous.as_str(),
                to = next.as_str(),
                "unexpected lifecycle transition"
            );
        }

        *state = next;
        previous
    }
}
