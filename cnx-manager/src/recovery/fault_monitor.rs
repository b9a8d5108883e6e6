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

//! Fault-notification adapter registered with every connection the manager
//! establishes. Runs on a vendor-owned task, so everything it touches goes
//! through the manager's guards.

use crate::broker::{BrokerFault, ConnectionListener, FaultKind};
use crate::connection_manager::ManagerInner;
use crate::observability::events;
use async_trait::async_trait;
use std::sync::Weak;
use tracing::{debug, error, info};

const COMPONENT: &str = "fault_monitor";

/// One monitor per connect cycle. `epoch` identifies the connection
/// generation this monitor watches; notifications that outlive their
/// generation are dropped as stale.
pub(crate) struct FaultMonitor {
    manager: Weak<ManagerInner>,
    epoch: u64,
}

impl FaultMonitor {
    pub(crate) fn new(manager: Weak<ManagerInner>, epoch: u64) -> Self {
        Self { manager, epoch }
    }
}

#[async_trait]
impl ConnectionListener for FaultMonitor {
    async fn on_fault(&self, fault: BrokerFault) {
        let Some(manager) = self.manager.upgrade() else {
            debug!(
                event = events::FAULT_IGNORED,
                component = COMPONENT,
                err = %fault,
                "manager dropped, fault ignored"
            );
            return;
        };

        error!(
            event = events::FAULT_NOTIFIED,
            component = COMPONENT,
            manager = manager.name(),
            epoch = self.epoch,
            err = %fault,
            "connection fault notified"
        );

        match fault.kind() {
            FaultKind::Disconnected => {
                manager.recover_from_disconnect(self.epoch, &fault).await;
            }
            FaultKind::Other => {
                // Narrow recovery scope: anything that is not a dropped
                // broker link is logged and left alone.
                info!(
                    event = events::FAULT_IGNORED,
                    component = COMPONENT,
                    manager = manager.name(),
                    kind = %fault.kind(),
                    "fault does not indicate a dropped broker link, no recovery"
                );
            }
        }
    }
}
