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

//! Live vendor resources held while a logical connection is established.

use crate::broker::traits::{BrokerConnection, BrokerSession, DirectoryContext};
use std::sync::Arc;

/// The connection/session pair returned by a successful connector call.
///
/// Either handle may be absent: a provider can hand back a partially built
/// context, and teardown must tolerate whichever half is missing.
#[derive(Clone)]
pub struct BrokerContext {
    connection: Option<Arc<dyn BrokerConnection>>,
    session: Option<Arc<dyn BrokerSession>>,
}

impl BrokerContext {
    pub fn new(connection: Arc<dyn BrokerConnection>, session: Arc<dyn BrokerSession>) -> Self {
        Self {
            connection: Some(connection),
            session: Some(session),
        }
    }

    /// Builds a context with possibly missing halves. Intended for providers
    /// that fail partway through session creation.
    pub fn from_parts(
        connection: Option<Arc<dyn BrokerConnection>>,
        session: Option<Arc<dyn BrokerSession>>,
    ) -> Self {
        Self {
            connection,
            session,
        }
    }

    pub fn connection(&self) -> Option<&Arc<dyn BrokerConnection>> {
        self.connection.as_ref()
    }

    pub fn session(&self) -> Option<&Arc<dyn BrokerSession>> {
        self.session.as_ref()
    }
}

/// Everything the manager holds for one established logical connection.
///
/// Replaced wholesale when a reconnection succeeds, never mutated in place.
/// The epoch tags which recovery generation installed it; fault notifications
/// carrying an older epoch are stale.
#[derive(Clone)]
pub(crate) struct ConnectionContext {
    pub(crate) directory: Arc<dyn DirectoryContext>,
    pub(crate) broker: BrokerContext,
    pub(crate) epoch: u64,
}
