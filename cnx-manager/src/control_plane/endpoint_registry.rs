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

//! Candidate endpoint set and failover selection.

use crate::endpoint::Endpoint;
use std::error::Error;
use std::fmt;

/// Construction failure: a registry needs at least one endpoint.
#[derive(Debug)]
pub(crate) struct EmptyEndpointSet;

impl fmt::Display for EmptyEndpointSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "endpoint set must contain at least one endpoint")
    }
}

impl Error for EmptyEndpointSet {}

/// Unique, insertion-ordered set of candidate endpoints plus the active one.
///
/// Invariant: `active` always indexes a member. Mutation happens only behind
/// the manager's guard, so concurrent fault-path reads of the active endpoint
/// go through that same guard.
pub(crate) struct EndpointRegistry {
    endpoints: Vec<Endpoint>,
    active: usize,
}

impl EndpointRegistry {
    /// Builds a registry from the candidate set, deduplicating by value and
    /// keeping first occurrences. The preferred endpoint (matched by name)
    /// becomes active; an unknown or absent preference falls back to the
    /// first endpoint.
    pub(crate) fn new(
        endpoints: Vec<Endpoint>,
        preferred: Option<&str>,
    ) -> Result<Self, EmptyEndpointSet> {
        let mut unique: Vec<Endpoint> = Vec::with_capacity(endpoints.len());
        for endpoint in endpoints {
            if !unique.contains(&endpoint) {
                unique.push(endpoint);
            }
        }

        if unique.is_empty() {
            return Err(EmptyEndpointSet);
        }

        let active = preferred
            .and_then(|name| unique.iter().position(|e| e.name() == name))
            .unwrap_or(0);

        Ok(Self {
            endpoints: unique,
            active,
        })
    }

    pub(crate) fn active(&self) -> &Endpoint {
        &self.endpoints[self.active]
    }

    /// Makes the first endpoint in iteration order that differs from the
    /// active one the new active endpoint and returns it. Returns `None`
    /// without touching the active endpoint when no alternative exists.
    pub(crate) fn failover(&mut self) -> Option<&Endpoint> {
        let current = self.active;
        let replacement = self
            .endpoints
            .iter()
            .position(|candidate| *candidate != self.endpoints[current])?;

        self.active = replacement;
        Some(&self.endpoints[self.active])
    }

    pub(crate) fn len(&self) -> usize {
        self.endpoints.len()
    }
}
