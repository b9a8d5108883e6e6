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

//! Subscription identity and the per-subscription teardown policy.

use crate::broker::MessageConsumer;
use std::fmt;
use std::sync::Arc;

/// Whether a subscription targets a topic or a queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DestinationKind {
    Topic,
    Queue,
}

impl fmt::Display for DestinationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DestinationKind::Topic => write!(f, "topic"),
            DestinationKind::Queue => write!(f, "queue"),
        }
    }
}

/// Identity of one subscription: name, destination kind, durability.
#[derive(Clone, Debug)]
pub struct SubscriptionDescriptor {
    name: String,
    destination: DestinationKind,
    durable: bool,
}

impl SubscriptionDescriptor {
    pub fn new(name: &str, destination: DestinationKind, durable: bool) -> Self {
        Self {
            name: name.to_string(),
            destination,
            durable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn destination(&self) -> DestinationKind {
        self.destination
    }

    pub fn is_durable(&self) -> bool {
        self.durable
    }

    /// Teardown policy: only a non-durable topic subscription gets an explicit
    /// broker-side unsubscribe. Unsubscribing a durable topic would destroy
    /// state the durability exists to preserve, and queues have no
    /// subscription record to drop.
    pub fn requires_explicit_unsubscribe(&self) -> bool {
        self.destination == DestinationKind::Topic && !self.durable
    }
}

/// A subscription plus its consumer handle, handed in by the subscribing
/// collaborator for teardown. Valid until unsubscribe/close completes.
#[derive(Clone)]
pub struct SubscriptionContext {
    descriptor: SubscriptionDescriptor,
    consumer: Option<Arc<dyn MessageConsumer>>,
}

impl SubscriptionContext {
    pub fn new(descriptor: SubscriptionDescriptor) -> Self {
        Self {
            descriptor,
            consumer: None,
        }
    }

    pub fn with_consumer(
        descriptor: SubscriptionDescriptor,
        consumer: Arc<dyn MessageConsumer>,
    ) -> Self {
        Self {
            descriptor,
            consumer: Some(consumer),
        }
    }

    pub fn descriptor(&self) -> &SubscriptionDescriptor {
        &self.descriptor
    }

    pub fn consumer(&self) -> Option<&Arc<dyn MessageConsumer>> {
        self.consumer.as_ref()
    }
}
