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

//! # cnx-manager
//!
//! `cnx-manager` keeps one logical connection to a publish/subscribe broker
//! alive across broker failures. It resolves candidate endpoints through a
//! directory-style lookup, establishes a connection/session pair, watches the
//! live connection for asynchronous faults, and on a dropped broker link
//! fails over to another candidate and reconnects.
//!
//! Typical usage is API-first and remains centered on [`Endpoint`] and
//! [`ConnectionManager`]. Internal modules are organized by domain layer to
//! keep behavior ownership explicit.
//!
//! ## Vendor boundary
//!
//! The broker client library itself is a collaborator, consumed exclusively
//! through the trait seams in this crate: [`DirectoryResolver`],
//! [`BrokerConnector`], [`BrokerConnection`], [`BrokerSession`],
//! [`MessageConsumer`], and the [`ConnectionListener`] fault-notification
//! target the connector registers on every connection it creates. Faults
//! cross the boundary as [`BrokerFault`]; providers that only report free
//! text are classified by the documented textual adapter in
//! [`BrokerFault::kind`].
//!
//! ## Retry model
//!
//! Resolution and connection each retry with a fixed backoff, forever by
//! default: this manager prefers availability over fail-fast. The backoff
//! and an optional attempt cap are explicit [`RetryPolicy`] configuration.
//! `connect()` and fault-driven recovery are serialized against each other,
//! so two overlapping reconnect sequences can never interleave.
//!
//! ## Internal architecture map
//!
//! - API facade: outward [`Endpoint`]/[`ConnectionManager`] surface
//! - Control plane: endpoint registry/failover and the lifecycle state cell
//! - Recovery: resolve/connect retry loops and the fault monitor
//! - Runtime: scheduled execution boundary for individual retry attempts
//!
//! ## Observability model
//!
//! The workspace uses `tracing` for logs/events. Library code emits
//! events/spans and does not unconditionally initialize a global subscriber.
//! Binaries and tests are responsible for one-time `tracing_subscriber`
//! initialization at process boundaries.

mod broker;
pub use broker::{
    BrokerConnection, BrokerConnector, BrokerContext, BrokerFault, BrokerSession,
    ConnectionListener, DirectoryContext, DirectoryResolver, FaultKind, MessageConsumer,
};

mod connection_manager;
pub use connection_manager::{ConnectionManager, ManagerConfig, ManagerCreationError, StartError};

mod control_plane;
pub use control_plane::lifecycle::LifecycleState;

mod credentials;
pub use credentials::Credentials;

mod endpoint;
pub use endpoint::Endpoint;

#[doc(hidden)]
pub mod observability;

mod recovery;
pub use recovery::policy::{RetryExhausted, RetryPolicy};

mod runtime;

mod subscription;
pub use subscription::{DestinationKind, SubscriptionContext, SubscriptionDescriptor};
