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

//! Fault taxonomy at the vendor boundary.
//!
//! Providers that report structured fault kinds attach a [`FaultKind`]
//! directly. Providers that only report free text fall back to the textual
//! adapter in [`BrokerFault::kind`]: a case-insensitive substring match for
//! the broker-link-dropped marker. The adapter is a documented compatibility
//! path, not the preferred classification.

use std::error::Error;
use std::fmt;

const DISCONNECTED_MARKER: &str = "disconnected";

/// Classified kind of a broker fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultKind {
    /// The link to the broker was dropped; the server is treated as gone.
    Disconnected,
    /// Any other fault. Logged, never acted on.
    Other,
}

impl FaultKind {
    fn classify_text(text: &str) -> Self {
        if text.to_lowercase().contains(DISCONNECTED_MARKER) {
            FaultKind::Disconnected
        } else {
            FaultKind::Other
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::Disconnected => write!(f, "disconnected"),
            FaultKind::Other => write!(f, "other"),
        }
    }
}

/// A fault reported by the vendor broker client.
///
/// Plays the role of the vendor library's exception type: every vendor-facing
/// call returns `Result<_, BrokerFault>`, and the asynchronous
/// fault-notification callback receives one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrokerFault {
    kind: Option<FaultKind>,
    message: String,
}

impl BrokerFault {
    /// Builds a fault with an explicit, provider-supplied kind.
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind: Some(kind),
            message: message.into(),
        }
    }

    /// Builds an untyped fault carrying only free text. The kind is derived
    /// lazily via the textual adapter.
    pub fn from_text(message: impl Into<String>) -> Self {
        Self {
            kind: None,
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the provider-supplied kind when present, otherwise classifies
    /// the message text. An empty message classifies as [`FaultKind::Other`];
    /// classification itself never fails.
    pub fn kind(&self) -> FaultKind {
        self.kind
            .unwrap_or_else(|| FaultKind::classify_text(&self.message))
    }
}

impl fmt::Display for BrokerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "unspecified broker fault")
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl Error for BrokerFault {}
