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

//! Canonical structured event names used across `cnx-manager`.

// Resolver retry loop events.
pub const RESOLVE_ATTEMPT: &str = "resolve_attempt";
pub const RESOLVE_ATTEMPT_FAILED: &str = "resolve_attempt_failed";
pub const RESOLVE_OK: &str = "resolve_ok";

// Connection retry loop events.
pub const CONNECT_ATTEMPT: &str = "connect_attempt";
pub const CONNECT_ATTEMPT_FAILED: &str = "connect_attempt_failed";
pub const CONNECT_OK: &str = "connect_ok";
pub const RETRY_EXHAUSTED: &str = "retry_exhausted";

// Fault detection and failover events.
pub const FAULT_NOTIFIED: &str = "fault_notified";
pub const FAULT_IGNORED: &str = "fault_ignored";
pub const FAULT_STALE: &str = "fault_stale";
pub const FAILOVER_START: &str = "failover_start";
pub const FAILOVER_SELECTED: &str = "failover_selected";
pub const FAILOVER_NO_ALTERNATIVE: &str = "failover_no_alternative";
pub const RECOVERY_SKIPPED_CLOSING: &str = "recovery_skipped_closing";
pub const RECOVERY_ABANDONED: &str = "recovery_abandoned";

// Lifecycle events.
pub const MANAGER_CREATED: &str = "manager_created";
pub const STATE_TRANSITION: &str = "state_transition";
pub const DELIVERY_STARTED: &str = "delivery_started";
pub const DELIVERY_START_REJECTED: &str = "delivery_start_rejected";
pub const DISCONNECT_START: &str = "disconnect_start";
pub const DISCONNECT_COMPLETE: &str = "disconnect_complete";
pub const SESSION_CLOSE_FAILED: &str = "session_close_failed";
pub const CONNECTION_STOP_FAILED: &str = "connection_stop_failed";
pub const CONNECTION_CLOSE_FAILED: &str = "connection_close_failed";

// Subscription teardown events.
pub const UNSUBSCRIBE_START: &str = "unsubscribe_start";
pub const CONSUMER_CLOSE_FAILED: &str = "consumer_close_failed";
pub const UNSUBSCRIBE_OK: &str = "unsubscribe_ok";
pub const UNSUBSCRIBE_FAILED: &str = "unsubscribe_failed";
pub const UNSUBSCRIBE_SKIPPED: &str = "unsubscribe_skipped";
