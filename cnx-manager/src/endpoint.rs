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

use std::fmt;

///
/// [`Endpoint`] identifies one candidate broker: a human-readable name plus the
/// provider URL the directory resolver is pointed at. Endpoints are immutable
/// once constructed; the registry holds them and other components borrow them.
///
/// # Examples
///
/// ```
/// use cnx_manager::Endpoint;
///
/// let primary = Endpoint::new("primary", "tcp://broker-a.example:61616");
/// assert_eq!(primary.provider_url(), "tcp://broker-a.example:61616");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint {
    name: String,
    provider_url: String,
}

impl Endpoint {
    pub fn new(name: &str, provider_url: &str) -> Self {
        Self {
            name: name.to_string(),
            provider_url: provider_url.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provider_url(&self) -> &str {
        &self.provider_url
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.provider_url)
    }
}
