// Modifications Copyright Andeya Lee 2024
// Based on original source code from Volo Contributors licensed under MIT OR Apache-2.0
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.
//!
//! Fixed instance list discover.

use super::{Discover, Instance, ReactiveDiscover};
use crate::net::address::Address;
use crate::BoxError;
use faststr::FastStr;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::HashMap;
use std::net::AddrParseError;
use std::sync::Arc;

/// [`FixedDiscover`] is a simple implementation of [`Discover`] that returns a fixed list of instances
/// per service. Unknown services have no instances.
#[derive(Clone, Debug, Default)]
pub struct FixedDiscover {
    services: HashMap<FastStr, Vec<Arc<Instance>>>,
}

impl FixedDiscover {
    /// Creates a new [`FixedDiscover`] serving `instances` for `service_id`.
    pub fn new(service_id: impl Into<FastStr>, instances: Vec<Arc<Instance>>) -> Self {
        Self::default().with_instances(service_id, instances)
    }

    /// Creates a new [`FixedDiscover`] from addresses, each with weight 1.
    pub fn from_address(service_id: impl Into<FastStr>, addrs: Vec<Address>) -> Self {
        let service_id = service_id.into();
        let instances = addrs
            .into_iter()
            .map(|addr| Arc::new(Instance::new(service_id.clone(), addr)))
            .collect();
        Self::new(service_id, instances)
    }

    /// Creates a new [`FixedDiscover`] from address strings.
    pub fn from_address_str<S: AsRef<str>>(service_id: impl Into<FastStr>, addrs: Vec<S>) -> Result<Self, AddrParseError> {
        let addrs = addrs.iter().map(|addr| addr.as_ref().parse()).collect::<Result<Vec<Address>, _>>()?;
        Ok(Self::from_address(service_id, addrs))
    }

    /// Replaces the instances of `service_id`.
    pub fn with_instances(mut self, service_id: impl Into<FastStr>, instances: Vec<Arc<Instance>>) -> Self {
        self.services.insert(service_id.into(), instances);
        self
    }

    fn get(&self, service_id: &str) -> Vec<Arc<Instance>> {
        self.services.get(service_id).cloned().unwrap_or_default()
    }
}

impl Discover for FixedDiscover {
    fn description(&self) -> &str {
        "FixedDiscover"
    }

    fn instances(&self, service_id: &str) -> Result<Vec<Arc<Instance>>, BoxError> {
        Ok(self.get(service_id))
    }

    fn services(&self) -> Result<Vec<FastStr>, BoxError> {
        Ok(self.services.keys().cloned().collect())
    }
}

/// [`FixedReactiveDiscover`] replays the instances of a [`FixedDiscover`] as a stream, once per
/// subscription.
#[derive(Clone, Debug, Default)]
pub struct FixedReactiveDiscover {
    inner: FixedDiscover,
}

impl FixedReactiveDiscover {
    /// Creates a new [`FixedReactiveDiscover`] serving `instances` for `service_id`.
    pub fn new(service_id: impl Into<FastStr>, instances: Vec<Arc<Instance>>) -> Self {
        FixedDiscover::new(service_id, instances).into()
    }
}

impl From<FixedDiscover> for FixedReactiveDiscover {
    fn from(inner: FixedDiscover) -> Self {
        Self { inner }
    }
}

impl ReactiveDiscover for FixedReactiveDiscover {
    fn description(&self) -> &str {
        "FixedReactiveDiscover"
    }

    fn instances(&self, service_id: &str) -> BoxStream<'static, Result<Arc<Instance>, BoxError>> {
        stream::iter(self.inner.get(service_id).into_iter().map(Ok)).boxed()
    }

    fn services(&self) -> BoxStream<'static, Result<FastStr, BoxError>> {
        stream::iter(self.inner.services.keys().cloned().map(Ok).collect::<Vec<_>>()).boxed()
    }
}
