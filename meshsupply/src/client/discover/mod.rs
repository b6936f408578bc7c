// Modifications Copyright Andeya Lee 2024
// Based on original source code from Volo Contributors licensed under MIT OR Apache-2.0
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.
//!
//! Service instance discovery.
//!
//! A discovery source answers "which instances currently serve service X".
//! It comes in two shapes: [`Discover`] lists instances synchronously (and
//! may block), [`ReactiveDiscover`] hands out a lazy stream of instances.
//! [`DiscoverySource`] holds either one.

use super::SupplierError;
use crate::net::address::Address;
use crate::BoxError;
pub use dummy::DummyDiscover;
use faststr::FastStr;
pub use fixed::{FixedDiscover, FixedReactiveDiscover};
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

mod dummy;
mod fixed;

/// Name of the pull capability, used in error messages.
pub const DISCOVER_NAME: &str = "Discover";
/// Name of the push capability, used in error messages.
pub const REACTIVE_DISCOVER_NAME: &str = "ReactiveDiscover";

/// [`Discover`] lists the instances of a service on demand.
///
/// Implementations may block, e.g. on a registry round trip. Callers that must
/// not block should run it on a blocking pool.
pub trait Discover: Send + Sync + 'static {
    /// A human readable description, used for logging.
    fn description(&self) -> &str {
        DISCOVER_NAME
    }
    /// Returns all instances of `service_id`, in registry order.
    fn instances(&self, service_id: &str) -> Result<Vec<Arc<Instance>>, BoxError>;
    /// Returns the known service ids.
    fn services(&self) -> Result<Vec<FastStr>, BoxError> {
        Ok(vec![])
    }
}

/// [`ReactiveDiscover`] streams the instances of a service.
///
/// Every call to [`ReactiveDiscover::instances`] starts an independent
/// subscription; dropping the stream cancels it.
pub trait ReactiveDiscover: Send + Sync + 'static {
    /// A human readable description, used for logging.
    fn description(&self) -> &str {
        REACTIVE_DISCOVER_NAME
    }
    /// Streams all instances of `service_id`, then completes.
    fn instances(&self, service_id: &str) -> BoxStream<'static, Result<Arc<Instance>, BoxError>>;
    /// Streams the known service ids.
    fn services(&self) -> BoxStream<'static, Result<FastStr, BoxError>> {
        stream::empty().boxed()
    }
}

/// [`Instance`] contains information of an instance from the target service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// service id the instance belongs to
    pub service_id: FastStr,
    /// registry specific instance id
    #[serde(default)]
    pub instance_id: Option<FastStr>,
    /// service address
    pub address: Address,
    /// service weight
    #[serde(default = "default_weight")]
    pub weight: u32,
    /// whether the instance is reached over a secure transport
    #[serde(default)]
    pub secure: bool,
    /// service tags extension
    #[serde(default)]
    pub tags: HashMap<Cow<'static, str>, Cow<'static, str>>,
}

fn default_weight() -> u32 {
    1
}

impl Instance {
    /// Creates an instance with weight 1 and no tags.
    pub fn new(service_id: impl Into<FastStr>, address: impl Into<Address>) -> Self {
        Self {
            service_id: service_id.into(),
            instance_id: None,
            address: address.into(),
            weight: default_weight(),
            secure: false,
            tags: Default::default(),
        }
    }

    /// Sets the instance id.
    pub fn with_instance_id(mut self, instance_id: impl Into<FastStr>) -> Self {
        self.instance_id = Some(instance_id.into());
        self
    }

    /// Sets the weight.
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    /// Marks the instance as secure.
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Adds a tag.
    pub fn with_tag(mut self, key: impl Into<Cow<'static, str>>, value: impl Into<Cow<'static, str>>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Returns `http://ip:port` or `https://ip:port`, `None` for unix sockets.
    pub fn uri(&self) -> Option<String> {
        let addr = self.address.ip()?;
        let scheme = if self.secure { "https" } else { "http" };
        Some(format!("{scheme}://{addr}"))
    }
}

/// A discovery source of either shape.
#[derive(Clone)]
pub enum DiscoverySource {
    /// Synchronous listing, see [`Discover`].
    Pull(Arc<dyn Discover>),
    /// Asynchronous listing, see [`ReactiveDiscover`].
    Push(Arc<dyn ReactiveDiscover>),
}

impl DiscoverySource {
    /// Wraps a [`Discover`].
    pub fn pull<D: Discover>(discover: D) -> Self {
        Self::Pull(Arc::new(discover))
    }

    /// Wraps a [`ReactiveDiscover`].
    pub fn push<D: ReactiveDiscover>(discover: D) -> Self {
        Self::Push(Arc::new(discover))
    }

    /// Description of the wrapped source.
    pub fn description(&self) -> &str {
        match self {
            Self::Pull(d) => d.description(),
            Self::Push(d) => d.description(),
        }
    }

    /// Whether this is a [`DiscoverySource::Pull`].
    #[inline]
    pub fn is_pull(&self) -> bool {
        matches!(self, Self::Pull(_))
    }
}

impl fmt::Debug for DiscoverySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pull(d) => f.debug_tuple("Pull").field(&d.description()).finish(),
            Self::Push(d) => f.debug_tuple("Push").field(&d.description()).finish(),
        }
    }
}

impl From<Arc<dyn Discover>> for DiscoverySource {
    fn from(discover: Arc<dyn Discover>) -> Self {
        Self::Pull(discover)
    }
}

impl From<Arc<dyn ReactiveDiscover>> for DiscoverySource {
    fn from(discover: Arc<dyn ReactiveDiscover>) -> Self {
        Self::Push(discover)
    }
}

impl From<FixedDiscover> for DiscoverySource {
    fn from(discover: FixedDiscover) -> Self {
        Self::pull(discover)
    }
}

impl From<DummyDiscover> for DiscoverySource {
    fn from(discover: DummyDiscover) -> Self {
        Self::pull(discover)
    }
}

impl From<FixedReactiveDiscover> for DiscoverySource {
    fn from(discover: FixedReactiveDiscover) -> Self {
        Self::push(discover)
    }
}

/// Accepts an untyped reference, e.g. one taken out of a dependency container.
///
/// The boxed value must be an `Arc<dyn Discover>`, an `Arc<dyn ReactiveDiscover>`
/// or a [`DiscoverySource`].
impl TryFrom<Box<dyn Any + Send + Sync>> for DiscoverySource {
    type Error = SupplierError;

    fn try_from(value: Box<dyn Any + Send + Sync>) -> Result<Self, Self::Error> {
        let value = match value.downcast::<DiscoverySource>() {
            Ok(source) => return Ok(*source),
            Err(value) => value,
        };
        let value = match value.downcast::<Arc<dyn Discover>>() {
            Ok(discover) => return Ok(Self::Pull(*discover)),
            Err(value) => value,
        };
        match value.downcast::<Arc<dyn ReactiveDiscover>>() {
            Ok(discover) => Ok(Self::Push(*discover)),
            Err(_) => Err(SupplierError::InvalidArgument(FastStr::from_string(format!(
                "Field discoverySource must be of type {DISCOVER_NAME} or {REACTIVE_DISCOVER_NAME}"
            )))),
        }
    }
}
