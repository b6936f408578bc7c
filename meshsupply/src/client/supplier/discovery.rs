// Copyright Andeya Lee 2024
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.
//! Discovery source backed supplier.

use super::{InstanceListStream, ServiceInstanceListSupplier, SupplierBuilder};
use crate::client::discover::{Discover, DiscoverySource, ReactiveDiscover};
use crate::client::SupplierError;
use crate::env::{Environment, PROPERTY_NAME};
use crate::BoxError;
use faststr::FastStr;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

/// A [`ServiceInstanceListSupplier`] that asks a [`DiscoverySource`] on every [`get`](ServiceInstanceListSupplier::get).
///
/// A [`DiscoverySource::Pull`] source is called on the tokio blocking pool: the one
/// set with [`DiscoveryClientSupplier::with_blocking_handle`], else the pool of the
/// runtime `get` is polled in. Polled outside a runtime without a handle, the stream
/// yields an error instead of listing. A [`DiscoverySource::Push`] source is
/// subscribed directly and collected until it completes.
///
/// No caching, filtering or retries. Errors of the source are yielded as is.
#[derive(Clone)]
pub struct DiscoveryClientSupplier {
    service_id: FastStr,
    source: DiscoverySource,
    blocking_handle: Option<Handle>,
}

impl DiscoveryClientSupplier {
    /// Creates a supplier for the service named by [`PROPERTY_NAME`] in `environment`.
    pub fn new(source: DiscoverySource, environment: &dyn Environment) -> Self {
        let service_id = environment.property(PROPERTY_NAME).unwrap_or_else(|| {
            warn!(property = PROPERTY_NAME, source = source.description(), "service id is not configured, using an empty one");
            FastStr::empty()
        });
        Self {
            service_id,
            source,
            blocking_handle: None,
        }
    }

    /// Creates a supplier over a pull-style source.
    pub fn from_discover<D: Discover>(discover: D, environment: &dyn Environment) -> Self {
        Self::new(DiscoverySource::pull(discover), environment)
    }

    /// Creates a supplier over a push-style source.
    pub fn from_reactive<D: ReactiveDiscover>(discover: D, environment: &dyn Environment) -> Self {
        Self::new(DiscoverySource::push(discover), environment)
    }

    /// Runs pull-style fetches on the blocking pool of `handle`.
    pub fn with_blocking_handle(mut self, handle: Handle) -> Self {
        self.blocking_handle = Some(handle);
        self
    }

    /// The underlying discovery source.
    #[inline]
    pub fn source(&self) -> &DiscoverySource {
        &self.source
    }

    /// Returns an empty [`Builder`].
    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Returns a [`Builder`] with both fields preset.
    ///
    /// Either may be `None`; that is reported by [`Builder::build`].
    pub fn builder_with(source: Option<DiscoverySource>, environment: Option<Arc<dyn Environment>>) -> Builder {
        Builder {
            discovery_source: source,
            environment,
            blocking_handle: None,
        }
    }
}

impl fmt::Debug for DiscoveryClientSupplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoveryClientSupplier")
            .field("service_id", &self.service_id)
            .field("source", &self.source)
            .finish()
    }
}

impl ServiceInstanceListSupplier for DiscoveryClientSupplier {
    fn service_id(&self) -> &FastStr {
        &self.service_id
    }

    fn get(&self) -> InstanceListStream {
        let service_id = self.service_id.clone();
        match &self.source {
            DiscoverySource::Pull(discover) => {
                let discover = discover.clone();
                let handle = self.blocking_handle.clone();
                stream::once(async move {
                    trace!(service_id = %service_id, source = discover.description(), "listing instances");
                    let list = move || discover.instances(&service_id);
                    let task = match handle {
                        Some(handle) => handle.spawn_blocking(list),
                        None => Handle::try_current().map_err(BoxError::from)?.spawn_blocking(list),
                    };
                    let instances = task.await??;
                    Ok::<_, BoxError>(instances)
                })
                .boxed()
            },
            DiscoverySource::Push(discover) => {
                let discover = discover.clone();
                stream::once(async move {
                    trace!(service_id = %service_id, source = discover.description(), "subscribing to instances");
                    discover.instances(&service_id).try_collect::<Vec<_>>().await
                })
                .boxed()
            },
        }
    }
}

/// Builds a [`DiscoveryClientSupplier`].
///
/// The shape of an untyped source is checked when it is set, presence of both
/// the source and the environment only when building. A builder can therefore be
/// filled in over several call sites.
#[derive(Clone, Default)]
pub struct Builder {
    discovery_source: Option<DiscoverySource>,
    environment: Option<Arc<dyn Environment>>,
    blocking_handle: Option<Handle>,
}

impl Builder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the discovery source, replacing any previous one.
    pub fn with_discovery_source(&mut self, source: impl Into<DiscoverySource>) -> &mut Self {
        self.discovery_source = Some(source.into());
        self
    }

    /// Sets the discovery source from an untyped reference.
    ///
    /// Fails with [`SupplierError::InvalidArgument`] unless `source` holds an
    /// `Arc<dyn Discover>`, an `Arc<dyn ReactiveDiscover>` or a [`DiscoverySource`];
    /// the current source is kept in that case.
    pub fn with_discovery_object(&mut self, source: Box<dyn Any + Send + Sync>) -> Result<&mut Self, SupplierError> {
        let source = DiscoverySource::try_from(source)?;
        Ok(self.with_discovery_source(source))
    }

    /// Sets the environment the service id is read from.
    pub fn with_environment<E: Environment>(&mut self, environment: E) -> &mut Self {
        self.environment = Some(Arc::new(environment));
        self
    }

    /// Unsets the environment.
    pub fn clear_environment(&mut self) -> &mut Self {
        self.environment = None;
        self
    }

    /// Runs pull-style fetches of built suppliers on the blocking pool of `handle`.
    pub fn with_blocking_handle(&mut self, handle: Handle) -> &mut Self {
        self.blocking_handle = Some(handle);
        self
    }

    /// The discovery source set so far.
    #[inline]
    pub fn discovery_source(&self) -> Option<&DiscoverySource> {
        self.discovery_source.as_ref()
    }

    /// Whether an environment is set.
    #[inline]
    pub fn has_environment(&self) -> bool {
        self.environment.is_some()
    }

    /// Builds a supplier. Can be called repeatedly; each call returns an independent supplier.
    #[inline]
    pub fn build(&self) -> Result<DiscoveryClientSupplier, SupplierError> {
        <Self as SupplierBuilder>::build(self)
    }
}

impl SupplierBuilder for Builder {
    type Supplier = DiscoveryClientSupplier;

    const SUPPLIER_NAME: &'static str = "DiscoveryClientSupplier";

    fn build(&self) -> Result<Self::Supplier, SupplierError> {
        let source = Self::required(&self.discovery_source, "discoverySource")?;
        let environment = Self::required(&self.environment, "environment")?;
        let mut supplier = DiscoveryClientSupplier::new(source.clone(), &**environment);
        supplier.blocking_handle = self.blocking_handle.clone();
        debug!(
            service_id = %supplier.service_id,
            source = source.description(),
            pull = source.is_pull(),
            "built {}",
            Self::SUPPLIER_NAME
        );
        Ok(supplier)
    }
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("discovery_source", &self.discovery_source)
            .field("environment", &self.environment.is_some())
            .field("blocking_handle", &self.blocking_handle.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::discover::{DummyDiscover, FixedDiscover, FixedReactiveDiscover, Instance};
    use crate::env::MapEnvironment;
    use crate::net::Address;
    use assert_matches::assert_matches;

    fn env(service_id: &'static str) -> MapEnvironment {
        MapEnvironment::new().with_property(PROPERTY_NAME, service_id)
    }

    fn instance(addr: &str) -> Arc<Instance> {
        Arc::new(Instance::new("orders", addr.parse::<Address>().unwrap()))
    }

    #[test]
    fn test_build_pull() {
        let supplier = DiscoveryClientSupplier::builder()
            .with_discovery_source(FixedDiscover::new("orders", vec![]))
            .with_environment(env("orders"))
            .build()
            .unwrap();
        assert_eq!(supplier.service_id().as_str(), "orders");
        assert!(supplier.source().is_pull());
    }

    #[test]
    fn test_build_push() {
        let supplier = DiscoveryClientSupplier::builder()
            .with_discovery_source(FixedReactiveDiscover::default())
            .with_environment(env("payments"))
            .build()
            .unwrap();
        assert_eq!(supplier.service_id().as_str(), "payments");
        assert!(!supplier.source().is_pull());
    }

    #[test]
    fn test_build_missing_fields() {
        let err = Builder::new().build().unwrap_err();
        assert_eq!(err, SupplierError::required_field_missing("discoverySource", Builder::SUPPLIER_NAME));
        let msg = err.to_string();
        assert!(msg.contains("discoverySource"), "{msg}");
        assert!(msg.contains("DiscoveryClientSupplier"), "{msg}");

        let err = Builder::new().with_discovery_source(DummyDiscover).build().unwrap_err();
        assert_matches!(err, SupplierError::RequiredFieldMissing { field: "environment", .. });

        let err = Builder::new().with_environment(env("orders")).build().unwrap_err();
        assert_matches!(err, SupplierError::RequiredFieldMissing { field: "discoverySource", .. });
    }

    fn build_generic<B: SupplierBuilder>(builder: &B) -> Result<B::Supplier, SupplierError> {
        builder.build()
    }

    #[test]
    fn test_build_through_trait() {
        let mut builder = Builder::new();
        assert_matches!(build_generic(&builder), Err(SupplierError::RequiredFieldMissing { field: "discoverySource", .. }));
        builder.with_discovery_source(DummyDiscover).with_environment(env("orders"));
        let supplier = build_generic(&builder).unwrap();
        assert_eq!(supplier.service_id().as_str(), "orders");
        assert_eq!(builder.build().unwrap().service_id().as_str(), "orders");
    }

    #[test]
    fn test_clear_environment() {
        let mut builder = Builder::new();
        builder.with_discovery_source(DummyDiscover).with_environment(env("orders"));
        assert!(builder.build().is_ok());
        builder.clear_environment();
        assert!(!builder.has_environment());
        assert_matches!(builder.build(), Err(SupplierError::RequiredFieldMissing { field: "environment", .. }));
    }

    #[test]
    fn test_invalid_object_keeps_source() {
        let mut builder = Builder::new();
        builder.with_discovery_source(FixedReactiveDiscover::default());
        let err = builder.with_discovery_object(Box::new(42u32)).unwrap_err();
        assert_matches!(err, SupplierError::InvalidArgument(_));
        assert_matches!(builder.discovery_source(), Some(DiscoverySource::Push(_)));

        let pull: Arc<dyn Discover> = Arc::new(DummyDiscover);
        builder.with_discovery_object(Box::new(pull)).unwrap();
        assert_matches!(builder.discovery_source(), Some(DiscoverySource::Pull(_)));
    }

    #[test]
    fn test_preset_builder() {
        let builder = DiscoveryClientSupplier::builder_with(None, Some(Arc::new(env("orders"))));
        assert_matches!(builder.build(), Err(SupplierError::RequiredFieldMissing { field: "discoverySource", .. }));

        let builder = DiscoveryClientSupplier::builder_with(Some(DummyDiscover.into()), Some(Arc::new(env("orders"))));
        assert_eq!(builder.build().unwrap().service_id().as_str(), "orders");
    }

    #[test]
    fn test_missing_service_id() {
        let supplier = DiscoveryClientSupplier::from_discover(DummyDiscover, &MapEnvironment::new());
        assert_eq!(supplier.service_id().as_str(), "");
    }

    #[tokio::test]
    async fn test_get_pull() {
        let supplier = DiscoveryClientSupplier::from_discover(
            FixedDiscover::new("orders", vec![instance("127.0.0.1:8000"), instance("127.0.0.1:8001")]),
            &env("orders"),
        );
        let lists: Vec<_> = supplier.get().try_collect().await.unwrap();
        assert_eq!(lists, vec![vec![instance("127.0.0.1:8000"), instance("127.0.0.1:8001")]]);
    }

    #[test]
    fn test_get_push_without_runtime() {
        let supplier = DiscoveryClientSupplier::from_reactive(FixedReactiveDiscover::new("orders", vec![instance("127.0.0.1:8000")]), &env("orders"));
        let lists: Vec<_> = futures::executor::block_on(supplier.get().try_collect()).unwrap();
        assert_eq!(lists, vec![vec![instance("127.0.0.1:8000")]]);
    }

    #[test]
    fn test_get_pull_without_runtime_yields_error() {
        let supplier = DiscoveryClientSupplier::from_discover(FixedDiscover::new("orders", vec![instance("127.0.0.1:8000")]), &env("orders"));
        let mut lists = supplier.get();
        let res = futures::executor::block_on(lists.next()).unwrap();
        assert!(res.is_err());
        assert!(futures::executor::block_on(lists.next()).is_none());
    }

    #[test]
    fn test_get_pull_with_blocking_handle() {
        let runtime = tokio::runtime::Builder::new_multi_thread().worker_threads(1).build().unwrap();
        let supplier = DiscoveryClientSupplier::builder()
            .with_discovery_source(FixedDiscover::new("orders", vec![instance("127.0.0.1:8000")]))
            .with_environment(env("orders"))
            .with_blocking_handle(runtime.handle().clone())
            .build()
            .unwrap();
        // Polled outside of any runtime.
        let lists: Vec<_> = futures::executor::block_on(supplier.get().try_collect()).unwrap();
        assert_eq!(lists, vec![vec![instance("127.0.0.1:8000")]]);
    }
}
