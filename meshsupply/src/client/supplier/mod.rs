// Copyright Andeya Lee 2024
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.
//!
//! Service instance list suppliers.
//!
//! A supplier is bound to one service and hands out its current instance list
//! on demand. Load balancers pick from the list; caching, health filtering and
//! retries are left to decorators wrapping a supplier.

use super::SupplierError;
use crate::client::discover::Instance;
use crate::BoxError;
pub use discovery::{Builder, DiscoveryClientSupplier};
use faststr::FastStr;
use futures::stream::BoxStream;
use std::sync::Arc;

mod discovery;

/// One-element stream carrying a full instance list.
pub type InstanceListStream = BoxStream<'static, Result<Vec<Arc<Instance>>, BoxError>>;

/// [`ServiceInstanceListSupplier`] supplies the instances of one service.
pub trait ServiceInstanceListSupplier: Send + Sync + 'static {
    /// The service this supplier is bound to.
    fn service_id(&self) -> &FastStr;
    /// Fetches the current instance list.
    ///
    /// Nothing happens until the stream is polled. Each call is an independent fetch.
    fn get(&self) -> InstanceListStream;
}

impl<T: ServiceInstanceListSupplier + ?Sized> ServiceInstanceListSupplier for Arc<T> {
    #[inline]
    fn service_id(&self) -> &FastStr {
        (**self).service_id()
    }

    #[inline]
    fn get(&self) -> InstanceListStream {
        (**self).get()
    }
}

/// [`SupplierBuilder`] validates its fields and builds a supplier.
pub trait SupplierBuilder {
    /// The supplier being built.
    type Supplier: ServiceInstanceListSupplier;
    /// Name of the supplier, used in error messages.
    const SUPPLIER_NAME: &'static str;

    /// Builds a supplier. Does not consume the builder.
    fn build(&self) -> Result<Self::Supplier, SupplierError>;

    /// Returns the field value, or [`SupplierError::RequiredFieldMissing`] naming `field`.
    fn required<'a, T>(value: &'a Option<T>, field: &'static str) -> Result<&'a T, SupplierError>
    where
        Self: Sized,
    {
        value.as_ref().ok_or_else(|| SupplierError::required_field_missing(field, Self::SUPPLIER_NAME))
    }
}
