// Copyright Andeya Lee 2024
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.
//!
//! meshsupply turns service discovery sources into instance-list suppliers
//! for client-side load balancing.
//!
//! ```no_run
//! use futures::StreamExt;
//! use meshsupply::client::discover::FixedDiscover;
//! use meshsupply::client::supplier::{DiscoveryClientSupplier, ServiceInstanceListSupplier};
//! use meshsupply::env::{MapEnvironment, PROPERTY_NAME};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let discover = FixedDiscover::from_address_str("orders", vec!["127.0.0.1:8000"])?;
//! let supplier = DiscoveryClientSupplier::builder()
//!     .with_discovery_source(discover)
//!     .with_environment(MapEnvironment::new().with_property(PROPERTY_NAME, "orders"))
//!     .build()?;
//! let instances = supplier.get().next().await.unwrap()?;
//! # Ok(())
//! # }
//! ```
#![deny(missing_docs)]
#![allow(clippy::type_complexity)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod client;
pub mod env;
pub mod net;

/// Type-erased error returned by discovery sources.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
