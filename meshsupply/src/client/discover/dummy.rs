// Modifications Copyright Andeya Lee 2024
// Based on original source code from Volo Contributors licensed under MIT OR Apache-2.0
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.
//!
//! Dummy discover.

use super::{Discover, Instance};
use crate::BoxError;
use std::sync::Arc;

/// [`DummyDiscover`] always returns an empty list.
///
/// Users that don't specify the address directly need to use their own [`Discover`].
#[derive(Clone, Debug, Default)]
pub struct DummyDiscover;

impl Discover for DummyDiscover {
    fn description(&self) -> &str {
        "DummyDiscover"
    }

    fn instances(&self, _: &str) -> Result<Vec<Arc<Instance>>, BoxError> {
        Ok(vec![])
    }
}
