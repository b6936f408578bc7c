// Copyright Andeya Lee 2024
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.
//!
//! Client side building blocks: discovery sources and the instance-list suppliers built on them.

pub mod discover;
pub mod supplier;

use faststr::FastStr;

/// Errors raised while assembling a supplier.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SupplierError {
    /// A value of an unsupported shape was handed to a builder.
    #[error("{0}")]
    InvalidArgument(FastStr),
    /// A required builder field was not set when building.
    #[error("The {field} field/s of {supplier} cannot be null")]
    RequiredFieldMissing {
        /// Name of the missing field.
        field: &'static str,
        /// Name of the supplier being built.
        supplier: &'static str,
    },
}

impl SupplierError {
    /// Creates a [`SupplierError::RequiredFieldMissing`].
    #[inline]
    pub fn required_field_missing(field: &'static str, supplier: &'static str) -> Self {
        Self::RequiredFieldMissing { field, supplier }
    }
}
