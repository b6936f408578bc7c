// Copyright Andeya Lee 2024
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.
//!
//! Key-value configuration lookup used to resolve supplier settings.

use faststr::FastStr;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Property that holds the name of the service a supplier is built for.
pub const PROPERTY_NAME: &str = "loadbalancer.client.name";

/// [`Environment`] is a read-only property lookup.
pub trait Environment: Send + Sync + 'static {
    /// Returns the value of `name`, or `None` if it is not set.
    fn property(&self, name: &str) -> Option<FastStr>;
}

impl<E: Environment + ?Sized> Environment for Arc<E> {
    #[inline]
    fn property(&self, name: &str) -> Option<FastStr> {
        (**self).property(name)
    }
}

impl<E: Environment + ?Sized> Environment for Box<E> {
    #[inline]
    fn property(&self, name: &str) -> Option<FastStr> {
        (**self).property(name)
    }
}

/// In-memory properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapEnvironment {
    properties: HashMap<FastStr, FastStr>,
}

impl MapEnvironment {
    /// Creates an empty [`MapEnvironment`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a property and returns self.
    pub fn with_property(mut self, name: impl Into<FastStr>, value: impl Into<FastStr>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets a property, returning the previous value.
    pub fn insert(&mut self, name: impl Into<FastStr>, value: impl Into<FastStr>) -> Option<FastStr> {
        self.properties.insert(name.into(), value.into())
    }

    /// Removes a property, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<FastStr> {
        self.properties.remove(name)
    }

    /// Number of properties.
    #[inline]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether no property is set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for MapEnvironment
where
    K: Into<FastStr>,
    V: Into<FastStr>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            properties: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl Environment for MapEnvironment {
    fn property(&self, name: &str) -> Option<FastStr> {
        self.properties.get(name).cloned()
    }
}

/// Reads properties from process environment variables.
///
/// A lookup first tries the exact name, then its relaxed form: upper case,
/// with `.` and `-` replaced by `_`. So `loadbalancer.client.name` also
/// matches `LOADBALANCER_CLIENT_NAME`. With a prefix set, only prefixed
/// variables are consulted (`APP_` + `LOADBALANCER_CLIENT_NAME`).
#[derive(Debug, Clone)]
pub struct OsEnvironment {
    prefix: Option<FastStr>,
    lookup: fn(&str) -> Option<String>,
}

fn process_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

impl Default for OsEnvironment {
    fn default() -> Self {
        Self {
            prefix: None,
            lookup: process_var,
        }
    }
}

impl OsEnvironment {
    /// Creates an [`OsEnvironment`] without prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an [`OsEnvironment`] that only reads variables starting with `prefix`.
    pub fn with_prefix(prefix: impl Into<FastStr>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..Self::default()
        }
    }

    /// Replaces the variable lookup, [`std::env::var`] by default.
    pub fn with_lookup(mut self, lookup: fn(&str) -> Option<String>) -> Self {
        self.lookup = lookup;
        self
    }

    fn var(&self, key: &str) -> Option<FastStr> {
        let key = match &self.prefix {
            Some(prefix) => format!("{prefix}{key}"),
            None => key.to_owned(),
        };
        (self.lookup)(&key).map(FastStr::from_string)
    }
}

/// `loadbalancer.client-name` -> `LOADBALANCER_CLIENT_NAME`
fn relaxed_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '.' | '-' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

impl Environment for OsEnvironment {
    fn property(&self, name: &str) -> Option<FastStr> {
        self.var(name).or_else(|| self.var(&relaxed_name(name)))
    }
}
