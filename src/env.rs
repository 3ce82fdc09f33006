//! Point-in-time snapshot of the process environment
//!
//! The environment is read exactly once at startup. Every later step (config
//! loading, artifact planning) works off the snapshot, so tests can inject a
//! fixed set of variables instead of mutating global state.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::ops::Bound;

/// Ordered, immutable view of environment variables.
///
/// Variables are kept sorted by name, which makes prefix enumeration
/// deterministic within a run. Values that are not valid UTF-8 are only
/// reachable through [`EnvSnapshot::get_os`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
    raw: BTreeMap<String, OsString>,
}

impl EnvSnapshot {
    /// Capture the current process environment.
    ///
    /// Variables whose name is not valid UTF-8 are skipped.
    pub fn capture() -> Self {
        Self::from_os_pairs(std::env::vars_os())
    }

    /// Build a snapshot from explicit name/value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::from_os_pairs(
            pairs
                .into_iter()
                .map(|(k, v)| (OsString::from(k.into()), OsString::from(v.into()))),
        )
    }

    /// Build a snapshot from platform strings, as `std::env::vars_os` yields them
    pub fn from_os_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let mut snapshot = Self::default();
        for (name, value) in pairs {
            let Ok(name) = name.into_string() else {
                continue;
            };
            if let Some(value) = value.to_str() {
                snapshot.vars.insert(name.clone(), value.to_string());
            }
            snapshot.raw.insert(name, value);
        }
        snapshot
    }

    /// Raw value, including empty strings
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Raw platform value, present even when it is not valid UTF-8
    pub fn get_os(&self, name: &str) -> Option<&OsStr> {
        self.raw.get(name).map(OsString::as_os_str)
    }

    /// Value of `name` if it is set and non-empty
    pub fn non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }

    /// First non-empty value among `names`, checked in order
    pub fn first_non_empty(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|name| self.non_empty(name))
    }

    /// Variables whose name starts with `prefix`, in name order
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.vars
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |(name, _)| name.starts_with(prefix))
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
