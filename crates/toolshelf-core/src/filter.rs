//! Facet filter engine.
//!
//! A [`FacetSelection`] maps property keys to the option values the user
//! picked. An item passes when, for **every** constrained key, it declares
//! **at least one** of the picked values (AND across keys, OR within a key).
//! Comparison is case-insensitive. An item that declares nothing for a
//! constrained key never passes that constraint.

use anyhow::{bail, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::models::CatalogItem;

/// Selected facet values per property key.
///
/// Keys with an empty value list are not constraints and are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FacetSelection(BTreeMap<String, Vec<String>>);

impl<'de> Deserialize<'de> for FacetSelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Vec<String>>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .fold(Self::new(), |sel, (key, values)| sel.with(key.trim(), values)))
    }
}

impl FacetSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a selection with `values` selected for `key`, replacing any
    /// previous choice for that key.
    pub fn with<I, S>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut picked: Vec<String> = Vec::new();
        for v in values {
            let v: String = v.into();
            let v = v.trim();
            if !v.is_empty() && !picked.iter().any(|p| p == v) {
                picked.push(v.to_string());
            }
        }
        if picked.is_empty() {
            self.0.remove(key);
        } else {
            self.0.insert(key.to_string(), picked);
        }
        self
    }

    /// Return a selection with `value` added to `key`, or removed if it was
    /// already selected.
    pub fn toggled(&self, key: &str, value: &str) -> Self {
        let mut values = self.0.get(key).cloned().unwrap_or_default();
        match values.iter().position(|v| v == value) {
            Some(i) => {
                values.remove(i);
            }
            None => values.push(value.to_string()),
        }
        self.clone().with(key, values)
    }

    /// Return a selection without any constraint on `key`.
    pub fn cleared(&self, key: &str) -> Self {
        let mut next = self.clone();
        next.0.remove(key);
        next
    }

    /// Build from `(key, "v1,v2")` pairs. Repeated keys accumulate.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut sel = Self::new();
        for (key, raw) in pairs {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            let mut values = sel.0.get(key).cloned().unwrap_or_default();
            values.extend(raw.split(',').map(str::to_string));
            sel = sel.with(key, values);
        }
        sel
    }

    /// Parse CLI-style `key=v1,v2` arguments.
    pub fn parse_args<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        let mut pairs = Vec::with_capacity(args.len());
        for arg in args {
            let arg = arg.as_ref();
            let Some((key, values)) = arg.split_once('=') else {
                bail!("invalid filter '{}': expected KEY=VALUE[,VALUE...]", arg);
            };
            if key.trim().is_empty() {
                bail!("invalid filter '{}': key must not be empty", arg);
            }
            pairs.push((key, values));
        }
        Ok(Self::from_pairs(pairs))
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    /// Active constraints in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Whether `item` satisfies every active constraint in `selected`.
pub fn matches_filters(item: &CatalogItem, selected: &FacetSelection) -> bool {
    selected.iter().all(|(key, wanted)| {
        let have: HashSet<String> = item
            .values_for(key)
            .into_iter()
            .map(str::to_lowercase)
            .collect();
        if wanted.is_empty() {
            return true;
        }
        if have.is_empty() {
            return false;
        }
        wanted
            .iter()
            .any(|w| have.contains(&w.trim().to_lowercase()))
    })
}
