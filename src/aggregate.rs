//! Server-side aggregations over a collection or query.
//!
//! An [`AggregateSpec`] names each aggregation by an alias; the backend answers
//! with an [`AggregateData`] holding one number per alias.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Alias used by [`AggregateSpec::count`]
pub const COUNT_ALIAS: &str = "count";

/// A single aggregation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", content = "field", rename_all = "camelCase")]
pub enum Aggregate {
    /// Number of matching entries
    Count,
    /// Sum of a numeric field
    Sum(String),
    /// Mean of a numeric field; absent when nothing matched
    Average(String),
}

/// Aggregations to run, keyed by alias
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateSpec {
    fields: BTreeMap<String, Aggregate>,
}

impl AggregateSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single count under [`COUNT_ALIAS`]
    pub fn count() -> Self {
        Self::new().with(COUNT_ALIAS, Aggregate::Count)
    }

    /// Add or replace the aggregation stored under `alias`
    pub fn with(mut self, alias: impl Into<String>, aggregate: Aggregate) -> Self {
        self.fields.insert(alias.into(), aggregate);
        self
    }

    pub fn sum(self, alias: impl Into<String>, field: impl Into<String>) -> Self {
        self.with(alias, Aggregate::Sum(field.into()))
    }

    pub fn average(self, alias: impl Into<String>, field: impl Into<String>) -> Self {
        self.with(alias, Aggregate::Average(field.into()))
    }

    pub fn get(&self, alias: &str) -> Option<&Aggregate> {
        self.fields.get(alias)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Aggregate)> {
        self.fields.iter().map(|(alias, aggregate)| (alias.as_str(), aggregate))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Result of an aggregate read
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateData {
    values: BTreeMap<String, Option<f64>>,
}

impl AggregateData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, alias: impl Into<String>, value: Option<f64>) -> Self {
        self.values.insert(alias.into(), value);
        self
    }

    /// Value of `alias`; `None` if absent or null
    pub fn get(&self, alias: &str) -> Option<f64> {
        self.values.get(alias).copied().flatten()
    }

    /// The count stored under [`COUNT_ALIAS`]
    pub fn count(&self) -> Option<u64> {
        self.get(COUNT_ALIAS)
            .filter(|count| *count >= 0.0)
            .map(|count| count as u64)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.values.iter().map(|(alias, value)| (alias.as_str(), *value))
    }
}
