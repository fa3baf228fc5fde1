use crate::signals::SignalCatalog;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Physical signal values keyed by signal name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadingSet {
    values: BTreeMap<String, f64>,
}

impl ReadingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    /// Builder form of [`ReadingSet::insert`].
    #[must_use]
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Value of `name`, or 0 when the signal is absent.
    pub fn value(&self, name: &str) -> f64 {
        self.get(name).unwrap_or(0.0)
    }

    /// Insert 0 for every catalog signal not already present.
    pub fn fill_defaults(&mut self, catalog: &SignalCatalog) {
        for signal in catalog.signals() {
            self.values.entry(signal.name.clone()).or_insert(0.0);
        }
    }

    #[must_use]
    pub fn filled(mut self, catalog: &SignalCatalog) -> Self {
        self.fill_defaults(catalog);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, f64)> for ReadingSet {
    fn from_iter<I: IntoIterator<Item = (&'a str, f64)>>(iter: I) -> Self {
        let mut readings = Self::new();
        for (name, value) in iter {
            readings.insert(name, value);
        }
        readings
    }
}

/// Round to one decimal place, the display precision of every signal.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
