//! Engine configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Optional hard cap on elements materialized into a single lookup
    /// (join inner side, group-by source). `None` means unbounded.
    pub max_lookup_elements: Option<usize>,

    /// Initial bucket capacity for lookups.
    pub lookup_capacity_hint: usize,

    /// Emit a `trace!` event for every element a cursor yields.
    pub trace_elements: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_lookup_elements: None,
            lookup_capacity_hint: 16,
            trace_elements: false,
        }
    }
}

impl EngineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `QFLOW_MAX_LOOKUP_ELEMENTS`: lookup element cap
    /// - `QFLOW_LOOKUP_CAPACITY_HINT`: initial lookup capacity
    /// - `QFLOW_TRACE_ELEMENTS`: `true`/`1` to trace every yielded element
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("QFLOW_MAX_LOOKUP_ELEMENTS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_lookup_elements = Some(v);
            }
        }

        if let Ok(s) = std::env::var("QFLOW_LOOKUP_CAPACITY_HINT") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.lookup_capacity_hint = v;
            }
        }

        if let Ok(s) = std::env::var("QFLOW_TRACE_ELEMENTS") {
            cfg.trace_elements = matches!(s.trim(), "1" | "true" | "TRUE" | "yes");
        }

        cfg
    }

    pub fn with_max_lookup_elements(mut self, limit: usize) -> Self {
        self.max_lookup_elements = Some(limit);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_lookup_elements == Some(0) {
            return Err(Error::Config(
                "max_lookup_elements must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
