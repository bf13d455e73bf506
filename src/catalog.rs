//! Field Catalog
//!
//! Allow-listed vocabulary of metric and dimension names accepted in a
//! reporting query plan. Built once at startup and shared read-only.

use crate::error::{AgentError, Result};
use itertools::Itertools;
use std::collections::HashSet;
use std::path::Path;
use strsim::jaro_winkler;
use tracing::{info, warn};

/// Minimum similarity for a catalog name to be offered as a suggestion
const SUGGESTION_THRESHOLD: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Metric,
    Dimension,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Metric => "metric",
            FieldKind::Dimension => "dimension",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    metrics: HashSet<String>,
    dimensions: HashSet<String>,
}

impl FieldCatalog {
    pub fn new<M, D>(metrics: M, dimensions: D) -> Self
    where
        M: IntoIterator,
        M::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            metrics: metrics.into_iter().map(Into::into).collect(),
            dimensions: dimensions.into_iter().map(Into::into).collect(),
        }
    }

    /// Load the allow-list from a sectioned text file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AgentError::Configuration(format!(
                "Field catalog not found at {}",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            AgentError::Configuration(format!(
                "Failed to read field catalog {}: {}",
                path.display(),
                e
            ))
        })?;

        let catalog = Self::parse(&text);
        info!(
            "Loaded field catalog with {} metrics and {} dimensions",
            catalog.metrics.len(),
            catalog.dimensions.len()
        );
        if catalog.is_empty() {
            warn!(
                "Field catalog {} has no metric or dimension sections; every plan will be rejected",
                path.display()
            );
        }
        Ok(catalog)
    }

    /// Parse the allow-list format.
    ///
    /// Any line mentioning "metric" or "dimension" (any case) is a section
    /// marker, whatever its prefix. `#` and `[` lines mentioning neither are
    /// comments. Remaining non-blank lines belong to the nearest preceding
    /// section; lines before the first marker are ignored.
    pub fn parse(text: &str) -> Self {
        let mut catalog = Self::default();
        let mut section: Option<FieldKind> = None;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let lowered = line.to_lowercase();
            if lowered.contains("metric") {
                section = Some(FieldKind::Metric);
                continue;
            }
            if lowered.contains("dimension") {
                section = Some(FieldKind::Dimension);
                continue;
            }
            if line.starts_with('#') || line.starts_with('[') {
                continue;
            }
            match section {
                Some(FieldKind::Metric) => {
                    catalog.metrics.insert(line.to_string());
                }
                Some(FieldKind::Dimension) => {
                    catalog.dimensions.insert(line.to_string());
                }
                None => {}
            }
        }

        catalog
    }

    pub fn metrics(&self) -> &HashSet<String> {
        &self.metrics
    }

    pub fn dimensions(&self) -> &HashSet<String> {
        &self.dimensions
    }

    pub fn contains(&self, kind: FieldKind, name: &str) -> bool {
        match kind {
            FieldKind::Metric => self.metrics.contains(name),
            FieldKind::Dimension => self.dimensions.contains(name),
        }
    }

    /// Sorted names of one kind, for prompts and listings
    pub fn sorted_names(&self, kind: FieldKind) -> Vec<&str> {
        let set = match kind {
            FieldKind::Metric => &self.metrics,
            FieldKind::Dimension => &self.dimensions,
        };
        set.iter().map(String::as_str).sorted().collect()
    }

    /// Most similar allowed name, if any is close enough
    pub fn closest(&self, kind: FieldKind, name: &str) -> Option<&str> {
        let needle = name.to_lowercase();
        self.sorted_names(kind)
            .into_iter()
            .map(|candidate| (candidate, jaro_winkler(&needle, &candidate.to_lowercase())))
            .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(candidate, _)| candidate)
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty() && self.dimensions.is_empty()
    }
}
