//! Query Plan Validator
//!
//! Checks plan field references against the Field Catalog and applies the
//! repair defaults before execution.

use crate::catalog::{FieldCatalog, FieldKind};
use crate::error::Result;
use crate::plan::types::{DateToken, FieldRef, QueryPlan};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Dimension injected when a plan asks for none
pub const DEFAULT_DIMENSION: &str = "date";

/// Field names a plan referenced but the catalog does not allow
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanValidation {
    pub invalid_metrics: Vec<String>,
    pub invalid_dimensions: Vec<String>,
}

impl PlanValidation {
    pub fn is_valid(&self) -> bool {
        self.invalid_metrics.is_empty() && self.invalid_dimensions.is_empty()
    }
}

pub struct PlanValidator {
    catalog: Arc<FieldCatalog>,
}

impl PlanValidator {
    pub fn new(catalog: Arc<FieldCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    /// Map each field reference to its bare name
    pub fn normalize(items: &[Value], kind: FieldKind) -> Result<Vec<String>> {
        items
            .iter()
            .map(|item| FieldRef::from_value(item, kind).map(FieldRef::into_name))
            .collect()
    }

    /// Report metric and dimension names missing from the catalog.
    /// The plan itself is left untouched.
    pub fn validate(&self, plan: &QueryPlan) -> Result<PlanValidation> {
        let metrics = Self::normalize(&plan.metrics, FieldKind::Metric)?;
        let dimensions = Self::normalize(&plan.dimensions, FieldKind::Dimension)?;

        let validation = PlanValidation {
            invalid_metrics: self.unknown(FieldKind::Metric, metrics),
            invalid_dimensions: self.unknown(FieldKind::Dimension, dimensions),
        };
        debug!("Plan validation: {:?}", validation);
        Ok(validation)
    }

    /// Every date token must be one the reporting API understands
    pub fn validate_date_ranges(plan: &QueryPlan) -> Result<()> {
        for range in &plan.date_ranges {
            DateToken::parse(&range.start_date)?;
            DateToken::parse(&range.end_date)?;
        }
        Ok(())
    }

    /// Closest allowed name for each invalid one, as "bad -> good" pairs
    pub fn suggestions(&self, validation: &PlanValidation) -> Vec<String> {
        let metrics = validation
            .invalid_metrics
            .iter()
            .map(|name| (name, FieldKind::Metric));
        let dimensions = validation
            .invalid_dimensions
            .iter()
            .map(|name| (name, FieldKind::Dimension));

        metrics
            .chain(dimensions)
            .filter_map(|(name, kind)| {
                self.catalog
                    .closest(kind, name)
                    .map(|closest| format!("{} -> {}", name, closest))
            })
            .collect()
    }

    fn unknown(&self, kind: FieldKind, names: Vec<String>) -> Vec<String> {
        names
            .into_iter()
            .filter(|name| !self.catalog.contains(kind, name))
            .collect()
    }
}

/// Post-validation repair: guarantee a time axis and keep zero-valued rows.
pub fn apply_defaults(plan: &mut QueryPlan) {
    if plan.dimensions.is_empty() {
        plan.dimensions.push(json!({ "name": DEFAULT_DIMENSION }));
    }
    if plan.keep_empty_rows.is_none() {
        plan.keep_empty_rows = Some(true);
    }
}
