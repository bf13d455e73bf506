//! Reporting query plans: data model, extraction from generated text, and
//! validation against the Field Catalog.

pub mod extractor;
pub mod types;
pub mod validator;

pub use extractor::{extract_json_object, strip_code_fences};
pub use types::{DateRange, DateToken, FieldRef, QueryPlan};
pub use validator::{apply_defaults, PlanValidation, PlanValidator};
