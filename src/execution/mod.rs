//! Execution of generated tabular transformations

pub mod result;
pub mod sandbox;
pub mod shape;

pub use result::{frame_to_records, Record};
pub use sandbox::{ResultKind, Transformation, DATASET_TABLE};
pub use shape::classify;
