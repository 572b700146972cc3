//! Tabular Source Loader: uploaded files in, named sheets and typed records out.

pub mod columns;
pub mod records;
pub mod workbook;

#[cfg(test)]
pub(crate) mod fixtures;

pub use records::{EngagementRecord, Mention};
pub use workbook::{load_workbook, Sheet, Workbook};
