//! Report Dataset Assembler: turns the loaded workbooks and the request
//! parameters into the ordered list of slide datasets.

pub mod assembler;
pub mod sources;

pub use assembler::{AssemblerOptions, ReportDatasetAssembler};
