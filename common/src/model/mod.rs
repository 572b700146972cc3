pub mod dataset;
pub mod engagement;
pub mod sentiment;
