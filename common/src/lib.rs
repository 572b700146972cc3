//! Models shared between the report backend and any client that consumes the
//! dataset bundle (the upload form, integration tests, external renderers).

pub mod model;
pub mod requests;
