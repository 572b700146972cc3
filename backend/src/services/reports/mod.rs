//! Report generation endpoints.
//!
//! Both routes take the same `multipart/form-data` form: the monitoring
//! workbooks under `excel_files` (identified by file stem, `combined_sources`
//! is required), the scalar fields `company_name`, `start_date`, `end_date`
//! and `has_competitors`, and optional images for the cover, the competitor
//! page and the highlighted posts (with `positive_links` / `negative_links`
//! as JSON link lists).
//!
//! The provided routes are:
//! - `POST /api/reports/generate`: streams the form into a temporary
//!   directory, validates the scalar fields, then loads the workbooks,
//!   assembles the report datasets and renders the deck on the blocking pool
//!   (`tokio::task::spawn_blocking`). Responds with the deck as an attachment.
//!
//! - `POST /api/reports/datasets`: same pipeline without rendering. Responds
//!   with the dataset bundle as JSON, which is handy for previews and for
//!   checking numbers without a renderer.
//!
//! Any failure aborts the whole request. Input problems (missing source,
//! sheet or column, bad fields, oversized upload) answer `400`, renderer and
//! I/O failures `500`. The temporary directory is removed when the request
//! finishes either way.

use crate::config::AppConfig;
use crate::error::ReportError;
use crate::report::{AssemblerOptions, ReportDatasetAssembler};
use actix_multipart::Multipart;
use actix_web::web::{post, scope};
use actix_web::{HttpResponse, Scope};
use common::model::dataset::ReportBundle;
use common::requests::ReportParameters;
use log::{error, info};

mod datasets;
mod generate;
pub mod upload;

use upload::ReportUpload;

const API_PATH: &str = "/api/reports";

/// Configures and returns the Actix scope for report routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/generate", post().to(generate::process))
        .route("/datasets", post().to(datasets::process))
}

/// Reads the form and validates its scalar fields.
async fn receive(
    payload: Multipart,
    config: &AppConfig,
) -> Result<(ReportUpload, ReportParameters), ReportError> {
    let upload = upload::read_upload(payload, config.max_upload_bytes).await?;
    let params = upload.parameters()?;
    info!(
        "Report requested for '{}' ({} to {}, competitors: {}): {} workbooks, {} bytes",
        params.company_name,
        params.start_date,
        params.end_date,
        params.has_competitors,
        upload.workbooks.len(),
        upload.total_bytes
    );
    Ok((upload, params))
}

/// Loads the uploaded workbooks and builds the dataset bundle. Blocking.
fn build_bundle(
    upload: &ReportUpload,
    params: &ReportParameters,
    options: AssemblerOptions,
) -> Result<ReportBundle, ReportError> {
    let sources = upload.load_sources()?;
    ReportDatasetAssembler::new(params, options).assemble(&sources)
}

fn assembler_options(config: &AppConfig) -> AssemblerOptions {
    AssemblerOptions {
        top_authors: config.top_authors,
    }
}

/// Runs `work` on the blocking pool.
async fn run_blocking<T, F>(work: F) -> Result<T, ReportError>
where
    F: FnOnce() -> Result<T, ReportError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ReportError::Internal(e.to_string()))?
}

fn error_response(err: &ReportError) -> HttpResponse {
    let status = err.status_code();
    if status.is_server_error() {
        error!("Report failed: {}", err);
    } else {
        info!("Report rejected: {}", err);
    }
    HttpResponse::build(status)
        .content_type("text/plain; charset=utf-8")
        .body(format!("Error: {}", err))
}
