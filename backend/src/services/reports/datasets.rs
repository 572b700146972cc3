use super::{assembler_options, build_bundle, error_response, receive, run_blocking};
use crate::config::AppConfig;
use crate::error::ReportError;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use common::model::dataset::ReportBundle;

/// HTTP handler wrapper: `200 OK` with the bundle as JSON, or the error.
pub async fn process(payload: Multipart, config: web::Data<AppConfig>) -> impl Responder {
    match build_datasets(payload, &config).await {
        Ok(bundle) => HttpResponse::Ok().json(bundle),
        Err(e) => error_response(&e),
    }
}

async fn build_datasets(payload: Multipart, config: &AppConfig) -> Result<ReportBundle, ReportError> {
    let (upload, params) = receive(payload, config).await?;
    let options = assembler_options(config);
    run_blocking(move || build_bundle(&upload, &params, options)).await
}
