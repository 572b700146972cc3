use super::{assembler_options, build_bundle, error_response, receive, run_blocking};
use crate::config::AppConfig;
use crate::error::ReportError;
use crate::render::PresentationRenderer;
use actix_multipart::Multipart;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse, Responder};
use log::info;
use std::sync::Arc;

/// HTTP handler wrapper: `200 OK` with the rendered deck as an attachment,
/// or the error.
pub async fn process(
    payload: Multipart,
    config: web::Data<AppConfig>,
    renderer: web::Data<dyn PresentationRenderer>,
) -> impl Responder {
    let renderer = renderer.into_inner();
    match generate_report(payload, &config, Arc::clone(&renderer)).await {
        Ok(deck) => HttpResponse::Ok()
            .content_type(renderer.content_type())
            .insert_header(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(renderer.file_name().to_string())],
            })
            .body(deck),
        Err(e) => error_response(&e),
    }
}

async fn generate_report(
    payload: Multipart,
    config: &AppConfig,
    renderer: Arc<dyn PresentationRenderer>,
) -> Result<Vec<u8>, ReportError> {
    let (upload, params) = receive(payload, config).await?;
    let options = assembler_options(config);

    let deck = run_blocking(move || {
        let bundle = build_bundle(&upload, &params, options)?;
        let slides = bundle.datasets.len();
        let deck = renderer.render(bundle, &upload.assets)?;
        info!(
            "Report for '{}' rendered: {} datasets, {} bytes",
            params.company_name,
            slides,
            deck.len()
        );
        Ok(deck)
    })
    .await?;
    Ok(deck)
}
