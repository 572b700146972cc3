mod aggregate;
mod config;
mod error;
mod render;
mod report;
mod services;
mod sources;

use crate::render::{DeckStyle, PdfDeckRenderer, PresentationRenderer};
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::{error, info};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = match config::load_app_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e));
        }
    };

    let renderer: Arc<dyn PresentationRenderer> =
        Arc::new(PdfDeckRenderer::new(DeckStyle::from_config(&config)));
    let renderer = web::Data::from(renderer);
    let bind = (config.host.clone(), config.port);
    let config = web::Data::new(config);

    info!(
        "Server running at http://{}:{} (fonts: {}/{})",
        bind.0,
        bind.1,
        config.fonts_dir.display(),
        config.font_family
    );

    HttpServer::new(move || {
        App::new()
            .app_data(config.clone())
            .app_data(renderer.clone())
            .service(services::health::configure_routes())
            .service(services::reports::configure_routes())
    })
    .bind(bind)?
    .run()
    .await
}
