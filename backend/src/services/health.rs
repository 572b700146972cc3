use actix_web::web::{get, resource};
use actix_web::{HttpResponse, Resource, Responder};

const API_PATH: &str = "/api/health";

/// Liveness probe.
pub async fn process() -> impl Responder {
    HttpResponse::Ok().content_type("text/plain; charset=utf-8").body("ok")
}

pub fn configure_routes() -> Resource {
    resource(API_PATH).route(get().to(process))
}
