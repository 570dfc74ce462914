// API route configuration

use crate::api::handlers;
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health_check))
        .route("/", web::get().to(handlers::health_check))
        .route("/images/{filename}", web::get().to(handlers::serve_image))
        .service(
            web::scope("/api/v1")
                .route("/products", web::get().to(handlers::list_products))
                .route("/gallery", web::get().to(handlers::gallery))
                .route("/export/{format}", web::get().to(handlers::export_rows)),
        );
}
