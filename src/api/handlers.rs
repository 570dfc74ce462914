// HTTP request handlers for API endpoints

use std::io::ErrorKind;

use actix_web::{http::header, web, HttpResponse, Result};

use crate::api::models::*;
use crate::api::server::AppState;
use crate::catalog::{localize, FlatRow, LocalizeMode};
use crate::export::ExportFormat;

/// Health check endpoint
pub async fn health_check(state: web::Data<AppState>) -> Result<HttpResponse> {
    let response = ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        upstream: state.client.config().base_url.clone(),
        image_dir: state.materializer.cache().dir().display().to_string(),
        uptime_seconds: state.started.elapsed().as_secs(),
    });

    Ok(HttpResponse::Ok().json(response))
}

/// Fetch, flatten and localize. On failure the ready-made 502 response is
/// returned instead, so handlers never serve partial data.
async fn load_rows(
    state: &AppState,
    mode: LocalizeMode,
) -> std::result::Result<(usize, Vec<FlatRow>), HttpResponse> {
    let (total_products, rows) = state.client.fetch_rows().await.map_err(|e| {
        tracing::error!(error = ?e, "catalog fetch failed");
        HttpResponse::BadGateway().json(ApiResponse::<()>::error(format!(
            "catalog fetch failed: {e:#}"
        )))
    })?;

    let (rows, report) = localize(rows, mode, &state.materializer)
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, %mode, "image localization failed");
            HttpResponse::InternalServerError().json(ApiResponse::<()>::error(format!(
                "image localization failed: {e:#}"
            )))
        })?;
    if let Some(report) = report {
        report.log_summary();
    }

    tracing::info!(total_products, total_rows = rows.len(), %mode, "rows assembled");
    Ok((total_products, rows))
}

/// Flattened rows, `?localize=none|eager|batch` (default eager)
pub async fn list_products(
    query: web::Query<LocalizeQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let (total_products, rows) = match load_rows(&state, query.mode()).await {
        Ok(loaded) => loaded,
        Err(resp) => return Ok(resp),
    };

    let response = ApiResponse::success(ProductsPayload {
        total_products,
        total_rows: rows.len(),
        rows,
    });
    Ok(HttpResponse::Ok().json(response))
}

/// One card per product with its variants, images from the local cache
pub async fn gallery(state: web::Data<AppState>) -> Result<HttpResponse> {
    let rows = match load_rows(&state, LocalizeMode::Eager).await {
        Ok((_, rows)) => rows,
        Err(resp) => return Ok(resp),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(build_gallery(rows))))
}

/// Rows as a downloadable file
pub async fn export_rows(
    path: web::Path<ExportFormat>,
    query: web::Query<LocalizeQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let format = path.into_inner();
    let rows = match load_rows(&state, query.mode()).await {
        Ok((_, rows)) => rows,
        Err(resp) => return Ok(resp),
    };

    let body = match format.render(&rows) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(error = ?e, %format, "export render failed");
            return Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error(format!("export failed: {e:#}"))));
        }
    };

    Ok(HttpResponse::Ok()
        .content_type(format.mime())
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", format.default_file_name()),
        ))
        .body(body))
}

/// Serve a file from the image cache
pub async fn serve_image(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let filename = path.into_inner();
    if !is_safe_filename(&filename) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error("invalid image name")));
    }

    let file_path = state.materializer.cache().file_path(&filename);
    match tokio::fs::read(&file_path).await {
        Ok(bytes) => Ok(HttpResponse::Ok()
            .content_type(image_content_type(&filename))
            .insert_header((header::CACHE_CONTROL, "public, max-age=86400"))
            .body(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Ok(HttpResponse::NotFound().json(ApiResponse::<()>::error("image not cached")))
        }
        Err(e) => {
            tracing::warn!(error = %e, file = %file_path.display(), "image read failed");
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error("image read failed")))
        }
    }
}

fn is_safe_filename(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && !name.contains("..")
}

fn image_content_type(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::routes::configure_routes;
    use crate::catalog::fixture::CannedFeed;
    use crate::catalog::CatalogClient;
    use crate::config::FeedConfig;
    use crate::images::{HttpImageFetcher, ImageCache, ImageMaterializer};
    use actix_web::http::StatusCode;
    use actix_web::test::{call_service, init_service, read_body, read_body_json, TestRequest};
    use actix_web::App;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    // Port 1 on loopback refuses connections, so every feed fetch fails fast.
    fn state(image_dir: &std::path::Path) -> web::Data<AppState> {
        state_with("http://127.0.0.1:1", image_dir)
    }

    fn state_with(base_url: &str, image_dir: &std::path::Path) -> web::Data<AppState> {
        let base_url = base_url.to_string();
        let feed = FeedConfig {
            base_url: base_url.clone(),
            timeout: Duration::from_secs(5),
            ..FeedConfig::default()
        };
        web::Data::new(AppState {
            client: CatalogClient::new(feed),
            materializer: ImageMaterializer::new(
                Arc::new(HttpImageFetcher::new(Duration::from_secs(5))),
                ImageCache::new(image_dir, "/images"),
                base_url,
            ),
            started: Instant::now(),
        })
    }

    #[test]
    fn filename_guard() {
        assert!(is_safe_filename("0cc175b9.jpg"));
        assert!(!is_safe_filename(""));
        assert!(!is_safe_filename("../secret"));
        assert!(!is_safe_filename("a/b.jpg"));
        assert!(!is_safe_filename(r"a\b.jpg"));
    }

    #[test]
    fn content_types() {
        assert_eq!(image_content_type("x.JPG"), "image/jpeg");
        assert_eq!(image_content_type("x.webp"), "image/webp");
        assert_eq!(image_content_type("x"), "application/octet-stream");
    }

    #[actix_web::test]
    async fn health_reports_upstream() {
        let tmp = tempfile::tempdir().unwrap();
        let app = init_service(App::new().app_data(state(tmp.path())).configure(configure_routes)).await;

        let resp = call_service(&app, TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["upstream"], "http://127.0.0.1:1");
    }

    #[actix_web::test]
    async fn serves_cached_images_only() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("0cc175b9.png"), b"\x89PNG").unwrap();
        let app = init_service(App::new().app_data(state(tmp.path())).configure(configure_routes)).await;

        let resp = call_service(
            &app,
            TestRequest::get().uri("/images/0cc175b9.png").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
        assert_eq!(read_body(resp).await.as_ref(), b"\x89PNG");

        let resp = call_service(
            &app,
            TestRequest::get().uri("/images/ffffffff.jpg").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = call_service(
            &app,
            TestRequest::get().uri("/images/..secret").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn upstream_failure_is_bad_gateway() {
        let tmp = tempfile::tempdir().unwrap();
        let app = init_service(App::new().app_data(state(tmp.path())).configure(configure_routes)).await;

        for uri in ["/api/v1/products", "/api/v1/gallery", "/api/v1/export/csv"] {
            let resp = call_service(&app, TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::BAD_GATEWAY, "{uri}");
            let body: serde_json::Value = read_body_json(resp).await;
            assert_eq!(body["success"], false);
            assert!(body.get("data").is_none());
        }
    }

    #[actix_web::test]
    async fn unknown_export_format_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let app = init_service(App::new().app_data(state(tmp.path())).configure(configure_routes)).await;

        let resp = call_service(
            &app,
            TestRequest::get().uri("/api/v1/export/pdf").to_request(),
        )
        .await;
        assert!(resp.status().is_client_error());
    }

    // Sofa has two sizes and one dimension, bed has neither: 3 rows, 2 products.
    async fn furniture_feed() -> CannedFeed {
        CannedFeed::serve(|_| {
            let body = serde_json::json!({
                "data": [
                    { "attributes": {
                        "name": "Sofa", "slug_item": "sofa",
                        "hero_image": { "data": { "attributes": { "url": "/uploads/sofa.png" } } },
                        "properties": { "bedsize": [
                            { "artnum": "S-1", "bedsize": { "data": { "attributes": { "name": "Small" } } } },
                            { "artnum": "L-1", "bedsize": { "data": { "attributes": { "name": "Large" } } } }
                        ] },
                        "details": { "detailitems": [ { "value": "W 200" } ] }
                    } },
                    { "attributes": { "name": "Bed", "slug_item": "bed" } }
                ],
                "meta": { "pagination": { "page": 1, "pageSize": 100, "pageCount": 1, "total": 2 } }
            });
            (200, body.to_string())
        })
        .await
    }

    #[actix_web::test]
    async fn products_reports_totals_and_rows() {
        let feed = furniture_feed().await;
        let tmp = tempfile::tempdir().unwrap();
        let app = init_service(
            App::new()
                .app_data(state_with(&feed.base_url, tmp.path()))
                .configure(configure_routes),
        )
        .await;

        let resp = call_service(
            &app,
            TestRequest::get().uri("/api/v1/products?localize=none").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["total_products"], 2);
        assert_eq!(body["data"]["total_rows"], 3);
        let rows = body["data"]["rows"].as_array().unwrap();
        assert_eq!(rows[0]["bedsize"], "Small");
        assert_eq!(rows[1]["artnum"], "L-1");
        assert_eq!(rows[0]["hero_image_url"], "/uploads/sofa.png");
        assert_eq!(rows[2]["slug_item"], "bed");
    }

    #[actix_web::test]
    async fn products_default_to_eager_localization() {
        let feed = furniture_feed().await;
        let tmp = tempfile::tempdir().unwrap();
        let cached = crate::images::image_filename("/uploads/sofa.png").unwrap();
        std::fs::write(tmp.path().join(&cached), b"png").unwrap();
        let app = init_service(
            App::new()
                .app_data(state_with(&feed.base_url, tmp.path()))
                .configure(configure_routes),
        )
        .await;

        let resp = call_service(&app, TestRequest::get().uri("/api/v1/products").to_request()).await;
        let body: serde_json::Value = read_body_json(resp).await;
        assert_eq!(body["data"]["rows"][0]["hero_image_url"], format!("/images/{cached}"));
        assert!(body["data"]["rows"][2]["hero_image_url"].is_null());
    }

    #[actix_web::test]
    async fn gallery_groups_rows_into_cards() {
        let feed = furniture_feed().await;
        let tmp = tempfile::tempdir().unwrap();
        let app = init_service(
            App::new()
                .app_data(state_with(&feed.base_url, tmp.path()))
                .configure(configure_routes),
        )
        .await;

        let resp = call_service(&app, TestRequest::get().uri("/api/v1/gallery").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = read_body_json(resp).await;
        let cards = body["data"].as_array().unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0]["slug"], "sofa");
        assert_eq!(cards[0]["variants"].as_array().unwrap().len(), 2);
        assert_eq!(cards[0]["variants"][1]["bedsize"], "Large");
        assert_eq!(cards[0]["variants"][1]["dimensions"], "W 200");
        // nothing cached yet, eager mode drops the remote image
        assert!(cards[0]["image"].is_null());
        assert_eq!(cards[1]["slug"], "bed");
        assert!(cards[1]["variants"].as_array().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn export_is_an_attachment_with_format_mime() {
        let feed = furniture_feed().await;
        let tmp = tempfile::tempdir().unwrap();
        let app = init_service(
            App::new()
                .app_data(state_with(&feed.base_url, tmp.path()))
                .configure(configure_routes),
        )
        .await;

        let resp = call_service(
            &app,
            TestRequest::get().uri("/api/v1/export/csv?localize=none").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/csv; charset=utf-8"
        );
        assert_eq!(
            resp.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            r#"attachment; filename="strapi_products.csv""#
        );
        let body = read_body(resp).await;
        let text = std::str::from_utf8(&body).unwrap();
        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "name,slug_item,hero_image_url,bedsize,artnum,dimensions");
        assert_eq!(lines[1], r#""Sofa","sofa","/uploads/sofa.png","Small","S-1","W 200""#);

        let resp = call_service(&app, TestRequest::get().uri("/api/v1/export/xlsx").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(
            resp.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            r#"attachment; filename="strapi_products.xlsx""#
        );
        assert!(read_body(resp).await.starts_with(b"PK"));
    }
}
