//! # API REST de Imágenes
//! src/api/mod.rs
//!
//! | Ruta                    | Middleware                  |
//! |-------------------------|-----------------------------|
//! | `POST /images`          | logging + timeout dinámico  |
//! | `GET /images`           | logging + timeout fijo      |
//! | `GET /images/{imageId}` | logging + timeout fijo      |
//! | `GET /health`           | ninguno                     |
//! | `GET /metrics`          | ninguno                     |

pub mod handlers;
pub mod models;

use std::sync::Arc;

use crate::config::Config;
use crate::engine::TaskEngine;
use crate::http::Method;
use crate::metrics::MetricsCollector;
use crate::middleware::Endpoint;
use crate::router::Router;

/// Construye el router con todas las rutas del servicio
pub fn build_router(engine: Arc<TaskEngine>, metrics: MetricsCollector, config: &Config) -> Router {
    let mut router = Router::new();

    let create_config = config.clone();
    let e = Arc::clone(&engine);
    router.register(
        Method::POST,
        "/images",
        Endpoint::new(move |req, ctx| handlers::new_image(&e, req, ctx))
            .with_dynamic_timeout(move |req| create_config.create_timeout_for(req.body().len()))
            .with_logging_context("newImageHandler"),
    );

    let e = Arc::clone(&engine);
    router.register(
        Method::GET,
        "/images",
        Endpoint::new(move |_req, ctx| handlers::list_images(&e, ctx))
            .with_timeout(config.list_timeout())
            .with_logging_context("getImageListHandler"),
    );

    let e = Arc::clone(&engine);
    router.register(
        Method::GET,
        "/images/{imageId}",
        Endpoint::new(move |req, ctx| handlers::get_image(&e, req, ctx))
            .with_timeout(config.get_timeout())
            .with_logging_context("getImageHandler"),
    );

    router.register(Method::GET, "/health", Endpoint::new(|_req, _ctx| handlers::health()));

    router.register(
        Method::GET,
        "/metrics",
        Endpoint::new(move |_req, _ctx| handlers::metrics(&engine, &metrics)),
    );

    router
}
