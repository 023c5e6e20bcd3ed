//! # Handlers de la API
//! src/api/handlers.rs
//!
//! Traducen las respuestas del `TaskEngine` al contrato HTTP/JSON. Aquí vive
//! el único mapeo `ErrorKind` → código de estado.

use uuid::Uuid;

use super::models::{ErrorResponse, GetImageListResponse, GetImageResponse, NewImageResponse};
use crate::context::ExecutionContext;
use crate::engine::{EngineError, ErrorKind, ImageStatus, TaskEngine};
use crate::http::{Request, Response, StatusCode};
use crate::metrics::MetricsCollector;

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BadRequest,
        ErrorKind::InternalProcessing => StatusCode::InternalServerError,
        ErrorKind::ResourceNotFound => StatusCode::NotFound,
    }
}

fn error_response(status: StatusCode, message: String, ctx: &ExecutionContext, image_id: Option<Uuid>) -> Response {
    Response::json(
        status,
        &ErrorResponse {
            error_message: message,
            correlation_id: ctx.correlation_id().unwrap_or_default().to_string(),
            image_id,
        },
    )
}

fn engine_error(err: &EngineError, ctx: &ExecutionContext, image_id: Option<Uuid>) -> Response {
    let status = status_for(err.kind());
    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
    } else {
        tracing::warn!(error = %err, "request rejected");
    }
    error_response(status, err.to_string(), ctx, image_id)
}

/// `POST /images`: header `async: true` → asíncrono; si no, síncrono.
///
/// El valor se compara exacto: `TRUE` o `1` van por el camino síncrono.
pub fn new_image(engine: &TaskEngine, request: &Request, ctx: &ExecutionContext) -> Response {
    let is_async = request.header("async") == Some("true");

    if is_async {
        return match engine.submit_async(request.body(), ctx) {
            Ok(id) => Response::json(StatusCode::Ok, &NewImageResponse { image_id: id }),
            Err(e) => engine_error(&e, ctx, None),
        };
    }

    let outcome = engine.submit_sync(request.body(), ctx);
    match outcome.result {
        Ok(_) => Response::json(StatusCode::Ok, &NewImageResponse { image_id: outcome.id }),
        Err(e) => {
            let id = (!outcome.id.is_nil()).then_some(outcome.id);
            engine_error(&e, ctx, id)
        }
    }
}

/// `GET /images/{imageId}`
///
/// El fallo de una tarea no es un error del request: se responde 200 con
/// `Finished=false` y el motivo en `ErrorMessage`.
pub fn get_image(engine: &TaskEngine, request: &Request, ctx: &ExecutionContext) -> Response {
    let raw = request.path_param("imageId").unwrap_or_default();
    let id = match Uuid::parse_str(raw) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(image_id = raw, error = %e, "invalid image id");
            return error_response(StatusCode::BadRequest, format!("invalid image id {}: {}", raw, e), ctx, None);
        }
    };

    let body = match engine.get(id) {
        Ok(ImageStatus::Processing) => GetImageResponse {
            ascii_value: String::new(),
            finished: false,
            error_message: String::new(),
        },
        Ok(ImageStatus::Finished(text)) => GetImageResponse {
            ascii_value: text,
            finished: true,
            error_message: String::new(),
        },
        Err(e) => match e.task_failure() {
            Some(failure) => GetImageResponse {
                ascii_value: String::new(),
                finished: false,
                error_message: failure.to_string(),
            },
            None => return engine_error(&e, ctx, Some(id)),
        },
    };

    Response::json(StatusCode::Ok, &body)
}

/// `GET /images`
pub fn list_images(engine: &TaskEngine, ctx: &ExecutionContext) -> Response {
    match engine.list() {
        Ok(ids) => Response::json(StatusCode::Ok, &GetImageListResponse { image_id_list: ids }),
        Err(e) => engine_error(&e, ctx, None),
    }
}

/// `GET /health`
pub fn health() -> Response {
    tracing::debug!("received health check request");
    Response::text(StatusCode::Ok, "running")
}

/// `GET /metrics`
pub fn metrics(engine: &TaskEngine, metrics: &MetricsCollector) -> Response {
    Response::json(
        StatusCode::Ok,
        &serde_json::json!({
            "requests": metrics.snapshot(),
            "tasks": engine.stats(),
        }),
    )
}
