//! # Sistema de Routing
//! src/router/mod.rs
//!
//! ```text
//! Request → Router → Endpoint (middleware + handler) → Response
//! ```
//!
//! Cada ruta es `METHOD + patrón`, donde el patrón admite segmentos
//! `{param}` (ej: `/images/{imageId}`). Los valores capturados quedan en
//! `Request::path_param`.
//!
//! - Ningún patrón coincide → 404
//! - El patrón coincide pero no el método → 405 con header `Allow`

use std::collections::HashMap;

use crate::context::ExecutionContext;
use crate::http::{Method, Request, Response, StatusCode};
use crate::middleware::Endpoint;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Debug)]
struct Route {
    method: Method,
    pattern: String,
    segments: Vec<Segment>,
    endpoint: Endpoint,
}

impl Route {
    /// Parámetros capturados si el path coincide con el patrón
    fn matches(&self, path: &[&str]) -> Option<HashMap<String, String>> {
        if path.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(path) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(params)
    }
}

/// Resultado de enrutar: la respuesta y la ruta que la produjo (para métricas)
#[derive(Debug)]
pub struct Routed {
    pub response: Response,
    pub route: String,
}

/// Router que mapea (método, patrón) a endpoints
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registra una ruta
    ///
    /// ```
    /// use ascii_server::http::{Method, Response, StatusCode};
    /// use ascii_server::middleware::Endpoint;
    /// use ascii_server::router::Router;
    ///
    /// let mut router = Router::new();
    /// router.register(
    ///     Method::GET,
    ///     "/images/{imageId}",
    ///     Endpoint::new(|req, _ctx| {
    ///         Response::text(StatusCode::Ok, req.path_param("imageId").unwrap_or_default())
    ///     }),
    /// );
    /// ```
    pub fn register(&mut self, method: Method, pattern: &str, endpoint: Endpoint) {
        let segments = split_path(pattern)
            .into_iter()
            .map(|part| match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(part.to_string()),
            })
            .collect();

        self.routes.push(Route {
            method,
            pattern: pattern.to_string(),
            segments,
            endpoint,
        });
    }

    /// Encuentra y ejecuta el endpoint para un request
    pub fn route(&self, mut request: Request, ctx: &ExecutionContext) -> Routed {
        let path = request.path().to_string();
        let parts = split_path(&path);

        let mut allowed = Vec::new();
        for route in &self.routes {
            let Some(params) = route.matches(&parts) else {
                continue;
            };
            if route.method != request.method() {
                allowed.push(route.method.as_str());
                continue;
            }

            request.set_path_params(params);
            let mut response = route.endpoint.call(&request, ctx);
            add_common_headers(&mut response);
            return Routed {
                response,
                route: format!("{} {}", route.method.as_str(), route.pattern),
            };
        }

        let (mut response, route) = if allowed.is_empty() {
            (
                Response::json(
                    StatusCode::NotFound,
                    &serde_json::json!({ "ErrorMessage": format!("route not found: {}", path) }),
                ),
                "unmatched".to_string(),
            )
        } else {
            let mut response = Response::json(
                StatusCode::MethodNotAllowed,
                &serde_json::json!({
                    "ErrorMessage": format!("method {} not allowed", request.method().as_str())
                }),
            );
            response.add_header("Allow", &allowed.join(", "));
            (response, format!("{} {}", request.method().as_str(), path))
        };

        add_common_headers(&mut response);
        Routed { response, route }
    }
}

/// Headers comunes a todas las respuestas
fn add_common_headers(response: &mut Response) {
    response.add_header("Server", "ascii-server/1.0");
    response.add_header("Connection", "close");
}
