//! # Códigos de Estado HTTP
//! src/http/status.rs
//!
//! Solo los códigos que el servicio realmente produce:
//!
//! - **2xx**: 200
//! - **4xx**: 400, 404, 405, 413
//! - **5xx**: 500, 503

/// Códigos de estado que soporta el servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok = 200,

    /// 400 Bad Request - imagen ilegible, UUID inválido o request malformado
    BadRequest = 400,

    /// 404 Not Found - ruta o imagen desconocida
    NotFound = 404,

    /// 405 Method Not Allowed - la ruta existe pero no para este método
    MethodNotAllowed = 405,

    /// 413 Payload Too Large - body mayor al límite configurado
    PayloadTooLarge = 413,

    /// 500 Internal Server Error
    InternalServerError = 500,

    /// 503 Service Unavailable - el request excedió su timeout
    ServiceUnavailable = 503,
}

impl StatusCode {
    /// Valor numérico del código
    ///
    /// ```
    /// use ascii_server::http::StatusCode;
    /// assert_eq!(StatusCode::PayloadTooLarge.as_u16(), 413);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::PayloadTooLarge => "Payload Too Large",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::ServiceUnavailable => "Service Unavailable",
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.as_u16())
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.as_u16())
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.as_u16())
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
