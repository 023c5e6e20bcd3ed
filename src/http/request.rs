//! # Parsing de Requests HTTP
//! src/http/request.rs
//!
//! ## Formato
//!
//! ```text
//! POST /images HTTP/1.1\r\n
//! Content-Length: 1234\r\n
//! async: true\r\n
//! \r\n
//! <bytes del PNG>
//! ```
//!
//! La cabecera (request line + headers) debe ser UTF-8; el body se trata
//! como bytes crudos y se delimita con `Content-Length`. Sin ese header el
//! body es vacío.

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

/// Tamaño máximo de request line + headers
pub const MAX_HEAD_BYTES: usize = 16 * 1024;

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Métodos HTTP soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    GET,
    POST,
}

impl Method {
    fn from_str(s: &str) -> Result<Self, ParseError> {
        match s {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            _ => Err(ParseError::UnsupportedMethod(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
        }
    }
}

/// Errores que pueden ocurrir al leer o parsear un request
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("empty request")]
    EmptyRequest,

    /// La conexión se cerró antes de completar cabecera o body
    #[error("incomplete HTTP request")]
    IncompleteRequest,

    #[error("invalid request line format")]
    InvalidRequestLine,

    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("invalid HTTP version: {0}")]
    InvalidHttpVersion(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("request head exceeds {0} bytes")]
    HeadersTooLarge(usize),

    #[error("request body of {length} bytes exceeds limit of {limit} bytes")]
    BodyTooLarge { length: usize, limit: usize },

    #[error("invalid content-length: {0}")]
    InvalidContentLength(String),

    #[error("error reading request: {0}")]
    Io(#[from] std::io::Error),
}

/// Request HTTP parseado
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,

    /// Path sin query string (ej: "/images/1b4e...")
    path: String,

    /// Headers con nombre en minúsculas
    headers: HashMap<String, String>,

    /// Segmentos `{param}` capturados por el router
    path_params: HashMap<String, String>,

    version: String,

    /// Compartido: clonar el request no copia el body
    body: Arc<[u8]>,
}

/// Request line + headers, antes de leer el body
struct Head {
    method: Method,
    path: String,
    version: String,
    headers: HashMap<String, String>,
}

impl Head {
    fn content_length(&self) -> Result<usize, ParseError> {
        match self.headers.get("content-length") {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| ParseError::InvalidContentLength(raw.clone())),
            None => Ok(0),
        }
    }

    fn into_request(self, body: Vec<u8>) -> Request {
        Request {
            method: self.method,
            path: self.path,
            headers: self.headers,
            path_params: HashMap::new(),
            version: self.version,
            body: body.into(),
        }
    }
}

impl Request {
    /// Parsea un request completo que ya está en memoria
    ///
    /// ```
    /// use ascii_server::http::Request;
    ///
    /// let raw = b"GET /images HTTP/1.0\r\nAsync: true\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.path(), "/images");
    /// assert_eq!(request.header("async"), Some("true"));
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        if buffer.iter().all(u8::is_ascii_whitespace) {
            return Err(ParseError::EmptyRequest);
        }

        let head_end = find_head_end(buffer).ok_or(ParseError::IncompleteRequest)?;
        let head = Self::parse_head(&buffer[..head_end])?;

        let length = head.content_length()?;
        let rest = &buffer[head_end + HEAD_TERMINATOR.len()..];
        if rest.len() < length {
            return Err(ParseError::IncompleteRequest);
        }

        Ok(head.into_request(rest[..length].to_vec()))
    }

    /// Lee un request desde un stream: cabecera hasta `\r\n\r\n`, luego
    /// exactamente `Content-Length` bytes de body.
    ///
    /// Rechaza bodies mayores a `max_body` sin leerlos.
    pub fn read_from<R: Read>(reader: &mut R, max_body: usize) -> Result<Self, ParseError> {
        let mut buffer = Vec::with_capacity(8192);
        let mut chunk = [0u8; 8192];

        let head_end = loop {
            if let Some(end) = find_head_end(&buffer) {
                break end;
            }
            if buffer.len() > MAX_HEAD_BYTES {
                return Err(ParseError::HeadersTooLarge(MAX_HEAD_BYTES));
            }

            let n = reader.read(&mut chunk)?;
            if n == 0 {
                return Err(if buffer.is_empty() {
                    ParseError::EmptyRequest
                } else {
                    ParseError::IncompleteRequest
                });
            }
            buffer.extend_from_slice(&chunk[..n]);
        };

        let head = Self::parse_head(&buffer[..head_end])?;
        let length = head.content_length()?;
        if length > max_body {
            return Err(ParseError::BodyTooLarge {
                length,
                limit: max_body,
            });
        }

        // Parte del body pudo llegar junto con la cabecera
        let mut body = buffer.split_off(head_end + HEAD_TERMINATOR.len());
        body.truncate(length);
        if body.len() < length {
            let missing = (length - body.len()) as u64;
            reader.take(missing).read_to_end(&mut body)?;
            if body.len() < length {
                return Err(ParseError::IncompleteRequest);
            }
        }

        Ok(head.into_request(body))
    }

    fn parse_head(bytes: &[u8]) -> Result<Head, ParseError> {
        let text = std::str::from_utf8(bytes).map_err(|_| ParseError::InvalidRequestLine)?;
        let mut lines = text.split("\r\n");

        let request_line = lines.next().ok_or(ParseError::IncompleteRequest)?;
        let (method, path, version) = Self::parse_request_line(request_line)?;
        let headers = Self::parse_headers(lines)?;

        Ok(Head {
            method,
            path,
            version,
            headers,
        })
    }

    /// Formato: `METHOD /path?query VERSION`
    fn parse_request_line(line: &str) -> Result<(Method, String, String), ParseError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(ParseError::InvalidRequestLine);
        }

        let method = Method::from_str(parts[0])?;

        // La query string no la usa ninguna ruta; se descarta
        let path = match parts[1].split_once('?') {
            Some((path, _query)) => path.to_string(),
            None => parts[1].to_string(),
        };

        let version = parts[2].to_string();
        if version != "HTTP/1.0" && version != "HTTP/1.1" {
            return Err(ParseError::InvalidHttpVersion(version));
        }

        Ok((method, path, version))
    }

    fn parse_headers<'a>(lines: impl Iterator<Item = &'a str>) -> Result<HashMap<String, String>, ParseError> {
        let mut headers = HashMap::new();

        for line in lines {
            if line.trim().is_empty() {
                break;
            }
            match line.split_once(':') {
                Some((name, value)) => {
                    headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
                }
                None => return Err(ParseError::InvalidHeader(line.to_string())),
            }
        }

        Ok(headers)
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Header por nombre, sin distinguir mayúsculas
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|s| s.as_str())
    }

    /// Parámetro de ruta capturado por el router (ej: `imageId`)
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(|s| s.as_str())
    }

    pub(crate) fn set_path_params(&mut self, params: HashMap<String, String>) {
        self.path_params = params;
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

fn find_head_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(HEAD_TERMINATOR.len())
        .position(|window| window == HEAD_TERMINATOR)
}
