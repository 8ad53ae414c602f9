//! # Estado y Serialización de Respuestas
//! src/http/response.rs
//!
//! La aplicación declara status y headers llamando a `StartResponse::start`.
//! El serializador arma el texto final:
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: text/plain\r\n      <- headers de la aplicación, en orden
//! Date: Tue, 01 Jan 2019 00:00:00 GMT\r\n
//! Server: GatewayServer/0.1.0\r\n   <- headers del servidor, siempre al final
//! \r\n
//! hi
//! ```
//!
//! Los headers del servidor no reemplazan ni deduplican a los de la
//! aplicación: si ambos mandan `Date`, salen los dos.

use super::StatusCode;
use crate::error::ServerError;
use std::time::SystemTime;

/// Valor del header `Server`
pub const SERVER_SOFTWARE: &str = concat!("GatewayServer/", env!("CARGO_PKG_VERSION"));

/// Lista ordenada de headers (nombre, valor)
pub type Headers = Vec<(String, String)>;

/// Status line y headers declarados por la aplicación
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseState {
    status: String,
    headers: Headers,
}

impl ResponseState {
    pub fn new<S: Into<String>>(status: S, headers: Headers) -> Self {
        Self { status: status.into(), headers }
    }

    /// Status sin el prefijo de versión (ej: "200 OK")
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Headers de la aplicación, en el orden en que se declararon
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

/// Callback start_response que recibe la aplicación
///
/// Vive solo durante un ciclo. Llamarlo más de una vez sobrescribe el estado
/// anterior; no llamarlo deja el ciclo sin respuesta.
#[derive(Debug, Default)]
pub struct StartResponse {
    state: Option<ResponseState>,
}

impl StartResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declara status y headers de la respuesta
    ///
    /// # Ejemplo
    /// ```
    /// use gateway_server::http::StartResponse;
    ///
    /// let mut start_response = StartResponse::new();
    /// start_response.start("200 OK", vec![("Content-Type".into(), "text/plain".into())]);
    /// assert!(start_response.is_started());
    /// ```
    pub fn start<S: Into<String>>(&mut self, status: S, headers: Headers) {
        let state = ResponseState::new(status, headers);
        if let Some(previous) = self.state.replace(state) {
            tracing::debug!(previous = %previous.status, "start_response called more than once");
        }
    }

    pub fn is_started(&self) -> bool {
        self.state.is_some()
    }

    /// Consume el callback y entrega el estado, o falla si nunca se llamó
    pub fn into_state(self) -> Result<ResponseState, ServerError> {
        self.state.ok_or(ServerError::ResponseStateMissing)
    }
}

/// Headers que agrega el servidor después de los de la aplicación
///
/// `Date` sigue el formato RFC 1123 (`Tue, 01 Jan 2019 00:00:00 GMT`).
pub fn server_headers(now: SystemTime) -> Headers {
    vec![
        ("Date".to_string(), httpdate::fmt_http_date(now)),
        ("Server".to_string(), SERVER_SOFTWARE.to_string()),
    ]
}

/// Serializa status, headers y body a texto de respuesta
///
/// El body se consume de forma perezosa, chunk por chunk. Cada chunk debe
/// ser UTF-8 válido.
///
/// # Ejemplo
/// ```
/// use gateway_server::http::{serialize, ResponseState};
/// use std::time::UNIX_EPOCH;
///
/// let state = ResponseState::new("200 OK", vec![]);
/// let body = vec![b"hi".to_vec()];
/// let text = serialize(&state, body, UNIX_EPOCH).unwrap();
///
/// assert!(text.starts_with("HTTP/1.1 200 OK\r\nDate: Thu, 01 Jan 1970 00:00:00 GMT\r\n"));
/// assert!(text.ends_with("\r\n\r\nhi"));
/// ```
pub fn serialize<I>(state: &ResponseState, body: I, now: SystemTime) -> Result<String, ServerError>
where
    I: IntoIterator<Item = Vec<u8>>,
{
    let mut response = format!("HTTP/1.1 {}\r\n", state.status());

    let server_headers = server_headers(now);
    for (name, value) in state.headers().iter().chain(server_headers.iter()) {
        response.push_str(&format!("{}: {}\r\n", name, value));
    }
    response.push_str("\r\n");

    for chunk in body {
        let text = String::from_utf8(chunk)
            .map_err(|_| ServerError::InvalidEncoding { context: "body chunk" })?;
        response.push_str(&text);
    }

    Ok(response)
}

/// Respuesta fija que se manda cuando un ciclo falla antes de responder
pub fn fallback_response(now: SystemTime) -> String {
    let state = ResponseState::new(
        StatusCode::InternalServerError.to_string(),
        vec![("Content-Type".to_string(), "text/plain".to_string())],
    );
    let body = StatusCode::InternalServerError.reason_phrase().as_bytes().to_vec();

    // El body es ASCII fijo, no puede fallar la decodificación
    serialize(&state, Some(body), now).unwrap_or_default()
}
