//! # Lectura y Parsing de Requests
//! src/http/request.rs
//!
//! El servidor solo interpreta la request line. Headers y body no se parsean:
//! el texto crudo completo se le entrega a la aplicación como input stream.
//!
//! ## Formato de la request line
//!
//! ```text
//! GET /hello HTTP/1.1\r\n
//! ```
//!
//! ## Límite de lectura
//!
//! Se hace UNA sola lectura de como máximo `READ_BUFFER_SIZE` bytes. No se
//! itera hasta encontrar `\r\n\r\n`: un request más grande queda truncado
//! en silencio y se procesa tal cual.

use crate::error::ServerError;
use std::io::Read;

/// Tamaño máximo de la única lectura que se hace por conexión
pub const READ_BUFFER_SIZE: usize = 1024;

/// Lee un chunk acotado de la conexión y lo decodifica como UTF-8
///
/// # Ejemplo
/// ```
/// use gateway_server::http::request::read_request;
///
/// let mut conn: &[u8] = b"GET / HTTP/1.1\r\n\r\n";
/// assert_eq!(read_request(&mut conn).unwrap(), "GET / HTTP/1.1\r\n\r\n");
/// ```
pub fn read_request<R: Read>(conn: &mut R) -> Result<String, ServerError> {
    let mut buffer = [0u8; READ_BUFFER_SIZE];
    let bytes_read = conn.read(&mut buffer)?;

    String::from_utf8(buffer[..bytes_read].to_vec())
        .map_err(|_| ServerError::InvalidEncoding { context: "request" })
}

/// Request line parseada: los tres campos son siempre no vacíos
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    method: String,
    path: String,
    version: String,
}

impl RequestLine {
    /// Parsea la primera línea del texto del request
    ///
    /// Formato: `METHOD PATH VERSION`. No se valida el método ni el path,
    /// solo que haya exactamente tres tokens separados por whitespace.
    ///
    /// # Ejemplo
    /// ```
    /// use gateway_server::http::RequestLine;
    ///
    /// let line = RequestLine::parse("GET /hello HTTP/1.1\r\nHost: x\r\n\r\n").unwrap();
    /// assert_eq!(line.method(), "GET");
    /// assert_eq!(line.path(), "/hello");
    /// assert_eq!(line.version(), "HTTP/1.1");
    /// ```
    pub fn parse(text: &str) -> Result<Self, ServerError> {
        let line = text
            .split(|c: char| c == '\r' || c == '\n')
            .next()
            .unwrap_or_default();

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            [method, path, version] => Ok(RequestLine {
                method: method.to_string(),
                path: path.to_string(),
                version: version.to_string(),
            }),
            _ => Err(ServerError::malformed_request_line(line)),
        }
    }

    /// Método HTTP tal como llegó (ej: "GET")
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Path de la petición (ej: "/hello")
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Versión del protocolo (ej: "HTTP/1.1")
    pub fn version(&self) -> &str {
        &self.version
    }
}
