//! # Módulo HTTP
//!
//! Lo mínimo del protocolo HTTP/1.1 que necesita el gateway, hecho a mano:
//!
//! - Lectura acotada del request y parsing de la request line
//! - Estado de respuesta y callback `start_response`
//! - Serialización de status line, headers y body
//!
//! No hay keep-alive, pipelining, chunked encoding ni TLS: cada conexión
//! lleva exactamente un request y una respuesta.

pub mod request;
pub mod response;
pub mod status;

// Re-exportamos los tipos principales para facilitar su uso
pub use request::{read_request, RequestLine};
pub use response::{fallback_response, serialize, Headers, ResponseState, StartResponse};
pub use status::StatusCode;
