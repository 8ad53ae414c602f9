//! # Errores del Servidor
//! src/error.rs
//!
//! Taxonomía de fallos de un ciclo de conexión y del arranque.
//!
//! Un request más grande que el buffer de lectura NO es un error: se trunca
//! en silencio y se parsea tal cual (ver `http::request`).

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// La request line no tiene exactamente 3 tokens (METHOD PATH VERSION)
    #[error("malformed request line: {line:?}")]
    MalformedRequestLine { line: String },

    /// Los bytes del request o un chunk del body no son UTF-8
    #[error("invalid utf-8 in {context}")]
    InvalidEncoding { context: &'static str },

    /// La aplicación retornó sin llamar a start_response
    #[error("application returned without calling start_response")]
    ResponseStateMissing,

    #[error("application panicked: {message}")]
    ApplicationPanicked { message: String },

    #[error("invalid application reference {reference:?}, expected module:callable")]
    InvalidApplicationReference { reference: String },

    #[error("unknown application {reference:?}")]
    UnknownApplication { reference: String },

    #[error("cannot bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ServerError {
    pub fn malformed_request_line<S: ToString>(line: S) -> Self {
        Self::MalformedRequestLine { line: line.to_string() }
    }

    pub fn bind<S: ToString>(address: S, source: io::Error) -> Self {
        Self::Bind { address: address.to_string(), source }
    }

    /// Fallos causados por lo que mandó el cliente
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            Self::MalformedRequestLine { .. } | Self::InvalidEncoding { context: "request" }
        )
    }
}
