//! # Entorno de Invocación
//! src/environ.rs
//!
//! Convierte la request line, la identidad del servidor y el texto crudo
//! del request en el entorno plano (estilo CGI) que recibe la aplicación.
//!
//! ## Entradas fijas
//!
//! | Clave                  | Valor                          |
//! |------------------------|--------------------------------|
//! | `gateway.version`      | `(1, 0)`                       |
//! | `gateway.url_scheme`   | `"http"`                       |
//! | `gateway.input`        | stream de lectura sobre el texto crudo |
//! | `gateway.errors`       | stderr del proceso             |
//! | `gateway.multithread`  | `false`                        |
//! | `gateway.multiprocess` | `false`                        |
//! | `gateway.run_once`     | `false`                        |
//! | `REQUEST_METHOD`       | método de la request line      |
//! | `PATH_INFO`            | path de la request line        |
//! | `SERVER_NAME`          | nombre resuelto del servidor   |
//! | `SERVER_PORT`          | puerto como string             |

use crate::http::RequestLine;
use crate::server::ServerIdentity;
use std::io::{self, Cursor};

/// Nombres de las claves del entorno
pub mod keys {
    pub const VERSION: &str = "gateway.version";
    pub const URL_SCHEME: &str = "gateway.url_scheme";
    pub const INPUT: &str = "gateway.input";
    pub const ERRORS: &str = "gateway.errors";
    pub const MULTITHREAD: &str = "gateway.multithread";
    pub const MULTIPROCESS: &str = "gateway.multiprocess";
    pub const RUN_ONCE: &str = "gateway.run_once";
    pub const REQUEST_METHOD: &str = "REQUEST_METHOD";
    pub const PATH_INFO: &str = "PATH_INFO";
    pub const SERVER_NAME: &str = "SERVER_NAME";
    pub const SERVER_PORT: &str = "SERVER_PORT";
}

/// Versión del contrato de invocación
pub const GATEWAY_VERSION: (u8, u8) = (1, 0);

/// Valor de una entrada del entorno
#[derive(Debug)]
pub enum EnvValue {
    Str(String),
    Bool(bool),
    Version(u8, u8),
    /// Body del request: el texto crudo leído de la conexión
    Input(Cursor<String>),
    Errors(io::Stderr),
}

/// Entorno ordenado que vive solo durante una invocación
#[derive(Debug)]
pub struct Environ {
    entries: Vec<(&'static str, EnvValue)>,
}

impl Environ {
    /// Construye el entorno de un ciclo
    ///
    /// Determinista para las mismas entradas (salvo los streams, que son
    /// objetos nuevos en cada llamada).
    pub fn build(request: &RequestLine, identity: &ServerIdentity, raw: &str) -> Self {
        let (major, minor) = GATEWAY_VERSION;
        let entries = vec![
            (keys::VERSION, EnvValue::Version(major, minor)),
            (keys::URL_SCHEME, EnvValue::Str("http".to_string())),
            (keys::INPUT, EnvValue::Input(Cursor::new(raw.to_string()))),
            (keys::ERRORS, EnvValue::Errors(io::stderr())),
            (keys::MULTITHREAD, EnvValue::Bool(false)),
            (keys::MULTIPROCESS, EnvValue::Bool(false)),
            (keys::RUN_ONCE, EnvValue::Bool(false)),
            (keys::REQUEST_METHOD, EnvValue::Str(request.method().to_string())),
            (keys::PATH_INFO, EnvValue::Str(request.path().to_string())),
            (keys::SERVER_NAME, EnvValue::Str(identity.server_name().to_string())),
            (keys::SERVER_PORT, EnvValue::Str(identity.port().to_string())),
        ];

        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&EnvValue> {
        self.entries
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value)
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut EnvValue> {
        self.entries
            .iter_mut()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value)
    }

    /// Obtiene una entrada de texto
    ///
    /// # Ejemplo
    /// ```ignore
    /// let method = environ.get_str(keys::REQUEST_METHOD); // Some("GET")
    /// ```
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            EnvValue::Str(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            EnvValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn version(&self) -> Option<(u8, u8)> {
        match self.get(keys::VERSION)? {
            EnvValue::Version(major, minor) => Some((*major, *minor)),
            _ => None,
        }
    }

    /// Stream de entrada con el texto crudo del request
    pub fn input(&mut self) -> Option<&mut Cursor<String>> {
        match self.get_mut(keys::INPUT)? {
            EnvValue::Input(stream) => Some(stream),
            _ => None,
        }
    }

    /// Stream de errores de la aplicación
    pub fn errors(&mut self) -> Option<&mut io::Stderr> {
        match self.get_mut(keys::ERRORS)? {
            EnvValue::Errors(stream) => Some(stream),
            _ => None,
        }
    }

    /// Recorre las entradas en orden de inserción
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &EnvValue)> {
        self.entries.iter().map(|(name, value)| (*name, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn identity() -> ServerIdentity {
        ServerIdentity::new("127.0.0.1", 8888, "localhost")
    }

    const RAW: &str = "GET /hello HTTP/1.1\r\nHost: x\r\n\r\n";

    fn build() -> Environ {
        let request = RequestLine::parse(RAW).unwrap();
        Environ::build(&request, &identity(), RAW)
    }

    #[test]
    fn test_cgi_variables() {
        let environ = build();

        assert_eq!(environ.get_str(keys::REQUEST_METHOD), Some("GET"));
        assert_eq!(environ.get_str(keys::PATH_INFO), Some("/hello"));
        assert_eq!(environ.get_str(keys::SERVER_NAME), Some("localhost"));
        assert_eq!(environ.get_str(keys::SERVER_PORT), Some("8888"));
    }

    #[test]
    fn test_gateway_variables() {
        let environ = build();

        assert_eq!(environ.version(), Some((1, 0)));
        assert_eq!(environ.get_str(keys::URL_SCHEME), Some("http"));
        assert_eq!(environ.get_bool(keys::MULTITHREAD), Some(false));
        assert_eq!(environ.get_bool(keys::MULTIPROCESS), Some(false));
        assert_eq!(environ.get_bool(keys::RUN_ONCE), Some(false));
        assert_eq!(environ.len(), 11);
    }

    #[test]
    fn test_input_stream_reads_raw_text() {
        let mut environ = build();

        let mut body = String::new();
        environ.input().unwrap().read_to_string(&mut body).unwrap();
        assert_eq!(body, RAW);
    }

    #[test]
    fn test_errors_stream_present() {
        let mut environ = build();
        assert!(environ.errors().is_some());
    }

    #[test]
    fn test_wrong_type_lookups() {
        let environ = build();

        assert_eq!(environ.get_bool(keys::REQUEST_METHOD), None);
        assert_eq!(environ.get_str(keys::MULTITHREAD), None);
        assert_eq!(environ.get_str("HTTP_HOST"), None);
    }

    #[test]
    fn test_build_is_deterministic() {
        let first = build();
        let second = build();

        for key in [keys::REQUEST_METHOD, keys::PATH_INFO, keys::SERVER_NAME, keys::SERVER_PORT] {
            assert_eq!(first.get_str(key), second.get_str(key));
        }
        let first_keys: Vec<_> = first.iter().map(|(name, _)| name).collect();
        let second_keys: Vec<_> = second.iter().map(|(name, _)| name).collect();
        assert_eq!(first_keys, second_keys);
    }
}
