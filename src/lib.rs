//! # Gateway Server
//! src/lib.rs
//!
//! Servidor HTTP/1.1 mínimo que adapta conexiones TCP a llamadas contra una
//! aplicación intercambiable, usando un entorno de variables estilo CGI.
//!
//! ## Arquitectura
//!
//! ```text
//! Listener → read_request → RequestLine::parse → Environ::build
//!          → Application::handle → serialize → send → close
//! ```
//!
//! - `server`: listener y ciclo por conexión (un solo thread, bloqueante)
//! - `http`: request line, estado de respuesta y serialización
//! - `environ`: entorno de invocación
//! - `app`: trait `Application`, registro `module:callable` y apps de ejemplo
//! - `config`: configuración CLI / variables de entorno
//! - `error`: errores del servidor
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use gateway_server::app::AppRegistry;
//! use gateway_server::config::Config;
//! use gateway_server::server::Server;
//!
//! let config = Config::default();
//! let app = AppRegistry::with_defaults().resolve(&config.app).unwrap();
//! let server = Server::bind(&config, app).unwrap();
//! server.serve_forever().unwrap();
//! ```

pub mod app;
pub mod config;
pub mod environ;
pub mod error;
pub mod http;
pub mod server;

pub use error::ServerError;
