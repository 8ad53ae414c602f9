//! # Módulo del Servidor
//! src/server/mod.rs
//!
//! Este módulo implementa el servidor TCP que:
//! 1. Escucha en un puerto (backlog de 1, `SO_REUSEADDR`)
//! 2. Acepta UNA conexión a la vez
//! 3. Lee el request, arma el entorno e invoca a la aplicación
//! 4. Serializa la respuesta, la envía y cierra la conexión

pub mod listener;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use listener::{Listener, ServerIdentity};
pub use tcp::{dump_lines, send, Connection, Server};
