//! # Aplicaciones
//! src/app/mod.rs
//!
//! Interfaz entre el servidor y la aplicación que atiende los requests.
//!
//! ```text
//! Environ + StartResponse → Application::handle → Body (chunks)
//! ```
//!
//! El servidor solo depende del trait `Application`. Cualquier función o
//! closure con la firma correcta ya es una aplicación.

pub mod demo;
pub mod registry;

pub use registry::AppRegistry;

use crate::environ::Environ;
use crate::error::ServerError;
use crate::http::StartResponse;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Secuencia finita de chunks binarios, se recorre una sola vez
pub type Body = Box<dyn Iterator<Item = Vec<u8>>>;

/// Construye un `Body` desde cualquier colección de chunks
///
/// # Ejemplo
/// ```
/// use gateway_server::app::body;
///
/// let mut chunks = body(vec![b"hi".to_vec()]);
/// assert_eq!(chunks.next(), Some(b"hi".to_vec()));
/// assert_eq!(chunks.next(), None);
/// ```
pub fn body<I>(chunks: I) -> Body
where
    I: IntoIterator<Item = Vec<u8>>,
    I::IntoIter: 'static,
{
    Box::new(chunks.into_iter())
}

/// Aplicación invocada una vez por ciclo
///
/// Debe llamar a `start_response.start(...)` antes de retornar; si no lo
/// hace, el ciclo falla con `ResponseStateMissing`.
pub trait Application: Send + Sync {
    fn handle(&self, environ: &mut Environ, start_response: &mut StartResponse) -> Body;
}

impl<F> Application for F
where
    F: Fn(&mut Environ, &mut StartResponse) -> Body + Send + Sync,
{
    fn handle(&self, environ: &mut Environ, start_response: &mut StartResponse) -> Body {
        self(environ, start_response)
    }
}

/// Llama a la aplicación con un `StartResponse` nuevo
///
/// No interpreta ni bufferea el body: se lo devuelve tal cual al
/// serializador, junto con el callback para que lea el estado.
pub fn invoke(app: &dyn Application, environ: &mut Environ) -> (StartResponse, Body) {
    let mut start_response = StartResponse::new();
    let body = app.handle(environ, &mut start_response);
    (start_response, body)
}

/// Ejecuta un tramo que corre código de la aplicación y convierte un panic
/// en `ApplicationPanicked`
///
/// El body se consume de forma perezosa, así que el tramo debe cubrir desde
/// `invoke` hasta que el serializador agota los chunks.
pub fn catch_application_panic<T, F>(stage: F) -> Result<T, ServerError>
where
    F: FnOnce() -> Result<T, ServerError>,
{
    panic::catch_unwind(AssertUnwindSafe(stage)).unwrap_or_else(|payload| {
        Err(ServerError::ApplicationPanicked { message: panic_message(payload.as_ref()) })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
