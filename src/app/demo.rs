//! # Aplicaciones de Ejemplo
//! src/app/demo.rs
//!
//! Aplicaciones incluidas para probar el servidor sin un framework externo:
//! - `demo:hello`: texto plano fijo
//! - `demo:environ`: el entorno de invocación como JSON
//! - `demo:echo`: devuelve lo que llegó por el input stream
//! - `demo:silent`: nunca llama a start_response

use super::{body, Body};
use crate::environ::{keys, EnvValue, Environ};
use crate::http::{StartResponse, StatusCode};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::io::Read;

fn json_headers() -> Vec<(String, String)> {
    vec![("Content-Type".to_string(), "application/json".to_string())]
}

/// Declara la respuesta según cómo salió la serialización JSON
///
/// Si falla se responde 500 en texto plano en vez de un JSON vacío.
fn json_body(start_response: &mut StartResponse, encoded: serde_json::Result<Vec<u8>>) -> Body {
    match encoded {
        Ok(bytes) => {
            start_response.start(StatusCode::Ok.to_string(), json_headers());
            body(vec![bytes])
        }
        Err(e) => {
            tracing::warn!(error = %e, "cannot serialize JSON body");
            start_response.start(
                StatusCode::InternalServerError.to_string(),
                vec![("Content-Type".to_string(), "text/plain".to_string())],
            );
            body(vec![b"Internal Server Error".to_vec()])
        }
    }
}

/// Handler para `demo:hello`
pub fn hello(_environ: &mut Environ, start_response: &mut StartResponse) -> Body {
    start_response.start(
        StatusCode::Ok.to_string(),
        vec![("Content-Type".to_string(), "text/plain".to_string())],
    );
    body(vec![b"Hello world from a simple gateway application!\n".to_vec()])
}

/// Handler para `demo:environ`
///
/// # Ejemplo de response
/// ```json
/// {
///   "PATH_INFO": "/hello",
///   "REQUEST_METHOD": "GET",
///   "gateway.input": "<input stream: 34 bytes>",
///   "gateway.version": [1, 0]
/// }
/// ```
pub fn environ(environ: &mut Environ, start_response: &mut StartResponse) -> Body {
    let mut variables = Map::new();
    for (name, value) in environ.iter() {
        let value = match value {
            EnvValue::Str(text) => Value::from(text.as_str()),
            EnvValue::Bool(flag) => Value::from(*flag),
            EnvValue::Version(major, minor) => json!([major, minor]),
            EnvValue::Input(stream) => {
                Value::from(format!("<input stream: {} bytes>", stream.get_ref().len()))
            }
            EnvValue::Errors(_) => Value::from("<stderr>"),
        };
        variables.insert(name.to_string(), value);
    }

    json_body(start_response, serde_json::to_vec_pretty(&Value::Object(variables)))
}

#[derive(Debug, Serialize)]
struct EchoReply {
    method: String,
    path: String,
    bytes: usize,
    raw: String,
}

/// Handler para `demo:echo`
///
/// Lee el input stream completo (request line, headers y lo que haya de
/// body dentro del buffer de lectura) y lo devuelve.
pub fn echo(environ: &mut Environ, start_response: &mut StartResponse) -> Body {
    let mut raw = String::new();
    if let Some(input) = environ.input() {
        if let Err(e) = input.read_to_string(&mut raw) {
            tracing::warn!(error = %e, "cannot read input stream");
        }
    }

    let reply = EchoReply {
        method: environ.get_str(keys::REQUEST_METHOD).unwrap_or_default().to_string(),
        path: environ.get_str(keys::PATH_INFO).unwrap_or_default().to_string(),
        bytes: raw.len(),
        raw,
    };

    json_body(start_response, serde_json::to_vec(&reply))
}

/// Handler para `demo:silent`: retorna body sin declarar la respuesta
pub fn silent(_environ: &mut Environ, _start_response: &mut StartResponse) -> Body {
    body(vec![b"nobody will see this".to_vec()])
}
