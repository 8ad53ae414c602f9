//! # Servidor TCP
//! src/server/tcp.rs
//!
//! Servidor síncrono de un solo thread. Cada ciclo se ejecuta completo antes
//! de aceptar la siguiente conexión:
//!
//! ```text
//! ACCEPTED → READ → PARSED → ENV_BUILT → INVOKED → SERIALIZED → CLOSED
//! ```
//!
//! Cualquier fallo salta directo a CLOSED: la conexión se cierra siempre,
//! exactamente una vez. Una aplicación que se bloquea bloquea todo el
//! servidor.

use super::listener::{resolve_address, resolve_server_name, Listener, ServerIdentity};
use crate::app::{catch_application_panic, invoke, Application};
use crate::config::Config;
use crate::environ::Environ;
use crate::error::ServerError;
use crate::http::{fallback_response, read_request, serialize, RequestLine};
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

/// Conexión de un ciclo: stream bidireccional que se puede cerrar
pub trait Connection: Read + Write {
    fn close(&mut self) -> io::Result<()>;
}

impl Connection for TcpStream {
    fn close(&mut self) -> io::Result<()> {
        match self.shutdown(Shutdown::Both) {
            // El peer ya cerró: no hay nada más que hacer
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

/// Cierra la conexión al salir del ciclo, pase lo que pase
struct CloseGuard<C: Connection> {
    conn: C,
}

impl<C: Connection> Deref for CloseGuard<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.conn
    }
}

impl<C: Connection> DerefMut for CloseGuard<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.conn
    }
}

impl<C: Connection> Drop for CloseGuard<C> {
    fn drop(&mut self) {
        if let Err(e) = self.conn.close() {
            tracing::debug!(error = %e, "error closing connection");
        }
    }
}

/// Resultado de los pasos previos al envío
struct Exchange {
    request: RequestLine,
    status: String,
    response: String,
}

/// Escribe todos los bytes de la respuesta en una sola llamada bloqueante
pub fn send<W: Write>(conn: &mut W, bytes: &[u8]) -> io::Result<()> {
    conn.write_all(bytes)?;
    conn.flush()
}

/// Formatea un texto línea por línea con un prefijo, estilo `curl -v`
///
/// # Ejemplo
/// ```
/// use gateway_server::server::dump_lines;
///
/// assert_eq!(dump_lines('<', "GET / HTTP/1.1\r\nHost: x\r\n"), "< GET / HTTP/1.1\n< Host: x\n");
/// ```
pub fn dump_lines(prefix: char, text: &str) -> String {
    text.lines().map(|line| format!("{} {}\n", prefix, line)).collect()
}

/// Servidor gateway: un listener, una aplicación, un ciclo a la vez
pub struct Server {
    listener: Listener,
    identity: ServerIdentity,
    app: Arc<dyn Application>,
    fail_fast: bool,
    dump: bool,
}

impl Server {
    /// Abre el listener y fija la identidad del servidor
    ///
    /// Un fallo de bind es fatal y se retorna tal cual.
    pub fn bind(config: &Config, app: Arc<dyn Application>) -> Result<Self, ServerError> {
        let address = resolve_address(&config.host, config.port)?;
        let listener = Listener::open(address)?;
        let local_addr = listener.local_addr();

        let server_name =
            resolve_server_name(config.bind_host(), &local_addr, config.server_name.as_deref());
        let identity = ServerIdentity::new(config.host.as_str(), local_addr.port(), server_name);

        tracing::info!(
            address = %local_addr,
            host = identity.host(),
            server_name = identity.server_name(),
            "listening"
        );

        Ok(Self {
            listener,
            identity,
            app,
            fail_fast: config.fail_fast,
            dump: !config.quiet,
        })
    }

    pub fn identity(&self) -> &ServerIdentity {
        &self.identity
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    /// Acepta y atiende conexiones para siempre
    ///
    /// Con `fail_fast` retorna ante el primer fallo; si no, registra el fallo
    /// y sigue con la siguiente conexión.
    pub fn serve_forever(&self) -> Result<(), ServerError> {
        loop {
            if let Err(e) = self.handle_next() {
                if self.fail_fast {
                    tracing::error!(error = %e, "cycle failed, stopping server");
                    return Err(e);
                }
                if e.is_client_fault() {
                    tracing::info!(error = %e, "bad request");
                } else {
                    tracing::warn!(error = %e, "cycle failed");
                }
            }
        }
    }

    /// Bloquea hasta la siguiente conexión y la atiende completa
    pub fn handle_next(&self) -> Result<(), ServerError> {
        let (stream, peer) = self.listener.accept_next()?;
        tracing::debug!(peer = %peer, "accepted connection");
        self.handle_connection(stream)
    }

    /// Ejecuta un ciclo completo sobre una conexión ya aceptada
    pub fn handle_connection<C: Connection>(&self, conn: C) -> Result<(), ServerError> {
        let start = Instant::now();
        let mut conn = CloseGuard { conn };

        let exchange = match self.prepare_response(&mut *conn) {
            Ok(exchange) => exchange,
            Err(e) => {
                if !self.fail_fast {
                    self.send_fallback(&mut *conn);
                }
                return Err(e);
            }
        };

        self.print_dump('>', &exchange.response);
        send(&mut *conn, exchange.response.as_bytes())?;

        tracing::info!(
            method = exchange.request.method(),
            path = exchange.request.path(),
            status = %exchange.status,
            bytes = exchange.response.len(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "request served"
        );

        Ok(())
    }

    /// READ → PARSED → ENV_BUILT → INVOKED → SERIALIZED
    fn prepare_response<C: Connection>(&self, conn: &mut C) -> Result<Exchange, ServerError> {
        let raw = read_request(conn)?;
        self.print_dump('<', &raw);

        let request = RequestLine::parse(&raw)?;
        let mut environ = Environ::build(&request, &self.identity, &raw);

        // INVOKED → SERIALIZED: el body es código de la aplicación que se
        // ejecuta recién al serializar
        let mut render = || -> Result<(String, String), ServerError> {
            let (start_response, body) = invoke(self.app.as_ref(), &mut environ);
            let state = start_response.into_state()?;
            let response = serialize(&state, body, SystemTime::now())?;
            Ok((state.status().to_string(), response))
        };

        let (status, response) = if self.fail_fast {
            render()?
        } else {
            catch_application_panic(render)?
        };

        Ok(Exchange { request, status, response })
    }

    fn send_fallback<C: Connection>(&self, conn: &mut C) {
        let response = fallback_response(SystemTime::now());
        self.print_dump('>', &response);
        if let Err(e) = send(conn, response.as_bytes()) {
            tracing::debug!(error = %e, "cannot send fallback response");
        }
    }

    fn print_dump(&self, prefix: char, text: &str) {
        if self.dump {
            println!("{}", dump_lines(prefix, text));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{body, Body};
    use crate::http::StartResponse;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Conexión en memoria que registra lo escrito y los cierres
    struct FakeConnection {
        input: io::Cursor<Vec<u8>>,
        written: Rc<RefCell<Vec<u8>>>,
        closes: Rc<RefCell<usize>>,
        fail_writes: bool,
    }

    impl FakeConnection {
        fn new(request: &[u8]) -> Self {
            Self {
                input: io::Cursor::new(request.to_vec()),
                written: Rc::new(RefCell::new(Vec::new())),
                closes: Rc::new(RefCell::new(0)),
                fail_writes: false,
            }
        }
    }

    impl Read for FakeConnection {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for FakeConnection {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail_writes {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer"));
            }
            self.written.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Connection for FakeConnection {
        fn close(&mut self) -> io::Result<()> {
            *self.closes.borrow_mut() += 1;
            Ok(())
        }
    }

    fn text_app(_: &mut Environ, start_response: &mut StartResponse) -> Body {
        start_response.start("200 OK", vec![("Content-Type".into(), "text/plain".into())]);
        body(vec![b"hi".to_vec()])
    }

    fn silent_app(_: &mut Environ, _: &mut StartResponse) -> Body {
        body(Vec::new())
    }

    /// Arranca la respuesta pero devuelve un chunk que no es UTF-8
    fn binary_app(_: &mut Environ, start_response: &mut StartResponse) -> Body {
        start_response.start("200 OK", vec![("Content-Type".into(), "text/plain".into())]);
        body(vec![vec![0xff]])
    }

    fn extract_body(response: &str) -> &str {
        response.split_once("\r\n\r\n").map(|(_, body)| body).unwrap_or_default()
    }

    fn server(app: Arc<dyn Application>, fail_fast: bool) -> Server {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            fail_fast,
            quiet: true,
            ..Config::default()
        };
        Server::bind(&config, app).unwrap()
    }

    /// Ejecuta un ciclo y retorna (resultado, texto escrito, cierres)
    fn run_cycle(server: &Server, conn: FakeConnection) -> (Result<(), ServerError>, String, usize) {
        let written = Rc::clone(&conn.written);
        let closes = Rc::clone(&conn.closes);
        let result = server.handle_connection(conn);
        let text = String::from_utf8(written.borrow().clone()).unwrap();
        let closes = *closes.borrow();
        (result, text, closes)
    }

    // ==================== Ciclo exitoso ====================

    #[test]
    fn test_cycle_success() {
        let server = server(Arc::new(text_app), false);
        let conn = FakeConnection::new(b"GET /hello HTTP/1.1\r\nHost: x\r\n\r\n");

        let (result, text, closes) = run_cycle(&server, conn);

        assert!(result.is_ok());
        assert!(text.starts_with("HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nDate: "));
        assert!(text.contains("\r\nServer: GatewayServer/"));
        assert!(text.ends_with("\r\n\r\nhi"));
        assert_eq!(closes, 1);
    }

    #[test]
    fn test_environment_reaches_application() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);
        let app = move |environ: &mut Environ, start_response: &mut StartResponse| -> Body {
            for key in ["REQUEST_METHOD", "PATH_INFO", "SERVER_NAME"] {
                let value = environ.get_str(key).unwrap_or_default().to_string();
                record.lock().unwrap().push(value);
            }
            start_response.start("200 OK", vec![]);
            body(Vec::new())
        };
        let server = server(Arc::new(app), false);

        let (result, _, _) = run_cycle(&server, FakeConnection::new(b"GET /hello HTTP/1.1\r\n\r\n"));

        assert!(result.is_ok());
        assert_eq!(*seen.lock().unwrap(), vec!["GET", "/hello", "localhost"]);
    }

    // ==================== Fallos (modo fail-fast) ====================

    #[test]
    fn test_malformed_request_skips_application() {
        let called = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = Arc::clone(&called);
        let app = move |_: &mut Environ, start_response: &mut StartResponse| -> Body {
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
            start_response.start("200 OK", vec![]);
            body(Vec::new())
        };
        let server = server(Arc::new(app), true);

        let (result, text, closes) = run_cycle(&server, FakeConnection::new(b"BADLINE\r\n\r\n"));

        assert!(matches!(result, Err(ServerError::MalformedRequestLine { .. })));
        assert!(!called.load(std::sync::atomic::Ordering::SeqCst));
        assert!(text.is_empty());
        assert_eq!(closes, 1);
    }

    #[test]
    fn test_missing_response_state_fails_and_closes() {
        let server = server(Arc::new(silent_app), true);

        let (result, text, closes) = run_cycle(&server, FakeConnection::new(b"GET / HTTP/1.1\r\n\r\n"));

        assert!(matches!(result, Err(ServerError::ResponseStateMissing)));
        assert!(text.is_empty());
        assert_eq!(closes, 1);
    }

    #[test]
    fn test_serialize_failure_closes_once() {
        let server = server(Arc::new(binary_app), true);

        let (result, text, closes) = run_cycle(&server, FakeConnection::new(b"GET / HTTP/1.1\r\n\r\n"));

        assert!(matches!(result, Err(ServerError::InvalidEncoding { .. })));
        assert!(text.is_empty());
        assert_eq!(closes, 1);
    }

    #[test]
    fn test_write_failure_still_closes_once() {
        let server = server(Arc::new(text_app), true);
        let mut conn = FakeConnection::new(b"GET / HTTP/1.1\r\n\r\n");
        conn.fail_writes = true;

        let (result, _, closes) = run_cycle(&server, conn);

        assert!(matches!(result, Err(ServerError::Io { .. })));
        assert_eq!(closes, 1);
    }

    // ==================== Fallos (modo endurecido) ====================

    #[test]
    fn test_hardened_malformed_request_gets_500() {
        let server = server(Arc::new(text_app), false);

        let (result, text, closes) = run_cycle(&server, FakeConnection::new(b"BADLINE\r\n\r\n"));

        assert!(result.is_err());
        assert!(text.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert_eq!(closes, 1);
    }

    #[test]
    fn test_hardened_application_panic_gets_500() {
        let app = |_: &mut Environ, _: &mut StartResponse| -> Body { panic!("application bug") };
        let server = server(Arc::new(app), false);

        let (result, text, closes) = run_cycle(&server, FakeConnection::new(b"GET / HTTP/1.1\r\n\r\n"));

        assert!(matches!(result, Err(ServerError::ApplicationPanicked { .. })));
        assert!(text.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert_eq!(closes, 1);
    }

    #[test]
    fn test_hardened_lazy_body_panic_gets_500() {
        let app = |_: &mut Environ, start_response: &mut StartResponse| -> Body {
            start_response.start("200 OK", vec![]);
            Box::new((0..1).map(|_| -> Vec<u8> { panic!("lazy body bug") }))
        };
        let server = server(Arc::new(app), false);

        let (result, text, closes) = run_cycle(&server, FakeConnection::new(b"GET / HTTP/1.1\r\n\r\n"));

        assert!(matches!(
            result,
            Err(ServerError::ApplicationPanicked { ref message }) if message == "lazy body bug"
        ));
        assert!(text.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert_eq!(closes, 1);
    }

    #[test]
    fn test_hardened_serialize_failure_gets_500() {
        let server = server(Arc::new(binary_app), false);

        let (result, text, closes) = run_cycle(&server, FakeConnection::new(b"GET / HTTP/1.1\r\n\r\n"));

        assert!(matches!(result, Err(ServerError::InvalidEncoding { .. })));
        assert!(text.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert_eq!(extract_body(&text), "Internal Server Error");
        assert_eq!(closes, 1);
    }

    #[test]
    fn test_hardened_write_failure_sends_no_fallback() {
        let server = server(Arc::new(text_app), false);
        let mut conn = FakeConnection::new(b"GET / HTTP/1.1\r\n\r\n");
        conn.fail_writes = true;

        let (result, text, closes) = run_cycle(&server, conn);

        assert!(matches!(result, Err(ServerError::Io { .. })));
        assert!(text.is_empty());
        assert_eq!(closes, 1);
    }

    // ==================== Helpers ====================

    #[test]
    fn test_send_writes_identical_bytes() {
        let bytes = b"HTTP/1.1 200 OK\r\n\r\nhi";
        let mut first = Vec::new();
        let mut second = Vec::new();

        send(&mut first, bytes).unwrap();
        send(&mut second, bytes).unwrap();

        assert_eq!(first, bytes);
        assert_eq!(first, second);
    }

    #[test]
    fn test_dump_lines() {
        assert_eq!(
            dump_lines('>', "HTTP/1.1 200 OK\r\n\r\nhi"),
            "> HTTP/1.1 200 OK\n> \n> hi\n"
        );
        assert_eq!(dump_lines('<', ""), "");
    }
}
