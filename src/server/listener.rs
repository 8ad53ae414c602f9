//! # Socket de Escucha
//! src/server/listener.rs
//!
//! El listener se crea con `SO_REUSEADDR` (reinicio inmediato sin esperar
//! TIME_WAIT) y un backlog de exactamente 1: mientras se atiende una
//! conexión, solo una más puede quedar en cola.

use crate::error::ServerError;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

/// Host que se usa cuando no se configura ninguno
pub const ALL_INTERFACES: &str = "0.0.0.0";

/// Conexiones pendientes que acepta el kernel mientras se atiende una
pub const BACKLOG: i32 = 1;

/// Identidad del servidor: se fija al arrancar y no cambia
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerIdentity {
    host: String,
    port: u16,
    server_name: String,
}

impl ServerIdentity {
    pub fn new<H: Into<String>, N: Into<String>>(host: H, port: u16, server_name: N) -> Self {
        Self { host: host.into(), port, server_name: server_name.into() }
    }

    /// Host tal como se configuró (vacío = todas las interfaces)
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Puerto realmente asignado por el bind
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }
}

/// Socket de escucha que acepta una conexión a la vez
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Crea, configura y pone a escuchar el socket
    pub fn open(address: SocketAddr) -> Result<Self, ServerError> {
        let bind = |source: std::io::Error| ServerError::bind(address, source);

        let socket = Socket::new(Domain::for_address(address), Type::STREAM, Some(Protocol::TCP))
            .map_err(bind)?;
        socket.set_reuse_address(true).map_err(bind)?;
        socket.bind(&address.into()).map_err(bind)?;
        socket.listen(BACKLOG).map_err(bind)?;

        let inner = TcpListener::from(socket);
        let local_addr = inner.local_addr()?;

        Ok(Self { inner, local_addr })
    }

    /// Bloquea hasta que un cliente se conecte (sin timeout)
    pub fn accept_next(&self) -> Result<(TcpStream, SocketAddr), ServerError> {
        Ok(self.inner.accept()?)
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

/// Host efectivo para el bind: vacío = todas las interfaces
pub fn bind_host(host: &str) -> &str {
    if host.is_empty() {
        ALL_INTERFACES
    } else {
        host
    }
}

/// Resuelve host y puerto a una dirección de socket
pub fn resolve_address(host: &str, port: u16) -> Result<SocketAddr, ServerError> {
    let host = bind_host(host);
    let display = format!("{}:{}", host, port);

    (host, port)
        .to_socket_addrs()
        .map_err(|e| ServerError::bind(&display, e))?
        .next()
        .ok_or_else(|| {
            ServerError::bind(
                &display,
                std::io::Error::new(std::io::ErrorKind::NotFound, "host resolved to no address"),
            )
        })
}

/// Nombre completo del servidor para `SERVER_NAME`
///
/// Orden: nombre explícito; `localhost` para loopback; para todas las
/// interfaces, el hostname de la máquina calificado por DNS; para una IP
/// concreta, su nombre reverso. Si la resolución falla queda el host tal
/// cual (o `localhost` si no hay hostname).
pub fn resolve_server_name(host: &str, address: &SocketAddr, explicit: Option<&str>) -> String {
    if let Some(name) = explicit {
        return name.to_string();
    }

    let ip = address.ip();
    if ip.is_loopback() {
        "localhost".to_string()
    } else if ip.is_unspecified() {
        match dns_lookup::get_hostname() {
            Ok(hostname) if !hostname.is_empty() => qualify(&hostname),
            Ok(_) => "localhost".to_string(),
            Err(e) => {
                tracing::debug!(error = %e, "cannot read machine hostname");
                "localhost".to_string()
            }
        }
    } else {
        pick_name(dns_lookup::lookup_addr(&ip), &ip, host)
    }
}

/// Intenta pasar de hostname corto a nombre completo vía DNS
fn qualify(hostname: &str) -> String {
    let first_ip = dns_lookup::lookup_host(hostname)
        .ok()
        .and_then(|ips| ips.into_iter().find(|ip| !ip.is_loopback()));

    match first_ip {
        Some(ip) => pick_name(dns_lookup::lookup_addr(&ip), &ip, hostname),
        None => hostname.to_string(),
    }
}

/// Se queda con el nombre reverso si es un nombre real, si no con `fallback`
fn pick_name(reverse: io::Result<String>, ip: &IpAddr, fallback: &str) -> String {
    match reverse {
        Ok(name) if !name.is_empty() && name != ip.to_string() => name,
        Ok(_) => fallback.to_string(),
        Err(e) => {
            tracing::debug!(ip = %ip, error = %e, "reverse lookup failed");
            fallback.to_string()
        }
    }
}
