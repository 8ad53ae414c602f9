//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del gateway desde argumentos CLI y variables de entorno.
//! Se lee una sola vez al arrancar; no se puede cambiar en caliente.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./gateway_server demo:hello --port 8888
//! ./gateway_server demo:environ --host 127.0.0.1 --server-name api.local
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! GATEWAY_APP=demo:echo HTTP_PORT=9000 ./gateway_server
//! ```

use crate::app::registry::parse_reference;
use crate::server::listener::bind_host;
use clap::Parser;

/// Configuración del gateway
#[derive(Debug, Clone, Parser)]
#[command(name = "gateway_server")]
#[command(about = "Servidor HTTP/1.1 minimo que atiende una aplicacion module:callable")]
#[command(version)]
pub struct Config {
    /// Aplicación a servir, en formato module:callable (ej: demo:hello)
    #[arg(value_name = "MODULE:CALLABLE", env = "GATEWAY_APP")]
    pub app: String,

    /// Host/IP en el que escucha (vacío = todas las interfaces)
    #[arg(long, default_value = "", env = "HTTP_HOST")]
    pub host: String,

    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8888", env = "HTTP_PORT")]
    pub port: u16,

    /// Nombre del servidor para SERVER_NAME (por defecto se resuelve del host)
    #[arg(long = "server-name", env = "SERVER_NAME")]
    pub server_name: Option<String>,

    /// Termina el servidor ante el primer fallo de un ciclo en vez de
    /// responder 500 y seguir atendiendo
    #[arg(long = "fail-fast", env = "FAIL_FAST")]
    pub fail_fast: bool,

    /// No imprime el volcado `<` / `>` de requests y responses
    #[arg(short, long, env = "QUIET")]
    pub quiet: bool,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    ///
    /// Si falta la aplicación, clap imprime el uso y termina el proceso
    /// con código distinto de cero.
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// Un host vacío se traduce a todas las interfaces.
    ///
    /// # Ejemplo
    /// ```rust
    /// use gateway_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "0.0.0.0:8888");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind_host(), self.port)
    }

    /// Host efectivo para el bind (misma regla que usa el listener)
    pub fn bind_host(&self) -> &str {
        bind_host(&self.host)
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        parse_reference(&self.app).map_err(|e| e.to_string())?;

        if let Some(name) = &self.server_name {
            if name.trim().is_empty() {
                return Err("Server name must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Imprime un resumen de la configuración
    pub fn print_summary(&self) {
        println!("Gateway Server Configuration");
        println!("   Application:  {}", self.app);
        println!("   Address:      {}", self.address());
        if let Some(name) = &self.server_name {
            println!("   Server name:  {}", name);
        }
        println!(
            "   On failure:   {}",
            if self.fail_fast { "stop server" } else { "respond 500 and continue" }
        );
        println!("   Dump:         {}", if self.quiet { "off" } else { "on" });
        println!();
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            app: "demo:hello".to_string(),
            host: String::new(),
            port: 8888,
            server_name: None,
            fail_fast: false,
            quiet: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8888);
        assert_eq!(config.host, "");
        assert_eq!(config.app, "demo:hello");
        assert!(!config.fail_fast);
    }

    #[test]
    fn test_address_all_interfaces() {
        let config = Config::default();
        assert_eq!(config.address(), "0.0.0.0:8888");
    }

    #[test]
    fn test_address_custom() {
        let mut config = Config::default();
        config.host = "127.0.0.1".to_string();
        config.port = 3000;
        assert_eq!(config.address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_validate_success() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    // ==================== App Reference Validation ====================

    #[test]
    fn test_validate_missing_callable() {
        let mut config = Config::default();
        config.app = "demo".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("module:callable"));
    }

    #[test]
    fn test_validate_empty_server_name() {
        let mut config = Config::default();
        config.server_name = Some("  ".to_string());
        let result = config.validate();
        assert!(result.unwrap_err().contains("Server name"));
    }

    // ==================== CLI Parsing ====================

    #[test]
    fn test_parse_cli_args() {
        let config = Config::try_parse_from([
            "gateway_server",
            "demo:echo",
            "--host",
            "127.0.0.1",
            "-p",
            "9000",
            "--fail-fast",
            "--quiet",
        ])
        .unwrap();

        assert_eq!(config.app, "demo:echo");
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert!(config.fail_fast);
        assert!(config.quiet);
        assert_eq!(config.server_name, None);
    }

    #[test]
    fn test_parse_cli_requires_app() {
        // Sin variable de entorno de respaldo en el entorno de tests
        if std::env::var_os("GATEWAY_APP").is_some() {
            return;
        }
        let result = Config::try_parse_from(["gateway_server"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_print_summary() {
        let config = Config::default();
        // Should not panic
        config.print_summary();
    }
}
