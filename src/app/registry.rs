//! # Registro de Aplicaciones
//! src/app/registry.rs
//!
//! Mapea referencias `module:callable` a aplicaciones.
//!
//! ## Arquitectura
//!
//! ```text
//! "demo:hello" → AppRegistry → Arc<dyn Application> → Server
//! ```
//!
//! La referencia se elige una sola vez al arrancar (argumento de la CLI).

use super::{demo, Application};
use crate::error::ServerError;
use std::sync::Arc;

/// Registro de aplicaciones disponibles
pub struct AppRegistry {
    /// Lista de referencia → aplicación
    apps: Vec<(String, Arc<dyn Application>)>,
}

impl AppRegistry {
    /// Crea un registro vacío
    pub fn new() -> Self {
        Self { apps: Vec::new() }
    }

    /// Registro con las aplicaciones de ejemplo incluidas en el crate
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("demo:hello", demo::hello);
        registry.register("demo:environ", demo::environ);
        registry.register("demo:echo", demo::echo);
        registry.register("demo:silent", demo::silent);
        registry
    }

    /// Registra una aplicación bajo una referencia
    ///
    /// # Ejemplo
    /// ```
    /// use gateway_server::app::{body, AppRegistry, Body};
    /// use gateway_server::environ::Environ;
    /// use gateway_server::http::StartResponse;
    ///
    /// fn ping(_: &mut Environ, start_response: &mut StartResponse) -> Body {
    ///     start_response.start("200 OK", vec![]);
    ///     body(vec![b"pong".to_vec()])
    /// }
    ///
    /// let mut registry = AppRegistry::new();
    /// registry.register("health:ping", ping);
    /// assert!(registry.resolve("health:ping").is_ok());
    /// ```
    pub fn register<A: Application + 'static>(&mut self, reference: &str, app: A) {
        self.apps.push((reference.to_string(), Arc::new(app)));
    }

    /// Busca la aplicación de una referencia `module:callable`
    pub fn resolve(&self, reference: &str) -> Result<Arc<dyn Application>, ServerError> {
        parse_reference(reference)?;

        self.apps
            .iter()
            .find(|(name, _)| name == reference)
            .map(|(_, app)| Arc::clone(app))
            .ok_or_else(|| ServerError::UnknownApplication { reference: reference.to_string() })
    }

    /// Referencias registradas, en orden de registro
    pub fn references(&self) -> Vec<&str> {
        self.apps.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl Default for AppRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Separa `module:callable` en sus dos mitades
///
/// Exactamente un `:` y ambas mitades no vacías.
pub fn parse_reference(reference: &str) -> Result<(&str, &str), ServerError> {
    let invalid = || ServerError::InvalidApplicationReference { reference: reference.to_string() };

    let (module, callable) = reference.split_once(':').ok_or_else(invalid)?;
    if module.is_empty() || callable.is_empty() || callable.contains(':') {
        return Err(invalid());
    }
    Ok((module, callable))
}
