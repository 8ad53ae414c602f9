//! # Códigos de Estado HTTP
//! src/http/status.rs
//!
//! El status line lo decide la aplicación como texto libre (ej: "200 OK"),
//! así que aquí solo están los códigos que el propio servidor necesita:
//! los de las aplicaciones de ejemplo y el de la respuesta de respaldo.

/// Códigos de estado que genera el servidor por su cuenta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK - La petición fue exitosa
    Ok = 200,

    /// 500 Internal Server Error - Respuesta de respaldo cuando falla un ciclo
    InternalServerError = 500,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use gateway_server::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Retorna el texto de razón (reason phrase) asociado al código
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK", listo para pasarlo a start_response
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
