//! # Códigos de Estado HTTP
//!
//! Este módulo define los códigos de estado HTTP/1.0 que usará el servidor.
//! Según el RFC 1945, HTTP/1.0 define códigos en 5 categorías:
//!
//! - **1xx**: Informacional (no se usan en HTTP/1.0)
//! - **2xx**: Éxito (200 OK)
//! - **3xx**: Redirección (no soportadas)
//! - **4xx**: Error del cliente (400, 404, 413)
//! - **5xx**: Error del servidor (el servidor no los emite)

/// Representa los códigos de estado HTTP que soporta nuestro servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK - La petición fue exitosa
    Ok = 200,
    
    /// 400 Bad Request - Request line o headers malformados
    BadRequest = 400,
    
    /// 404 Not Found - Ningún prefijo registrado coincide con la URI
    NotFound = 404,
    
    /// 413 Payload Too Large - El Content-Length declarado supera el límite
    PayloadTooLarge = 413,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    /// 
    /// # Ejemplo
    /// ```
    /// use raw_http_server::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }
    
    /// Retorna el texto de razón (reason phrase) asociado al código
    /// 
    /// Estos textos están definidos en el RFC 1945 y son estándares.
    /// 
    /// # Ejemplo
    /// ```
    /// use raw_http_server::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::PayloadTooLarge => "Payload Too Large",
        }
    }
}

impl std::fmt::Display for StatusCode {
    /// Formatea el código de estado para mostrarlo
    /// 
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_status_code_values() {
        assert_eq!(StatusCode::Ok.as_u16(), 200);
        assert_eq!(StatusCode::BadRequest.as_u16(), 400);
        assert_eq!(StatusCode::NotFound.as_u16(), 404);
        assert_eq!(StatusCode::PayloadTooLarge.as_u16(), 413);
    }
    
    #[test]
    fn test_reason_phrases() {
        assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
        assert_eq!(StatusCode::BadRequest.reason_phrase(), "Bad Request");
        assert_eq!(StatusCode::PayloadTooLarge.reason_phrase(), "Payload Too Large");
    }
    
    #[test]
    fn test_display() {
        assert_eq!(StatusCode::Ok.to_string(), "200 OK");
        assert_eq!(StatusCode::NotFound.to_string(), "404 Not Found");
        assert_eq!(StatusCode::PayloadTooLarge.to_string(), "413 Payload Too Large");
    }
}