//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Route Table: mapea prefijos de path a handlers.
//!
//! ```text
//! Request → Router (prefijo más largo) → Handler → Response
//! ```
//!
//! Una URI coincide con todo prefijo registrado con el que empiece; gana el
//! más largo. Las entradas se mantienen ordenadas por largo descendente y
//! luego lexicográficamente, así que la resolución es determinista y basta
//! con quedarse con la primera coincidencia.
//!
//! La tabla se arma una sola vez al arrancar y después es de solo lectura.

use crate::http::{Request, Response};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Un handler recibe el Request y retorna la Response a serializar
pub type Handler = Box<dyn Fn(&Request) -> Response + Send + Sync>;

/// Ningún prefijo registrado coincide con la URI
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("no handler for path: {uri}")]
    NotFound { uri: String },
}

/// Router que mapea prefijos a handlers
#[derive(Default)]
pub struct Router {
    /// Ordenado por (largo desc, prefijo asc)
    routes: Vec<(String, Handler)>,
}

impl Router {
    /// Crea un router vacío
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registra un handler bajo un prefijo exacto
    ///
    /// Registrar otra vez el mismo prefijo reemplaza el handler anterior.
    ///
    /// # Ejemplo
    /// ```
    /// use raw_http_server::router::Router;
    /// use raw_http_server::http::Response;
    ///
    /// let mut router = Router::new();
    /// router.register("/hello", |_req| Response::html("<h1>Hello</h1>"));
    /// assert!(router.resolve("/hello/world").is_ok());
    /// ```
    pub fn register<F>(&mut self, prefix: &str, handler: F)
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        let position = self.routes.binary_search_by(|(existing, _)| {
            existing
                .len()
                .cmp(&prefix.len())
                .reverse()
                .then_with(|| existing.as_str().cmp(prefix))
        });

        match position {
            Ok(index) => self.routes[index].1 = Box::new(handler),
            Err(index) => self
                .routes
                .insert(index, (prefix.to_string(), Box::new(handler))),
        }
    }

    /// Busca el handler del prefijo más largo que coincide con `uri`
    pub fn resolve(&self, uri: &str) -> Result<&Handler, RouteError> {
        self.routes
            .iter()
            .find(|(prefix, _)| uri.starts_with(prefix.as_str()))
            .map(|(prefix, handler)| {
                debug!(%prefix, %uri, "found handler");
                handler
            })
            .ok_or_else(|| RouteError::NotFound {
                uri: uri.to_string(),
            })
    }

    /// Resuelve y ejecuta el handler para un request
    pub fn route(&self, request: &Request) -> Result<Response, RouteError> {
        let handler = self.resolve(request.uri())?;
        Ok(handler(request))
    }

    /// Prefijos registrados, en orden de prioridad
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|(prefix, _)| prefix.as_str())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("prefixes", &self.prefixes().collect::<Vec<_>>())
            .finish()
    }
}
