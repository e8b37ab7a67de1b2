//! # Errores del Servidor
//! src/error.rs
//!
//! Taxonomía de errores del servidor:
//!
//! - [`SetupError`]: fallo al crear/configurar/bindear/escuchar el socket.
//!   Es el único error fatal: aborta el arranque del proceso.
//! - [`ParseError`](crate::http::request::ParseError): request malformado.
//! - [`RouteError`](crate::router::RouteError): ningún prefijo coincide.
//! - [`ServerError`]: agrupa todo lo que puede fallar durante un ciclo
//!   accept → parse → route → write → close.
//!
//! Los errores por conexión se loguean y el loop vuelve a aceptar.

use crate::http::request::ParseError;
use crate::router::RouteError;
use std::fmt;
use std::io;
use thiserror::Error;

/// Etapa del Listener Factory en la que ocurrió el fallo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStage {
    Socket,
    SetOption,
    Bind,
    Listen,
}

impl fmt::Display for SetupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SetupStage::Socket => "socket",
            SetupStage::SetOption => "setsockopt",
            SetupStage::Bind => "bind",
            SetupStage::Listen => "listen",
        };
        f.write_str(name)
    }
}

/// Error fatal durante la creación del socket de escucha
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct SetupError {
    pub stage: SetupStage,
    #[source]
    pub source: io::Error,
}

impl SetupError {
    pub fn new(stage: SetupStage, source: io::Error) -> Self {
        Self { stage, source }
    }
}

/// Cualquier fallo del servidor
///
/// Todas las variantes excepto `Setup` son recuperables: afectan solo a la
/// conexión actual.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    #[error("malformed request: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("failed writing response: {0}")]
    Write(#[source] io::Error),

    #[error("failed closing connection: {0}")]
    Close(#[source] io::Error),
}

impl ServerError {
    /// Indica si el error debe terminar el proceso
    pub fn is_fatal(&self) -> bool {
        matches!(self, ServerError::Setup(_))
    }
}
