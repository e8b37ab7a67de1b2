//! # Handlers del Servidor
//! src/handlers/mod.rs
//!
//! Handlers de referencia que registra el servidor al arrancar:
//!
//! - `/hello`: HTML fijo
//! - `/notfound`: 404 con body vacío
//! - `/echo`: devuelve el body del request
//! - `/`: fallback, repite la URI pedida dentro de un HTML
//!
//! Cada handler recibe un Request y retorna una Response; ninguno toca el
//! socket.

use crate::http::{Request, Response, StatusCode};
use crate::router::Router;

/// Adapta una función que produce HTML en un handler 200 OK
pub fn html<F>(render: F) -> impl Fn(&Request) -> Response + Send + Sync + 'static
where
    F: Fn(&Request) -> String + Send + Sync + 'static,
{
    move |request: &Request| Response::html(&render(request))
}

/// Handler para /hello
pub fn hello_handler(_req: &Request) -> Response {
    Response::html("<h1>Hello world</h1>")
}

/// Handler para /notfound
pub fn not_found_handler(_req: &Request) -> Response {
    Response::not_found()
}

/// Handler para /echo
///
/// Devuelve el body del request tal cual (vacío para GET/HEAD).
pub fn echo_handler(req: &Request) -> Response {
    Response::new(StatusCode::Ok)
        .with_header("Content-Type", "application/octet-stream")
        .with_body_bytes(req.body().to_vec())
}

/// Handler de fallback para `/`
///
/// La URI se copia byte a byte en el body.
pub fn fallback_page(req: &Request) -> String {
    format!("<h1>Using fallback matcher for path: {}</h1>", req.uri())
}

/// Route Table por defecto del servidor
pub fn default_router() -> Router {
    let mut router = Router::new();
    router.register("/hello", hello_handler);
    router.register("/notfound", not_found_handler);
    router.register("/echo", echo_handler);
    router.register("/", html(fallback_page));
    router
}
