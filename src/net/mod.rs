//! # Módulo de Red
//! src/net/mod.rs
//!
//! Capa más baja del servidor: sockets crudos sobre syscalls.
//!
//! - `socket`: [`SocketHandle`], envoltura delgada sobre un descriptor del
//!   SO, y los traits [`Connection`] / [`Acceptor`] que usa el Server Loop.
//! - `listener`: Listener Factory (`socket` → `setsockopt` → `bind` → `listen`).
//!
//! Todo es bloqueante: un cliente lento detiene al servidor entero. El único
//! timeout es el de las lecturas que descartan lo pendiente antes del close.

pub mod listener;
pub mod socket;

pub use listener::bind_listener;
pub use socket::{Acceptor, Connection, SocketHandle};
