//! # Métricas de Conexiones
//! src/metrics/mod.rs
//!
//! Contadores del ciclo de vida de las conexiones:
//! - Conexiones aceptadas
//! - Conexiones cerradas
//! - Ciclos que terminaron con error (parse, route, write, close)
//!
//! Con el servidor inactivo, `accepted == closed`: cada socket aceptado se
//! cierra exactamente una vez.

pub mod counters;

pub use counters::{ConnectionCounters, CountersSnapshot};
