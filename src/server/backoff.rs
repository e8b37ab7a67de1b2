//! # Backoff de accept
//! src/server/backoff.rs
//!
//! Si `accept` falla varias veces seguidas (por ejemplo `EMFILE` cuando se
//! acaban los descriptores), el loop espera cada vez el doble antes de
//! reintentar, hasta un tope. Un accept exitoso reinicia la cuenta.

use std::time::Duration;

/// Espera tras el primer fallo
pub const ACCEPT_BACKOFF_BASE_MS: u64 = 10;

/// Espera máxima entre reintentos
pub const ACCEPT_BACKOFF_MAX_MS: u64 = 1000;

/// Espera antes del próximo `accept` tras `failures` fallos consecutivos
pub fn accept_backoff(failures: u32) -> Duration {
    if failures == 0 {
        return Duration::ZERO;
    }

    let exponential = 2u64.saturating_pow(failures - 1);
    let delay_ms = ACCEPT_BACKOFF_BASE_MS.saturating_mul(exponential);
    Duration::from_millis(delay_ms.min(ACCEPT_BACKOFF_MAX_MS))
}
