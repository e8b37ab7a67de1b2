//! # Contadores de Conexiones
//! src/metrics/counters.rs

use std::sync::atomic::{AtomicU64, Ordering};

/// Contadores de conexiones del servidor
///
/// El servidor es secuencial, pero los contadores son atómicos para poder
/// leerlos desde otro thread (por ejemplo, en tests).
#[derive(Debug)]
pub struct ConnectionCounters {
    accepted: AtomicU64,
    closed: AtomicU64,
    failed: AtomicU64,
}

impl ConnectionCounters {
    pub fn new() -> Self {
        Self {
            accepted: AtomicU64::new(0),
            closed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_closed(&self) {
        self.closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Conexiones aceptadas que todavía no se cerraron
    pub fn open(&self) -> u64 {
        let snapshot = self.snapshot();
        snapshot.accepted.saturating_sub(snapshot.closed)
    }

    /// Obtiene un snapshot de los contadores
    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            closed: self.closed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

impl Default for ConnectionCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot de contadores (para uso externo)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountersSnapshot {
    pub accepted: u64,
    pub closed: u64,
    pub failed: u64,
}
