// Archivo: config.rs
// Propósito: configuración del orquestador de commits, con lectura desde
// variables de entorno (`.env` incluido vía dotenvy).
use std::time::Duration;

pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_REORDER_CONCURRENCY: usize = 4;

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Plazo máximo de cada llamada remota. Un timeout cuenta como fallo.
    pub call_timeout: Duration,
    /// Máximo de llamadas simultáneas en la fase de reordenado.
    pub reorder_concurrency: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig { call_timeout: Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS),
                     reorder_concurrency: DEFAULT_REORDER_CONCURRENCY }
    }
}

impl SyncConfig {
    /// Lee `STEP_CALL_TIMEOUT_MS` y `STEP_REORDER_CONCURRENCY`. Valores
    /// ausentes o no numéricos toman el default.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let timeout_ms = std::env::var("STEP_CALL_TIMEOUT_MS").ok()
                                                              .and_then(|v| v.trim().parse::<u64>().ok())
                                                              .filter(|v| *v > 0)
                                                              .unwrap_or(DEFAULT_CALL_TIMEOUT_MS);
        let concurrency = std::env::var("STEP_REORDER_CONCURRENCY").ok()
                                                                   .and_then(|v| v.trim().parse::<usize>().ok())
                                                                   .unwrap_or(DEFAULT_REORDER_CONCURRENCY);
        SyncConfig { call_timeout: Duration::from_millis(timeout_ms),
                     reorder_concurrency: concurrency.max(1) }
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_reorder_concurrency(mut self, n: usize) -> Self {
        self.reorder_concurrency = n.max(1);
        self
    }
}
