//! Adaptadores concretos de los contratos de `flow-sync`.
//!
//! - `DieselDraftMedium`: medio de borradores sobre SQLite (Diesel + r2d2),
//!   con las migraciones embebidas en el binario.
//! - `HttpStepService`: servicio remoto de pasos sobre `reqwest`.
//!
//! Los constructores `*_from_env` leen la configuración del entorno (y de
//! un `.env` si existe).

mod draft_persistence;
mod http_service;
pub mod schema;

pub use draft_persistence::{new_draft_repo_from_env, DieselDraftMedium, DEFAULT_DRAFT_DB_URL, MIGRATIONS};
pub use http_service::{new_step_service_from_env, HttpStepService};
