//! Crate `flow-sync` - sincronización de pasos del editor de automatizaciones
//!
//! Este crate define el almacén de borradores (`DraftRepository`), el diff
//! entre la secuencia local y el baseline del servidor (`diff_steps`), el
//! orquestador que aplica ese diff contra el servicio remoto
//! (`CommitOrchestrator`) y la sesión de edición que lo usa
//! (`BuilderSession`). También expone implementaciones en memoria útiles
//! para pruebas (`InMemoryStepService`, `InMemoryDraftMedium`).
//!
//! Diseño resumido:
//! - Las ediciones son sólo locales y se escriben en el borrador; no hay red
//!   hasta el commit.
//! - El commit aplica create → update → delete → reordenado completo →
//!   refresh, y el resultado del refresh pasa a ser el nuevo baseline.
//! - Un único commit en curso por flow (guard interno del orquestador).
//!
//! Ejemplo rápido:
//! ```rust
//! use flow_sync::{CommitOrchestrator, DraftStore, InMemoryDraftMedium, InMemoryStepService, SyncConfig};
//! use std::sync::Arc;
//! let service = Arc::new(InMemoryStepService::new());
//! let drafts = Arc::new(DraftStore::new(InMemoryDraftMedium::new()));
//! let engine = CommitOrchestrator::new(service, drafts, SyncConfig::default());
//! assert!(!engine.is_committing("flow-1"));
//! ```
pub mod config;
pub mod draft;
pub mod engine;
pub mod errors;
pub mod reconcile;
pub mod repository;
pub mod session;
pub mod stubs;

pub use config::*;
pub use draft::*;
pub use engine::*;
pub use errors::*;
pub use reconcile::*;
pub use repository::*;
pub use session::*;
pub use stubs::*;
