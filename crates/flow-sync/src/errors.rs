// Archivo: errors.rs
// Propósito: errores del motor de sincronización y el error específico de
// `commit`, que además de la causa informa la operación que falló y el
// mapa de ids acumulado.
use step_domain::{DomainError, StepId};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errores comunes del crate.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Entidad no encontrada en el servicio remoto.
    #[error("No encontrado: {0}")]
    NotFound(String),
    /// Llamada remota fallida: error HTTP o respuesta sin indicador de éxito.
    #[error("Llamada remota fallida: {0}")]
    Remote(String),
    /// La llamada no respondió dentro del plazo configurado.
    #[error("Timeout tras {after:?} en {op}")]
    Timeout { op: String, after: Duration },
    /// Error del medio de almacenamiento del borrador.
    #[error("Error de almacenamiento: {0}")]
    Storage(String),
    /// Edición local inválida.
    #[error("Error de dominio: {0}")]
    Domain(#[from] DomainError),
    #[error("Error de serialización: {0}")]
    Serialization(#[from] serde_json::Error),
    /// El paso indicado no existe en la secuencia local.
    #[error("Paso desconocido: {0}")]
    UnknownStep(String),
    #[error("Otro: {0}")]
    Other(String),
}

/// Alias de resultado usado por las APIs del crate.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Operación remota en curso cuando falló un commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOp {
    Create { local_id: StepId },
    Update { step_id: StepId, position: u32 },
    Delete { step_id: StepId },
    Reorder { step_id: StepId, position: u32 },
    Refresh,
}

impl fmt::Display for CommitOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitOp::Create { local_id } => write!(f, "create {}", local_id),
            CommitOp::Update { step_id, position } => write!(f, "update {} @{}", step_id, position),
            CommitOp::Delete { step_id } => write!(f, "delete {}", step_id),
            CommitOp::Reorder { step_id, position } => write!(f, "reorder {} @{}", step_id, position),
            CommitOp::Refresh => f.write_str("refresh"),
        }
    }
}

/// Error devuelto por `CommitOrchestrator::commit`.
///
/// No se intenta rollback: si `partial` es `true` el store remoto ya tiene
/// parte de los cambios aplicados y el siguiente commit volverá a calcular
/// el diff contra el estado que haya quedado.
#[derive(Error, Debug)]
pub enum CommitError {
    /// Ya hay un commit en curso para este flow.
    #[error("Ya hay un commit en curso para el flow {0}")]
    InProgress(String),
    /// La secuencia local no es válida; no se hizo ninguna llamada.
    #[error("Secuencia local inválida: {0}")]
    Invalid(#[from] DomainError),
    /// Falló una llamada remota.
    #[error("Commit fallido en {op} (parcial: {partial}): {cause}")]
    Failed {
        op: CommitOp,
        /// Mapa id local -> id de servidor acumulado hasta el fallo.
        id_map: HashMap<StepId, StepId>,
        /// Al menos una mutación remota ya se había aplicado.
        partial: bool,
        #[source]
        cause: SyncError,
    },
}

impl CommitError {
    /// `true` para el caso PartialCommit: el servidor quedó modificado.
    pub fn is_partial(&self) -> bool {
        matches!(self, CommitError::Failed { partial: true, .. })
    }
}
