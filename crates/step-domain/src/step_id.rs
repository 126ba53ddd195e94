// step_id.rs
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Prefijo reservado de los ids generados en el cliente.
pub const LOCAL_ID_PREFIX: &str = "tmp_";

/// Identificador de un paso. Puede ser un id de servidor (opaco, asignado
/// por el store remoto) o un id local (`tmp_<millis>_<hex>`) para pasos que
/// todavía no existen en el servidor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
  /// Envuelve un id ya existente (de servidor o local).
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  /// Genera un id local nuevo.
  pub fn new_local() -> Self {
    let rand = Uuid::new_v4().simple().to_string();
    Self(format!("{}{}_{}", LOCAL_ID_PREFIX, Utc::now().timestamp_millis(), &rand[..8]))
  }

  pub fn is_local(&self) -> bool {
    self.0.starts_with(LOCAL_ID_PREFIX)
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for StepId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for StepId {
  fn from(s: &str) -> Self {
    Self::new(s)
  }
}

impl From<String> for StepId {
  fn from(s: String) -> Self {
    Self(s)
  }
}
