// Archivo: draft.rs
// Propósito: borradores por flow que sobreviven a recargas. Los cambios
// locales se escriben aquí en cada mutación y se leen una sola vez al abrir
// el editor. La persistencia es best-effort: leer falla a `None`, escribir
// y borrar tragan el error.
use crate::repository::DraftMedium;
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use step_domain::Step;

/// Registro persistido para un flow con cambios sin guardar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub steps_draft: Option<Vec<Step>>,
    pub automation_patch: Option<JsonValue>,
    pub updated_at: DateTime<Utc>,
}

/// Escritura parcial: los campos `None` conservan el valor ya guardado.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftPatch {
    pub steps_draft: Option<Vec<Step>>,
    pub automation_patch: Option<JsonValue>,
}

impl DraftPatch {
    pub fn steps(steps: Vec<Step>) -> Self {
        Self { steps_draft: Some(steps), automation_patch: None }
    }

    pub fn automation(patch: JsonValue) -> Self {
        Self { steps_draft: None, automation_patch: Some(patch) }
    }
}

/// Clave del borrador de un flow en el medio subyacente.
pub fn draft_key(flow_id: &str) -> String {
    format!("wf:draft:{}", flow_id)
}

/// Contrato del almacén de borradores. Ninguna operación propaga errores.
pub trait DraftRepository: Send + Sync {
    fn read(&self, flow_id: &str) -> Option<Draft>;
    /// Fusiona `patch` con el borrador existente y sella `updated_at`.
    fn write(&self, flow_id: &str, patch: DraftPatch);
    fn clear(&self, flow_id: &str);
}

/// `DraftRepository` sobre cualquier `DraftMedium`, serializando en JSON.
pub struct DraftStore<M>
    where M: DraftMedium
{
    medium: M,
}

impl<M> DraftStore<M> where M: DraftMedium
{
    pub fn new(medium: M) -> Self {
        Self { medium }
    }

    pub fn medium(&self) -> &M {
        &self.medium
    }
}

impl<M> DraftRepository for DraftStore<M> where M: DraftMedium
{
    fn read(&self, flow_id: &str) -> Option<Draft> {
        let key = draft_key(flow_id);
        let raw = match self.medium.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("no se pudo leer el borrador {}: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str::<Draft>(&raw) {
            Ok(d) => Some(d),
            Err(e) => {
                warn!("borrador corrupto en {}, se ignora: {}", key, e);
                None
            }
        }
    }

    fn write(&self, flow_id: &str, patch: DraftPatch) {
        let key = draft_key(flow_id);
        let (steps_draft, automation_patch) = match self.read(flow_id) {
            Some(existing) => (patch.steps_draft.or(existing.steps_draft),
                               patch.automation_patch.or(existing.automation_patch)),
            None => (patch.steps_draft, patch.automation_patch),
        };
        let draft = Draft { steps_draft, automation_patch, updated_at: Utc::now() };
        let raw = match serde_json::to_string(&draft) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("no se pudo serializar el borrador {}: {}", key, e);
                return;
            }
        };
        if let Err(e) = self.medium.put(&key, &raw) {
            warn!("no se pudo escribir el borrador {}: {}", key, e);
        }
    }

    fn clear(&self, flow_id: &str) {
        let key = draft_key(flow_id);
        if let Err(e) = self.medium.remove(&key) {
            warn!("no se pudo borrar el borrador {}: {}", key, e);
        }
    }
}
