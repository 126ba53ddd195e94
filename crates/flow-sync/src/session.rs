// Archivo: session.rs
// Propósito: sesión del editor de automatizaciones. Mantiene la secuencia
// local y el baseline de un flow, escribe cada mutación en el borrador y
// delega el guardado en el `CommitOrchestrator`.
use crate::draft::DraftPatch;
use crate::engine::CommitOrchestrator;
use crate::errors::{CommitError, Result, SyncError};
use crate::reconcile::{diff_steps, order_changed, StepDiff};
use log::{debug, warn};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use step_domain::{DomainError, Step, StepId, StepKind};

/// Resultado de un commit correcto.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitOutcome {
    /// Secuencia refrescada del servidor (nuevo baseline y nuevo local).
    pub steps: Vec<Step>,
    /// Patch de cabecera pendiente, para que el llamador lo aplique por su
    /// propio canal.
    pub automation_patch: Option<JsonValue>,
}

/// Sesión de edición de un flow.
///
/// Ninguna mutación hace llamadas de red. El borrador existe sólo mientras
/// el estado local difiere del baseline: si una edición devuelve la
/// secuencia a su estado original se borra.
pub struct BuilderSession {
    flow_id: String,
    engine: Arc<CommitOrchestrator>,
    local: Vec<Step>,
    baseline: Vec<Step>,
    automation_patch: Option<JsonValue>,
}

impl BuilderSession {
    /// Abre la sesión: lee el baseline remoto y, si hay borrador, rehidrata
    /// el estado local desde él.
    pub async fn open(flow_id: impl Into<String>, engine: Arc<CommitOrchestrator>) -> Result<Self> {
        let flow_id = flow_id.into();
        let baseline = engine.fetch_steps(&flow_id).await?;
        let draft = engine.drafts().read(&flow_id);
        let (local, automation_patch) = match draft {
            Some(d) => {
                debug!("rehidratando borrador de {} ({})", flow_id, d.updated_at);
                (d.steps_draft.unwrap_or_else(|| baseline.clone()), d.automation_patch)
            }
            None => (baseline.clone(), None),
        };
        Ok(Self { flow_id, engine, local, baseline, automation_patch })
    }

    pub fn flow_id(&self) -> &str {
        &self.flow_id
    }

    pub fn steps(&self) -> &[Step] {
        &self.local
    }

    pub fn baseline(&self) -> &[Step] {
        &self.baseline
    }

    pub fn automation_patch(&self) -> Option<&JsonValue> {
        self.automation_patch.as_ref()
    }

    pub fn step(&self, id: &StepId) -> Option<&Step> {
        self.local.iter().find(|s| &s.id == id)
    }

    /// Inserta un paso en `index` (se ajusta al final si se pasa). El paso
    /// se normaliza antes de aceptarse.
    pub fn insert_step(&mut self, index: usize, step: Step) -> Result<StepId> {
        let step = step.normalized()?;
        if self.step(&step.id).is_some() {
            return Err(DomainError::DuplicateId(step.id.to_string()).into());
        }
        let id = step.id.clone();
        let index = index.min(self.local.len());
        self.local.insert(index, step);
        self.persist_draft();
        Ok(id)
    }

    pub fn push_step(&mut self, step: Step) -> Result<StepId> {
        let len = self.local.len();
        self.insert_step(len, step)
    }

    /// Reemplaza título y contenido de un paso existente.
    pub fn update_step(&mut self, id: &StepId, title: impl Into<String>, kind: StepKind) -> Result<()> {
        let pos = self.position_of(id)?;
        let edited = Step { id: id.clone(), title: title.into(), kind, collapsed: self.local[pos].collapsed };
        self.local[pos] = edited.normalized()?;
        self.persist_draft();
        Ok(())
    }

    /// Estado visual; no genera diff. Por sí solo no cuenta como cambio
    /// pendiente: si nada más difiere del baseline el borrador se borra y
    /// el valor se pierde al reabrir la sesión.
    pub fn set_collapsed(&mut self, id: &StepId, collapsed: bool) -> Result<()> {
        let pos = self.position_of(id)?;
        self.local[pos].collapsed = collapsed;
        self.persist_draft();
        Ok(())
    }

    pub fn remove_step(&mut self, id: &StepId) -> Result<Step> {
        let pos = self.position_of(id)?;
        let removed = self.local.remove(pos);
        self.persist_draft();
        Ok(removed)
    }

    /// Mueve el paso de la posición `from` a `to` (0-based).
    pub fn move_step(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.local.len();
        if from >= len || to >= len {
            return Err(DomainError::ValidationError(format!("Posición fuera de rango ({} -> {}, {} pasos)",
                                                            from, to, len)).into());
        }
        let step = self.local.remove(from);
        self.local.insert(to, step);
        self.persist_draft();
        Ok(())
    }

    /// Fusiona (superficialmente) `patch` en el patch de cabecera pendiente.
    /// Un valor que no sea objeto reemplaza al anterior.
    pub fn patch_automation(&mut self, patch: JsonValue) {
        let merged = match (self.automation_patch.take(), patch) {
            (Some(JsonValue::Object(mut current)), JsonValue::Object(extra)) => {
                current.extend(extra);
                JsonValue::Object(current)
            }
            (_, patch) => patch,
        };
        self.automation_patch = Some(merged);
        self.persist_draft();
    }

    pub fn pending_diff(&self) -> StepDiff {
        diff_steps(&self.local, &self.baseline)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.automation_patch.is_some()
        || order_changed(&self.local, &self.baseline)
        || !self.pending_diff().is_empty()
    }

    /// Descarta los cambios locales y el borrador.
    pub fn discard(&mut self) {
        self.local = self.baseline.clone();
        self.automation_patch = None;
        self.engine.drafts().clear(&self.flow_id);
    }

    /// Relee el baseline remoto conservando las ediciones locales.
    pub async fn reload(&mut self) -> Result<()> {
        self.baseline = self.engine.fetch_steps(&self.flow_id).await?;
        self.persist_draft();
        Ok(())
    }

    /// Guarda los cambios. Si falla, las ediciones y el borrador se
    /// conservan para reintentar.
    ///
    /// Tras un fallo parcial los pasos ya creados adoptan su id de servidor
    /// y el baseline se relee, de modo que el siguiente intento sólo envía
    /// lo que no llegó a aplicarse.
    pub async fn commit(&mut self) -> std::result::Result<CommitOutcome, CommitError> {
        match self.engine.commit(&self.flow_id, &self.local, &self.baseline).await {
            Ok(refreshed) => {
                self.baseline = refreshed.clone();
                self.local = refreshed;
                Ok(CommitOutcome { steps: self.local.clone(), automation_patch: self.automation_patch.take() })
            }
            Err(err) => {
                if let CommitError::Failed { partial: true, id_map, .. } = &err {
                    self.absorb_partial(id_map).await;
                }
                Err(err)
            }
        }
    }

    async fn absorb_partial(&mut self, id_map: &HashMap<StepId, StepId>) {
        for step in &mut self.local {
            if let Some(real) = id_map.get(&step.id) {
                step.id = real.clone();
            }
        }
        match self.engine.fetch_steps(&self.flow_id).await {
            Ok(baseline) => self.baseline = baseline,
            Err(e) => warn!("no se pudo releer {} tras un commit parcial: {}", self.flow_id, e),
        }
        self.persist_draft();
    }

    fn position_of(&self, id: &StepId) -> Result<usize> {
        self.local
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| SyncError::UnknownStep(id.to_string()))
    }

    fn persist_draft(&self) {
        if self.has_unsaved_changes() {
            self.engine.drafts().write(&self.flow_id,
                                       DraftPatch { steps_draft: Some(self.local.clone()),
                                                    automation_patch: self.automation_patch.clone() });
        } else {
            self.engine.drafts().clear(&self.flow_id);
        }
    }
}
