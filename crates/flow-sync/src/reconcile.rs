// Archivo: reconcile.rs
// Propósito: calcular qué pasos hay que crear, actualizar y borrar para
// llevar el servidor (baseline) al estado local (current).
use indexmap::IndexMap;
use step_domain::{same_content, Step, StepId};

/// Resultado del diff. `created`, `updated` y `unchanged` siguen el orden de
/// `current`; `deleted` sigue el de `baseline`. `order` es el orden local
/// completo, que la fase de reordenado necesita aunque no haya cambios de
/// contenido.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepDiff {
    pub created: Vec<Step>,
    pub updated: Vec<Step>,
    pub deleted: Vec<Step>,
    pub unchanged: Vec<Step>,
    pub order: Vec<StepId>,
}

impl StepDiff {
    /// Sin cambios de contenido ni de identidad (el orden no cuenta).
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}

/// Compara `current` contra `baseline` emparejando por id.
///
/// - created: ids que no están en baseline, o ids locales (siempre, aunque
///   el paso no haya cambiado: el servidor no lo conoce).
/// - deleted: ids de baseline ausentes en current.
/// - updated: ids en ambos cuyo contenido codificado difiere.
///
/// Un paso movido pero sin cambios queda en `unchanged`.
pub fn diff_steps(current: &[Step], baseline: &[Step]) -> StepDiff {
    let base_index: IndexMap<&StepId, &Step> = baseline.iter().map(|s| (&s.id, s)).collect();
    let current_index: IndexMap<&StepId, &Step> = current.iter().map(|s| (&s.id, s)).collect();

    let mut diff = StepDiff { order: current.iter().map(|s| s.id.clone()).collect(),
                              ..Default::default() };

    for (id, step) in current_index.iter() {
        match base_index.get(id) {
            Some(base) if !id.is_local() => {
                if same_content(step, base) {
                    diff.unchanged.push((*step).clone());
                } else {
                    diff.updated.push((*step).clone());
                }
            }
            _ => diff.created.push((*step).clone()),
        }
    }
    diff.deleted = base_index.iter()
                             .filter(|(id, _)| !current_index.contains_key(*id))
                             .map(|(_, s)| (*s).clone())
                             .collect();
    diff
}

/// `true` si el orden de los ids difiere (además de los cambios de
/// contenido que recoge `diff_steps`).
pub fn order_changed(current: &[Step], baseline: &[Step]) -> bool {
    current.len() != baseline.len() || current.iter().zip(baseline.iter()).any(|(a, b)| a.id != b.id)
}
