// Archivo: engine.rs
// Propósito: implementar el `CommitOrchestrator`, que aplica en el servicio
// remoto el diff entre el estado local y el baseline y devuelve el nuevo
// baseline.
//
// Nota: el orquestador no guarda estado de los flows. Sólo lleva el
// registro de qué flows tienen un commit en curso (single-flight) y usa el
// `DraftRepository` como log de efectos: lo limpia tras un commit correcto.
use crate::config::SyncConfig;
use crate::draft::DraftRepository;
use crate::errors::{CommitError, CommitOp, Result, SyncError};
use crate::reconcile::diff_steps;
use crate::repository::StepService;
use dashmap::DashSet;
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use step_domain::{decode_sequence, encode, encode_with_position, ensure_unique_ids, Step, StepId};

/// Orquestador de commits.
///
/// Fases (cada una termina antes de empezar la siguiente):
/// 1. create, secuencial, construye el mapa id local -> id servidor
/// 2. sustitución de ids en la secuencia local
/// 3. update de los pasos con contenido cambiado, secuencial
/// 4. delete, secuencial
/// 5. reordenado de *todos* los pasos con su posición final, concurrente
///    con un máximo de `reorder_concurrency` llamadas en vuelo
/// 6. refresh: relectura completa, que pasa a ser el nuevo baseline
///
/// Cualquier fallo aborta el commit sin rollback. Soltar el futuro de
/// `commit` abandona las llamadas pendientes y libera el guard del flow.
pub struct CommitOrchestrator {
    service: Arc<dyn StepService>,
    drafts: Arc<dyn DraftRepository>,
    config: SyncConfig,
    in_flight: DashSet<String>,
}

/// Marca un flow como "commit en curso" mientras vive.
struct FlightGuard<'a> {
    in_flight: &'a DashSet<String>,
    flow_id: String,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.flow_id);
    }
}

impl CommitOrchestrator {
    pub fn new(service: Arc<dyn StepService>, drafts: Arc<dyn DraftRepository>, config: SyncConfig) -> Self {
        Self { service, drafts, config, in_flight: DashSet::new() }
    }

    pub fn service(&self) -> &Arc<dyn StepService> {
        &self.service
    }

    pub fn drafts(&self) -> &Arc<dyn DraftRepository> {
        &self.drafts
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Indica si hay un commit en curso para `flow_id`.
    pub fn is_committing(&self, flow_id: &str) -> bool {
        self.in_flight.contains(flow_id)
    }

    /// Lee la secuencia remota de un flow: ordena por `stepCount` y
    /// descarta los tipos desconocidos.
    pub async fn fetch_steps(&self, flow_id: &str) -> Result<Vec<Step>> {
        let wires = self.bounded(format!("list {}", flow_id), self.service.list_steps(flow_id)).await?;
        Ok(decode_sequence(wires))
    }

    /// Aplica `current` sobre el servidor tomando `baseline` como referencia
    /// y devuelve la secuencia remota refrescada. En caso de éxito el
    /// borrador del flow queda limpio.
    pub async fn commit(&self,
                        flow_id: &str,
                        current: &[Step],
                        baseline: &[Step])
                        -> std::result::Result<Vec<Step>, CommitError> {
        let _guard = self.acquire(flow_id)?;
        ensure_unique_ids(current)?;

        let diff = diff_steps(current, baseline);
        info!("commit {}: {} create, {} update, {} delete, {} pasos",
              flow_id,
              diff.created.len(),
              diff.updated.len(),
              diff.deleted.len(),
              current.len());

        let mut id_map: HashMap<StepId, StepId> = HashMap::new();
        let mut applied = false;

        // 1. create
        for step in &diff.created {
            let op = CommitOp::Create { local_id: step.id.clone() };
            let mut wire = encode(step);
            wire.id = None;
            match self.bounded(op.to_string(), self.service.create_step(flow_id, &wire)).await {
                Ok(server_id) => {
                    debug!("creado {} -> {}", step.id, server_id);
                    id_map.insert(step.id.clone(), StepId::new(server_id));
                    applied = true;
                }
                Err(cause) => return Err(failed(op, &id_map, applied, cause)),
            }
        }

        // 2. ids reales
        let with_real_ids: Vec<Step> = current.iter()
                                              .map(|s| {
                                                  let mut s = s.clone();
                                                  if let Some(real) = id_map.get(&s.id) {
                                                      s.id = real.clone();
                                                  }
                                                  s
                                              })
                                              .collect();
        let positions: HashMap<&StepId, u32> = with_real_ids.iter()
                                                            .enumerate()
                                                            .map(|(i, s)| (&s.id, (i + 1) as u32))
                                                            .collect();

        // 3. update
        for step in &diff.updated {
            let step_id = id_map.get(&step.id).cloned().unwrap_or_else(|| step.id.clone());
            let Some(position) = positions.get(&step_id).copied() else {
                warn!("paso actualizado {} ausente de la secuencia final", step_id);
                continue;
            };
            let op = CommitOp::Update { step_id: step_id.clone(), position };
            let mut resolved = step.clone();
            resolved.id = step_id.clone();
            let wire = encode_with_position(&resolved, position);
            match self.bounded(op.to_string(), self.service.update_step(flow_id, step_id.as_str(), &wire)).await {
                Ok(()) => applied = true,
                Err(cause) => return Err(failed(op, &id_map, applied, cause)),
            }
        }

        // 4. delete
        for step in &diff.deleted {
            let op = CommitOp::Delete { step_id: step.id.clone() };
            match self.bounded(op.to_string(), self.service.delete_step(flow_id, step.id.as_str())).await {
                Ok(()) => applied = true,
                Err(cause) => return Err(failed(op, &id_map, applied, cause)),
            }
        }

        // 5. reordenado completo
        let cap = self.config.reorder_concurrency.max(1);
        let results: Vec<(CommitOp, Result<()>)> =
            stream::iter(with_real_ids.iter().enumerate().map(|(i, step)| {
                          let position = (i + 1) as u32;
                          let op = CommitOp::Reorder { step_id: step.id.clone(), position };
                          let wire = encode_with_position(step, position);
                          async move {
                              let res = self.bounded(op.to_string(),
                                                     self.service.update_step(flow_id, step.id.as_str(), &wire))
                                            .await;
                              (op, res)
                          }
                      })).buffered(cap)
                         .collect()
                         .await;
        applied |= results.iter().any(|(_, r)| r.is_ok());
        if let Some((op, Err(cause))) = results.into_iter().find(|(_, r)| r.is_err()) {
            return Err(failed(op, &id_map, applied, cause));
        }

        // 6. refresh
        let refreshed = match self.fetch_steps(flow_id).await {
            Ok(steps) => steps,
            Err(cause) => return Err(failed(CommitOp::Refresh, &id_map, applied, cause)),
        };
        self.drafts.clear(flow_id);
        info!("commit {} completado: {} pasos en el servidor", flow_id, refreshed.len());
        Ok(refreshed)
    }

    fn acquire(&self, flow_id: &str) -> std::result::Result<FlightGuard<'_>, CommitError> {
        if !self.in_flight.insert(flow_id.to_string()) {
            return Err(CommitError::InProgress(flow_id.to_string()));
        }
        Ok(FlightGuard { in_flight: &self.in_flight, flow_id: flow_id.to_string() })
    }

    /// Aplica el timeout configurado; un timeout cuenta como llamada fallida.
    async fn bounded<T, F>(&self, label: String, fut: F) -> Result<T>
        where F: Future<Output = Result<T>>
    {
        debug!("llamada remota: {}", label);
        match tokio::time::timeout(self.config.call_timeout, fut).await {
            Ok(res) => res,
            Err(_) => Err(SyncError::Timeout { op: label, after: self.config.call_timeout }),
        }
    }
}

fn failed(op: CommitOp, id_map: &HashMap<StepId, StepId>, partial: bool, cause: SyncError) -> CommitError {
    warn!("commit abortado en {} (parcial: {}): {}", op, partial, cause);
    CommitError::Failed { op, id_map: id_map.clone(), partial, cause }
}
