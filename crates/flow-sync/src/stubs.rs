// Archivo: stubs.rs
// Propósito: implementaciones en memoria para pruebas y wiring rápido.
//
// Incluye un servicio de pasos en memoria (`InMemoryStepService`) que
// registra cada llamada y permite inyectar fallos, y un medio de borradores
// en memoria (`InMemoryDraftMedium`). No son durables.
use crate::errors::{Result, SyncError};
use crate::repository::{DraftMedium, StepService};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use step_domain::{decode_sequence, encode_with_position, Step, WireStep};

/// Tipo de llamada al servicio remoto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    List,
    Create,
    Update,
    Delete,
}

/// Llamada registrada por `InMemoryStepService`.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    List { flow_id: String },
    Create { flow_id: String, step: WireStep },
    Update { flow_id: String, step_id: String, step: WireStep },
    Delete { flow_id: String, step_id: String },
}

impl RecordedCall {
    pub fn kind(&self) -> CallKind {
        match self {
            RecordedCall::List { .. } => CallKind::List,
            RecordedCall::Create { .. } => CallKind::Create,
            RecordedCall::Update { .. } => CallKind::Update,
            RecordedCall::Delete { .. } => CallKind::Delete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FaultMode {
    Fail,
    Hang,
}

#[derive(Debug)]
struct Fault {
    kind: CallKind,
    skip: usize,
    mode: FaultMode,
}

/// Servicio de pasos en memoria.
pub struct InMemoryStepService {
    /// Pasos por flow, tal como los guardaría el servidor.
    steps: Mutex<HashMap<String, Vec<WireStep>>>,
    calls: Mutex<Vec<RecordedCall>>,
    faults: Mutex<Vec<Fault>>,
    next_id: AtomicU64,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl InMemoryStepService {
    pub fn new() -> Self {
        Self { steps: Mutex::new(HashMap::new()),
               calls: Mutex::new(Vec::new()),
               faults: Mutex::new(Vec::new()),
               next_id: AtomicU64::new(1),
               latency: None,
               in_flight: AtomicUsize::new(0),
               max_in_flight: AtomicUsize::new(0) }
    }

    /// Añade una espera artificial a cada llamada, para que las llamadas
    /// concurrentes se solapen.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Carga pasos directamente en el "servidor" asignando ids y posiciones.
    /// Devuelve la secuencia tal como la vería un `list`, útil como
    /// baseline.
    pub fn seed(&self, flow_id: &str, steps: &[Step]) -> Vec<Step> {
        let wires: Vec<WireStep> = steps.iter()
                                        .enumerate()
                                        .map(|(i, s)| {
                                            let mut w = encode_with_position(s, (i + 1) as u32);
                                            w.id = Some(self.allocate_id());
                                            w
                                        })
                                        .collect();
        self.steps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(flow_id.to_string(), wires.clone());
        decode_sequence(wires)
    }

    /// Copia de lo guardado para un flow, en orden de `stepCount`.
    pub fn stored(&self, flow_id: &str) -> Vec<WireStep> {
        let mut wires = self.steps
                            .lock()
                            .unwrap_or_else(|e| e.into_inner())
                            .get(flow_id)
                            .cloned()
                            .unwrap_or_default();
        wires.sort_by_key(|w| w.step_count.unwrap_or(u32::MAX));
        wires
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn calls_of(&self, kind: CallKind) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.kind() == kind).collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// La llamada número `skip + 1` de tipo `kind` (contando desde ahora)
    /// falla con `SyncError::Remote`.
    pub fn fail_call(&self, kind: CallKind, skip: usize) {
        self.faults
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Fault { kind, skip, mode: FaultMode::Fail });
    }

    /// Igual que `fail_call` pero la llamada no responde nunca.
    pub fn hang_call(&self, kind: CallKind, skip: usize) {
        self.faults
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Fault { kind, skip, mode: FaultMode::Hang });
    }

    /// Máximo de llamadas simultáneas observado.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn allocate_id(&self) -> String {
        format!("srv_{:04}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Registra la llamada y decide si hay que inyectar un fallo.
    fn enter(&self, call: RecordedCall) -> Option<FaultMode> {
        let kind = call.kind();
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(call);
        let mut faults = self.faults.lock().unwrap_or_else(|e| e.into_inner());
        let idx = faults.iter().position(|f| f.kind == kind)?;
        if faults[idx].skip > 0 {
            faults[idx].skip -= 1;
            return None;
        }
        Some(faults.remove(idx).mode)
    }

    async fn simulate<T>(&self, call: RecordedCall, apply: impl FnOnce() -> Result<T>) -> Result<T> {
        let label = format!("{:?}", call.kind());
        let fault = self.enter(call);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let res = match fault {
            Some(FaultMode::Fail) => Err(SyncError::Remote(format!("fallo inyectado en {}", label))),
            Some(FaultMode::Hang) => std::future::pending().await,
            None => apply(),
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        res
    }
}

impl Default for InMemoryStepService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StepService for InMemoryStepService {
    async fn list_steps(&self, flow_id: &str) -> Result<Vec<WireStep>> {
        self.simulate(RecordedCall::List { flow_id: flow_id.to_string() }, || {
                Ok(self.steps
                       .lock()
                       .unwrap_or_else(|e| e.into_inner())
                       .get(flow_id)
                       .cloned()
                       .unwrap_or_default())
            })
            .await
    }

    async fn create_step(&self, flow_id: &str, step: &WireStep) -> Result<String> {
        self.simulate(RecordedCall::Create { flow_id: flow_id.to_string(), step: step.clone() }, || {
                let mut steps = self.steps.lock().unwrap_or_else(|e| e.into_inner());
                let list = steps.entry(flow_id.to_string()).or_default();
                let id = self.allocate_id();
                let mut stored = step.clone();
                stored.id = Some(id.clone());
                stored.step_count = stored.step_count.or(Some(list.len() as u32 + 1));
                list.push(stored);
                Ok(id)
            })
            .await
    }

    async fn update_step(&self, flow_id: &str, step_id: &str, step: &WireStep) -> Result<()> {
        let call = RecordedCall::Update { flow_id: flow_id.to_string(),
                                          step_id: step_id.to_string(),
                                          step: step.clone() };
        self.simulate(call, || {
                let mut steps = self.steps.lock().unwrap_or_else(|e| e.into_inner());
                let existing = steps.get_mut(flow_id)
                                    .and_then(|l| l.iter_mut().find(|w| w.id.as_deref() == Some(step_id)))
                                    .ok_or_else(|| SyncError::NotFound(format!("step {}", step_id)))?;
                let step_count = step.step_count.or(existing.step_count);
                *existing = step.clone();
                existing.id = Some(step_id.to_string());
                existing.step_count = step_count;
                Ok(())
            })
            .await
    }

    async fn delete_step(&self, flow_id: &str, step_id: &str) -> Result<()> {
        let call = RecordedCall::Delete { flow_id: flow_id.to_string(), step_id: step_id.to_string() };
        self.simulate(call, || {
                let mut steps = self.steps.lock().unwrap_or_else(|e| e.into_inner());
                let list = steps.get_mut(flow_id)
                                .ok_or_else(|| SyncError::NotFound(format!("flow {}", flow_id)))?;
                let before = list.len();
                list.retain(|w| w.id.as_deref() != Some(step_id));
                if list.len() == before {
                    return Err(SyncError::NotFound(format!("step {}", step_id)));
                }
                Ok(())
            })
            .await
    }
}

/// Medio de borradores en memoria. Puede simular un almacenamiento roto.
#[derive(Debug, Default)]
pub struct InMemoryDraftMedium {
    values: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemoryDraftMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Escribe un valor crudo, p. ej. para simular un borrador corrupto.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap_or_else(|e| e.into_inner()).get(key).cloned()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl DraftMedium for InMemoryDraftMedium {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(SyncError::Storage("lectura deshabilitada".into()));
        }
        Ok(self.raw(key))
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SyncError::Storage("escritura deshabilitada".into()));
        }
        self.insert_raw(key, value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SyncError::Storage("escritura deshabilitada".into()));
        }
        self.values.lock().unwrap_or_else(|e| e.into_inner()).remove(key);
        Ok(())
    }
}
