// Archivo: repository.rs
// Propósito: contratos de los colaboradores externos del motor: el
// servicio remoto de pasos (`StepService`) y el medio clave/valor donde se
// guardan los borradores (`DraftMedium`).
use crate::errors::Result;
use async_trait::async_trait;
use std::sync::Arc;
use step_domain::WireStep;

/// Servicio remoto de pasos (`GET/POST/PUT/DELETE steps`).
///
/// Las implementaciones deben devolver `SyncError::Remote` ante un error
/// HTTP o una respuesta sin indicador de éxito. Se asume consistencia
/// lectura-tras-escritura: un `list_steps` posterior ve las escrituras
/// previas del mismo commit.
#[async_trait]
pub trait StepService: Send + Sync {
    /// Lista los pasos de un flow, en cualquier orden.
    async fn list_steps(&self, flow_id: &str) -> Result<Vec<WireStep>>;

    /// Crea un paso y devuelve el `_id` asignado por el servidor.
    async fn create_step(&self, flow_id: &str, step: &WireStep) -> Result<String>;

    /// Reemplaza el contenido y/o la posición (`step_count`) de un paso.
    async fn update_step(&self, flow_id: &str, step_id: &str, step: &WireStep) -> Result<()>;

    /// Elimina un paso.
    async fn delete_step(&self, flow_id: &str, step_id: &str) -> Result<()>;
}

/// Medio clave/valor para los borradores. Se trata como no fiable: el
/// `DraftStore` que lo envuelve absorbe sus errores.
pub trait DraftMedium: Send + Sync {
    /// Lee el valor crudo de `key`, `None` si no existe.
    fn get(&self, key: &str) -> Result<Option<String>>;
    /// Escribe (o reemplaza) el valor de `key`.
    fn put(&self, key: &str, value: &str) -> Result<()>;
    /// Elimina `key`. No es error si no existía.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Permite compartir un mismo medio entre el `DraftStore` y otros dueños.
impl<M> DraftMedium for Arc<M> where M: DraftMedium
{
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        (**self).put(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}
