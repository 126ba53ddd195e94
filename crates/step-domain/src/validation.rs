// validation.rs
use crate::{ActionStep, DomainError, Step, StepKind};
use std::collections::HashSet;

pub const MIN_RETRY_ATTEMPTS: u32 = 1;
pub const MAX_RETRY_ATTEMPTS: u32 = 7;
pub const MIN_RETRY_DELAY_SECONDS: u32 = 1;
pub const MAX_RETRY_DELAY_SECONDS: u32 = 300;
pub(crate) const DEFAULT_RETRY_DELAY_SECONDS: u32 = 60;

pub(crate) fn clamp_retry_attempts(v: u32) -> u32 {
  v.clamp(MIN_RETRY_ATTEMPTS, MAX_RETRY_ATTEMPTS)
}

pub(crate) fn clamp_retry_delay(v: u32) -> u32 {
  v.clamp(MIN_RETRY_DELAY_SECONDS, MAX_RETRY_DELAY_SECONDS)
}

impl Step {
  /// Prepara una edición local para entrar en el borrador.
  ///
  /// Los valores con un default seguro se ajustan (reintentos y espera de
  /// `http_request`, título vacío); el resto de entradas inválidas se
  /// rechaza con `ValidationError` y la edición no debe aceptarse.
  pub fn normalized(mut self) -> Result<Step, DomainError> {
    if self.title.trim().is_empty() {
      self.title = self.kind.default_title().to_string();
    } else {
      self.title = self.title.trim().to_string();
    }
    match &mut self.kind {
      StepKind::Delay(d) => {
        if !d.amount.is_finite() || d.amount <= 0.0 {
          return Err(DomainError::ValidationError(format!("La espera debe ser un número positivo (recibido {})",
                                                          d.amount)));
        }
      }
      StepKind::Action(ActionStep::HttpRequest(h)) => {
        h.url = h.url.trim().to_string();
        if h.url.is_empty() {
          return Err(DomainError::ValidationError("La petición HTTP necesita una URL".to_string()));
        }
        h.retry_attempts = clamp_retry_attempts(h.retry_attempts);
        h.retry_delay_seconds = clamp_retry_delay(h.retry_delay_seconds);
      }
      StepKind::Action(ActionStep::SendEmail(e)) => {
        if e.template_id.trim().is_empty() {
          return Err(DomainError::ValidationError("El envío de email necesita una plantilla".to_string()));
        }
      }
      StepKind::Action(ActionStep::MoveToList(m)) => {
        if m.target_list_id.trim().is_empty() {
          return Err(DomainError::ValidationError("Mover a lista necesita una lista destino".to_string()));
        }
      }
      StepKind::Action(ActionStep::DeleteFromCurrentList) | StepKind::Action(ActionStep::DeleteSubscriber) => {}
    }
    Ok(self)
  }
}

/// Una secuencia no puede repetir ids.
pub fn ensure_unique_ids(steps: &[Step]) -> Result<(), DomainError> {
  let mut seen = HashSet::new();
  for s in steps {
    if !seen.insert(&s.id) {
      return Err(DomainError::DuplicateId(s.id.to_string()));
    }
  }
  Ok(())
}
