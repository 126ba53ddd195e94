// step.rs
use crate::{KeyValue, StepId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unidad atómica del pipeline. El orden no se guarda aquí: es la posición
/// dentro de la secuencia que la contiene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
  pub id: StepId,
  pub title: String,
  pub kind: StepKind,
  /// Estado puramente visual del editor. No viaja al servidor y no cuenta
  /// para el diff.
  #[serde(default)]
  pub collapsed: bool,
}

impl Step {
  /// Crea un paso nuevo con id local.
  pub fn new_local(title: impl Into<String>, kind: StepKind) -> Self {
    Self { id: StepId::new_local(), title: title.into(), kind, collapsed: false }
  }

  pub fn with_id(id: impl Into<StepId>, title: impl Into<String>, kind: StepKind) -> Self {
    Self { id: id.into(), title: title.into(), kind, collapsed: false }
  }

  pub fn delay(title: impl Into<String>, amount: f64, unit: DelayUnit) -> Self {
    Self::new_local(title, StepKind::Delay(DelaySpec { amount, unit }))
  }

  pub fn action(title: impl Into<String>, action: ActionStep) -> Self {
    Self::new_local(title, StepKind::Action(action))
  }

  pub fn is_local(&self) -> bool {
    self.id.is_local()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
  Delay(DelaySpec),
  Action(ActionStep),
}

impl StepKind {
  /// Etiqueta por defecto cuando el usuario deja el título vacío.
  pub fn default_title(&self) -> &'static str {
    match self {
      StepKind::Delay(_) => "Esperar",
      StepKind::Action(ActionStep::SendEmail(_)) => "Enviar email",
      StepKind::Action(ActionStep::HttpRequest(_)) => "Petición HTTP",
      StepKind::Action(ActionStep::MoveToList(_)) => "Mover a lista",
      StepKind::Action(ActionStep::DeleteFromCurrentList) => "Quitar de la lista actual",
      StepKind::Action(ActionStep::DeleteSubscriber) => "Eliminar suscriptor",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelaySpec {
  pub amount: f64,
  pub unit: DelayUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelayUnit {
  Seconds,
  #[default]
  Minutes,
  Hours,
  Days,
  Weeks,
  Months,
}

impl DelayUnit {
  pub fn as_str(&self) -> &'static str {
    match self {
      DelayUnit::Seconds => "seconds",
      DelayUnit::Minutes => "minutes",
      DelayUnit::Hours => "hours",
      DelayUnit::Days => "days",
      DelayUnit::Weeks => "weeks",
      DelayUnit::Months => "months",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_lowercase().as_str() {
      "seconds" => Some(DelayUnit::Seconds),
      "minutes" => Some(DelayUnit::Minutes),
      "hours" => Some(DelayUnit::Hours),
      "days" => Some(DelayUnit::Days),
      "weeks" => Some(DelayUnit::Weeks),
      "months" => Some(DelayUnit::Months),
      _ => None,
    }
  }
}

impl fmt::Display for DelayUnit {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Acciones soportadas. Cada variante lleva sólo los campos que su tipo
/// necesita; el codec hace `match` exhaustivo sobre ellas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "actionKind", rename_all = "snake_case")]
pub enum ActionStep {
  SendEmail(SendEmail),
  HttpRequest(HttpRequest),
  MoveToList(MoveToList),
  DeleteFromCurrentList,
  DeleteSubscriber,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmail {
  pub template_id: String,
  #[serde(default)]
  pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveToList {
  pub target_list_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequest {
  pub method: HttpMethod,
  pub url: String,
  #[serde(default)]
  pub query: Vec<KeyValue>,
  #[serde(default)]
  pub headers: Vec<KeyValue>,
  #[serde(default)]
  pub body: String,
  pub retry_attempts: u32,
  pub retry_delay_seconds: u32,
}

impl HttpRequest {
  /// Petición con los valores por defecto del proveedor.
  pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
    Self { method,
           url: url.into(),
           query: Vec::new(),
           headers: Vec::new(),
           body: String::new(),
           retry_attempts: crate::MIN_RETRY_ATTEMPTS,
           retry_delay_seconds: crate::validation::DEFAULT_RETRY_DELAY_SECONDS }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
  Get,
  #[default]
  Post,
  Put,
  Patch,
  Delete,
}

impl HttpMethod {
  pub fn as_str(&self) -> &'static str {
    match self {
      HttpMethod::Get => "GET",
      HttpMethod::Post => "POST",
      HttpMethod::Put => "PUT",
      HttpMethod::Patch => "PATCH",
      HttpMethod::Delete => "DELETE",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_uppercase().as_str() {
      "GET" => Some(HttpMethod::Get),
      "POST" => Some(HttpMethod::Post),
      "PUT" => Some(HttpMethod::Put),
      "PATCH" => Some(HttpMethod::Patch),
      "DELETE" => Some(HttpMethod::Delete),
      _ => None,
    }
  }
}

impl fmt::Display for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.kind {
      StepKind::Delay(d) => write!(f, "[{}] {} (esperar {} {})", self.id, self.title, d.amount, d.unit),
      StepKind::Action(a) => {
        let kind = match a {
          ActionStep::SendEmail(_) => "send_email",
          ActionStep::HttpRequest(_) => "http_request",
          ActionStep::MoveToList(_) => "move_to_list",
          ActionStep::DeleteFromCurrentList => "delete_from_current_list",
          ActionStep::DeleteSubscriber => "delete_subscriber",
        };
        write!(f, "[{}] {} ({})", self.id, self.title, kind)
      }
    }
  }
}
