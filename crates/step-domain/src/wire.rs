// wire.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Paso tal como lo expone el servicio remoto (`GET/POST/PUT steps`).
///
/// `step_type` se mantiene como texto para que un tipo desconocido no rompa
/// la deserialización del listado completo; el codec decide qué hacer con
/// él. Los campos específicos de cada tipo son opcionales y se omiten al
/// serializar cuando no aplican.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireStep {
  #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  pub step_type: String,
  #[serde(default)]
  pub title: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub step_count: Option<u32>,

  // waitSubscriber
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub wait_amount: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub wait_unit: Option<String>,

  // sendMail
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email_template_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email_subject: Option<String>,

  // sendWebhook
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub webhook_method: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub webhook_url: Option<String>,
  /// Query params como `key=value&key2=value2`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub webhook_query: Option<String>,
  /// Cabeceras en el mismo formato que `webhook_query`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub webhook_headers: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub webhook_body: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub retry_attempts: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub retry_delay: Option<u32>,

  // moveSubscriber
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub target_list_id: Option<String>,
}

impl WireStep {
  pub fn new(step_type: StepType, title: impl Into<String>) -> Self {
    Self { step_type: step_type.to_string(), title: title.into(), ..Default::default() }
  }

  /// Tipo reconocido, o `None` si el servidor envía algo que este cliente
  /// no sabe representar.
  pub fn known_type(&self) -> Option<StepType> {
    self.step_type.parse().ok()
  }
}

/// Valores de `stepType` en el esquema remoto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepType {
  WaitSubscriber,
  SendMail,
  SendWebhook,
  MoveSubscriber,
  RemoveSubscriber,
  DeleteSubscriber,
}

impl StepType {
  pub fn as_str(&self) -> &'static str {
    match self {
      StepType::WaitSubscriber => "waitSubscriber",
      StepType::SendMail => "sendMail",
      StepType::SendWebhook => "sendWebhook",
      StepType::MoveSubscriber => "moveSubscriber",
      StepType::RemoveSubscriber => "removeSubscriber",
      StepType::DeleteSubscriber => "deleteSubscriber",
    }
  }
}

impl fmt::Display for StepType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for StepType {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "waitSubscriber" => Ok(StepType::WaitSubscriber),
      "sendMail" => Ok(StepType::SendMail),
      "sendWebhook" => Ok(StepType::SendWebhook),
      "moveSubscriber" => Ok(StepType::MoveSubscriber),
      "removeSubscriber" => Ok(StepType::RemoveSubscriber),
      "deleteSubscriber" => Ok(StepType::DeleteSubscriber),
      other => Err(format!("stepType desconocido: {}", other)),
    }
  }
}
