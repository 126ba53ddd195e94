// Archivo: http_service.rs
// Propósito: `StepService` sobre la API REST de pasos.
//   GET    {base}/steps?flowId=..            -> [WireStep] | { steps: [WireStep] }
//   POST   {base}/steps  { flowId, step }    -> { _id }
//   PUT    {base}/steps  { flowId, stepId, stepData } -> { success: true }
//   DELETE {base}/steps?flowId=..&stepId=..  -> { success: true }
use async_trait::async_trait;
use flow_sync::{StepService, SyncError};
use log::debug;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use step_domain::WireStep;
use url::Url;

/// Cliente HTTP del servicio de pasos. El timeout por llamada lo impone el
/// orquestador; aquí solo se traduce cada operación a su petición.
pub struct HttpStepService {
  base_url: Url,
  token: Option<String>,
  client: Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateBody<'a> {
  flow_id: &'a str,
  step: &'a WireStep,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBody<'a> {
  flow_id: &'a str,
  step_id: &'a str,
  step_data: &'a WireStep,
}

#[derive(Deserialize)]
struct CreatedResponse {
  #[serde(rename = "_id")]
  id: Option<String>,
}

#[derive(Deserialize)]
struct AckResponse {
  #[serde(default)]
  success: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListResponse {
  Bare(Vec<WireStep>),
  Wrapped { steps: Vec<WireStep> },
}

impl HttpStepService {
  pub fn new(base_url: &str) -> Result<Self, SyncError> {
    let client = Client::builder().build()
                                  .map_err(|e| SyncError::Other(format!("cliente HTTP: {}", e)))?;
    Self::with_client(base_url, client)
  }

  /// Igual que `new` pero con un `reqwest::Client` ya configurado.
  pub fn with_client(base_url: &str, client: Client) -> Result<Self, SyncError> {
    let mut base_url =
      Url::parse(base_url).map_err(|e| SyncError::Other(format!("URL base inválida '{}': {}", base_url, e)))?;
    // `Url::join` descarta el último segmento si no termina en '/'.
    if !base_url.path().ends_with('/') {
      let path = format!("{}/", base_url.path());
      base_url.set_path(&path);
    }
    Ok(Self { base_url, token: None, client })
  }

  /// Token enviado como `Authorization: Bearer ...`.
  pub fn with_token(mut self, token: impl Into<String>) -> Self {
    self.token = Some(token.into());
    self
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  fn steps_url(&self) -> Result<Url, SyncError> {
    self.base_url.join("steps").map_err(|e| SyncError::Other(format!("URL de pasos: {}", e)))
  }

  pub(crate) fn list_url(&self, flow_id: &str) -> Result<Url, SyncError> {
    let mut url = self.steps_url()?;
    url.query_pairs_mut().append_pair("flowId", flow_id);
    Ok(url)
  }

  pub(crate) fn delete_url(&self, flow_id: &str, step_id: &str) -> Result<Url, SyncError> {
    let mut url = self.steps_url()?;
    url.query_pairs_mut().append_pair("flowId", flow_id).append_pair("stepId", step_id);
    Ok(url)
  }

  fn request(&self, method: Method, url: Url) -> RequestBuilder {
    let builder = self.client.request(method, url);
    match &self.token {
      Some(token) => builder.bearer_auth(token),
      None => builder,
    }
  }

  /// Envía la petición y devuelve el cuerpo si el estado es 2xx.
  async fn send(&self, label: &str, builder: RequestBuilder) -> Result<String, SyncError> {
    let resp = builder.send().await.map_err(|e| SyncError::Remote(format!("{}: {}", label, e)))?;
    let status = resp.status();
    let body = resp.text().await.map_err(|e| SyncError::Remote(format!("{}: {}", label, e)))?;
    debug!("{} -> HTTP {}", label, status);
    if status == StatusCode::NOT_FOUND {
      return Err(SyncError::NotFound(format!("{}: {}", label, snippet(&body))));
    }
    if !status.is_success() {
      return Err(SyncError::Remote(format!("{}: HTTP {}: {}", label, status.as_u16(), snippet(&body))));
    }
    Ok(body)
  }
}

fn snippet(body: &str) -> &str {
  match body.char_indices().nth(200) {
    Some((idx, _)) => &body[..idx],
    None => body,
  }
}

pub(crate) fn parse_list(body: &str) -> Result<Vec<WireStep>, SyncError> {
  let parsed: ListResponse =
    serde_json::from_str(body).map_err(|e| SyncError::Remote(format!("respuesta de lista inválida: {}", e)))?;
  Ok(match parsed {
       ListResponse::Bare(steps) => steps,
       ListResponse::Wrapped { steps } => steps,
     })
}

pub(crate) fn parse_created(body: &str) -> Result<String, SyncError> {
  let parsed: CreatedResponse =
    serde_json::from_str(body).map_err(|e| SyncError::Remote(format!("respuesta de creación inválida: {}", e)))?;
  match parsed.id {
    Some(id) if !id.trim().is_empty() => Ok(id),
    _ => Err(SyncError::Remote("la respuesta de creación no trae _id".into())),
  }
}

pub(crate) fn parse_ack(label: &str, body: &str) -> Result<(), SyncError> {
  let parsed: AckResponse =
    serde_json::from_str(body).map_err(|e| SyncError::Remote(format!("{}: respuesta inválida: {}", label, e)))?;
  if parsed.success {
    Ok(())
  } else {
    Err(SyncError::Remote(format!("{}: el servidor no confirmó la operación", label)))
  }
}

#[async_trait]
impl StepService for HttpStepService {
  async fn list_steps(&self, flow_id: &str) -> Result<Vec<WireStep>, SyncError> {
    let url = self.list_url(flow_id)?;
    let body = self.send("GET steps", self.request(Method::GET, url)).await?;
    parse_list(&body)
  }

  async fn create_step(&self, flow_id: &str, step: &WireStep) -> Result<String, SyncError> {
    let url = self.steps_url()?;
    let payload = CreateBody { flow_id, step };
    let body = self.send("POST steps", self.request(Method::POST, url).json(&payload)).await?;
    parse_created(&body)
  }

  async fn update_step(&self, flow_id: &str, step_id: &str, step: &WireStep) -> Result<(), SyncError> {
    let url = self.steps_url()?;
    let payload = UpdateBody { flow_id, step_id, step_data: step };
    let body = self.send("PUT steps", self.request(Method::PUT, url).json(&payload)).await?;
    parse_ack("PUT steps", &body)
  }

  async fn delete_step(&self, flow_id: &str, step_id: &str) -> Result<(), SyncError> {
    let url = self.delete_url(flow_id, step_id)?;
    let body = self.send("DELETE steps", self.request(Method::DELETE, url)).await?;
    parse_ack("DELETE steps", &body)
  }
}

/// Construye el servicio a partir de `STEPS_API_URL` (obligatoria) y
/// `STEPS_API_TOKEN` (opcional).
pub fn new_step_service_from_env() -> Result<HttpStepService, SyncError> {
  dotenvy::dotenv().ok();
  let url = std::env::var("STEPS_API_URL").map_err(|_| SyncError::Other("STEPS_API_URL no está definida".into()))?;
  let service = HttpStepService::new(&url)?;
  Ok(match std::env::var("STEPS_API_TOKEN") {
       Ok(token) if !token.trim().is_empty() => service.with_token(token),
       _ => service,
     })
}
