// params.rs
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Par clave/valor usado para query params y cabeceras de `http_request`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
  pub key: String,
  pub value: String,
}

impl KeyValue {
  pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
    Self { key: key.into(), value: value.into() }
  }
}

/// Decodifica `key=value&key2=value2` en una lista estructurada. Una cadena
/// vacía produce una lista vacía.
pub fn parse_params(raw: &str) -> Vec<KeyValue> {
  let raw = raw.trim().trim_start_matches('?');
  if raw.is_empty() {
    return Vec::new();
  }
  form_urlencoded::parse(raw.as_bytes()).map(|(k, v)| KeyValue::new(k, v)).collect()
}

/// Inverso de `parse_params`.
pub fn format_params(params: &[KeyValue]) -> String {
  let mut serializer = form_urlencoded::Serializer::new(String::new());
  for p in params {
    serializer.append_pair(&p.key, &p.value);
  }
  serializer.finish()
}
