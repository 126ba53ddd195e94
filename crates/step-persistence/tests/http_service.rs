use flow_sync::{CommitOrchestrator, DraftStore, InMemoryDraftMedium, StepService, SyncConfig, SyncError};
use std::sync::Arc;
use step_domain::{DelayUnit, Step, StepType, WireStep};
use step_persistence::HttpStepService;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Petición recibida por el servidor de prueba.
#[derive(Debug)]
struct Seen {
  request_line: String,
  headers: String,
  body: String,
}

async fn read_request(sock: &mut TcpStream) -> Seen {
  let mut buf = Vec::new();
  let mut chunk = [0u8; 4096];
  let header_end = loop {
    let n = sock.read(&mut chunk).await.unwrap();
    assert!(n > 0, "conexión cerrada antes de las cabeceras");
    buf.extend_from_slice(&chunk[..n]);
    if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
      break pos + 4;
    }
  };
  let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
  let content_length = head.lines()
                           .filter_map(|l| l.split_once(':'))
                           .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
                           .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                           .unwrap_or(0);
  while buf.len() < header_end + content_length {
    let n = sock.read(&mut chunk).await.unwrap();
    assert!(n > 0, "conexión cerrada antes del cuerpo");
    buf.extend_from_slice(&chunk[..n]);
  }
  let (request_line, headers) = head.split_once("\r\n").unwrap();
  Seen { request_line: request_line.to_string(),
         headers: headers.to_lowercase(),
         body: String::from_utf8_lossy(&buf[header_end..header_end + content_length]).to_string() }
}

/// Sirve una respuesta enlatada por conexión, en orden, y devuelve lo recibido.
async fn serve(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<Seen>>) {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  let handle = tokio::spawn(async move {
    let mut seen = Vec::new();
    for (status, body) in responses {
      let (mut sock, _) = listener.accept().await.unwrap();
      seen.push(read_request(&mut sock).await);
      let resp = format!("HTTP/1.1 {} OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: \
                          close\r\n\r\n{}",
                         status,
                         body.len(),
                         body);
      sock.write_all(resp.as_bytes()).await.unwrap();
      let _ = sock.shutdown().await;
    }
    seen
  });
  (format!("http://{}/api", addr), handle)
}

fn service(base: &str) -> HttpStepService {
  let client = reqwest::Client::builder().no_proxy().build().unwrap();
  HttpStepService::with_client(base, client).unwrap().with_token("tok-123")
}

#[tokio::test]
async fn list_sends_flow_id_and_bearer_token() {
  let (base, server) =
    serve(vec![(200, r#"{"steps":[{"_id":"s1","stepType":"waitSubscriber","title":"Esperar","stepCount":1}]}"#)]).await;
  let svc = service(&base);

  let steps = svc.list_steps("flow-1").await.unwrap();
  assert_eq!(steps.len(), 1);
  assert_eq!(steps[0].id.as_deref(), Some("s1"));

  let seen = server.await.unwrap();
  assert_eq!(seen[0].request_line, "GET /api/steps?flowId=flow-1 HTTP/1.1");
  assert!(seen[0].headers.contains("authorization: bearer tok-123"));
}

#[tokio::test]
async fn create_posts_flow_id_and_step_without_id() {
  let (base, server) = serve(vec![(200, r#"{"_id":"srv_9"}"#)]).await;
  let svc = service(&base);
  let wire = WireStep::new(StepType::DeleteSubscriber, "Eliminar");

  let id = svc.create_step("flow-1", &wire).await.unwrap();
  assert_eq!(id, "srv_9");

  let seen = server.await.unwrap();
  assert!(seen[0].request_line.starts_with("POST /api/steps "));
  let body: serde_json::Value = serde_json::from_str(&seen[0].body).unwrap();
  assert_eq!(body["flowId"], "flow-1");
  assert_eq!(body["step"]["stepType"], "deleteSubscriber");
  assert!(body["step"].get("_id").is_none());
}

#[tokio::test]
async fn update_and_delete_require_success_flag() {
  let (base, server) = serve(vec![(200, r#"{"success":true}"#), (200, r#"{"ok":1}"#)]).await;
  let svc = service(&base);
  let wire = WireStep::new(StepType::DeleteSubscriber, "Eliminar");

  svc.update_step("flow-1", "s1", &wire).await.unwrap();
  let err = svc.delete_step("flow-1", "s1").await.unwrap_err();
  assert!(matches!(err, SyncError::Remote(_)), "{:?}", err);

  let seen = server.await.unwrap();
  let put: serde_json::Value = serde_json::from_str(&seen[0].body).unwrap();
  assert!(seen[0].request_line.starts_with("PUT /api/steps "));
  assert_eq!(put["stepId"], "s1");
  assert_eq!(put["stepData"]["title"], "Eliminar");
  assert_eq!(seen[1].request_line, "DELETE /api/steps?flowId=flow-1&stepId=s1 HTTP/1.1");
}

#[tokio::test]
async fn http_errors_map_to_remote_and_not_found() {
  let (base, server) = serve(vec![(500, r#"{"error":"boom"}"#), (404, "")]).await;
  let svc = service(&base);

  assert!(matches!(svc.list_steps("flow-1").await, Err(SyncError::Remote(msg)) if msg.contains("500")));
  assert!(matches!(svc.delete_step("flow-1", "gone").await, Err(SyncError::NotFound(_))));
  server.await.unwrap();
}

#[tokio::test]
async fn commit_over_http_creates_positions_and_refreshes() {
  let (base, server) = serve(vec![(200, r#"{"_id":"srv_1"}"#),
                                  (200, r#"{"success":true}"#),
                                  (200,
                                   r#"[{"_id":"srv_1","stepType":"waitSubscriber","title":"Esperar","stepCount":1,"waitAmount":3,"waitUnit":"minutes"}]"#)]).await;
  let engine = CommitOrchestrator::new(Arc::new(service(&base)),
                                       Arc::new(DraftStore::new(InMemoryDraftMedium::new())),
                                       SyncConfig::default());
  let current = vec![Step::delay("Esperar", 3.0, DelayUnit::Minutes)];

  let refreshed = engine.commit("flow-1", &current, &[]).await.expect("commit");
  assert_eq!(refreshed.len(), 1);
  assert_eq!(refreshed[0].id.as_str(), "srv_1");
  assert_eq!(refreshed[0].kind, current[0].kind);

  let seen = server.await.unwrap();
  let methods: Vec<&str> = seen.iter().map(|s| s.request_line.split(' ').next().unwrap()).collect();
  assert_eq!(methods, vec!["POST", "PUT", "GET"]);
  let put: serde_json::Value = serde_json::from_str(&seen[1].body).unwrap();
  assert_eq!(put["stepId"], "srv_1");
  assert_eq!(put["stepData"]["stepCount"], 1);
}
