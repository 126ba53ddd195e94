use step_domain::{decode, decode_sequence, encode, encode_with_position, same_content, ActionStep, DelayUnit, HttpMethod,
                  HttpRequest, KeyValue, MoveToList, SendEmail, Step, StepId, StepKind, StepType, WireStep};

fn saved(id: &str, title: &str, kind: StepKind) -> Step {
  Step::with_id(id, title, kind)
}

fn all_shapes() -> Vec<Step> {
  let mut hook = HttpRequest::new(HttpMethod::Put, "https://api.example.com/hook");
  hook.query = vec![KeyValue::new("list", "vip"), KeyValue::new("q", "a b&c")];
  hook.headers = vec![KeyValue::new("Authorization", "Bearer x")];
  hook.body = r#"{"email":"{{email}}"}"#.into();
  hook.retry_attempts = 5;
  hook.retry_delay_seconds = 120;
  vec![saved("s1", "Esperar", StepKind::Delay(step_domain::DelaySpec { amount: 3.0, unit: DelayUnit::Days })),
       saved("s2",
             "Bienvenida",
             StepKind::Action(ActionStep::SendEmail(SendEmail { template_id: "tpl-1".into(), subject: "Hola".into() }))),
       saved("s3", "Webhook", StepKind::Action(ActionStep::HttpRequest(hook))),
       saved("s4",
             "Mover",
             StepKind::Action(ActionStep::MoveToList(MoveToList { target_list_id: "list-9".into() }))),
       saved("s5", "Quitar", StepKind::Action(ActionStep::DeleteFromCurrentList)),
       saved("s6", "Borrar", StepKind::Action(ActionStep::DeleteSubscriber))]
}

#[test]
fn every_supported_shape_survives_encode_then_decode() {
  for step in all_shapes() {
    let back = decode(&encode(&step)).expect("recognized type");
    assert_eq!(back, step, "round-trip for {}", step);
  }
}

#[test]
fn new_steps_round_trip_modulo_id() {
  let step = Step::delay("wait", 1.5, DelayUnit::Hours);
  let back = decode(&encode(&step)).unwrap();
  assert_ne!(back.id, step.id);
  assert_eq!(back.kind, step.kind);
  assert_eq!(back.title, step.title);
}

#[test]
fn wire_names_follow_remote_schema() {
  let shapes = all_shapes();
  let types: Vec<String> = shapes.iter().map(|s| encode(s).step_type).collect();
  assert_eq!(types,
             vec!["waitSubscriber", "sendMail", "sendWebhook", "moveSubscriber", "removeSubscriber", "deleteSubscriber"]);
  let json = serde_json::to_value(encode_with_position(&shapes[2], 3)).unwrap();
  assert_eq!(json["_id"], "s3");
  assert_eq!(json["stepCount"], 3);
  assert_eq!(json["webhookQuery"], "list=vip&q=a+b%26c");
  assert_eq!(json["retryAttempts"], 5);
  assert!(json.get("waitAmount").is_none());
}

#[test]
fn unknown_step_type_decodes_to_none() {
  let wire = WireStep { id: Some("x".into()), step_type: "sendSms".into(), ..Default::default() };
  assert!(decode(&wire).is_none());
}

#[test]
fn decode_sequence_sorts_by_step_count_and_drops_unknown() {
  let mut a = WireStep::new(StepType::DeleteSubscriber, "a");
  a.id = Some("a".into());
  a.step_count = Some(2);
  let mut b = WireStep::new(StepType::RemoveSubscriber, "b");
  b.id = Some("b".into());
  b.step_count = Some(1);
  let unknown = WireStep { id: Some("u".into()), step_type: "future".into(), step_count: Some(0), ..Default::default() };
  let steps = decode_sequence(vec![a, unknown, b]);
  let ids: Vec<&str> = steps.iter().map(|s| s.id.as_str()).collect();
  assert_eq!(ids, vec!["b", "a"]);
}

#[test]
fn decode_sequence_drops_steps_without_server_id() {
  let mut kept = WireStep::new(StepType::DeleteSubscriber, "kept");
  kept.id = Some("k".into());
  kept.step_count = Some(2);
  let mut missing = WireStep::new(StepType::DeleteSubscriber, "missing");
  missing.step_count = Some(1);
  let mut blank = WireStep::new(StepType::RemoveSubscriber, "blank");
  blank.id = Some(String::new());

  let steps = decode_sequence(vec![missing, kept, blank]);

  assert_eq!(steps.len(), 1);
  assert_eq!(steps[0].id.as_str(), "k");
  assert!(!steps[0].is_local());
}

#[test]
fn decode_tolerates_missing_fields() {
  let wire: WireStep = serde_json::from_value(serde_json::json!({"_id": "w", "stepType": "waitSubscriber"})).unwrap();
  let step = decode(&wire).unwrap();
  assert_eq!(step.id, StepId::new("w"));
  match step.kind {
    StepKind::Delay(d) => assert_eq!(d.unit, DelayUnit::Minutes),
    other => panic!("unexpected {:?}", other),
  }
}

#[test]
fn same_content_ignores_local_only_fields() {
  let a = all_shapes().remove(0);
  let mut b = a.clone();
  b.collapsed = true;
  assert!(same_content(&a, &b));
  b.title = "Otro".into();
  assert!(!same_content(&a, &b));
}

#[test]
fn steps_serialize_for_draft_storage() {
  let steps = all_shapes();
  let raw = serde_json::to_string(&steps).unwrap();
  let back: Vec<Step> = serde_json::from_str(&raw).unwrap();
  assert_eq!(back, steps);
  let v = serde_json::to_value(&steps[1]).unwrap();
  assert_eq!(v["kind"]["action"]["actionKind"], "send_email");
}
