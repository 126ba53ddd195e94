use step_domain::{ensure_unique_ids, ActionStep, DelayUnit, DomainError, HttpMethod, HttpRequest, MoveToList, Step,
                  StepKind};

fn http_step(attempts: u32, delay: u32) -> Step {
  let mut req = HttpRequest::new(HttpMethod::Post, " https://hooks.example.com ");
  req.retry_attempts = attempts;
  req.retry_delay_seconds = delay;
  Step::action("hook", ActionStep::HttpRequest(req))
}

fn retry_of(step: &Step) -> (u32, u32) {
  match &step.kind {
    StepKind::Action(ActionStep::HttpRequest(h)) => (h.retry_attempts, h.retry_delay_seconds),
    other => panic!("unexpected {:?}", other),
  }
}

#[test]
fn retry_values_are_clamped_not_rejected() {
  let step = http_step(99, 0).normalized().expect("clamped");
  assert_eq!(retry_of(&step), (7, 1));
  let step = http_step(0, 1000).normalized().expect("clamped");
  assert_eq!(retry_of(&step), (1, 300));
}

#[test]
fn blank_title_falls_back_to_kind_label() {
  let step = Step::delay("   ", 2.0, DelayUnit::Hours).normalized().unwrap();
  assert_eq!(step.title, "Esperar");
}

#[test]
fn invalid_edits_are_rejected() {
  assert!(matches!(Step::delay("d", 0.0, DelayUnit::Days).normalized(), Err(DomainError::ValidationError(_))));
  assert!(matches!(Step::delay("d", f64::NAN, DelayUnit::Days).normalized(), Err(DomainError::ValidationError(_))));
  let no_url = Step::action("h", ActionStep::HttpRequest(HttpRequest::new(HttpMethod::Get, "  ")));
  assert!(no_url.normalized().is_err());
  let no_list = Step::action("m", ActionStep::MoveToList(MoveToList::default()));
  assert!(no_list.normalized().is_err());
}

#[test]
fn duplicate_ids_are_detected() {
  let a = Step::with_id("a", "x", StepKind::Action(ActionStep::DeleteSubscriber));
  let b = Step::with_id("b", "y", StepKind::Action(ActionStep::DeleteSubscriber));
  assert!(ensure_unique_ids(&[a.clone(), b]).is_ok());
  assert_eq!(ensure_unique_ids(&[a.clone(), a]), Err(DomainError::DuplicateId("a".into())));
}
