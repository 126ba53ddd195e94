// codec.rs
use crate::validation::{clamp_retry_attempts, clamp_retry_delay};
use crate::{format_params, parse_params};
use crate::{ActionStep, DelaySpec, DelayUnit, HttpMethod, HttpRequest, MoveToList, SendEmail, Step, StepId, StepKind,
            StepType, WireStep};

/// Convierte un paso en su forma remota. Los ids locales no se envían: el
/// servidor asigna uno al crear. `step_count` queda vacío; lo fija quien
/// conoce la posición (ver `encode_with_position`).
pub fn encode(step: &Step) -> WireStep {
  let id = if step.id.is_local() { None } else { Some(step.id.as_str().to_string()) };
  let mut wire = match &step.kind {
    StepKind::Delay(d) => WireStep { wait_amount: Some(d.amount),
                                     wait_unit: Some(d.unit.as_str().to_string()),
                                     ..WireStep::new(StepType::WaitSubscriber, step.title.clone()) },
    StepKind::Action(ActionStep::SendEmail(e)) => {
      WireStep { email_template_id: Some(e.template_id.clone()),
                 email_subject: Some(e.subject.clone()),
                 ..WireStep::new(StepType::SendMail, step.title.clone()) }
    }
    StepKind::Action(ActionStep::HttpRequest(h)) => {
      WireStep { webhook_method: Some(h.method.as_str().to_string()),
                 webhook_url: Some(h.url.clone()),
                 webhook_query: Some(format_params(&h.query)),
                 webhook_headers: Some(format_params(&h.headers)),
                 webhook_body: Some(h.body.clone()),
                 retry_attempts: Some(clamp_retry_attempts(h.retry_attempts)),
                 retry_delay: Some(clamp_retry_delay(h.retry_delay_seconds)),
                 ..WireStep::new(StepType::SendWebhook, step.title.clone()) }
    }
    StepKind::Action(ActionStep::MoveToList(m)) => {
      WireStep { target_list_id: Some(m.target_list_id.clone()),
                 ..WireStep::new(StepType::MoveSubscriber, step.title.clone()) }
    }
    StepKind::Action(ActionStep::DeleteFromCurrentList) => WireStep::new(StepType::RemoveSubscriber, step.title.clone()),
    StepKind::Action(ActionStep::DeleteSubscriber) => WireStep::new(StepType::DeleteSubscriber, step.title.clone()),
  };
  wire.id = id;
  wire
}

/// `encode` con la posición 1-based que espera `PUT steps`.
pub fn encode_with_position(step: &Step, position: u32) -> WireStep {
  let mut wire = encode(step);
  wire.step_count = Some(position);
  wire
}

/// Convierte un paso remoto al modelo local. Devuelve `None` si el
/// `stepType` no es reconocido; nunca falla para un tipo conocido (los
/// campos ausentes toman su valor por defecto).
pub fn decode(wire: &WireStep) -> Option<Step> {
  let kind = match wire.known_type()? {
    StepType::WaitSubscriber => {
      StepKind::Delay(DelaySpec { amount: wire.wait_amount.unwrap_or(0.0),
                                  unit: wire.wait_unit.as_deref().and_then(DelayUnit::parse).unwrap_or_default() })
    }
    StepType::SendMail => {
      StepKind::Action(ActionStep::SendEmail(SendEmail { template_id: wire.email_template_id.clone().unwrap_or_default(),
                                                         subject: wire.email_subject.clone().unwrap_or_default() }))
    }
    StepType::SendWebhook => StepKind::Action(ActionStep::HttpRequest(decode_webhook(wire))),
    StepType::MoveSubscriber => {
      StepKind::Action(ActionStep::MoveToList(MoveToList { target_list_id: wire.target_list_id
                                                                               .clone()
                                                                               .unwrap_or_default() }))
    }
    StepType::RemoveSubscriber => StepKind::Action(ActionStep::DeleteFromCurrentList),
    StepType::DeleteSubscriber => StepKind::Action(ActionStep::DeleteSubscriber),
  };
  let id = match &wire.id {
    Some(id) if !id.is_empty() => StepId::new(id.clone()),
    _ => StepId::new_local(),
  };
  Some(Step { id, title: wire.title.clone(), kind, collapsed: false })
}

fn decode_webhook(wire: &WireStep) -> HttpRequest {
  HttpRequest { method: wire.webhook_method.as_deref().and_then(HttpMethod::parse).unwrap_or_default(),
                url: wire.webhook_url.clone().unwrap_or_default(),
                query: wire.webhook_query.as_deref().map(parse_params).unwrap_or_default(),
                headers: wire.webhook_headers.as_deref().map(parse_params).unwrap_or_default(),
                body: wire.webhook_body.clone().unwrap_or_default(),
                retry_attempts: clamp_retry_attempts(wire.retry_attempts.unwrap_or(0)),
                retry_delay_seconds: clamp_retry_delay(wire.retry_delay
                                                           .unwrap_or(crate::validation::DEFAULT_RETRY_DELAY_SECONDS)) }
}

/// Ordena por `stepCount` ascendente y decodifica, descartando los pasos
/// cuyo tipo no se reconoce y los que llegan sin `_id`. Los pasos sin
/// `stepCount` van al final conservando el orden de llegada.
pub fn decode_sequence(mut wires: Vec<WireStep>) -> Vec<Step> {
  wires.sort_by_key(|w| w.step_count.unwrap_or(u32::MAX));
  wires.iter()
       .filter_map(|w| {
         // Sin id de servidor el diff lo vería como nuevo y lo duplicaría.
         if w.id.as_deref().map_or(true, |id| id.trim().is_empty()) {
           log::warn!("descartando paso '{}' ({}) sin _id", w.title, w.step_type);
           return None;
         }
         let step = decode(w);
         if step.is_none() {
           log::warn!("descartando paso {:?} con stepType desconocido '{}'", w.id, w.step_type);
         }
         step
       })
       .collect()
}

/// Igualdad de contenido a efectos del diff: compara la forma codificada
/// sin id ni posición, de modo que los campos locales (p. ej. `collapsed`)
/// y el orden no cuentan.
pub fn same_content(a: &Step, b: &Step) -> bool {
  content_of(a) == content_of(b)
}

fn content_of(step: &Step) -> WireStep {
  let mut wire = encode(step);
  wire.id = None;
  wire.step_count = None;
  wire
}
