//! step-domain: modelo de pasos de automatización y su codec de red
//!
//! Define la representación en memoria de un paso (`Step`, unión etiquetada
//! `delay | action`), el esquema remoto (`WireStep`) y el mapeo bidireccional
//! entre ambos. Todo el crate es puro: no hace I/O.
mod codec;
mod errors;
mod params;
mod step;
mod step_id;
mod validation;
mod wire;

pub use codec::{decode, decode_sequence, encode, encode_with_position, same_content};
pub use errors::DomainError;
pub use params::{format_params, parse_params, KeyValue};
pub use step::{ActionStep, DelaySpec, DelayUnit, HttpMethod, HttpRequest, MoveToList, SendEmail, Step, StepKind};
pub use step_id::{StepId, LOCAL_ID_PREFIX};
pub use validation::{ensure_unique_ids, MAX_RETRY_ATTEMPTS, MAX_RETRY_DELAY_SECONDS, MIN_RETRY_ATTEMPTS,
                     MIN_RETRY_DELAY_SECONDS};
pub use wire::{StepType, WireStep};
