use chrono::Utc;
use flow_sync::{draft_key, DraftMedium, DraftPatch, DraftRepository, DraftStore};
use serde_json::json;
use step_domain::{DelayUnit, Step};
use step_persistence::{new_draft_repo_from_env, DieselDraftMedium};
use uuid::Uuid;

// Fichero SQLite temporal por prueba; evita depender del soporte de URIs
// `file:...?mode=memory` de cada build de sqlite.
fn temp_db_url() -> String {
  let path = std::env::temp_dir().join(format!("stepflow_drafts_{}.db", Uuid::new_v4()));
  path.to_str().unwrap().to_string()
}

#[test]
fn medium_put_get_replace_remove() {
  let medium = DieselDraftMedium::new(&temp_db_url()).expect("medium");
  assert_eq!(medium.get("wf:draft:x").unwrap(), None);

  medium.put("wf:draft:x", "uno").unwrap();
  assert_eq!(medium.get("wf:draft:x").unwrap().as_deref(), Some("uno"));

  medium.put("wf:draft:x", "dos").unwrap();
  assert_eq!(medium.get("wf:draft:x").unwrap().as_deref(), Some("dos"));
  assert_eq!(medium.count().unwrap(), 1);

  medium.remove("wf:draft:x").unwrap();
  assert_eq!(medium.get("wf:draft:x").unwrap(), None);
  // Borrar una clave inexistente no es error.
  medium.remove("wf:draft:x").unwrap();
}

#[test]
fn put_stamps_rows_with_wall_clock_millis() {
  let medium = DieselDraftMedium::new(&temp_db_url()).expect("medium");
  let before = Utc::now().timestamp_millis();
  medium.put("wf:draft:t", "{}").unwrap();
  let after = Utc::now().timestamp_millis();

  let stamp = medium.stamp_of("wf:draft:t").unwrap().expect("stamp");
  assert!(stamp >= before && stamp <= after, "{} fuera de [{}, {}]", stamp, before, after);
  assert_eq!(medium.stamp_of("wf:draft:otro").unwrap(), None);
}

#[test]
fn draft_survives_reopening_the_database() {
  let url = temp_db_url();
  let steps = vec![Step::delay("Esperar", 2.0, DelayUnit::Hours)];
  {
    let store = DraftStore::new(DieselDraftMedium::new(&url).unwrap());
    store.write("flow-9", DraftPatch::steps(steps.clone()));
    store.write("flow-9", DraftPatch::automation(json!({"name": "Bienvenida"})));
  }

  let store = DraftStore::new(DieselDraftMedium::new(&url).unwrap());
  let draft = store.read("flow-9").expect("draft");
  assert_eq!(draft.steps_draft, Some(steps));
  assert_eq!(draft.automation_patch, Some(json!({"name": "Bienvenida"})));

  store.clear("flow-9");
  assert!(store.read("flow-9").is_none());
  assert_eq!(store.medium().count().unwrap(), 0);
}

#[test]
fn drafts_are_isolated_per_flow() {
  let store = DraftStore::new(DieselDraftMedium::new(&temp_db_url()).unwrap());
  store.write("a", DraftPatch::automation(json!({"status": "on"})));
  store.write("b", DraftPatch::automation(json!({"status": "off"})));

  store.clear("a");
  assert!(store.read("a").is_none());
  assert_eq!(store.read("b").unwrap().automation_patch, Some(json!({"status": "off"})));
}

#[test]
fn corrupt_row_reads_as_no_draft() {
  let store = DraftStore::new(DieselDraftMedium::new(&temp_db_url()).unwrap());
  store.medium().put(&draft_key("flow-1"), "{no es json").unwrap();
  assert!(store.read("flow-1").is_none());

  // Una escritura posterior reemplaza el contenido corrupto.
  store.write("flow-1", DraftPatch::automation(json!({"k": 1})));
  assert_eq!(store.read("flow-1").unwrap().automation_patch, Some(json!({"k": 1})));
}

#[test]
fn repo_from_env_uses_draft_db_url() {
  let url = temp_db_url();
  std::env::set_var("DRAFT_DB_URL", &url);
  let store = new_draft_repo_from_env().expect("store from env");
  store.write("flow-env", DraftPatch::automation(json!({})));

  let reopened = DieselDraftMedium::new(&url).unwrap();
  assert!(reopened.get(&draft_key("flow-env")).unwrap().is_some());
}
