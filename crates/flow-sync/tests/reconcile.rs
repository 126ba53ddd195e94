use flow_sync::{diff_steps, order_changed};
use std::collections::HashSet;
use step_domain::{ActionStep, DelayUnit, MoveToList, Step, StepId, StepKind};

fn server(id: &str, title: &str) -> Step {
  Step::with_id(id, title, StepKind::Action(ActionStep::DeleteSubscriber))
}

fn ids(steps: &[Step]) -> Vec<String> {
  steps.iter().map(|s| s.id.to_string()).collect()
}

#[test]
fn new_local_step_against_empty_baseline() {
  let new = Step::delay("wait", 3.0, DelayUnit::Minutes);
  let diff = diff_steps(&[new.clone()], &[]);
  assert_eq!(diff.created, vec![new]);
  assert!(diff.updated.is_empty() && diff.deleted.is_empty());
}

#[test]
fn pure_reorder_is_not_an_update() {
  let a = server("a", "A");
  let b = server("b", "B");
  let diff = diff_steps(&[b.clone(), a.clone()], &[a.clone(), b.clone()]);
  assert!(diff.is_empty());
  assert_eq!(diff.order, vec![StepId::new("b"), StepId::new("a")]);
  assert!(order_changed(&[b, a.clone()], &[a, server("b", "B")]));
}

#[test]
fn removed_steps_are_deleted() {
  let a = server("a", "A");
  let diff = diff_steps(&[], &[a.clone()]);
  assert_eq!(diff.deleted, vec![a]);
  assert!(diff.created.is_empty());
}

#[test]
fn edited_and_moved_step_is_updated() {
  let a = server("a", "A");
  let b = server("b", "B");
  let mut b2 = b.clone();
  b2.kind = StepKind::Action(ActionStep::MoveToList(MoveToList { target_list_id: "l1".into() }));
  let diff = diff_steps(&[b2.clone(), a.clone()], &[a.clone(), b]);
  assert_eq!(diff.updated, vec![b2]);
  assert_eq!(diff.unchanged, vec![a]);
}

#[test]
fn collapsed_flag_alone_is_not_an_update() {
  let a = server("a", "A");
  let mut folded = a.clone();
  folded.collapsed = true;
  assert!(diff_steps(&[folded], &[a]).is_empty());
}

#[test]
fn server_id_missing_from_baseline_is_created() {
  let ghost = server("gone-remotely", "G");
  let diff = diff_steps(&[ghost.clone()], &[server("a", "A")]);
  assert_eq!(diff.created, vec![ghost]);
  assert_eq!(ids(&diff.deleted), vec!["a"]);
}

#[test]
fn diff_partitions_union_without_overlap() {
  let baseline = vec![server("a", "A"), server("b", "B"), server("c", "C"), server("d", "D")];
  let mut c2 = baseline[2].clone();
  c2.title = "C2".into();
  let current = vec![Step::delay("n1", 1.0, DelayUnit::Hours),
                     baseline[3].clone(),
                     c2,
                     Step::delay("n2", 5.0, DelayUnit::Seconds),
                     baseline[0].clone()];
  let diff = diff_steps(&current, &baseline);

  let buckets = [&diff.created, &diff.updated, &diff.unchanged, &diff.deleted];
  let mut seen = HashSet::new();
  let mut total = 0;
  for bucket in buckets {
    for s in bucket.iter() {
      assert!(seen.insert(s.id.clone()), "{} appears twice", s.id);
      total += 1;
    }
  }
  let union: HashSet<StepId> = current.iter().chain(baseline.iter()).map(|s| s.id.clone()).collect();
  assert_eq!(seen, union);
  assert_eq!(total, union.len());
  assert_eq!(ids(&diff.deleted), vec!["b"]);
  assert_eq!(ids(&diff.updated), vec!["c"]);
  assert!(diff.created.iter().all(|s| s.is_local()));
}

#[test]
fn diff_is_idempotent_on_identical_inputs() {
  let baseline = vec![server("a", "A"), server("b", "B")];
  let first = diff_steps(&baseline, &baseline);
  let second = diff_steps(&baseline, &baseline);
  assert!(first.is_empty());
  assert_eq!(first, second);
}
