//! Integration tests for the list and detail view-models.

#[path = "../support/mod.rs"]
mod support;

use std::time::Duration;

use tareas::{
    CollegeTask, DetailViewModel, DocumentStore, Draft, Exam, ExamDraft, ListUiState,
    ListViewModel, Purchase, Record, StoreError, StoreOp,
};
use tokio::sync::watch;

use support::{exam_draft, exam_fields, fixture, purchase_draft};

async fn wait_until<S, F>(receiver: &mut watch::Receiver<S>, predicate: F) -> S
where
    S: Clone,
    F: FnMut(&S) -> bool,
{
    let state = tokio::time::timeout(Duration::from_secs(2), receiver.wait_for(predicate))
        .await
        .expect("state did not converge in time")
        .expect("view-model dropped");
    S::clone(&state)
}

fn record_count<R>(state: &ListUiState<R>) -> Option<usize> {
    state.records.data().map(Vec::len)
}

// ----------------------------------------------------------------------------
// List screens
// ----------------------------------------------------------------------------

#[tokio::test]
async fn signed_out_list_is_an_auth_error_without_subscription() {
    let f = fixture(None);
    let mut list = ListViewModel::<Exam>::new(f.repo.clone());
    assert!(!list.has_user());
    list.load();

    let state = list.state();
    assert_eq!(
        state.records.error_message().as_deref(),
        Some("not authenticated")
    );
    assert!(!list.is_subscribed());
    assert_eq!(f.store.active_listeners(), 0);
}

#[tokio::test]
async fn empty_list_becomes_success_not_loading() {
    let f = fixture(Some("u1"));
    let mut list = ListViewModel::<Exam>::new(f.repo.clone());
    assert!(list.state().records.is_loading());

    list.load();
    let mut watcher = list.watch();
    let state = wait_until(&mut watcher, |s| !s.records.is_loading()).await;

    assert!(state.records.is_success());
    assert_eq!(record_count(&state), Some(0));
}

#[tokio::test]
async fn list_follows_store_changes() {
    let f = fixture(Some("u1"));
    let mut list = ListViewModel::<Purchase>::new(f.repo.clone());
    list.load();
    let mut watcher = list.watch();
    wait_until(&mut watcher, |s| record_count(s) == Some(0)).await;

    let purchases = f.repo.collection::<Purchase>();
    assert!(purchases.add_record("u1", purchase_draft("pan")).await);
    assert!(purchases.add_record("u2", purchase_draft("sal")).await);
    assert!(purchases.add_record("u1", purchase_draft("leche")).await);

    let state = wait_until(&mut watcher, |s| record_count(s) == Some(2)).await;
    let products: Vec<&str> = state
        .records
        .data()
        .unwrap()
        .iter()
        .map(|p| p.producto.as_str())
        .collect();
    assert_eq!(products, vec!["leche", "pan"]);
}

#[tokio::test]
async fn error_state_recovers_on_next_snapshot() {
    let f = fixture(Some("u1"));
    let mut list = ListViewModel::<Exam>::new(f.repo.clone());
    list.load();
    let mut watcher = list.watch();
    wait_until(&mut watcher, |s| s.records.is_success()).await;

    f.store
        .push_fault("examenes", StoreError::Unavailable("network".into()));
    let state = wait_until(&mut watcher, |s| s.records.is_error()).await;
    assert!(state
        .records
        .error_message()
        .unwrap()
        .contains("store unavailable: network"));

    let exams = f.repo.collection::<Exam>();
    assert!(exams.add_record("u1", exam_draft("Math")).await);
    let state = wait_until(&mut watcher, |s| record_count(s) == Some(1)).await;
    assert!(state.records.is_success());
}

#[tokio::test]
async fn first_snapshot_fault_then_success() {
    let f = fixture(Some("u1"));
    f.store
        .fail_next(StoreOp::Snapshot, StoreError::Unavailable("boot".into()));

    let mut list = ListViewModel::<Exam>::new(f.repo.clone());
    list.load();
    let mut watcher = list.watch();
    let state = wait_until(&mut watcher, |s| s.records.is_error()).await;
    assert!(state.records.error_message().unwrap().contains("boot"));

    let exams = f.repo.collection::<Exam>();
    assert!(exams.add_record("u1", exam_draft("Math")).await);
    let state = wait_until(&mut watcher, |s| record_count(s) == Some(1)).await;
    assert!(state.records.is_success());
}

#[tokio::test]
async fn setup_fault_is_shown_as_error() {
    let f = fixture(Some("u1"));
    f.store
        .fail_next(StoreOp::Listen, StoreError::PermissionDenied("rules".into()));

    let mut list = ListViewModel::<CollegeTask>::new(f.repo.clone());
    list.load();
    let mut watcher = list.watch();
    let state = wait_until(&mut watcher, |s| s.records.is_error()).await;
    assert!(state
        .records
        .error_message()
        .unwrap()
        .contains("permission denied"));
}

#[tokio::test]
async fn reload_keeps_a_single_subscription() {
    let f = fixture(Some("u1"));
    let mut list = ListViewModel::<Exam>::new(f.repo.clone());
    list.load();
    list.load();
    list.load();

    assert_eq!(f.store.active_listeners(), 1);
    assert_eq!(f.store.listener_removals(), 2);
}

#[tokio::test]
async fn teardown_releases_listener_once_and_freezes_state() {
    let f = fixture(Some("u1"));
    let mut list = ListViewModel::<Exam>::new(f.repo.clone());
    list.load();
    let mut watcher = list.watch();
    wait_until(&mut watcher, |s| s.records.is_success()).await;

    list.teardown();
    list.teardown();
    assert_eq!(f.store.active_listeners(), 0);
    assert_eq!(f.store.listener_removals(), 1);
    assert!(!list.is_subscribed());

    let exams = f.repo.collection::<Exam>();
    assert!(exams.add_record("u1", exam_draft("Math")).await);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(record_count(&list.state()), Some(0));

    drop(list);
    assert_eq!(f.store.listener_removals(), 1);
}

#[tokio::test]
async fn dropping_the_view_model_releases_listener() {
    let f = fixture(Some("u1"));
    let mut list = ListViewModel::<Exam>::new(f.repo.clone());
    list.load();
    drop(list);

    assert_eq!(f.store.active_listeners(), 0);
    assert_eq!(f.store.listener_removals(), 1);
}

#[tokio::test]
async fn delete_sets_one_shot_status() {
    let f = fixture(Some("u1"));
    let exams = f.repo.collection::<Exam>();
    assert!(exams.add_record("u1", exam_draft("Math")).await);

    let mut list = ListViewModel::<Exam>::new(f.repo.clone());
    list.load();
    let mut watcher = list.watch();
    let state = wait_until(&mut watcher, |s| record_count(s) == Some(1)).await;
    let id = state.records.data().unwrap()[0].document_id().to_string();

    list.delete(&id).await.unwrap();
    let state = wait_until(&mut watcher, |s| record_count(s) == Some(0)).await;
    assert!(state.deleted_status);

    list.reset_deleted_status();
    assert!(!list.state().deleted_status);
}

#[tokio::test]
async fn failed_delete_reports_false() {
    let f = fixture(Some("u1"));
    f.store
        .fail_next(StoreOp::Delete, StoreError::Unavailable("offline".into()));

    let list = ListViewModel::<Exam>::new(f.repo.clone());
    list.delete("e1").await.unwrap();
    assert!(!list.state().deleted_status);
}

#[tokio::test]
async fn sign_out_does_not_cancel_the_live_list() {
    let f = fixture(Some("u1"));
    let mut list = ListViewModel::<Exam>::new(f.repo.clone());
    list.load();

    list.sign_out();
    assert!(!list.has_user());
    assert!(list.is_subscribed());
    assert_eq!(f.store.active_listeners(), 1);

    list.teardown();
    assert_eq!(f.store.active_listeners(), 0);
}

// ----------------------------------------------------------------------------
// Detail screens
// ----------------------------------------------------------------------------

#[tokio::test]
async fn empty_id_opens_a_blank_form() {
    let f = fixture(Some("u1"));
    let detail = DetailViewModel::<Exam>::new(f.repo.clone());
    detail.edit(|draft| draft.materia = "leftover".into());

    assert!(detail.open("").is_none());
    let state = detail.state();
    assert_eq!(state.draft, ExamDraft::default());
    assert!(state.record_id.is_empty());
    assert!(state.selected.is_none());
}

#[tokio::test]
async fn open_fills_the_form_from_the_record() {
    let f = fixture(Some("u1"));
    f.store
        .set("examenes", "e1", exam_fields("u1", "e1", "Math", "2024-01-01"))
        .await
        .unwrap();

    let detail = DetailViewModel::<Exam>::new(f.repo.clone());
    detail.open("e1").unwrap().await.unwrap();

    let state = detail.state();
    assert_eq!(state.record_id, "e1");
    assert_eq!(state.draft.materia, "Math");
    assert_eq!(state.draft.fecha, "2024-01-01");
    assert_eq!(state.selected.unwrap().document_id, "e1");
}

#[tokio::test]
async fn missing_record_leaves_form_blank() {
    let f = fixture(Some("u1"));
    let detail = DetailViewModel::<Exam>::new(f.repo.clone());
    detail.open("ghost").unwrap().await.unwrap();

    let state = detail.state();
    assert_eq!(state.record_id, "ghost");
    assert!(state.selected.is_none());
    assert_eq!(state.draft, ExamDraft::default());
}

#[tokio::test]
async fn incomplete_form_never_reaches_the_store() {
    let f = fixture(Some("u1"));
    let detail = DetailViewModel::<Exam>::new(f.repo.clone());
    detail.edit(|draft| {
        *draft = exam_draft("Math");
        draft.hora = " ".into();
    });

    assert!(!detail.can_submit());
    assert!(detail.submit().is_none());
    assert_eq!(f.store.count("examenes"), 0);
    assert!(!detail.state().added_status);
}

#[tokio::test]
async fn submit_in_create_mode_adds_for_current_user() {
    let f = fixture(Some("u1"));
    let detail = DetailViewModel::<Exam>::new(f.repo.clone());
    detail.open("");
    detail.edit(|draft| *draft = exam_draft("Math"));
    assert!(detail.can_submit());

    detail.submit().unwrap().await.unwrap();
    assert!(detail.state().added_status);

    let mut subscription = f.repo.collection::<Exam>().subscribe_user_records("u1");
    let exams = subscription.try_next().unwrap().data().cloned().unwrap();
    assert_eq!(exams.len(), 1);
    assert_eq!(exams[0].owner_id, "u1");
    assert_eq!(exams[0].materia, "Math");

    detail.reset_added_status();
    assert!(!detail.state().added_status);
}

#[tokio::test]
async fn submit_in_create_mode_requires_a_user() {
    let f = fixture(None);
    let detail = DetailViewModel::<Purchase>::new(f.repo.clone());
    detail.edit(|draft| *draft = purchase_draft("pan"));

    assert!(detail.can_submit());
    assert!(detail.submit().is_none());
    assert_eq!(f.store.count("compras"), 0);
}

#[tokio::test]
async fn submit_in_edit_mode_updates_the_record() {
    let f = fixture(Some("u1"));
    let exams = f.repo.collection::<Exam>();
    assert!(exams.add_record("u1", exam_draft("Math")).await);
    let mut subscription = exams.subscribe_user_records("u1");
    let original = subscription.try_next().unwrap().data().unwrap()[0].clone();

    let detail = DetailViewModel::<Exam>::new(f.repo.clone());
    detail.open(original.document_id()).unwrap().await.unwrap();
    detail.edit(|draft| draft.fecha = "2024-02-02".into());
    detail.submit().unwrap().await.unwrap();

    let state = detail.state();
    assert!(state.updated_status);
    assert!(!state.added_status);

    let updated = exams
        .get_record_by_id(original.document_id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.fecha, "2024-02-02");
    assert_eq!(updated.materia, original.materia);
    assert_eq!(updated.owner_id, original.owner_id);
    assert_eq!(updated.timestamp, original.timestamp);
    assert_eq!(f.store.count("examenes"), 1);

    detail.reset_updated_status();
    assert!(!detail.state().updated_status);
}

#[tokio::test]
async fn failed_update_reports_false() {
    let f = fixture(Some("u1"));
    let detail = DetailViewModel::<Exam>::new(f.repo.clone());
    detail.open("ghost").unwrap().await.unwrap();
    detail.edit(|draft| *draft = exam_draft("Math"));

    detail.submit().unwrap().await.unwrap();
    assert!(!detail.state().updated_status);
}

#[tokio::test]
async fn completion_after_view_model_is_gone_is_discarded() {
    let f = fixture(Some("u1"));
    let detail = DetailViewModel::<Exam>::new(f.repo.clone());
    detail.edit(|draft| *draft = exam_draft("Math"));

    let pending = detail.submit().unwrap();
    drop(detail);

    pending.await.unwrap();
    assert_eq!(f.store.count("examenes"), 1);
}

#[tokio::test]
async fn reset_state_returns_to_create_mode() {
    let f = fixture(Some("u1"));
    let detail = DetailViewModel::<Exam>::new(f.repo.clone());
    detail.open("e1").unwrap().await.unwrap();
    detail.edit(|draft| *draft = exam_draft("Math"));

    detail.reset_state();
    let state = detail.state();
    assert!(state.record_id.is_empty());
    assert!(!state.draft.is_complete());
    assert!(state.selected.is_none());
}
