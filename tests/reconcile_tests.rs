//! # Reconciliation Tests
//!
//! Drives the reconciler end to end against in-memory stores and listing
//! doubles: the success path, every failure path, idempotence across repeated
//! and racing invocations, and cancellation.

mod common;

use common::{
    id, picker, reconciled_picker, reconciler, CompletedThenFailingLister, FailingLister,
    HangingLister, InMemorySecrets, InMemoryStore, RecordingLister,
};
use file_picker_controller::controller::reconciler::{
    reconcile, reconcile_with_scope, CancelScope, CredentialError, Outcome, RandomSelector,
    ReconcilerError,
};
use file_picker_controller::crd::{Condition, FilePickerStatus, Phase};
use file_picker_controller::listing::FixedLister;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_selects_a_listed_file_and_records_completion() {
    let store = InMemoryStore::with([picker("wallpaper", "acct", "images")]);
    let lister = RecordingLister::new(&["a.png", "b.png"]);
    let reconciler = reconciler(store.clone(), InMemorySecrets::with_token("sig=abc"), lister.clone())
        .with_selector(Arc::new(RandomSelector));

    let outcome = reconcile(&reconciler, &id("wallpaper")).await.unwrap();

    let stored = store.fetch(&id("wallpaper")).unwrap();
    assert!(["a.png", "b.png"].contains(&stored.spec.file_name.as_str()));
    assert_eq!(
        outcome,
        Outcome::Selected {
            file_name: stored.spec.file_name.clone()
        }
    );
    assert_ne!(stored.reconciled_at(), 0);
    assert_eq!(store.updates(), 1);
    assert_eq!(lister.calls(), 1);

    let status = stored.status.unwrap();
    assert_eq!(status.phase, Some(Phase::Ready));
    assert_eq!(status.conditions[0].reason.as_deref(), Some("FileSelected"));
    assert_eq!(status.observed_generation, Some(1));
}

#[tokio::test]
async fn test_empty_listing_is_retryable_and_mutates_nothing() {
    let store = InMemoryStore::with([picker("wallpaper", "acct", "images")]);
    let reconciler = reconciler(
        store.clone(),
        InMemorySecrets::with_token("sig=abc"),
        Arc::new(FixedLister::new(Vec::<String>::new())),
    );

    let err = reconcile(&reconciler, &id("wallpaper")).await.unwrap_err();

    assert!(matches!(err, ReconcilerError::NoFilesAvailable { .. }));
    assert!(err.is_retryable());
    assert_eq!(store.updates(), 0);

    let stored = store.fetch(&id("wallpaper")).unwrap();
    assert!(stored.spec.file_name.is_empty());
    assert_eq!(stored.reconciled_at(), 0);
    let status = stored.status.unwrap();
    assert_eq!(status.phase, Some(Phase::Failed));
    assert_eq!(status.conditions[0].reason.as_deref(), Some("NoFilesAvailable"));
}

#[tokio::test]
async fn test_already_reconciled_resource_is_left_alone() {
    let store = InMemoryStore::with([reconciled_picker("wallpaper", "x.png", 1234)]);
    let secrets = InMemorySecrets::with_token("sig=abc");
    let lister = RecordingLister::new(&["a.png"]);
    let reconciler = reconciler(store.clone(), secrets.clone(), lister.clone());

    let outcome = reconcile(&reconciler, &id("wallpaper")).await.unwrap();

    assert_eq!(outcome, Outcome::AlreadyReconciled);
    assert_eq!(secrets.reads(), 0);
    assert_eq!(lister.calls(), 0);
    assert_eq!(store.updates(), 0);
    assert_eq!(store.status_patches(), 0);

    let stored = store.fetch(&id("wallpaper")).unwrap();
    assert_eq!(stored.spec.file_name, "x.png");
    assert_eq!(stored.reconciled_at(), 1234);
}

#[tokio::test]
async fn test_empty_account_fails_validation_before_any_io() {
    let store = InMemoryStore::with([picker("wallpaper", "", "images")]);
    let secrets = InMemorySecrets::with_token("sig=abc");
    let lister = RecordingLister::new(&["a.png"]);
    let reconciler = reconciler(store.clone(), secrets.clone(), lister.clone());

    let err = reconcile(&reconciler, &id("wallpaper")).await.unwrap_err();

    assert!(matches!(err, ReconcilerError::Validation { field: "account" }));
    assert!(!err.is_retryable());
    assert_eq!(secrets.reads(), 0);
    assert_eq!(lister.calls(), 0);
    assert_eq!(store.updates(), 0);

    let status = store.fetch(&id("wallpaper")).unwrap().status.unwrap();
    assert_eq!(status.conditions[0].reason.as_deref(), Some("ValidationFailed"));
}

#[tokio::test]
async fn test_empty_container_fails_validation() {
    let store = InMemoryStore::with([picker("wallpaper", "acct", "")]);
    let reconciler = reconciler(
        store.clone(),
        InMemorySecrets::with_token("sig=abc"),
        RecordingLister::new(&["a.png"]),
    );

    let err = reconcile(&reconciler, &id("wallpaper")).await.unwrap_err();
    assert!(matches!(err, ReconcilerError::Validation { field: "container" }));
}

#[tokio::test]
async fn test_missing_secret_prevents_listing() {
    let store = InMemoryStore::with([picker("wallpaper", "acct", "images")]);
    let lister = RecordingLister::new(&["a.png"]);
    let reconciler = reconciler(store.clone(), InMemorySecrets::empty(), lister.clone());

    let err = reconcile(&reconciler, &id("wallpaper")).await.unwrap_err();

    assert!(matches!(
        err,
        ReconcilerError::CredentialNotFound(CredentialError::SecretNotFound { .. })
    ));
    assert!(err.is_retryable());
    assert_eq!(lister.calls(), 0);
    assert_eq!(store.updates(), 0);
}

#[tokio::test]
async fn test_missing_token_key_is_a_credential_error() {
    let store = InMemoryStore::with([picker("wallpaper", "acct", "images")]);
    let secrets = InMemorySecrets::empty();
    secrets.put("default", "sas-token", "other", b"sig=abc");
    let reconciler = reconciler(store.clone(), secrets, RecordingLister::new(&["a.png"]));

    let err = reconcile(&reconciler, &id("wallpaper")).await.unwrap_err();

    assert!(matches!(
        err,
        ReconcilerError::CredentialNotFound(CredentialError::KeyMissing { .. })
    ));
    assert_eq!(err.reason(), "CredentialNotFound");
}

#[tokio::test]
async fn test_secret_in_other_namespace_is_not_used() {
    let store = InMemoryStore::with([picker("wallpaper", "acct", "images")]);
    let secrets = InMemorySecrets::empty();
    secrets.put("kube-system", "sas-token", "token", b"sig=abc");
    let reconciler = reconciler(store.clone(), secrets, RecordingLister::new(&["a.png"]));

    let err = reconcile(&reconciler, &id("wallpaper")).await.unwrap_err();
    assert_eq!(err.reason(), "CredentialNotFound");
}

#[tokio::test]
async fn test_token_trailing_newline_is_stripped() {
    let store = InMemoryStore::with([picker("wallpaper", "acct", "images")]);
    let lister = RecordingLister::new(&["a.png"]);
    let reconciler = reconciler(store, InMemorySecrets::with_token("abc\n"), lister.clone());

    reconcile(&reconciler, &id("wallpaper")).await.unwrap();

    assert_eq!(lister.credentials(), vec!["abc".to_string()]);
}

#[tokio::test]
async fn test_listing_failure_is_retryable_and_reported() {
    let store = InMemoryStore::with([picker("wallpaper", "acct", "images")]);
    let lister = Arc::new(FailingLister::default());
    let reconciler = reconciler(store.clone(), InMemorySecrets::with_token("sig=abc"), lister.clone());

    let err = reconcile(&reconciler, &id("wallpaper")).await.unwrap_err();

    assert!(matches!(err, ReconcilerError::Listing(_)));
    assert!(err.is_retryable());
    assert_eq!(lister.calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.updates(), 0);

    let status = store.fetch(&id("wallpaper")).unwrap().status.unwrap();
    assert_eq!(status.phase, Some(Phase::Failed));
    assert_eq!(status.conditions[0].reason.as_deref(), Some("ListingFailed"));
    assert!(status.message.unwrap().contains("503"));
}

#[tokio::test]
async fn test_repeated_identical_failure_patches_status_once() {
    let store = InMemoryStore::with([picker("wallpaper", "acct", "images")]);
    let reconciler = reconciler(
        store.clone(),
        InMemorySecrets::with_token("sig=abc"),
        Arc::new(FixedLister::new(Vec::<String>::new())),
    );

    reconcile(&reconciler, &id("wallpaper")).await.unwrap_err();
    reconcile(&reconciler, &id("wallpaper")).await.unwrap_err();

    assert_eq!(store.status_patches(), 1);
}

#[tokio::test]
async fn test_failure_after_concurrent_completion_keeps_ready_status() {
    let store = InMemoryStore::with([picker("wallpaper", "acct", "images")]);
    let mut winner = reconciled_picker("wallpaper", "winner.png", 99);
    winner.status = Some(FilePickerStatus {
        reconciled_at: 99,
        phase: Some(Phase::Ready),
        conditions: vec![Condition::ready(true, "FileSelected", None)],
        ..Default::default()
    });
    let lister = CompletedThenFailingLister::new(store.clone(), winner);
    let reconciler = reconciler(store.clone(), InMemorySecrets::with_token("sig=abc"), lister);

    let err = reconcile(&reconciler, &id("wallpaper")).await.unwrap_err();

    assert!(matches!(err, ReconcilerError::Listing(_)));
    assert_eq!(store.status_patches(), 0);
    assert_eq!(store.updates(), 0);

    let stored = store.fetch(&id("wallpaper")).unwrap();
    assert_eq!(stored.spec.file_name, "winner.png");
    assert_eq!(stored.reconciled_at(), 99);
    let status = stored.status.unwrap();
    assert_eq!(status.phase, Some(Phase::Ready));
    assert_eq!(status.conditions[0].reason.as_deref(), Some("FileSelected"));
}

#[tokio::test]
async fn test_preset_file_with_empty_account_fails_validation() {
    let mut resource = picker("wallpaper", "", "images");
    resource.spec.file_name = "b.png".to_string();
    let store = InMemoryStore::with([resource]);
    let reconciler = reconciler(
        store.clone(),
        InMemorySecrets::with_token("sig=abc"),
        RecordingLister::new(&["a.png"]),
    );

    let err = reconcile(&reconciler, &id("wallpaper")).await.unwrap_err();

    assert!(matches!(err, ReconcilerError::Validation { field: "account" }));
    let stored = store.fetch(&id("wallpaper")).unwrap();
    assert_eq!(stored.reconciled_at(), 0);
    assert_eq!(stored.spec.file_name, "b.png");
}

#[tokio::test]
async fn test_missing_resource_is_a_noop() {
    let store = InMemoryStore::with(Vec::new());
    let lister = RecordingLister::new(&["a.png"]);
    let reconciler = reconciler(store.clone(), InMemorySecrets::with_token("sig=abc"), lister.clone());

    let outcome = reconcile(&reconciler, &id("gone")).await.unwrap();

    assert_eq!(outcome, Outcome::NotFound);
    assert_eq!(lister.calls(), 0);
    assert_eq!(store.updates(), 0);
}

#[tokio::test]
async fn test_second_reconciliation_is_a_noop() {
    let store = InMemoryStore::with([picker("wallpaper", "acct", "images")]);
    let lister = RecordingLister::new(&["a.png", "b.png"]);
    let reconciler = reconciler(store.clone(), InMemorySecrets::with_token("sig=abc"), lister.clone())
        .with_selector(Arc::new(RandomSelector));

    reconcile(&reconciler, &id("wallpaper")).await.unwrap();
    let first = store.fetch(&id("wallpaper")).unwrap();

    let outcome = reconcile(&reconciler, &id("wallpaper")).await.unwrap();
    let second = store.fetch(&id("wallpaper")).unwrap();

    assert_eq!(outcome, Outcome::AlreadyReconciled);
    assert_eq!(first.spec.file_name, second.spec.file_name);
    assert_eq!(first.reconciled_at(), second.reconciled_at());
    assert_eq!(store.updates(), 1);
    assert_eq!(lister.calls(), 1);
}

#[tokio::test]
async fn test_lost_status_write_is_adopted_without_relisting() {
    let mut resource = picker("wallpaper", "acct", "images");
    resource.spec.file_name = "b.png".to_string();
    let store = InMemoryStore::with([resource]);
    let lister = RecordingLister::new(&["a.png"]);
    let reconciler = reconciler(store.clone(), InMemorySecrets::with_token("sig=abc"), lister.clone());

    let outcome = reconcile(&reconciler, &id("wallpaper")).await.unwrap();

    assert_eq!(
        outcome,
        Outcome::Adopted {
            file_name: "b.png".to_string()
        }
    );
    assert_eq!(lister.calls(), 0);
    assert_eq!(store.updates(), 0);

    let stored = store.fetch(&id("wallpaper")).unwrap();
    assert_eq!(stored.spec.file_name, "b.png");
    assert_ne!(stored.reconciled_at(), 0);
}

#[tokio::test]
async fn test_conflicting_writer_wins_and_retry_stops_at_gate() {
    let store = InMemoryStore::with([picker("wallpaper", "acct", "images")]);
    store.race_next_update_with("z.png");
    let lister = RecordingLister::new(&["a.png"]);
    let reconciler = reconciler(store.clone(), InMemorySecrets::with_token("sig=abc"), lister.clone());

    let err = reconcile(&reconciler, &id("wallpaper")).await.unwrap_err();
    assert!(matches!(err, ReconcilerError::Conflict { .. }));
    assert!(err.is_retryable());
    assert_eq!(store.fetch(&id("wallpaper")).unwrap().spec.file_name, "z.png");

    let outcome = reconcile(&reconciler, &id("wallpaper")).await.unwrap();
    assert_eq!(outcome, Outcome::AlreadyReconciled);
    assert_eq!(store.fetch(&id("wallpaper")).unwrap().spec.file_name, "z.png");
    assert_eq!(store.updates(), 0);
    assert_eq!(lister.calls(), 1);
}

#[tokio::test]
async fn test_racing_reconciliations_persist_exactly_one_choice() {
    let store = InMemoryStore::with([picker("wallpaper", "acct", "images")]);
    let lister = RecordingLister::new(&["a.png", "b.png"]);
    let reconciler = reconciler(store.clone(), InMemorySecrets::with_token("sig=abc"), lister)
        .with_selector(Arc::new(RandomSelector));

    let rid = id("wallpaper");
    let (first, second) = tokio::join!(reconcile(&reconciler, &rid), reconcile(&reconciler, &rid));

    assert_eq!(store.updates(), 1);
    let selected = [&first, &second]
        .iter()
        .filter(|r| matches!(r, Ok(Outcome::Selected { .. })))
        .count();
    assert_eq!(selected, 1);
    for result in [&first, &second] {
        assert!(matches!(
            result,
            Ok(Outcome::Selected { .. } | Outcome::AlreadyReconciled)
                | Err(ReconcilerError::Conflict { .. })
        ));
    }

    let stored = store.fetch(&id("wallpaper")).unwrap();
    assert!(["a.png", "b.png"].contains(&stored.spec.file_name.as_str()));
    assert_ne!(stored.reconciled_at(), 0);
}

#[tokio::test]
async fn test_shutdown_aborts_before_any_call() {
    let store = InMemoryStore::with([picker("wallpaper", "acct", "images")]);
    let lister = RecordingLister::new(&["a.png"]);
    let reconciler = reconciler(store.clone(), InMemorySecrets::with_token("sig=abc"), lister.clone());

    let token = CancellationToken::new();
    token.cancel();
    let scope = CancelScope::new(token, Duration::from_secs(30));

    let err = reconcile_with_scope(&reconciler, &id("wallpaper"), &scope)
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcilerError::Cancelled(_)));
    assert!(err.is_retryable());
    assert_eq!(store.gets(), 0);
    assert_eq!(lister.calls(), 0);
    assert_eq!(store.updates(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_abandons_hanging_listing() {
    let store = InMemoryStore::with([picker("wallpaper", "acct", "images")]);
    let lister = Arc::new(HangingLister::default());
    let reconciler = reconciler(store.clone(), InMemorySecrets::with_token("sig=abc"), lister.clone());
    let scope = CancelScope::new(CancellationToken::new(), Duration::from_secs(1));

    let err = reconcile_with_scope(&reconciler, &id("wallpaper"), &scope)
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcilerError::Cancelled("deadline exceeded")));
    assert!(lister.started.load(Ordering::SeqCst));
    assert_eq!(store.updates(), 0);
    assert_eq!(store.status_patches(), 0);
    assert!(store.fetch(&id("wallpaper")).unwrap().spec.file_name.is_empty());
}

#[tokio::test]
async fn test_shutdown_token_of_reconciler_is_honored() {
    let store = InMemoryStore::with([picker("wallpaper", "acct", "images")]);
    let lister = Arc::new(HangingLister::default());
    let shutdown = CancellationToken::new();
    let reconciler = reconciler(store.clone(), InMemorySecrets::with_token("sig=abc"), lister.clone())
        .with_shutdown(shutdown.clone());

    let cancel = async {
        while !lister.started.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        shutdown.cancel();
    };
    let rid = id("wallpaper");
    let (result, ()) = tokio::join!(reconcile(&reconciler, &rid), cancel);

    assert!(matches!(
        result,
        Err(ReconcilerError::Cancelled("shutdown requested"))
    ));
    assert_eq!(store.updates(), 0);
    assert_eq!(store.status_patches(), 0);
}
