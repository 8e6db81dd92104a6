mod common;

use camwall::{
    deletion::{DeleteOutcome, DeletionWorkflow, FolderCleanup},
    error::Error,
    interaction::{Notice, Prompt},
    media::{Camera, Classification, StorageBackend},
    playback::PlaybackState,
};
use common::{
    Event, RecordingBackend, ScriptedUi, capture, clip_path, folder_path, index_of, session,
    visible_times,
};
use std::sync::Arc;

fn workflow(backend: &Arc<RecordingBackend>) -> DeletionWorkflow {
    let storage: Arc<dyn StorageBackend> = backend.clone();
    DeletionWorkflow::new(storage, "mp4")
}

#[tokio::test]
async fn declining_changes_nothing() {
    let backend = Arc::new(RecordingBackend::default());
    let mut session = session(&backend);
    session
        .populate(vec![
            capture(&backend, 100, Classification::Event, "a"),
            capture(&backend, 200, Classification::Event, "b"),
        ])
        .await
        .unwrap();
    backend.clear_events();

    let ui = ScriptedUi::answering([false]);
    let outcome = workflow(&backend)
        .delete_current(&mut session, &ui)
        .await
        .unwrap();

    assert!(matches!(outcome, DeleteOutcome::Declined));
    assert!(backend.events().is_empty());
    assert_eq!(session.catalog.current_time(), Some(200));
    assert_eq!(session.engine.loaded_time(), Some(200));
    assert_eq!(visible_times(&session), vec![200, 100]);
    assert!(matches!(
        ui.prompts.borrow().as_slice(),
        [Prompt::DeleteMediaSet { files, .. }] if files.len() == 4
    ));
}

#[tokio::test]
async fn files_are_removed_only_after_release() {
    let backend = Arc::new(RecordingBackend::default());
    let mut session = session(&backend);
    session
        .populate(vec![
            capture(&backend, 100, Classification::Event, "a"),
            capture(&backend, 200, Classification::Event, "b"),
            capture(&backend, 300, Classification::Event, "c"),
        ])
        .await
        .unwrap();
    session.select(200).await.unwrap();
    backend.clear_events();

    // confirm the media set, keep the emptied folder
    let ui = ScriptedUi::answering([true, false]);
    let outcome = workflow(&backend)
        .delete_current(&mut session, &ui)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        DeleteOutcome::MediaSetDeleted {
            time: 200,
            folder: FolderCleanup::Declined
        }
    ));

    let events = backend.events();
    let detach = index_of(&events, &Event::Detach(Camera::Front));
    let mut last_remove = 0;
    for camera in Camera::ALL {
        let path = clip_path("b", 200, camera);
        let release = index_of(&events, &Event::Release(path.clone()));
        let remove = index_of(&events, &Event::Remove(path.clone()));
        assert!(detach < release && release < remove, "{camera} out of order");
        assert!(remove > last_remove);
        last_remove = remove;
        assert!(!backend.has_file(&path));
    }

    assert_eq!(visible_times(&session), vec![300, 100]);
    assert_eq!(session.catalog.selected_index(), 1);
    assert_eq!(session.catalog.current_time(), Some(100));
    assert_eq!(session.engine.loaded_time(), Some(100));
    assert_eq!(backend.live(), 4);
    assert_eq!(
        ui.notices.borrow().first(),
        Some(&Notice::MediaSetDeleted {
            title: String::from("capture 200")
        })
    );
}

#[tokio::test]
async fn deleting_the_last_entry_clears_the_selection() {
    let backend = Arc::new(RecordingBackend::default());
    let mut session = session(&backend);
    session
        .populate(vec![capture(&backend, 100, Classification::Sentry, "a")])
        .await
        .unwrap();

    let ui = ScriptedUi::answering([true]);
    workflow(&backend)
        .delete_current(&mut session, &ui)
        .await
        .unwrap();

    assert!(session.catalog.current().is_none());
    assert_eq!(session.catalog.selected_index(), 0);
    assert_eq!(session.engine.state(), PlaybackState::Idle);
    assert_eq!(backend.live(), 0);
}

#[tokio::test]
async fn storage_failure_aborts_the_remaining_removals() {
    let backend = Arc::new(RecordingBackend::default());
    let mut session = session(&backend);
    session
        .populate(vec![capture(&backend, 100, Classification::Event, "a")])
        .await
        .unwrap();
    let stuck = clip_path("a", 100, Camera::Back);
    backend.fail_removal_of(stuck.clone());

    let ui = ScriptedUi::answering([true]);
    let err = workflow(&backend)
        .delete_current(&mut session, &ui)
        .await
        .unwrap_err();

    match err {
        Error::Storage(err) => assert_eq!(err.path, stuck),
        other => panic!("unexpected error {other}"),
    }
    assert!(!backend.has_file(&clip_path("a", 100, Camera::Front)));
    for camera in [Camera::Back, Camera::Left, Camera::Right] {
        assert!(backend.has_file(&clip_path("a", 100, camera)));
    }
    assert!(session.catalog.current().is_none());
    assert_eq!(backend.live(), 0);
    assert_eq!(ui.prompts.borrow().len(), 1);
}

#[tokio::test]
async fn folder_with_other_videos_is_kept() {
    let backend = Arc::new(RecordingBackend::default());
    let mut session = session(&backend);
    session
        .populate(vec![
            capture(&backend, 100, Classification::Dashcam, "recent"),
            capture(&backend, 200, Classification::Dashcam, "recent"),
        ])
        .await
        .unwrap();

    let ui = ScriptedUi::answering([true]);
    let outcome = workflow(&backend)
        .delete_current(&mut session, &ui)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        DeleteOutcome::MediaSetDeleted {
            folder: FolderCleanup::StillHasMedia,
            ..
        }
    ));
    assert_eq!(ui.prompts.borrow().len(), 1);
    assert_eq!(session.catalog.current_time(), Some(100));
}

#[tokio::test]
async fn emptied_folder_is_removed_on_confirmation() {
    let backend = Arc::new(RecordingBackend::default());
    let mut session = session(&backend);
    session
        .populate(vec![
            capture(&backend, 100, Classification::Event, "a"),
            capture(&backend, 200, Classification::Event, "b"),
        ])
        .await
        .unwrap();
    backend.add_file(folder_path("b").join("event.json"));

    let ui = ScriptedUi::answering([true, true]);
    let outcome = workflow(&backend)
        .delete_current(&mut session, &ui)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        DeleteOutcome::MediaSetDeleted {
            folder: FolderCleanup::Removed { purged: 0 },
            ..
        }
    ));
    assert!(matches!(
        &ui.prompts.borrow()[1],
        Prompt::DeleteEmptyFolder { remaining, .. } if remaining == &["event.json"]
    ));
    assert!(backend.events().contains(&Event::RemoveFolder(folder_path("b"))));
    assert!(!backend.has_file(&folder_path("b").join("event.json")));
    assert_eq!(session.catalog.current_time(), Some(100));
}

#[tokio::test]
async fn folder_deletion_needs_a_parent_before_asking() {
    let backend = Arc::new(RecordingBackend::default());
    let mut session = session(&backend);
    let mut orphan = capture(&backend, 100, Classification::Event, "a");
    orphan.parent_folder = None;
    session.populate(vec![orphan]).await.unwrap();
    backend.clear_events();

    let ui = ScriptedUi::answering([true]);
    let err = workflow(&backend)
        .delete_folder(&mut session, 100, &ui)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Precondition(ref missing) if missing.missing == "parent folder"));
    assert!(ui.prompts.borrow().is_empty());
    assert!(backend.events().is_empty());
    assert_eq!(session.catalog.current_time(), Some(100));
}

#[tokio::test]
async fn folder_deletion_purges_its_entries_and_selects_the_first() {
    let backend = Arc::new(RecordingBackend::default());
    let mut session = session(&backend);
    session
        .populate(vec![
            capture(&backend, 100, Classification::Sentry, "b"),
            capture(&backend, 200, Classification::Sentry, "a"),
            capture(&backend, 300, Classification::Sentry, "a"),
        ])
        .await
        .unwrap();
    assert_eq!(session.catalog.current_time(), Some(300));
    backend.clear_events();

    let ui = ScriptedUi::answering([true]);
    let outcome = workflow(&backend)
        .delete_folder(&mut session, 300, &ui)
        .await
        .unwrap();

    assert!(matches!(outcome, DeleteOutcome::FolderDeleted { purged: 2 }));
    let events = backend.events();
    let removed = index_of(&events, &Event::RemoveFolder(folder_path("a")));
    for camera in Camera::ALL {
        assert!(index_of(&events, &Event::Release(clip_path("a", 300, camera))) < removed);
    }
    assert_eq!(visible_times(&session), vec![100]);
    assert_eq!(session.catalog.current_time(), Some(100));
    assert_eq!(session.engine.loaded_time(), Some(100));
    assert_eq!(
        ui.notices.borrow().as_slice(),
        [Notice::FolderDeleted {
            folder: String::from("a"),
            purged: 2
        }]
    );
}
