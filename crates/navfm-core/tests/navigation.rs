use std::fs;
use std::sync::Arc;

use navfm_core::host::{DirChild, MemoryFailure, MemoryHost, RootStyle};
use navfm_core::nav::filter::{SortDirection, SortField};
use navfm_core::{
    Command, CoreError, DirectoryEntry, Event, LoadOutcome, NativeHost, Navigator, ViewPreferences,
};
use tempfile::TempDir;

fn names(entries: &[DirectoryEntry]) -> Vec<String> {
    entries.iter().map(|e| e.name().to_string()).collect()
}

fn memory_tree() -> Arc<MemoryHost> {
    let host = MemoryHost::new(RootStyle::DriveLetters);
    host.insert_dir("c:\\", vec![DirChild::dir("Users"), DirChild::dir("Temp")]);
    host.insert_dir("C:\\Users", vec![DirChild::dir("me")]);
    host.insert_dir("C:\\Users\\me", vec![DirChild::file("notes.txt")]);
    host.insert_file("C:\\Users\\me\\notes.txt", "hello");
    host.insert_dir("C:\\Temp", Vec::new());
    Arc::new(host)
}

#[tokio::test]
async fn lists_a_real_directory_in_base_order() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("zeta")).unwrap();
    fs::create_dir(tmp.path().join("Alpha")).unwrap();
    fs::write(tmp.path().join("b.txt"), "bb").unwrap();
    fs::write(tmp.path().join("A.txt"), "a").unwrap();

    let nav = Navigator::new(Arc::new(NativeHost::new()), ViewPreferences::default());
    let outcome = nav
        .navigate(&tmp.path().to_string_lossy(), true)
        .await
        .unwrap();
    assert_eq!(outcome, LoadOutcome::Applied);

    let state = nav.snapshot();
    assert_eq!(names(state.entries()), vec!["Alpha", "zeta", "A.txt", "b.txt"]);
    let b = &state.entries()[3];
    assert_eq!(b.size(), Some(2));
    assert!(b.modified().is_some());
    assert_eq!(state.entries()[0].size(), None);
}

#[tokio::test]
async fn missing_directory_keeps_previous_location() {
    let tmp = TempDir::new().unwrap();
    let nav = Navigator::new(Arc::new(NativeHost::new()), ViewPreferences::default());
    nav.navigate(&tmp.path().to_string_lossy(), true).await.unwrap();

    let gone = tmp.path().join("does-not-exist");
    let outcome = nav.navigate(&gone.to_string_lossy(), true).await.unwrap();
    assert!(matches!(outcome, LoadOutcome::Failed(_)));
    assert!(nav.current_path().unwrap().same_location(&tmp.path().to_string_lossy()));
    assert!(!nav.snapshot().history().can_go_back());
}

#[tokio::test]
async fn file_target_is_not_a_directory() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("plain.txt");
    fs::write(&file, "x").unwrap();

    let nav = Navigator::new(Arc::new(NativeHost::new()), ViewPreferences::default());
    match nav.navigate(&file.to_string_lossy(), true).await.unwrap() {
        LoadOutcome::Failed(failure) => {
            assert_eq!(failure.kind, navfm_core::FailureKind::NotADirectory)
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(nav.current_path().is_none());
}

#[tokio::test]
async fn rename_on_disk_then_refresh() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("draft.txt"), "x").unwrap();
    fs::write(tmp.path().join("taken.txt"), "y").unwrap();

    let nav = Navigator::new(Arc::new(NativeHost::new()), ViewPreferences::default());
    nav.navigate(&tmp.path().to_string_lossy(), true).await.unwrap();

    let renamed = nav
        .rename(&tmp.path().join("draft.txt"), "final.txt")
        .await
        .unwrap();
    assert_eq!(renamed, Some(tmp.path().join("final.txt")));
    assert_eq!(names(nav.snapshot().entries()), vec!["final.txt", "taken.txt"]);

    let err = nav
        .rename(&tmp.path().join("final.txt"), "taken.txt")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::AlreadyExists(_)));

    let err = nav
        .rename(&tmp.path().join("final.txt"), "what?.txt")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidName(_)));
    assert!(tmp.path().join("final.txt").exists());
}

#[tokio::test]
async fn browsing_session_over_drive_paths() {
    let host = memory_tree();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let nav = Navigator::new(host.clone(), ViewPreferences::default()).with_events(tx);

    nav.execute(Command::Navigate("c:".into())).await.unwrap();
    assert_eq!(nav.current_path().unwrap().as_str(), "c:\\");
    nav.execute(Command::Navigate("C:/Users/me".into())).await.unwrap();
    assert_eq!(nav.execute(Command::GoUp).await.unwrap(), LoadOutcome::Applied);
    assert_eq!(nav.current_path().unwrap().as_str(), "C:\\Users");

    let state = nav.snapshot();
    let back: Vec<&str> = state.history().back_stack().iter().map(|p| p.as_str()).collect();
    assert_eq!(back, vec!["c:\\", "C:\\Users\\me"]);

    nav.execute(Command::GoBack).await.unwrap();
    nav.execute(Command::GoBack).await.unwrap();
    assert_eq!(nav.current_path().unwrap().as_str(), "c:\\");
    assert_eq!(nav.execute(Command::GoBack).await.unwrap(), LoadOutcome::Noop);
    assert_eq!(names(&nav.visible_entries()), vec!["Temp", "Users"]);

    nav.execute(Command::SetSort(SortField::Name, SortDirection::Descending))
        .await
        .unwrap();
    assert_eq!(names(&nav.visible_entries()), vec!["Users", "Temp"]);

    nav.execute(Command::Navigate("C:\\Temp".into())).await.unwrap();
    assert!(!nav.snapshot().history().can_go_forward());

    let mut loaded = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let Event::DirectoryLoaded { path, .. } = event {
            loaded.push(path.as_str().to_string());
        }
    }
    assert_eq!(loaded.first().map(String::as_str), Some("c:\\"));
    assert_eq!(loaded.last().map(String::as_str), Some("C:\\Temp"));
}

#[tokio::test]
async fn stale_listing_is_discarded_whatever_the_completion_order() {
    let host = memory_tree();
    let slow = host.gate_listing("C:\\Users");
    let nav = Navigator::new(host.clone(), ViewPreferences::default());

    let (first, second) = tokio::join!(nav.navigate("C:\\Users", true), async {
        let outcome = nav.navigate("C:\\Temp", true).await;
        drop(slow);
        outcome
    });

    assert_eq!(first.unwrap(), LoadOutcome::Superseded);
    assert_eq!(second.unwrap(), LoadOutcome::Applied);
    let state = nav.snapshot();
    assert_eq!(state.current_path().unwrap().as_str(), "C:\\Temp");
    assert!(state.entries().is_empty());
    assert!(!state.is_loading());
    assert_eq!(host.listing_calls(), vec!["C:\\Users", "C:\\Temp"]);
}

#[tokio::test]
async fn relative_input_is_rejected_without_side_effects() {
    let nav = Navigator::new(memory_tree(), ViewPreferences::default());
    let err = nav
        .execute(Command::Navigate("Users\\me".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Resolution(_)));
    assert_eq!(nav.snapshot().request_sequence(), 0);
    assert_eq!(nav.current_path(), None);
}

fn lettered_tree() -> Arc<MemoryHost> {
    let host = MemoryHost::default();
    host.insert_dir("/", vec![DirChild::dir("a"), DirChild::dir("b"), DirChild::dir("c")]);
    for name in ["a", "b", "c"] {
        let file = format!("{name}.txt");
        host.insert_dir(&format!("/{name}"), vec![DirChild::file(file.as_str())]);
        host.insert_file(&format!("/{name}/{file}"), name);
    }
    Arc::new(host)
}

const RELEASE_ORDERS: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

#[tokio::test]
async fn last_issued_navigation_wins_in_every_completion_order() {
    let targets = ["/a", "/b", "/c"];
    for order in RELEASE_ORDERS {
        let host = lettered_tree();
        let mut gates: Vec<_> = targets.iter().map(|t| Some(host.gate_listing(t))).collect();
        let nav = Navigator::new(host.clone(), ViewPreferences::default());

        let (a, b, c, ()) = tokio::join!(
            nav.navigate(targets[0], true),
            nav.navigate(targets[1], true),
            nav.navigate(targets[2], true),
            async {
                assert_eq!(host.listing_calls(), vec!["/a", "/b", "/c"]);
                for index in order {
                    if let Some(gate) = gates[index].take() {
                        gate.send(()).unwrap();
                    }
                    tokio::task::yield_now().await;
                }
            }
        );

        assert_eq!(a.unwrap(), LoadOutcome::Superseded, "order {order:?}");
        assert_eq!(b.unwrap(), LoadOutcome::Superseded, "order {order:?}");
        assert_eq!(c.unwrap(), LoadOutcome::Applied, "order {order:?}");

        let state = nav.snapshot();
        assert_eq!(state.current_path().unwrap().as_str(), "/c", "order {order:?}");
        assert_eq!(names(state.entries()), vec!["c.txt"], "order {order:?}");
        assert!(!state.is_loading(), "order {order:?}");
        assert!(state.error().is_none(), "order {order:?}");
        let back: Vec<&str> = state.history().back_stack().iter().map(|p| p.as_str()).collect();
        assert_eq!(back, vec!["/a", "/b"], "order {order:?}");
    }
}

#[tokio::test]
async fn superseded_failure_does_not_set_error() {
    for fail_first in [true, false] {
        let host = lettered_tree();
        host.fail_listing("/a", MemoryFailure::PermissionDenied);
        let gate_a = host.gate_listing("/a");
        let gate_b = host.gate_listing("/b");
        let nav = Navigator::new(host.clone(), ViewPreferences::default());

        let (a, b, ()) = tokio::join!(nav.navigate("/a", true), nav.navigate("/b", true), async {
            let (first, second) = if fail_first {
                (gate_a, gate_b)
            } else {
                (gate_b, gate_a)
            };
            first.send(()).unwrap();
            tokio::task::yield_now().await;
            second.send(()).unwrap();
        });

        assert_eq!(a.unwrap(), LoadOutcome::Superseded);
        assert_eq!(b.unwrap(), LoadOutcome::Applied);
        let state = nav.snapshot();
        assert!(state.error().is_none());
        assert_eq!(state.current_path().unwrap().as_str(), "/b");
        assert_eq!(names(state.entries()), vec!["b.txt"]);
        assert!(!state.is_loading());
    }
}
