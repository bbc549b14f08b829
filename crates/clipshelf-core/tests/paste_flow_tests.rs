//! Select-and-paste flows against the change watcher.

mod common;

use std::sync::Arc;
use std::time::Duration;

use clipshelf_core::clipboard::{ClipboardWatcher, PollOutcome, SystemClipboard, WatchState};
use clipshelf_core::config::WatcherConfig;
use clipshelf_core::history::{AddOutcome, EntryKind, HistoryStore};
use clipshelf_core::normalize::image_dimensions;

use common::{fast_watcher_config, png_of_size, Harness};

fn texts(store: &HistoryStore) -> Vec<String> {
    store
        .get()
        .iter()
        .map(|e| e.text().unwrap_or("<image>").to_string())
        .collect()
}

#[tokio::test]
async fn test_selected_text_is_consumed_once() {
    let h = Harness::new(HistoryStore::default());
    let mut watcher = WatchState::new(fast_watcher_config(), h.clipboard.change_count().unwrap());

    h.clipboard.copy_text("first");
    watcher.poll(&h.store, h.clipboard.as_ref());
    h.clipboard.copy_text("second");
    watcher.poll(&h.store, h.clipboard.as_ref());
    assert_eq!(texts(&h.store), vec!["second", "first"]);

    h.controller.remember_focus();
    h.controller.select(1).unwrap().await.unwrap();

    assert_eq!(
        watcher.poll(&h.store, h.clipboard.as_ref()),
        PollOutcome::Captured {
            kind: EntryKind::Text,
            outcome: AddOutcome::Suppressed,
        }
    );
    assert_eq!(texts(&h.store), vec!["second", "first"]);
    assert!(h.store.pending_suppression().is_none());

    // An independent copy of the same text afterwards is a normal capture.
    h.clipboard.copy_text("first");
    assert_eq!(
        watcher.poll(&h.store, h.clipboard.as_ref()),
        PollOutcome::Captured {
            kind: EntryKind::Text,
            outcome: AddOutcome::MovedToFront,
        }
    );
    assert_eq!(texts(&h.store), vec!["first", "second"]);

    assert_eq!(h.focus.events(), vec!["restore 1001", "paste"]);
    assert_eq!(h.presenter.hidden(), 1);
}

#[tokio::test]
async fn test_selected_large_image_is_consumed() {
    let h = Harness::new(HistoryStore::default());
    let mut watcher = WatchState::new(fast_watcher_config(), 0);

    h.clipboard.copy_image(&png_of_size(2400, 600));
    assert!(matches!(
        watcher.poll(&h.store, h.clipboard.as_ref()),
        PollOutcome::Captured {
            kind: EntryKind::Image,
            outcome: AddOutcome::Inserted,
        }
    ));
    let stored = h.store.get()[0].image().cloned().unwrap();
    assert_eq!(stored.dimensions(), Some((1200, 300)));

    h.clipboard.copy_text("something else");
    watcher.poll(&h.store, h.clipboard.as_ref());

    h.controller.select(1).unwrap().await.unwrap();
    assert_eq!(
        watcher.poll(&h.store, h.clipboard.as_ref()),
        PollOutcome::Captured {
            kind: EntryKind::Image,
            outcome: AddOutcome::Suppressed,
        }
    );
    assert_eq!(h.store.len(), 2);
    assert_eq!(h.store.get()[1].kind(), EntryKind::Image);
}

#[tokio::test]
async fn test_grace_window_skips_own_write() {
    let h = Harness::new(HistoryStore::default());
    let mut watcher = WatchState::new(WatcherConfig::default(), 0);

    h.clipboard.copy_text("entry");
    watcher.poll(&h.store, h.clipboard.as_ref());

    h.controller.select(0).unwrap().await.unwrap();
    assert_eq!(
        watcher.poll(&h.store, h.clipboard.as_ref()),
        PollOutcome::SelfWrite
    );
    assert_eq!(h.store.len(), 1);
}

#[tokio::test]
async fn test_out_of_range_select_leaves_everything_alone() {
    let h = Harness::new(HistoryStore::default());
    h.store.add_text("only");

    assert!(h.controller.select(3).is_none());
    assert_eq!(h.clipboard.write_count(), 0);
    assert_eq!(h.presenter.hidden(), 0);
    assert!(h.focus.events().is_empty());
    assert_eq!(h.store.len(), 1);
}

#[tokio::test]
async fn test_running_watcher_does_not_duplicate_paste() {
    let h = Harness::new(HistoryStore::default());
    let (_changes, handle) =
        ClipboardWatcher::with_config(fast_watcher_config()).start(Arc::clone(&h.store), h.system_clipboard());
    tokio::time::sleep(Duration::from_millis(30)).await;

    h.clipboard.copy_text("alpha");
    tokio::time::sleep(Duration::from_millis(60)).await;
    h.clipboard.copy_text("beta");
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(texts(&h.store), vec!["beta", "alpha"]);

    h.controller.select(1).unwrap().await.unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;

    assert_eq!(texts(&h.store), vec!["beta", "alpha"]);
    assert_eq!(h.clipboard.text().as_deref(), Some("alpha"));
    handle.stop().await;
}

#[test]
fn test_png_fixture_dimensions() {
    assert_eq!(image_dimensions(&png_of_size(3, 5)), Some((3, 5)));
}
