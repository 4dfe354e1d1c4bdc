//! `Core` spawn/shutdown lifecycle: cooperative notification, the forced-abort
//! fallback, isolation between distinct `Core` instances, and shutdown-on-drop.

use semian_core::Core;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread")]
async fn spawn_runs_the_task_and_tracks_it() {
    let core = Core::new();
    let ran = Arc::new(AtomicBool::new(false));
    let ran_clone = Arc::clone(&ran);

    core.spawn(move |shutdown| async move {
        ran_clone.store(true, Ordering::SeqCst);
        shutdown.notified().await;
    });

    assert_eq!(core.task_count(), 1);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(ran.load(Ordering::SeqCst));
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_stops_a_cooperative_task_and_clears_the_task_list() {
    let core = Core::new();
    let stopped = Arc::new(AtomicBool::new(false));
    let stopped_clone = Arc::clone(&stopped);

    core.spawn(move |shutdown| async move {
        shutdown.notified().await;
        stopped_clone.store(true, Ordering::SeqCst);
    });

    core.shutdown();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(stopped.load(Ordering::SeqCst));
    assert_eq!(core.task_count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_force_aborts_a_task_that_ignores_the_notify() {
    let core = Core::new();
    let reached_end = Arc::new(AtomicBool::new(false));
    let reached_end_clone = Arc::clone(&reached_end);

    core.spawn(move |_shutdown| async move {
        tokio::time::sleep(Duration::from_secs(60)).await;
        reached_end_clone.store(true, Ordering::SeqCst);
    });

    core.shutdown();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(!reached_end.load(Ordering::SeqCst));
    assert_eq!(core.task_count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn dropping_core_shuts_down_its_tasks() {
    let stopped = Arc::new(AtomicBool::new(false));
    let stopped_clone = Arc::clone(&stopped);

    {
        let core = Core::new();
        core.spawn(move |shutdown| async move {
            shutdown.notified().await;
            stopped_clone.store(true, Ordering::SeqCst);
        });
        assert_eq!(core.task_count(), 1);
    } // core dropped here

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(stopped.load(Ordering::SeqCst));
}

#[tokio::test(flavor = "multi_thread")]
async fn distinct_cores_track_and_shut_down_independently() {
    let a = Core::new();
    let b = Core::new();
    let a_stopped = Arc::new(AtomicBool::new(false));
    let b_stopped = Arc::new(AtomicBool::new(false));
    let a_clone = Arc::clone(&a_stopped);
    let b_clone = Arc::clone(&b_stopped);

    a.spawn(move |shutdown| async move {
        shutdown.notified().await;
        a_clone.store(true, Ordering::SeqCst);
    });
    b.spawn(move |shutdown| async move {
        shutdown.notified().await;
        b_clone.store(true, Ordering::SeqCst);
    });

    a.shutdown();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(a_stopped.load(Ordering::SeqCst));
    assert!(!b_stopped.load(Ordering::SeqCst));
    assert_eq!(a.task_count(), 0);
    assert_eq!(b.task_count(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn many_tasks_are_all_tracked_and_all_stopped() {
    let core = Core::new();
    let stopped = Arc::new(AtomicUsize::new(0));

    for _ in 0..20 {
        let stopped_clone = Arc::clone(&stopped);
        core.spawn(move |shutdown| async move {
            shutdown.notified().await;
            stopped_clone.fetch_add(1, Ordering::SeqCst);
        });
    }

    assert_eq!(core.task_count(), 20);
    core.shutdown();
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(stopped.load(Ordering::SeqCst), 20);
    assert_eq!(core.task_count(), 0);
}
