//! Signal watcher integration with the coordinator.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use graceful_closer::lifecycle::TerminationSignal;
use graceful_closer::ShutdownCoordinator;
use tokio::sync::oneshot;

mod common;

fn fake_signal() -> (oneshot::Sender<()>, impl std::future::Future<Output = TerminationSignal>) {
    let (tx, rx) = oneshot::channel();
    let trigger = async move {
        let _ = rx.await;
        TerminationSignal::Terminate
    };
    (tx, trigger)
}

#[tokio::test]
async fn test_signal_triggers_shutdown() {
    let coordinator = ShutdownCoordinator::new();
    let calls = Arc::new(AtomicUsize::new(0));
    common::register_counting(&coordinator, "kafka", &calls);
    common::register_counting(&coordinator, "logger", &calls);

    let (signal, trigger) = fake_signal();
    let watcher = coordinator
        .spawn_watcher(trigger, Duration::from_secs(1))
        .unwrap();

    assert!(!coordinator.is_started());
    signal.send(()).unwrap();

    watcher.await.unwrap();
    assert!(coordinator.completion().is_fired());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(matches!(coordinator.outcome(), Some(Ok(()))));
}

#[tokio::test]
async fn test_watcher_uses_its_own_grace_period() {
    let coordinator = ShutdownCoordinator::new();
    common::register_stalling(&coordinator, "stuck");

    let (signal, trigger) = fake_signal();
    let watcher = coordinator
        .spawn_watcher(trigger, Duration::from_millis(40))
        .unwrap();
    signal.send(()).unwrap();

    tokio::time::timeout(Duration::from_secs(1), watcher)
        .await
        .expect("watcher should give up after its grace period")
        .unwrap();

    let outcome = coordinator.outcome().expect("run completed");
    assert!(outcome.unwrap_err().is_deadline_exceeded());
}

#[tokio::test]
async fn test_watcher_stands_down_after_explicit_shutdown() {
    let coordinator = ShutdownCoordinator::new();
    let calls = Arc::new(AtomicUsize::new(0));
    common::register_counting(&coordinator, "telegram", &calls);

    let (signal, trigger) = fake_signal();
    let watcher = coordinator
        .spawn_watcher(trigger, Duration::from_secs(1))
        .unwrap();

    coordinator.shutdown(common::budget(1000)).await.unwrap();
    tokio::time::timeout(Duration::from_secs(1), watcher)
        .await
        .expect("watcher should exit on completion")
        .unwrap();

    // The signal now has nobody listening; no second run happens.
    assert!(signal.send(()).is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_with_no_signals_has_no_watcher() {
    let coordinator = ShutdownCoordinator::with_signals(&[], Duration::from_secs(1)).unwrap();

    let (_signal, trigger) = fake_signal();
    assert!(coordinator.spawn_watcher(trigger, Duration::from_secs(1)).is_some());
}

#[cfg(unix)]
fn send_hangup() {
    let status = std::process::Command::new("kill")
        .args(["-HUP", &std::process::id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_repeated_os_signals_are_absorbed() {
    use graceful_closer::lifecycle::TerminationSignal::Hangup;

    let coordinator = ShutdownCoordinator::with_signals(&[Hangup], Duration::from_secs(1)).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    common::register_counting(&coordinator, "logger", &calls);

    send_hangup();
    tokio::time::timeout(Duration::from_secs(5), coordinator.completion().wait())
        .await
        .unwrap();

    // The handler stays installed, so this one must not terminate the process.
    send_hangup();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(coordinator.outcome(), Some(Ok(()))));
}
