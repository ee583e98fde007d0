use std::sync::Arc;
use std::time::Duration;

use seedwire_app::demo::{DemoSettings, demo_info_hash, run_round};
use seedwire_relay::{Connection, RelaySettings};
use seedwire_test_support::FrameLog;
use seedwire_test_support::fixtures::{drain_frames, relay_metrics, settle};
use seedwire_torrent_core::{MemoryRegistry, WorkerRegistry};
use tokio::sync::mpsc;

#[tokio::test(start_paused = true)]
async fn observers_see_a_full_demo_round() {
    let registry = Arc::new(MemoryRegistry::new());
    let metrics = relay_metrics();
    let connection = Connection::new(
        Arc::clone(&registry) as Arc<dyn WorkerRegistry>,
        RelaySettings::default(),
        metrics.clone(),
    );
    let (outbound, mut frames) = mpsc::channel(512);
    let task = tokio::spawn(connection.run(tokio_stream::pending::<String>(), outbound));
    settle().await;

    let settings = DemoSettings {
        step: Duration::from_millis(200),
        linger: Duration::from_secs(2),
    };
    run_round(&registry, 7, settings).await;
    settle().await;

    let log = FrameLog::parse(drain_frames(&mut frames)).for_hash(&demo_info_hash(7));
    let order: Vec<usize> = ["verifying", "ready", "interested", "finished", "destroyed"]
        .iter()
        .map(|kind| log.position(kind).unwrap_or_else(|| panic!("{kind} frame")))
        .collect();
    assert!(order.windows(2).all(|pair| pair[0] < pair[1]), "{order:?}");
    assert_eq!(log.count("ready"), 1);
    assert_eq!(log.position("destroyed"), Some(log.len() - 1));
    assert!(log.count("download") >= 1);
    assert!(log.count("stats") >= 1);

    let selection = log.first("selection").expect("selection frame");
    assert_eq!(selection["perFileCoverage"][0], true);
    assert_eq!(metrics.snapshot().subscriptions_active, 0);
    task.abort();
}
