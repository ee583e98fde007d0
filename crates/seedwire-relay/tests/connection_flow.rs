use std::sync::Arc;
use std::time::Duration;

use seedwire_relay::{Connection, RelayResult, RelaySettings};
use seedwire_telemetry::Metrics;
use seedwire_test_support::FrameLog;
use seedwire_test_support::fixtures::{drain_frames, relay_metrics, sample_metadata, settle};
use seedwire_torrent_core::{MemoryRegistry, MemoryWorker, TorrentWorker, WorkerRegistry};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_stream::wrappers::ReceiverStream;

struct Harness {
    registry: Arc<MemoryRegistry>,
    metrics: Metrics,
    inbound: mpsc::Sender<String>,
    outbound: mpsc::Receiver<String>,
    task: JoinHandle<RelayResult<()>>,
}

impl Harness {
    async fn connect() -> Self {
        Self::connect_to(Arc::new(MemoryRegistry::new()), relay_metrics()).await
    }

    async fn connect_to(registry: Arc<MemoryRegistry>, metrics: Metrics) -> Self {
        let connection = Connection::new(
            Arc::clone(&registry) as Arc<dyn WorkerRegistry>,
            RelaySettings::default(),
            metrics.clone(),
        );
        let (inbound, inbound_rx) = mpsc::channel(16);
        let (outbound_tx, outbound) = mpsc::channel(256);
        let task = tokio::spawn(connection.run(ReceiverStream::new(inbound_rx), outbound_tx));
        settle().await;
        Self {
            registry,
            metrics,
            inbound,
            outbound,
            task,
        }
    }

    fn add(&self, worker: &Arc<MemoryWorker>) {
        self.registry
            .insert(Arc::clone(worker) as Arc<dyn TorrentWorker>);
    }

    async fn command(&self, frame: &str) {
        self.inbound
            .send(frame.to_string())
            .await
            .expect("connection accepts frames");
        settle().await;
    }

    fn frames(&mut self) -> FrameLog {
        FrameLog::parse(drain_frames(&mut self.outbound))
    }
}

#[tokio::test(start_paused = true)]
async fn lifecycle_is_relayed_with_a_single_ready() {
    let mut harness = Harness::connect().await;
    let worker = MemoryWorker::new("aa");
    harness.add(&worker);
    settle().await;

    worker.begin_verifying(sample_metadata());
    settle().await;
    worker.mark_ready();
    worker.mark_ready();
    settle().await;

    let log = harness.frames().for_hash("aa");
    assert_eq!(log.types(), vec!["verifying", "ready"]);
    let verifying = log.first("verifying").expect("verifying frame");
    assert_eq!(verifying["stats"]["paused"], false);
    assert!(log.first("ready").expect("ready frame")["stats"].is_object());
}

#[tokio::test(start_paused = true)]
async fn duplicate_creation_does_not_duplicate_listeners() {
    let mut harness = Harness::connect().await;
    let worker = MemoryWorker::new("bb");
    worker.begin_verifying(sample_metadata());
    harness.add(&worker);
    harness.add(&worker);
    settle().await;
    assert_eq!(harness.metrics.snapshot().subscriptions_active, 1);

    time::sleep(Duration::from_millis(1_200)).await;
    worker.set_interested(true);
    settle().await;

    let log = harness.frames();
    assert_eq!(log.count("verifying"), 1);
    assert_eq!(log.count("stats"), 1);
    assert_eq!(log.count("interested"), 1);
}

#[tokio::test(start_paused = true)]
async fn no_stats_after_destroyed_and_worker_can_return() {
    let mut harness = Harness::connect().await;
    let worker = MemoryWorker::new("cc");
    worker.begin_verifying(sample_metadata());
    harness.add(&worker);
    settle().await;

    time::sleep(Duration::from_millis(2_100)).await;
    worker.destroy();
    settle().await;
    time::sleep(Duration::from_millis(3_000)).await;

    let log = harness.frames();
    let destroyed_at = log.position("destroyed").expect("destroyed frame");
    assert_eq!(destroyed_at + 1, log.len(), "frames after destroyed");
    assert_eq!(log.count("stats"), 2);
    assert_eq!(harness.metrics.snapshot().subscriptions_active, 0);

    let reborn = MemoryWorker::new("cc");
    reborn.begin_verifying(sample_metadata());
    harness.add(&reborn);
    settle().await;
    assert_eq!(harness.frames().types(), vec!["verifying"]);
}

#[tokio::test(start_paused = true)]
async fn worker_acting_in_its_creation_turn_is_fully_relayed() {
    let mut harness = Harness::connect().await;
    let worker = MemoryWorker::new("zz");
    harness.add(&worker);
    worker.begin_verifying(sample_metadata());
    worker.mark_ready();
    worker.destroy();
    assert!(harness.registry.remove("zz").is_some());

    time::sleep(Duration::from_millis(5_500)).await;

    let log = harness.frames();
    assert_eq!(log.types(), vec!["verifying", "ready", "destroyed"]);
    assert_eq!(harness.metrics.snapshot().subscriptions_active, 0);
}

#[tokio::test(start_paused = true)]
async fn stats_stop_at_destroyed_for_a_worker_created_ready() {
    let mut harness = Harness::connect().await;
    let worker = MemoryWorker::new("yy");
    harness.add(&worker);
    worker.begin_verifying(sample_metadata());
    worker.mark_ready();

    time::sleep(Duration::from_millis(2_100)).await;
    worker.destroy();
    settle().await;
    time::sleep(Duration::from_millis(3_000)).await;

    let log = harness.frames();
    assert_eq!(log.position("verifying"), Some(0));
    assert_eq!(log.position("ready"), Some(1));
    assert_eq!(log.count("ready"), 1);
    assert_eq!(log.count("stats"), 2);
    let destroyed_at = log.position("destroyed").expect("destroyed frame");
    assert_eq!(destroyed_at + 1, log.len(), "frames after destroyed");
    assert_eq!(harness.metrics.snapshot().subscriptions_active, 0);
}

#[tokio::test(start_paused = true)]
async fn unknown_worker_commands_are_silent() {
    let mut harness = Harness::connect().await;
    harness.command(r#"{"type":"pause","args":["nope"]}"#).await;
    harness.command("{not json").await;
    harness.command(r#"{"type":"reboot","args":[]}"#).await;

    assert!(harness.frames().is_empty());
    assert_eq!(harness.metrics.commands("pause", "unknown_torrent"), 1);
    assert!(!harness.task.is_finished(), "connection survived bad input");
}

#[tokio::test(start_paused = true)]
async fn commands_reach_the_worker() {
    let mut harness = Harness::connect().await;
    let worker = MemoryWorker::new("dd");
    worker.begin_verifying(sample_metadata());
    harness.add(&worker);
    settle().await;

    harness.command(r#"{"type":"pause","args":["dd"]}"#).await;
    assert!(worker.is_paused());
    harness.command(r#"{"type":"select","args":["dd",1]}"#).await;
    harness.command(r#"{"type":"select","args":["dd",7]}"#).await;

    worker.finish();
    settle().await;

    let log = harness.frames();
    let selection = log.first("selection").expect("selection frame");
    assert_eq!(
        selection["perFileCoverage"],
        serde_json::json!([false, true, false])
    );
    assert_eq!(harness.metrics.commands("pause", "applied"), 1);
    assert_eq!(harness.metrics.commands("select", "applied"), 1);
    assert_eq!(harness.metrics.commands("select", "rejected"), 1);
}

#[tokio::test(start_paused = true)]
async fn every_connection_gets_its_own_subscription() {
    let registry = Arc::new(MemoryRegistry::new());
    let metrics = relay_metrics();
    let mut first = Harness::connect_to(Arc::clone(&registry), metrics.clone()).await;
    let mut second = Harness::connect_to(Arc::clone(&registry), metrics.clone()).await;

    let worker = MemoryWorker::new("ee");
    worker.begin_verifying(sample_metadata());
    first.add(&worker);
    settle().await;

    assert_eq!(first.frames().types(), vec!["verifying"]);
    assert_eq!(second.frames().types(), vec!["verifying"]);
    assert_eq!(metrics.snapshot().connections_active, 2);
    assert_eq!(metrics.snapshot().subscriptions_active, 2);
}

#[tokio::test(start_paused = true)]
async fn closing_inbound_ends_the_connection_and_its_subscriptions() {
    let harness = Harness::connect().await;
    let worker = MemoryWorker::new("ff");
    worker.begin_verifying(sample_metadata());
    harness.add(&worker);
    settle().await;
    assert_eq!(harness.metrics.snapshot().subscriptions_active, 1);

    let Harness {
        metrics,
        inbound,
        task,
        ..
    } = harness;
    drop(inbound);

    task.await.expect("join").expect("clean shutdown");
    assert_eq!(metrics.snapshot().connections_active, 0);
    assert_eq!(metrics.snapshot().subscriptions_active, 0);
}
