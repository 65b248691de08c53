//! # Settings Check Pipeline Tests
//!
//! End-to-end behavior of the processor: windowing, gates, and exactly-once
//! delivery under racing finalizers.
//!
//! Run with: cargo test --package warden_security --test settings_pipeline

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use warden_security::{
    BackendStatus, CheckDataCache, ChannelSink, Clock, CollectingSink, FinalizeCause, ManualClock,
    ProcessorConfig, RemoteSettings, RemoteSnapshot, SettingsCheckProcessor,
};
use warden_shared::{config_keys, ClientSettings, ConnectionId, SkinLayers};

struct Rig {
    processor: Arc<SettingsCheckProcessor>,
    remote: Arc<RemoteSettings>,
    players: Arc<CheckDataCache>,
    sink: Arc<CollectingSink>,
    clock: Arc<ManualClock>,
}

fn rig(names: &[&str]) -> Rig {
    let remote = Arc::new(RemoteSettings::default());
    let players = Arc::new(CheckDataCache::new());
    let sink = Arc::new(CollectingSink::new());
    let clock = Arc::new(ManualClock::new());
    for name in names {
        players.track(name);
    }

    let processor = SettingsCheckProcessor::new(
        &ProcessorConfig::default(),
        Arc::new(BackendStatus::new(true)),
        remote.clone(),
        players.clone(),
        sink.clone(),
    )
    .with_clock(clock.clone());

    Rig {
        processor: Arc::new(processor),
        remote,
        players,
        sink,
        clock,
    }
}

fn none() -> SkinLayers {
    SkinLayers::default()
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn fragments_within_window_are_consolidated() {
    let rig = rig(&["Steve"]);
    let conn = ConnectionId(1);

    rig.processor
        .submit_fragment(conn, "Steve", &ClientSettings::default().locale("en_US"), &none());
    rig.clock.advance(Duration::from_millis(500));
    rig.processor
        .submit_fragment(conn, "Steve", &ClientSettings::default().chat_mode("full"), &none());

    rig.clock.advance(Duration::from_millis(300));
    assert_eq!(rig.processor.on_maintenance_tick(), 0);
    assert!(rig.sink.is_empty());

    rig.clock.advance(Duration::from_millis(300));
    assert_eq!(rig.processor.on_maintenance_tick(), 1);

    let records = rig.sink.take();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].username, "Steve");
    assert_eq!(records[0].settings["locale"], "en_US");
    assert_eq!(records[0].settings["chatMode"], "full");
    assert_eq!(records[0].cause, FinalizeCause::Expired);
}

#[test]
fn later_fragments_do_not_extend_the_window() {
    let rig = rig(&["Steve"]);
    let conn = ConnectionId(1);

    for _ in 0..9 {
        rig.processor
            .submit_fragment(conn, "Steve", &ClientSettings::default().colors("true"), &none());
        rig.clock.advance(Duration::from_millis(100));
    }
    // 900ms in, deadline untouched by the drip.
    rig.clock.advance(Duration::from_millis(100));
    assert_eq!(rig.processor.on_maintenance_tick(), 1);
}

#[test]
fn disconnect_finalizes_immediately_and_once() {
    let rig = rig(&["Alex"]);
    let conn = ConnectionId(2);

    rig.processor.submit_fragment(
        conn,
        "Alex",
        &ClientSettings::default().view_distance("8"),
        &SkinLayers::all("true"),
    );
    rig.clock.advance(Duration::from_millis(50));
    rig.processor.on_disconnect(conn);

    let records = rig.sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].cause, FinalizeCause::Disconnected);
    assert_eq!(records[0].settings.len(), 1);
    assert_eq!(records[0].settings["viewDistance"], "8");
    assert_eq!(records[0].skin_parts.len(), 7);

    rig.clock.advance(Duration::from_secs(2));
    assert_eq!(rig.processor.on_maintenance_tick(), 0);
    rig.processor.on_disconnect(conn);
    assert_eq!(rig.sink.len(), 1);
}

#[test]
fn last_write_wins_for_same_key() {
    let rig = rig(&["Steve"]);
    let conn = ConnectionId(3);

    rig.processor
        .submit_fragment(conn, "Steve", &ClientSettings::default().main_hand("left"), &none());
    rig.processor
        .submit_fragment(conn, "Steve", &ClientSettings::default().main_hand("right"), &none());
    rig.processor.on_disconnect(conn);

    assert_eq!(rig.sink.take()[0].settings["mainHand"], "right");
}

#[test]
fn optional_listing_flag_is_omitted_when_absent() {
    let rig = rig(&["Steve"]);
    let conn = ConnectionId(4);

    rig.processor.submit_fragment(
        conn,
        "Steve",
        &ClientSettings::default()
            .locale("en_US")
            .view_distance("12")
            .colors("true")
            .main_hand("right")
            .chat_mode("full"),
        &none(),
    );
    rig.processor.on_disconnect(conn);

    let record = &rig.sink.take()[0];
    assert_eq!(record.settings.len(), 5);
    assert!(!record.settings.contains_key("clientListingAllowed"));
}

// ============================================================================
// GATES
// ============================================================================

#[test]
fn privacy_opt_out_creates_nothing() {
    let rig = rig(&["Steve"]);
    rig.remote.replace(
        RemoteSnapshot::default()
            .with_bool(config_keys::COLLECT_PLAYER_SETTINGS, false)
            .with_bool(config_keys::INVALIDATE_CACHE, true),
    );

    for i in 0..1_000 {
        rig.processor.submit_fragment(
            ConnectionId(i % 10),
            "Steve",
            &ClientSettings::default().locale("en_US"),
            &none(),
        );
    }

    assert_eq!(rig.processor.pending_count(), 0);
    assert_eq!(rig.processor.stats().aggregations_started, 0);
    assert_eq!(rig.processor.stats().dropped_privacy, 1_000);
}

#[test]
fn remote_config_is_read_on_every_call() {
    let rig = rig(&["Steve", "Alex"]);
    rig.remote.replace(
        RemoteSnapshot::default()
            .with_bool(config_keys::COLLECT_PLAYER_SETTINGS, false)
            .with_bool(config_keys::INVALIDATE_CACHE, true),
    );
    rig.processor
        .submit_fragment(ConnectionId(1), "Steve", &ClientSettings::default(), &none());
    assert_eq!(rig.processor.pending_count(), 0);

    rig.remote.replace(RemoteSnapshot::default());
    rig.processor
        .submit_fragment(ConnectionId(2), "Alex", &ClientSettings::default(), &none());
    assert_eq!(rig.processor.pending_count(), 1);
}

#[test]
fn already_checked_player_is_pure_noop() {
    let rig = rig(&["Steve"]);
    rig.players.track("Steve").set_player_settings_checked(true);

    rig.processor.submit_fragment(
        ConnectionId(1),
        "Steve",
        &ClientSettings::default().locale("en_US"),
        &SkinLayers::all("true"),
    );

    assert_eq!(rig.processor.pending_count(), 0);
    assert_eq!(rig.processor.stats().aggregations_started, 0);
    assert_eq!(rig.processor.stats().fragments_accepted, 0);
    rig.processor.on_disconnect(ConnectionId(1));
    assert!(rig.sink.is_empty());
}

#[test]
fn delivered_record_marks_player_checked() {
    let rig = rig(&["Steve"]);
    rig.processor
        .submit_fragment(ConnectionId(1), "Steve", &ClientSettings::default().locale("en_US"), &none());
    rig.processor.on_disconnect(ConnectionId(1));

    // A new session for the same player is gated by the check state.
    rig.processor
        .submit_fragment(ConnectionId(2), "Steve", &ClientSettings::default().locale("en_US"), &none());
    assert_eq!(rig.processor.pending_count(), 0);
    assert_eq!(rig.processor.stats().dropped_already_checked, 1);
}

#[test]
fn fragment_after_finalize_never_reaches_delivered_record() {
    let rig = rig(&["Steve"]);
    let conn = ConnectionId(9);
    rig.processor
        .submit_fragment(conn, "Steve", &ClientSettings::default().locale("en_US"), &none());
    rig.clock.advance(Duration::from_secs(1));
    rig.processor.on_maintenance_tick();

    rig.players.track("Steve").set_player_settings_checked(false);
    rig.processor
        .submit_fragment(conn, "Steve", &ClientSettings::default().chat_mode("hidden"), &none());
    rig.clock.advance(Duration::from_secs(1));
    rig.processor.on_maintenance_tick();

    let records = rig.sink.take();
    assert_eq!(records.len(), 1);
    assert!(!records[0].settings.contains_key("chatMode"));
}

// ============================================================================
// RACES
// ============================================================================

#[test]
fn sweep_and_disconnect_race_delivers_once() {
    for round in 0..200u64 {
        let rig = rig(&["Steve"]);
        let conn = ConnectionId(round);
        rig.processor
            .submit_fragment(conn, "Steve", &ClientSettings::default().locale("en_US"), &none());
        rig.clock.advance(Duration::from_secs(1));

        let barrier = Arc::new(Barrier::new(2));
        let sweeper = {
            let processor = Arc::clone(&rig.processor);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                processor.on_maintenance_tick();
            })
        };
        let disconnector = {
            let processor = Arc::clone(&rig.processor);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                processor.on_disconnect(conn);
            })
        };
        sweeper.join().unwrap();
        disconnector.join().unwrap();

        assert_eq!(rig.sink.len(), 1, "round {round}");
        assert_eq!(rig.processor.stats().finalized_total(), 1, "round {round}");
    }
}

#[test]
fn concurrent_submitters_share_one_task_per_connection() {
    const THREADS: usize = 8;
    const CONNECTIONS: u64 = 32;

    let rig = rig(&["Steve"]);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let processor = Arc::clone(&rig.processor);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for conn in 0..CONNECTIONS {
                    processor.submit_fragment(
                        ConnectionId(conn),
                        "Steve",
                        &ClientSettings::default().view_distance(t.to_string()),
                        &none(),
                    );
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = rig.processor.stats();
    assert_eq!(stats.aggregations_started, CONNECTIONS);
    assert_eq!(stats.fragments_accepted, THREADS as u64 * CONNECTIONS);
    assert_eq!(rig.processor.pending_count(), CONNECTIONS as usize);

    // The sink marks Steve checked on the first delivery; the rest are still
    // finalized because their tasks already exist.
    rig.clock.advance(Duration::from_secs(1));
    assert_eq!(rig.processor.on_maintenance_tick(), CONNECTIONS as usize);
    assert_eq!(rig.sink.len(), CONNECTIONS as usize);
}

#[test]
fn merges_racing_finalize_are_all_or_nothing() {
    for round in 0..100u64 {
        let rig = rig(&["Steve"]);
        let conn = ConnectionId(round);
        rig.processor
            .submit_fragment(conn, "Steve", &ClientSettings::default().locale("en_US"), &none());

        let barrier = Arc::new(Barrier::new(2));
        let submitter = {
            let processor = Arc::clone(&rig.processor);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                processor.submit_fragment(
                    conn,
                    "Steve",
                    &ClientSettings::default().chat_mode("full").main_hand("left"),
                    &SkinLayers::all("true"),
                );
            })
        };
        barrier.wait();
        rig.processor.on_disconnect(conn);
        submitter.join().unwrap();

        let records = rig.sink.take();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        let merged = record.settings.contains_key("chatMode");
        assert_eq!(merged, record.settings.contains_key("mainHand"));
        assert_eq!(merged, record.skin_parts.len() == 7);
    }
}

/// Manual clock that parks the next caller of `now()` once armed.
struct ParkingClock {
    inner: ManualClock,
    armed: AtomicBool,
    parked: Barrier,
    resumed: Barrier,
}

impl ParkingClock {
    fn new() -> Self {
        Self {
            inner: ManualClock::new(),
            armed: AtomicBool::new(false),
            parked: Barrier::new(2),
            resumed: Barrier::new(2),
        }
    }
}

impl Clock for ParkingClock {
    fn now(&self) -> Instant {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.parked.wait();
            self.resumed.wait();
        }
        self.inner.now()
    }
}

#[test]
fn disconnect_between_gates_and_claim_delivers_once() {
    let players = Arc::new(CheckDataCache::new());
    players.track("Steve");
    let sink = Arc::new(CollectingSink::new());
    let clock = Arc::new(ParkingClock::new());
    let processor = Arc::new(
        SettingsCheckProcessor::new(
            &ProcessorConfig::default(),
            Arc::new(BackendStatus::new(true)),
            Arc::new(RemoteSettings::default()),
            players,
            sink.clone(),
        )
        .with_clock(clock.clone()),
    );
    let conn = ConnectionId(1);
    processor.submit_fragment(conn, "Steve", &ClientSettings::default().locale("en_US"), &none());

    // The submitter passes every gate, then parks before touching the table.
    clock.armed.store(true, Ordering::SeqCst);
    let submitter = {
        let processor = Arc::clone(&processor);
        thread::spawn(move || {
            processor.submit_fragment(conn, "Steve", &ClientSettings::default().chat_mode("full"), &none());
        })
    };
    clock.parked.wait();
    processor.on_disconnect(conn);
    clock.resumed.wait();
    submitter.join().unwrap();

    assert_eq!(processor.pending_count(), 0);
    clock.inner.advance(Duration::from_secs(1));
    assert_eq!(processor.on_maintenance_tick(), 0);

    let records = sink.take();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].cause, FinalizeCause::Disconnected);
    assert!(!records[0].settings.contains_key("chatMode"));
    assert_eq!(processor.stats().dropped_sealed, 1);
    assert_eq!(processor.stats().finalized_total(), 1);
    assert_eq!(processor.closed_count(), 0);
}

// ============================================================================
// CHANNEL HAND-OFF
// ============================================================================

#[test]
fn channel_sink_feeds_backend_worker() {
    let players = Arc::new(CheckDataCache::new());
    players.track("Steve");
    players.track("Alex");
    let config = ProcessorConfig::from_toml_str("window_ms = 500\nsink_buffer = 16").unwrap();
    let (sink, receiver) = ChannelSink::from_config(&config);
    assert_eq!(receiver.capacity(), Some(16));
    let clock = Arc::new(ManualClock::new());
    let processor = SettingsCheckProcessor::new(
        &config,
        Arc::new(BackendStatus::new(true)),
        Arc::new(RemoteSettings::default()),
        players.clone(),
        Arc::new(sink),
    )
    .with_clock(clock.clone());

    processor.submit_fragment(ConnectionId(1), "Steve", &ClientSettings::default().locale("en_US"), &none());
    processor.submit_fragment(ConnectionId(2), "Alex", &ClientSettings::default().locale("de_DE"), &none());
    processor.on_disconnect(ConnectionId(2));
    clock.advance(Duration::from_secs(1));
    processor.on_maintenance_tick();

    let mut names: Vec<_> = receiver.try_iter().map(|r| r.username).collect();
    names.sort();
    assert_eq!(names, vec!["Alex".to_owned(), "Steve".to_owned()]);
    assert!(players.track("Steve").is_player_settings_checked());
}
