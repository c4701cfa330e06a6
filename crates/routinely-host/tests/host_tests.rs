// Integration tests for the routine host

use std::time::Duration;

use routinely_host::config::{RoutineConfig, RoutinelyConfig, EXAMPLE_CONFIG};
use routinely_host::{shutdown_channel, HostError, RoutineHost};
use routinely_scheduler::{ManualClock, RoutineError, Scheduler, Value};

fn manual_host(config: &RoutinelyConfig) -> (ManualClock, RoutineHost) {
    let clock = ManualClock::new();
    let scheduler = Scheduler::with_capacity(config.scheduler.capacity).with_clock(clock.clone());
    (clock, RoutineHost::with_scheduler(scheduler, config))
}

fn fast_config() -> RoutinelyConfig {
    let mut config = RoutinelyConfig::default();
    config.scheduler.tick_interval_ms = 1;
    config.routines.push(RoutineConfig::new("spin", 0).with_message("spin"));
    config
}

#[test]
fn test_initialize_creates_configured_routines() {
    let config: RoutinelyConfig = toml::from_str(EXAMPLE_CONFIG).unwrap();
    let (_, mut host) = manual_host(&config);

    assert_eq!(host.initialize().unwrap(), 2);
    assert!(host.is_initialized());

    let scheduler = host.scheduler();
    assert_eq!(scheduler.count_used(), 2);
    let countdown = scheduler.fetch_by_tag("countdown").unwrap();
    let routine = scheduler.routine(countdown);
    assert_eq!(routine.interval(), Ok(250));
    assert_eq!(routine.iterations(), Ok(4));
    assert_eq!(routine.yields(), Ok(true));
    assert_eq!(
        routine.arguments(),
        Ok(vec![Value::from("launch"), Value::from(4)])
    );
}

#[test]
fn test_configured_routines_fire_and_expire() {
    let config: RoutinelyConfig = toml::from_str(EXAMPLE_CONFIG).unwrap();
    let (clock, mut host) = manual_host(&config);
    host.initialize().unwrap();
    let countdown = host.scheduler().fetch_by_tag("countdown").unwrap();

    clock.advance(250);
    host.tick();
    let routine = host.scheduler().routine(countdown);
    assert_eq!(routine.result(), Ok(Value::from("countdown launch 4")));
    assert_eq!(routine.iterations(), Ok(3));

    for _ in 0..3 {
        clock.advance(250);
        host.tick();
    }
    assert!(!host.scheduler().routine(countdown).is_valid());
    let heartbeat = host.scheduler().fetch_by_tag("heartbeat").unwrap();
    assert_eq!(
        host.scheduler().routine(heartbeat).result(),
        Ok(Value::from("still alive"))
    );
}

#[test]
fn test_scheduler_defaults_come_from_config() {
    let mut config = RoutinelyConfig::default();
    config.scheduler.silenced = true;
    config.scheduler.persistent = true;
    config.routines.push(RoutineConfig::new("inherits", 10));
    let mut loud = RoutineConfig::new("loud", 10);
    loud.quiet = Some(false);
    config.routines.push(loud);

    let (_, mut host) = manual_host(&config);
    host.initialize().unwrap();
    let scheduler = host.scheduler();

    let inherits = scheduler.routine(scheduler.fetch_by_tag("inherits").unwrap());
    assert_eq!(inherits.quiet(), Ok(true));
    assert_eq!(inherits.persistent(), Ok(true));
    let loud = scheduler.routine(scheduler.fetch_by_tag("loud").unwrap());
    assert_eq!(loud.quiet(), Ok(false));
}

#[test]
fn test_unsupported_argument_is_rejected() {
    let mut config = RoutinelyConfig::default();
    config.routines.push(RoutineConfig::new("good", 10));
    config
        .routines
        .push(RoutineConfig::new("bad", 10).with_arg(toml::Value::Array(vec![])));

    let (_, mut host) = manual_host(&config);
    match host.initialize() {
        Err(HostError::UnsupportedArgument { tag, kind }) => {
            assert_eq!(tag, "bad");
            assert_eq!(kind, "array");
        }
        other => panic!("expected unsupported argument, got {:?}", other),
    }
    assert_eq!(host.scheduler().count_used(), 0);
}

#[test]
fn test_too_many_routines_for_capacity() {
    let mut config = RoutinelyConfig::default();
    config.scheduler.capacity = 1;
    config.routines.push(RoutineConfig::new("first", 10));
    config.routines.push(RoutineConfig::new("second", 10));

    let (_, mut host) = manual_host(&config);
    match host.initialize() {
        Err(HostError::Routine { tag, source }) => {
            assert_eq!(tag, "second");
            assert_eq!(source, RoutineError::PoolExhausted { capacity: 1 });
        }
        other => panic!("expected pool exhaustion, got {:?}", other),
    }

    // The routine created before the failure is gone again
    assert!(!host.is_initialized());
    assert_eq!(host.scheduler().count_used(), 0);
    assert_eq!(host.scheduler().find_by_tag("first"), None);
}

#[test]
fn test_reinitialize_starts_over() {
    let config: RoutinelyConfig = toml::from_str(EXAMPLE_CONFIG).unwrap();
    let (_, mut host) = manual_host(&config);
    host.initialize().unwrap();
    host.initialize().unwrap();
    assert_eq!(host.scheduler().count_used(), 2);

    host.deinitialize();
    assert!(!host.is_initialized());
    assert_eq!(host.scheduler().count_used(), 0);
}

#[tokio::test]
async fn test_run_stops_after_tick_budget() {
    let mut host = RoutineHost::new(&fast_config());
    host.initialize().unwrap();
    let (_tx, rx) = shutdown_channel();

    let ticks = host.run(Some(3), rx).await;
    assert_eq!(ticks, 3);
    assert!(host.scheduler().routine(host.scheduler().fetch_by_tag("spin").unwrap()).is_valid());
}

#[tokio::test]
async fn test_run_honours_shutdown_before_start() {
    let mut host = RoutineHost::new(&fast_config());
    host.initialize().unwrap();
    let (tx, rx) = shutdown_channel();
    tx.send(true).unwrap();

    assert_eq!(host.run(None, rx).await, 0);
}

#[tokio::test]
async fn test_run_stops_on_shutdown_signal() {
    let mut host = RoutineHost::new(&fast_config());
    host.initialize().unwrap();
    let (tx, rx) = shutdown_channel();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let _ = tx.send(true);
    });

    let ticks = tokio::time::timeout(Duration::from_secs(5), host.run(None, rx))
        .await
        .expect("host stopped");
    assert!(ticks >= 1);
}

#[tokio::test]
async fn test_run_stops_when_sender_is_dropped() {
    let mut host = RoutineHost::new(&fast_config());
    host.initialize().unwrap();
    let (tx, rx) = shutdown_channel();
    drop(tx);

    let ticks = tokio::time::timeout(Duration::from_secs(5), host.run(None, rx))
        .await
        .expect("host stopped");
    assert!(ticks <= 1);
}
