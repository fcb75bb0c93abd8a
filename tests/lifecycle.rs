mod common;

use common::{FakeEdgeService, FakeTimer};
use tacho_core::{
    Config, ConfigError, HardwareError, InitError, SamplePeriodError, SystemState, Tachometer,
};

#[test]
fn test_initialize_registers_both_handlers() {
    let tacho = Tachometer::new(Config {
        sensor_pin: 18,
        timer_id: 3,
        sample_period_ms: 500,
        ..Config::default()
    });
    let mut edge = FakeEdgeService::default();
    let mut timer = FakeTimer::default();

    assert_eq!(tacho.initialize(&mut edge, &mut timer), Ok(()));
    assert_eq!(tacho.state(), SystemState::Running);
    assert_eq!(edge.pin, Some(18));
    assert_eq!(timer.timer_id, Some(3));
    assert_eq!(timer.period_ms, 500);
}

#[test]
fn test_initialize_is_idempotent() {
    let tacho = Tachometer::new(Config::default());
    let mut edge = FakeEdgeService::default();
    let mut timer = FakeTimer::default();

    assert_eq!(tacho.initialize(&mut edge, &mut timer), Ok(()));
    assert_eq!(tacho.initialize(&mut edge, &mut timer), Ok(()));

    assert_eq!(edge.attaches, 1);
    assert_eq!(timer.starts, 1);
}

#[test]
fn test_unsupported_pin_faults_and_releases_timer() {
    let tacho = Tachometer::new(Config {
        sensor_pin: 7,
        ..Config::default()
    });
    let mut edge = FakeEdgeService::failing(HardwareError::UnsupportedPin(7));
    let mut timer = FakeTimer::default();

    assert_eq!(
        tacho.initialize(&mut edge, &mut timer),
        Err(InitError::Hardware(HardwareError::UnsupportedPin(7)))
    );
    assert_eq!(tacho.state(), SystemState::Error);
    assert_eq!(timer.stops, 1);
    assert!(timer.handler.is_none());
}

#[test]
fn test_timer_failure_skips_edge_registration() {
    let tacho = Tachometer::new(Config::default());
    let mut edge = FakeEdgeService::default();
    let mut timer = FakeTimer {
        fail_start: Some(HardwareError::TimerBusy(1)),
        ..FakeTimer::default()
    };

    assert_eq!(
        tacho.initialize(&mut edge, &mut timer),
        Err(InitError::Hardware(HardwareError::TimerBusy(1)))
    );
    assert_eq!(edge.attaches, 0);
    assert_eq!(tacho.state(), SystemState::Error);
}

#[test]
fn test_error_state_is_terminal() {
    let tacho = Tachometer::new(Config::default());
    let mut edge = FakeEdgeService::failing(HardwareError::UnsupportedPin(2));
    let mut timer = FakeTimer::default();
    assert!(tacho.initialize(&mut edge, &mut timer).is_err());

    let mut edge = FakeEdgeService::default();
    assert_eq!(tacho.initialize(&mut edge, &mut timer), Err(InitError::Faulted));
    assert_eq!(edge.attaches, 0);
}

#[test]
fn test_failed_instance_keeps_zero_readings() {
    let tacho = Tachometer::new(Config::default());
    let mut edge = FakeEdgeService::failing(HardwareError::UnsupportedPin(2));
    let mut timer = FakeTimer::default();
    let _ = tacho.initialize(&mut edge, &mut timer);

    assert_eq!(tacho.current_rpm(), 0);
    assert!(!tacho.is_new_data_available());
}

#[test]
fn test_independent_instances_coexist() {
    let first = Tachometer::new(Config {
        debounce_micros: 0,
        ..Config::default()
    });
    let second = Tachometer::new(Config {
        debounce_micros: 0,
        sensor_pin: 3,
        timer_id: 4,
        ..Config::default()
    });

    let (mut edge_a, mut timer_a) = (FakeEdgeService::default(), FakeTimer::default());
    let (mut edge_b, mut timer_b) = (FakeEdgeService::default(), FakeTimer::default());
    first.initialize(&mut edge_a, &mut timer_a).unwrap();
    second.initialize(&mut edge_b, &mut timer_b).unwrap();

    for t in 1..=4 {
        edge_a.edge(t * 10);
    }
    edge_b.edge(10);
    timer_a.fire();
    timer_b.fire();

    assert_eq!(first.current_frequency_hz(), 4);
    assert_eq!(second.current_frequency_hz(), 1);
}

#[test]
fn test_new_data_flag_is_single_shot() {
    let tacho = Tachometer::new(Config::default());
    let mut edge = FakeEdgeService::default();
    let mut timer = FakeTimer::default();
    tacho.initialize(&mut edge, &mut timer).unwrap();

    assert!(!tacho.is_new_data_available());
    timer.fire();
    assert!(tacho.is_new_data_available());
    assert!(!tacho.is_new_data_available());

    timer.fire();
    timer.fire();
    assert!(tacho.is_new_data_available());
    assert!(!tacho.is_new_data_available());
}

#[test]
fn test_sample_period_reprograms_timer() {
    let tacho = Tachometer::new(Config::default());
    let mut edge = FakeEdgeService::default();
    let mut timer = FakeTimer::default();
    tacho.initialize(&mut edge, &mut timer).unwrap();

    assert_eq!(tacho.set_sample_period(200, &mut timer), Ok(()));
    assert_eq!(timer.period_ms, 200);
    assert_eq!(tacho.sample_period_ms(), 200);

    // 3 pulses in 200 ms
    for t in 1..=3 {
        edge.edge(t * 1_000);
    }
    timer.fire();
    assert_eq!(tacho.current_frequency_hz(), 15);
}

#[test]
fn test_short_sample_period_rejected() {
    let tacho = Tachometer::new(Config::default());
    let mut edge = FakeEdgeService::default();
    let mut timer = FakeTimer::default();
    tacho.initialize(&mut edge, &mut timer).unwrap();

    assert_eq!(
        tacho.set_sample_period(99, &mut timer),
        Err(SamplePeriodError::Config(ConfigError::SamplePeriodTooShort))
    );
    assert_eq!(timer.period_ms, 1000);
    assert_eq!(tacho.sample_period_ms(), 1000);
}

#[test]
fn test_timer_rejection_keeps_previous_period() {
    let tacho = Tachometer::new(Config::default());
    let mut edge = FakeEdgeService::default();
    let mut timer = FakeTimer::default();
    tacho.initialize(&mut edge, &mut timer).unwrap();

    timer.fail_set_period = Some(HardwareError::InvalidPeriod(60_000));
    assert_eq!(
        tacho.set_sample_period(60_000, &mut timer),
        Err(SamplePeriodError::Hardware(HardwareError::InvalidPeriod(60_000)))
    );
    assert_eq!(tacho.sample_period_ms(), 1000);
}

#[test]
fn test_sample_period_before_initialize_is_used_at_start() {
    let tacho = Tachometer::new(Config::default());
    let mut edge = FakeEdgeService::default();
    let mut timer = FakeTimer::default();

    assert_eq!(tacho.set_sample_period(400, &mut timer), Ok(()));
    assert_eq!(timer.starts, 0);

    tacho.initialize(&mut edge, &mut timer).unwrap();
    assert_eq!(timer.period_ms, 400);
}
