pub mod common;

use embassy_futures::block_on;
use trackball::config::TrackballConfig;
use trackball::pipeline::Trackball;
use trackball::report::PointerReport;
use trackball::state::SharedState;
use trackball::store::{ButtonFunction, ConfigStore, DeviceConfig};

use crate::common::{TestPins, TestSensor, TestTransport, host_record};

fn new_trackball<'a>(
    shared: &'a SharedState,
    sensors: &[TestSensor; 2],
    pins: &TestPins,
) -> Trackball<'a, TestSensor, TestPins, TestTransport> {
    Trackball::new(
        sensors.clone(),
        pins.clone(),
        TestTransport::new(),
        shared,
        &TrackballConfig::default(),
    )
}

fn shared_with(config: DeviceConfig) -> SharedState {
    SharedState::new(ConfigStore::new(config))
}

#[test]
fn test_cpi_is_written_once() {
    let shared = SharedState::default();
    let sensors = [TestSensor::default(), TestSensor::default()];
    let pins = TestPins::new();
    let mut trackball = new_trackball(&shared, &sensors, &pins);

    block_on(async {
        trackball.run_cycle().await;
        trackball.run_cycle().await;
    });
    assert_eq!(*sensors[0].cpi_writes.borrow(), vec![600]);
    assert_eq!(*sensors[1].cpi_writes.borrow(), vec![800]);
    assert_eq!(trackball.state().current_cpi, [6, 8]);
}

#[test]
fn test_failed_cpi_write_is_retried() {
    let shared = SharedState::default();
    let sensors = [
        TestSensor {
            fail_cpi: true,
            ..Default::default()
        },
        TestSensor::default(),
    ];
    let pins = TestPins::new();
    let mut trackball = new_trackball(&shared, &sensors, &pins);

    block_on(async {
        trackball.run_cycle().await;
        trackball.run_cycle().await;
    });
    assert_eq!(*sensors[0].cpi_writes.borrow(), vec![600, 600]);
    assert_eq!(trackball.state().current_cpi, [0, 8]);
}

#[test]
fn test_cursor_motion_report() {
    let shared = SharedState::default();
    let sensors = [TestSensor::default(), TestSensor::default()];
    let pins = TestPins::new();
    let mut trackball = new_trackball(&shared, &sensors, &pins);

    sensors[0].push(50, 3);
    let report = block_on(trackball.run_cycle());
    assert_eq!(
        report,
        Some(PointerReport {
            dx: 50,
            dy: -3,
            ..Default::default()
        })
    );
    assert_eq!(trackball.transport().reports.len(), 1);
}

#[test]
fn test_twist_scrolls_in_whole_ticks() {
    let shared = SharedState::default();
    let sensors = [TestSensor::default(), TestSensor::default()];
    let pins = TestPins::new();
    let mut trackball = new_trackball(&shared, &sensors, &pins);

    // A clear twist first, so the classifier settles on scrolling
    sensors[1].push(240, 0);
    for _ in 0..3 {
        sensors[1].push(40, 0);
    }
    let wheels: Vec<i16> = block_on(async {
        let mut wheels = Vec::new();
        for _ in 0..4 {
            wheels.push(trackball.run_cycle().await.map(|r| r.vwheel).unwrap_or_default());
        }
        wheels
    });
    assert_eq!(wheels, vec![2, 0, 0, 1]);
    assert!(trackball.state().twist.scroll_mode());
}

#[test]
fn test_high_resolution_scroll() {
    let shared = SharedState::default();
    shared.set_resolution_multiplier(0b001);
    let sensors = [TestSensor::default(), TestSensor::default()];
    let pins = TestPins::new();
    let mut trackball = new_trackball(&shared, &sensors, &pins);

    sensors[1].push(240, 0);
    sensors[1].push(45, 0);
    let first = block_on(trackball.run_cycle());
    let second = block_on(trackball.run_cycle());
    assert_eq!(first.map(|r| r.vwheel), Some(240));
    assert_eq!(second.map(|r| r.vwheel), Some(45));
}

#[test]
fn test_click_drag_latches_button_one() {
    let mut config = DeviceConfig::default();
    config.button_function[2] = ButtonFunction::ClickDrag;
    let shared = shared_with(config);
    let sensors = [TestSensor::default(), TestSensor::default()];
    let pins = TestPins::new();
    let mut trackball = new_trackball(&shared, &sensors, &pins);

    let mut buttons = Vec::new();
    block_on(async {
        for step in [true, false, false, true, false] {
            if step {
                pins.press(24);
            } else {
                pins.release(24);
            }
            buttons.push(trackball.run_cycle().await.map(|r| r.buttons).unwrap_or_default());
        }
    });
    assert_eq!(buttons, vec![1, 1, 1, 0, 0]);
}

#[test]
fn test_shift_switches_cpi_and_buttons() {
    let mut config = DeviceConfig::default();
    config.button_function[3] = ButtonFunction::Shift;
    config.sensor_shifted_cpi = [2, 4];
    config.button_shifted_function[0] = ButtonFunction::Button4;
    let shared = shared_with(config);
    let sensors = [TestSensor::default(), TestSensor::default()];
    let pins = TestPins::new();
    let mut trackball = new_trackball(&shared, &sensors, &pins);

    pins.press(26);
    pins.press(16);
    let shifted = block_on(trackball.run_cycle()).map(|r| r.buttons);
    pins.release(26);
    let unshifted = block_on(trackball.run_cycle()).map(|r| r.buttons);

    assert_eq!(shifted, Some(1 << 3));
    assert_eq!(unshifted, Some(1 << 0));
    assert_eq!(*sensors[0].cpi_writes.borrow(), vec![200, 600]);
    assert_eq!(*sensors[1].cpi_writes.borrow(), vec![400, 800]);
}

#[test]
fn test_report_dropped_while_host_not_ready() {
    let shared = SharedState::default();
    let sensors = [TestSensor::default(), TestSensor::default()];
    let pins = TestPins::new();
    let mut trackball = new_trackball(&shared, &sensors, &pins);
    trackball.transport().ready = false;

    sensors[0].push(10, 0);
    assert_eq!(block_on(trackball.run_cycle()), None);
    assert!(trackball.transport().reports.is_empty());
    // The cycle still ran
    assert_eq!(trackball.state().current_cpi, [6, 8]);
    assert!(trackball.state().twist.averages.x > 0.0);
}

#[test]
fn test_host_config_applies_next_cycle() {
    let shared = SharedState::default();
    let sensors = [TestSensor::default(), TestSensor::default()];
    let pins = TestPins::new();
    let mut trackball = new_trackball(&shared, &sensors, &pins);

    block_on(trackball.run_cycle());
    let mut config = DeviceConfig::default();
    config.sensor_cpi = [10, 8];
    shared
        .with_store(|store| store.apply_incoming(&host_record(&config)))
        .unwrap();
    block_on(trackball.run_cycle());
    assert_eq!(*sensors[0].cpi_writes.borrow(), vec![600, 1000]);
    assert_eq!(*sensors[1].cpi_writes.borrow(), vec![800]);
}

#[test]
fn test_button_pins_come_from_board_config() {
    let shared = SharedState::default();
    let sensors = [TestSensor::default(), TestSensor::default()];
    let pins = TestPins::new();
    let config = TrackballConfig {
        button_pins: [2, 3, 4, 5],
        ..Default::default()
    };
    let mut trackball = Trackball::new(sensors.clone(), pins.clone(), TestTransport::new(), &shared, &config);

    // The default board's button 1 pin is not wired here
    pins.press(16);
    assert_eq!(block_on(trackball.run_cycle()).map(|r| r.buttons), Some(0));
    pins.release(16);
    pins.press(4);
    assert_eq!(block_on(trackball.run_cycle()).map(|r| r.buttons), Some(1 << 1));
}
