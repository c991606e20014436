//! The per-cycle polling loop.

use embassy_time::{Duration, Instant, Timer};

use crate::button::{PinSampler, shift_active};
use crate::config::TrackballConfig;
use crate::report::{PointerReport, ReportTransport, emit};
use crate::sensor::{MotionData, MotionSensor, wanted_cpi};
use crate::state::{DeviceState, SharedState};
use crate::store::{NUM_BUTTONS, NUM_SENSORS};

/// Owns the sensors, the button pins and the report transport, and runs the pipeline.
pub struct Trackball<'a, S: MotionSensor, P: PinSampler, T: ReportTransport> {
    sensors: [S; NUM_SENSORS],
    pins: P,
    transport: T,
    shared: &'a SharedState,
    button_pins: [u8; NUM_BUTTONS],
    poll_interval: Duration,
    state: DeviceState,
}

impl<'a, S: MotionSensor, P: PinSampler, T: ReportTransport> Trackball<'a, S, P, T> {
    pub fn new(
        sensors: [S; NUM_SENSORS],
        pins: P,
        transport: T,
        shared: &'a SharedState,
        config: &TrackballConfig,
    ) -> Self {
        Self {
            sensors,
            pins,
            transport,
            shared,
            button_pins: config.button_pins,
            poll_interval: config.poll_interval,
            state: DeviceState::default(),
        }
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn transport(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn sensors(&mut self) -> &mut [S; NUM_SENSORS] {
        &mut self.sensors
    }

    /// Run one cycle: sample, map, quantize, classify and emit.
    ///
    /// Returns the report if it was handed to the transport.
    pub async fn run_cycle(&mut self) -> Option<PointerReport> {
        // Changes from the host take effect at cycle boundaries
        let config = self.shared.config();
        let resolution_multiplier = self.shared.resolution_multiplier();

        let pin_state = self.pins.sample();
        let shifted = shift_active(&config, pin_state, &self.button_pins);

        for (i, sensor) in self.sensors.iter_mut().enumerate() {
            if let Some(cpi) = wanted_cpi(&config, i, shifted, self.state.current_cpi[i]) {
                match sensor.set_cpi(cpi as u16 * 100).await {
                    Ok(()) => {
                        debug!("Sensor {}: CPI set to {}", i, cpi as u16 * 100);
                        self.state.current_cpi[i] = cpi;
                    }
                    Err(e) => warn!("Sensor {}: failed to set CPI: {:?}", i, e),
                }
            }
        }

        let mut motion = [MotionData::default(); NUM_SENSORS];
        for (i, sensor) in self.sensors.iter_mut().enumerate() {
            match sensor.read_motion().await {
                Ok(m) => motion[i] = m,
                Err(e) => warn!("Sensor {}: read motion error: {:?}", i, e),
            }
        }

        let report = self.state.process(
            &config,
            pin_state,
            &self.button_pins,
            &motion,
            resolution_multiplier,
            Instant::now(),
        );

        if emit(&mut self.transport, &report).await {
            Some(report)
        } else {
            None
        }
    }

    pub async fn run(&mut self) -> ! {
        info!("Trackball polling started");
        loop {
            if self.run_cycle().await.is_none() {
                // Nothing was sent, give the USB task room before the next poll
                Timer::after(self.poll_interval).await;
            }
        }
    }
}
