//! Input core of a dual-sensor trackball: button and sensor mapping, scroll quantization,
//! twist-to-scroll and a host-configurable, flash-persisted configuration.
//!
//! ## Feature flags
#![doc = document_features::document_features!()]
#![no_std]
#![allow(async_fn_in_trait)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod boot;
pub mod button;
pub mod config;
pub mod pipeline;
pub mod report;
pub mod scroll;
pub mod sensor;
pub mod state;
pub mod store;
pub mod twist;
pub mod usb;

use embassy_futures::join::join;
use embassy_usb::UsbDevice;
use embassy_usb::driver::Driver;
use embedded_storage::nor_flash::NorFlash;

use crate::button::PinSampler;
use crate::pipeline::Trackball;
use crate::sensor::MotionSensor;
use crate::state::SharedState;
use crate::store::{ConfigStorage, ConfigStore};
use crate::usb::UsbPointerWriter;

pub(crate) type RawMutex = embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

/// Build the shared state from whatever valid record the flash holds, defaults otherwise.
pub fn load_shared_state<F: NorFlash>(storage: &mut ConfigStorage<F>) -> SharedState {
    let mut store = ConfigStore::default();
    storage.load_into(&mut store);
    SharedState::new(store)
}

/// Run the USB device and the trackball polling loop together.
///
/// The HID class, request handler and device handler must already be registered on the
/// builder `usb_device` was built from.
pub async fn run_trackball<'d, D: Driver<'d>, S: MotionSensor, P: PinSampler>(
    mut usb_device: UsbDevice<'d, D>,
    trackball: &mut Trackball<'_, S, P, UsbPointerWriter<'_, 'd, D>>,
) {
    info!("Trackball started");
    join(usb_device.run(), trackball.run()).await;
}
