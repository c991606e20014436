mod descriptor;

use embassy_usb::class::hid::{
    Config, HidBootProtocol, HidSubclass, HidWriter, ReportId, RequestHandler, State,
};
use embassy_usb::control::OutResponse;
use embassy_usb::driver::{Driver, EndpointError};
use embassy_usb::{Builder, Handler};
use embedded_storage::nor_flash::NorFlash;
use static_cell::StaticCell;

pub use descriptor::TRACKBALL_REPORT_DESCRIPTOR;

use crate::boot::jump_to_bootloader;
use crate::config::TrackballUsbConfig;
use crate::report::{
    CONFIG_REPORT_ID, HidError, POINTER_REPORT_ID, POINTER_REPORT_SIZE, PointerReport, RESOLUTION_MULTIPLIER_REPORT_ID,
    ReportTransport,
};
use crate::state::SharedState;
use crate::store::{CONFIG_SIZE, ConfigCommand, ConfigStorage};

/// Size of the pointer report on the interrupt endpoint, report id included
pub const POINTER_PACKET_SIZE: usize = POINTER_REPORT_SIZE + 1;

/// Handles GET_REPORT and SET_REPORT requests for the feature reports.
///
/// Report 2 carries the resolution multiplier, report 3 the configuration record. A valid
/// configuration written by the host is applied, its command is run and it's persisted.
pub struct UsbRequestHandler<'a, F: NorFlash> {
    shared: &'a SharedState,
    storage: ConfigStorage<F>,
}

impl<'a, F: NorFlash> UsbRequestHandler<'a, F> {
    pub fn new(shared: &'a SharedState, storage: ConfigStorage<F>) -> Self {
        Self { shared, storage }
    }

    pub fn storage(&mut self) -> &mut ConfigStorage<F> {
        &mut self.storage
    }

    fn set_config(&mut self, data: &[u8]) {
        let Ok(command) = self.shared.with_store(|store| store.apply_incoming(data)) else {
            return;
        };
        run_config_command(command);
        let record = self.shared.with_store(|store| store.persisted_bytes());
        if let Err(e) = self.storage.persist(&record) {
            warn!("New config is active but not persisted: {:?}", e);
        }
    }
}

fn run_config_command(command: ConfigCommand) {
    match command {
        ConfigCommand::None => {}
        ConfigCommand::ResetIntoBootloader => {
            info!("Reset into bootloader requested by the host");
            jump_to_bootloader();
        }
    }
}

/// Payload of a report written by the host, the leading report id is dropped if present
fn report_payload(id: u8, data: &[u8]) -> &[u8] {
    match data.split_first() {
        Some((&first, rest)) if first == id => rest,
        _ => data,
    }
}

impl<F: NorFlash> RequestHandler for UsbRequestHandler<'_, F> {
    fn get_report(&mut self, id: ReportId, buf: &mut [u8]) -> Option<usize> {
        debug!("Get report for {:?}", id);
        let ReportId::Feature(report_id) = id else {
            return None;
        };
        // Numbered reports go out with the report id in front
        let (head, payload) = buf.split_first_mut()?;
        *head = report_id;
        match report_id {
            RESOLUTION_MULTIPLIER_REPORT_ID if !payload.is_empty() => {
                payload[0] = self.shared.resolution_multiplier();
                Some(2)
            }
            CONFIG_REPORT_ID if payload.len() >= CONFIG_SIZE => {
                let record = self.shared.with_store(|store| store.export());
                payload[..CONFIG_SIZE].copy_from_slice(&record);
                Some(CONFIG_SIZE + 1)
            }
            _ => None,
        }
    }

    fn set_report(&mut self, id: ReportId, data: &[u8]) -> OutResponse {
        debug!("Set report for {:?}: {:?}", id, data);
        if let ReportId::Feature(report_id) = id {
            let payload = report_payload(report_id, data);
            match report_id {
                RESOLUTION_MULTIPLIER_REPORT_ID if !payload.is_empty() => {
                    info!("Resolution multiplier set to {:#x}", payload[0]);
                    self.shared.set_resolution_multiplier(payload[0]);
                }
                CONFIG_REPORT_ID if payload.len() >= CONFIG_SIZE => self.set_config(payload),
                _ => {}
            }
        }
        OutResponse::Accepted
    }
}

/// Tracks the host session in [`SharedState`]
pub struct UsbDeviceHandler<'a> {
    shared: &'a SharedState,
}

impl<'a> UsbDeviceHandler<'a> {
    pub fn new(shared: &'a SharedState) -> Self {
        Self { shared }
    }
}

impl Handler for UsbDeviceHandler<'_> {
    fn enabled(&mut self, enabled: bool) {
        if enabled {
            info!("Device enabled");
        } else {
            info!("Device disabled");
            self.shared.set_connected(false);
        }
    }

    fn reset(&mut self) {
        info!("Bus reset");
        self.shared.set_connected(false);
    }

    fn configured(&mut self, configured: bool) {
        if configured {
            info!("Device configured, high-resolution scrolling reset");
        } else {
            info!("Device is no longer configured");
        }
        self.shared.set_connected(configured);
    }

    fn suspended(&mut self, suspended: bool) {
        info!("Device suspended: {}", suspended);
    }
}

/// Sends pointer reports on the HID interrupt endpoint
pub struct UsbPointerWriter<'a, 'd, D: Driver<'d>> {
    writer: HidWriter<'d, D, POINTER_PACKET_SIZE>,
    shared: &'a SharedState,
}

impl<'a, 'd, D: Driver<'d>> UsbPointerWriter<'a, 'd, D> {
    pub fn new(writer: HidWriter<'d, D, POINTER_PACKET_SIZE>, shared: &'a SharedState) -> Self {
        Self { writer, shared }
    }
}

impl<'d, D: Driver<'d>> ReportTransport for UsbPointerWriter<'_, 'd, D> {
    fn ready(&self) -> bool {
        self.shared.connected()
    }

    async fn write_report(&mut self, report: &PointerReport) -> Result<usize, HidError> {
        let mut buf = [0u8; POINTER_PACKET_SIZE];
        buf[0] = POINTER_REPORT_ID;
        buf[1..].copy_from_slice(&report.serialize());
        self.writer.write(&buf).await.map_err(|e| match e {
            EndpointError::BufferOverflow => HidError::BufferOverflow,
            EndpointError::Disabled => HidError::UsbDisabled,
        })?;
        Ok(POINTER_REPORT_SIZE)
    }
}

pub fn new_usb_builder<'d, D: Driver<'d>>(driver: D, usb_config: TrackballUsbConfig<'d>) -> Builder<'d, D> {
    // Create embassy-usb Config
    let mut config = embassy_usb::Config::new(usb_config.vid, usb_config.pid);
    config.manufacturer = Some(usb_config.manufacturer);
    config.product = Some(usb_config.product_name);
    config.serial_number = usb_config.serial_number;
    config.max_power = usb_config.max_power;
    config.max_packet_size_0 = 64;

    const USB_BUF_SIZE: usize = 128;

    // Create embassy-usb DeviceBuilder using the driver and config.
    static CONFIG_DESC: StaticCell<[u8; USB_BUF_SIZE]> = StaticCell::new();
    static BOS_DESC: StaticCell<[u8; 16]> = StaticCell::new();
    static MSOS_DESC: StaticCell<[u8; 16]> = StaticCell::new();
    static CONTROL_BUF: StaticCell<[u8; USB_BUF_SIZE]> = StaticCell::new();

    Builder::new(
        driver,
        config,
        &mut CONFIG_DESC.init([0; USB_BUF_SIZE])[..],
        &mut BOS_DESC.init([0; 16])[..],
        &mut MSOS_DESC.init([0; 16])[..],
        &mut CONTROL_BUF.init([0; USB_BUF_SIZE])[..],
    )
}

/// Add the trackball HID interface to the builder.
///
/// The request handler answers the feature reports, see [`UsbRequestHandler`].
pub fn add_trackball_hid<'d, D: Driver<'d>>(
    builder: &mut Builder<'d, D>,
    state: &'d mut State<'d>,
    request_handler: &'d mut dyn RequestHandler,
) -> HidWriter<'d, D, POINTER_PACKET_SIZE> {
    let hid_config = Config {
        report_descriptor: TRACKBALL_REPORT_DESCRIPTOR,
        request_handler: Some(request_handler),
        poll_ms: 1,
        max_packet_size: 64,
        hid_subclass: HidSubclass::No,
        hid_boot_protocol: HidBootProtocol::None,
    };
    HidWriter::new(builder, state, hid_config)
}
