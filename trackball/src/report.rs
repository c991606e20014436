//! The pointer report sent to the host and the transport it's sent over.

use byteorder::{ByteOrder, LittleEndian};

/// Report id of the pointer input report
pub const POINTER_REPORT_ID: u8 = 1;
/// Feature report id of the resolution multiplier
pub const RESOLUTION_MULTIPLIER_REPORT_ID: u8 = 2;
/// Feature report id of the configuration record
pub const CONFIG_REPORT_ID: u8 = 3;

/// Serialized size of [`PointerReport`], without the report id
pub const POINTER_REPORT_SIZE: usize = 9;

/// Pointer report: buttons, cursor motion and both wheels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PointerReport {
    pub buttons: u8,
    pub dx: i16,
    pub dy: i16,
    pub vwheel: i16,
    pub hwheel: i16,
}

impl PointerReport {
    /// Packed little-endian layout: buttons, dx, dy, vwheel, hwheel
    pub fn serialize(&self) -> [u8; POINTER_REPORT_SIZE] {
        let mut buf = [0u8; POINTER_REPORT_SIZE];
        buf[0] = self.buttons;
        LittleEndian::write_i16(&mut buf[1..3], self.dx);
        LittleEndian::write_i16(&mut buf[3..5], self.dy);
        LittleEndian::write_i16(&mut buf[5..7], self.vwheel);
        LittleEndian::write_i16(&mut buf[7..9], self.hwheel);
        buf
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidError {
    /// The endpoint is disabled, usually because the host is gone
    UsbDisabled,
    BufferOverflow,
}

/// Channel which carries pointer reports to the host
pub trait ReportTransport {
    /// Whether the host session is up and a report can be sent
    fn ready(&self) -> bool;

    /// Write report to the host, return the number of bytes written if success.
    async fn write_report(&mut self, report: &PointerReport) -> Result<usize, HidError>;
}

/// Send the report if the transport can take it.
///
/// A report which can't be sent is dropped, the next cycle supersedes it. Returns whether
/// the report was written.
pub async fn emit<T: ReportTransport>(transport: &mut T, report: &PointerReport) -> bool {
    if !transport.ready() {
        return false;
    }
    match transport.write_report(report).await {
        Ok(_) => true,
        Err(e) => {
            warn!("Failed to send pointer report: {:?}", e);
            false
        }
    }
}
