/// Reboot into the mass-storage bootloader so new firmware can be flashed.
///
/// Without a bootloader to jump to the device just reboots.
pub fn jump_to_bootloader() {
    #[cfg(feature = "rp2040")]
    // Jump to the RP2040 USB boot ROM, no activity LED and all interfaces enabled
    embassy_rp::rom_data::reset_to_usb_boot(0, 0);

    #[cfg(not(feature = "rp2040"))]
    warn!("No bootloader available on this target");

    reboot_trackball();
}

pub(crate) fn reboot_trackball() {
    warn!("Rebooting trackball!");
    #[cfg(all(
        target_arch = "arm",
        target_os = "none",
        any(target_abi = "eabi", target_abi = "eabihf")
    ))]
    cortex_m::peripheral::SCB::sys_reset();
}
