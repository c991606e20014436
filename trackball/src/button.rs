//! Button state machine: shift modifier, mouse buttons and click-drag.

use embedded_hal::digital::InputPin;

use crate::store::{ButtonFunction, DeviceConfig, NUM_BUTTONS};

/// Source of the raw pin state, one bit per GPIO number.
///
/// Buttons are active-low: a cleared bit means the button is pressed.
pub trait PinSampler {
    fn sample(&mut self) -> u32;
}

/// Samples a set of pulled-up button pins into a GPIO bitmask
pub struct ButtonPins<In: InputPin, const N: usize> {
    pins: [In; N],
    gpio_numbers: [u8; N],
}

impl<In: InputPin, const N: usize> ButtonPins<In, N> {
    /// `gpio_numbers[i]` is the bit position of `pins[i]` in the sampled mask
    pub fn new(pins: [In; N], gpio_numbers: [u8; N]) -> Self {
        Self { pins, gpio_numbers }
    }
}

impl<In: InputPin, const N: usize> PinSampler for ButtonPins<In, N> {
    fn sample(&mut self) -> u32 {
        let mut state = u32::MAX;
        for (pin, &gpio) in self.pins.iter_mut().zip(self.gpio_numbers.iter()) {
            // A pin that can't be read is reported as released
            if pin.is_low().unwrap_or(false) {
                state &= !pin_mask(gpio);
            }
        }
        state
    }
}

fn pin_mask(gpio: u8) -> u32 {
    1u32.checked_shl(gpio as u32).unwrap_or(0)
}

/// Whether the button on `gpio` is pressed in the sampled state
pub fn is_pressed(pin_state: u32, gpio: u8) -> bool {
    let mask = pin_mask(gpio);
    mask != 0 && pin_state & mask == 0
}

/// True if any button mapped to shift is held.
///
/// Only the unshifted table decides which buttons are modifiers.
pub fn shift_active(config: &DeviceConfig, pin_state: u32, button_pins: &[u8; NUM_BUTTONS]) -> bool {
    config
        .button_function
        .iter()
        .zip(button_pins.iter())
        .any(|(&function, &gpio)| function == ButtonFunction::Shift && is_pressed(pin_state, gpio))
}

/// Edge-tracking state of the buttons, kept across cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonState {
    prev_pin_state: u32,
    click_drag: bool,
}

impl Default for ButtonState {
    fn default() -> Self {
        Self {
            prev_pin_state: u32::MAX,
            click_drag: false,
        }
    }
}

impl ButtonState {
    pub fn click_drag(&self) -> bool {
        self.click_drag
    }

    /// Compute the report's button byte for this cycle and remember the pin state.
    pub fn process(
        &mut self,
        config: &DeviceConfig,
        pin_state: u32,
        button_pins: &[u8; NUM_BUTTONS],
        shifted: bool,
    ) -> u8 {
        let mut buttons = 0u8;
        for (i, &gpio) in button_pins.iter().enumerate() {
            // Shift buttons consume the press, whatever the shifted table says
            if config.button_function[i] == ButtonFunction::Shift {
                continue;
            }
            let function = if shifted {
                config.button_shifted_function[i]
            } else {
                config.button_function[i]
            };
            let pressed = is_pressed(pin_state, gpio);
            match function {
                ButtonFunction::ClickDrag => {
                    if pressed && !is_pressed(self.prev_pin_state, gpio) {
                        self.click_drag = !self.click_drag;
                        debug!("Click-drag toggled: {}", self.click_drag);
                    }
                }
                f => {
                    if pressed {
                        buttons |= f.report_bit().unwrap_or(0);
                    }
                }
            }
        }

        if self.click_drag {
            buttons |= ButtonFunction::Button1.report_bit().unwrap_or(0);
        }

        self.prev_pin_state = pin_state;
        buttons
    }
}
