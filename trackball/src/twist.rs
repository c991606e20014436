//! Twist-to-scroll: decide whether the ball is moving the cursor or scrolling.
//!
//! Both sensors see motion when the ball rolls, but only the scroll sensor sees much of it
//! when the ball is twisted around the vertical axis. The classifier keeps exponentially
//! smoothed averages of the CPI-normalized motion and commits to "scrolling" or "moving
//! the cursor" until the ball stops, zeroing scroll output while it thinks the user is
//! moving the cursor. Cursor motion is never suppressed.
//!
//! The thresholds only make sense with the default sensor layout and were tuned at roughly
//! 500 samples per second. Shifted mappings are not considered and false positives still
//! happen occasionally.

use crate::store::SensorFunction;

const DECAY: f32 = 0.9;
const WEIGHT: f32 = 0.1;

/// Cursor averages below this leave cursor mode
pub const CURSOR_EXIT: f32 = 0.1 / 12.0;
/// Vertical scroll average below this leaves scroll mode
pub const SCROLL_EXIT: f32 = 0.1 / 16.0;
/// Cursor average magnitude above this enters cursor mode
pub const CURSOR_ENTER: f32 = 2.0 / 12.0;
/// Vertical scroll average magnitude above this enters scroll mode
pub const SCROLL_ENTER: f32 = 2.0 / 16.0;

/// Exponentially smoothed motion per logical function
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningAverages {
    pub x: f32,
    pub y: f32,
    pub vscroll: f32,
    pub hscroll: f32,
}

impl RunningAverages {
    pub fn decay(&mut self) {
        self.x *= DECAY;
        self.y *= DECAY;
        self.vscroll *= DECAY;
        self.hscroll *= DECAY;
    }

    /// Add a mapped delta, normalized by the sensor's current CPI.
    ///
    /// Nothing is added while the sensor has no CPI applied yet.
    pub fn add(&mut self, function: SensorFunction, delta: i16, cpi: u8) {
        if cpi == 0 {
            return;
        }
        let value = WEIGHT * delta as f32 / cpi as f32;
        match function {
            SensorFunction::None => {}
            SensorFunction::CursorX => self.x += value,
            SensorFunction::CursorY => self.y += value,
            SensorFunction::VerticalScroll => self.vscroll += value,
            SensorFunction::HorizontalScroll => self.hscroll += value,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TwistToScroll {
    pub averages: RunningAverages,
    scroll_mode: bool,
    not_scroll_mode: bool,
}

impl TwistToScroll {
    pub fn scroll_mode(&self) -> bool {
        self.scroll_mode
    }

    pub fn not_scroll_mode(&self) -> bool {
        self.not_scroll_mode
    }

    /// Start a new cycle, the averages fade before the new motion is added
    pub fn decay(&mut self) {
        self.averages.decay();
    }

    /// Update the modes from the current averages.
    ///
    /// Returns true if the vertical scroll output of this cycle must be suppressed.
    pub fn evaluate(&mut self) -> bool {
        let RunningAverages { x, y, vscroll, .. } = self.averages;

        if x.abs() < CURSOR_EXIT && y.abs() < CURSOR_EXIT {
            self.not_scroll_mode = false;
        }

        if vscroll.abs() < SCROLL_EXIT {
            self.scroll_mode = false;
        }

        if !self.scroll_mode && x * x + y * y > CURSOR_ENTER * CURSOR_ENTER {
            if !self.not_scroll_mode {
                trace!("Twist-to-scroll: cursor mode");
            }
            self.not_scroll_mode = true;
        }

        if !self.not_scroll_mode && vscroll * vscroll > SCROLL_ENTER * SCROLL_ENTER {
            if !self.scroll_mode {
                trace!("Twist-to-scroll: scroll mode");
            }
            self.scroll_mode = true;
        }

        !self.scroll_mode || self.not_scroll_mode
    }
}
