// src/graphics/animation.rs

//! Animations that move a buffer's viewport over a number of render cycles.

use log::{trace, warn};

use super::{Direction, PixelBuffer};

/// A stateful stepper driven once per render cycle.
///
/// Once an animation reports done it stays done; further steps are no-ops.
pub trait Animation: Send {
    /// Advances the animation by one render cycle.
    fn perform_step(&mut self, buffer: &mut PixelBuffer);

    fn is_done(&self) -> bool;
}

/// Scrolls the whole content of a buffer across the screen.
///
/// On construction the content is moved fully off-screen on the entry side,
/// so the first visible frame is blank. The content then enters, crosses the
/// screen and leaves on the other side, which takes `width + screen_size`
/// unit shifts.
#[derive(Debug)]
pub struct HorizontalScroll {
    direction: Direction,
    speed_divisor: u32,
    step_counter: u32,
    shifts_remaining: usize,
    done: bool,
}

impl HorizontalScroll {
    /// Prepares `buffer` for a scroll in `direction` over a screen of
    /// `screen_size` columns. One shift happens every `speed_divisor` steps.
    pub fn new(
        buffer: &mut PixelBuffer,
        screen_size: usize,
        direction: Direction,
        speed_divisor: u32,
    ) -> Self {
        let direction = if direction.is_horizontal() {
            direction
        } else {
            warn!(
                "HorizontalScroll: {:?} is not a horizontal direction, scrolling left",
                direction
            );
            Direction::Left
        };
        let speed_divisor = speed_divisor.max(1);
        let shifts_remaining = buffer.width() + screen_size;

        match direction {
            Direction::Left => buffer.shift(Direction::Right, screen_size),
            _ => buffer.shift(Direction::Left, buffer.width()),
        }

        Self {
            direction,
            speed_divisor,
            step_counter: 0,
            shifts_remaining,
            done: shifts_remaining == 0,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Number of unit shifts still to perform.
    pub fn shifts_remaining(&self) -> usize {
        self.shifts_remaining
    }
}

impl Animation for HorizontalScroll {
    fn perform_step(&mut self, buffer: &mut PixelBuffer) {
        if self.done {
            return;
        }
        self.step_counter = self.step_counter.wrapping_add(1);
        if self.step_counter % self.speed_divisor == 0 {
            buffer.shift(self.direction, 1);
            self.shifts_remaining -= 1;
            trace!(
                "HorizontalScroll: {} shifts remaining",
                self.shifts_remaining
            );
            if self.shifts_remaining == 0 {
                self.done = true;
            }
        }
    }

    fn is_done(&self) -> bool {
        self.done
    }
}
