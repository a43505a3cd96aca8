//! LED chaser showing that the loop is alive
//!
//! One LED of the ring is lit at a time and the lit position walks around the
//! ring at a speed that follows the gyroscope X rate, so rotating the board
//! visibly speeds up or reverses the chase.

use embedded_hal::digital::OutputPin;

use crate::error::{HarnessError, Result};

/// Number of LEDs on the ring
pub const RING_SIZE: usize = 8;

/// Position counter steps per LED
const STEPS_PER_LED: i32 = 10;

/// Gyroscope rate (deg/s) that changes the speed by one step per iteration
const RATE_PER_SPEED_STEP: f32 = 180.0;

/// Chasing light over a ring of [`RING_SIZE`] LEDs
pub struct LedChaser<P> {
    leds: [P; RING_SIZE],
    /// Position counter; the lit LED is `position / 10`
    position: i32,
    /// Counter steps per iteration, may be negative
    speed: i32,
}

impl<P: OutputPin> LedChaser<P> {
    /// Take ownership of the ring, starting at speed 1
    pub fn new(leds: [P; RING_SIZE]) -> Self {
        Self {
            leds,
            position: 0,
            speed: 1,
        }
    }

    /// Move the lit LED by the current speed
    pub fn bump(&mut self) -> Result<()> {
        let previous = self.lit();
        self.position = self.position.wrapping_add(self.speed);
        let next = self.lit();

        self.leds[previous].set_low().map_err(|_| HarnessError::Indicator)?;
        self.leds[next].set_high().map_err(|_| HarnessError::Indicator)?;
        Ok(())
    }

    /// Fold the gyroscope X rate (deg/s) into the running speed
    pub fn adjust_speed(&mut self, gyroscope_x: f32) {
        self.speed = (self.speed as f32 + gyroscope_x / RATE_PER_SPEED_STEP) as i32;
    }

    /// Index of the LED that is currently lit
    pub fn lit(&self) -> usize {
        (self.position / STEPS_PER_LED).rem_euclid(RING_SIZE as i32) as usize
    }

    /// Current speed in counter steps per iteration
    pub fn speed(&self) -> i32 {
        self.speed
    }

    /// Release the LED pins
    pub fn release(self) -> [P; RING_SIZE] {
        self.leds
    }
}
