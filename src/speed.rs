// Proportional motor speed law with deadzone, dead-band and saturation
// Copyright © 2025 Hs293Go
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the "Software"),
// to deal in the Software without restriction, including without limitation
// the rights to use, copy, modify, merge, publish, distribute, sublicense,
// and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included
// in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES
// OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT.
// IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
// DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT,
// TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE
// OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use num_traits::float::FloatCore;
use num_traits::AsPrimitive;

/// Errors raised when validating [`MotorSpeedParams`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum SpeedParamsError {
    /// The minimum speed is not strictly smaller than the maximum speed
    #[cfg_attr(
        feature = "std",
        error("minimum speed must be strictly smaller than maximum speed")
    )]
    InvalidSpeedRange,

    /// The gain is zero, negative or not finite
    #[cfg_attr(feature = "std", error("gain must be finite and strictly positive"))]
    InvalidGain,
}

/// Per-axis parameters of the motor speed law.
///
/// Speeds are PWM-equivalent magnitudes in `[0, 255]`. `min_speed` is the PWM setting at which the
/// motor starts moving, `max_speed` is the largest PWM setting considered safe for the mechanism.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MotorSpeedParams<F: FloatCore> {
    /// Smallest nonzero speed magnitude ever commanded.
    /// Defaults to 100.
    min_speed: u8,

    /// Saturation limit of the speed magnitude.
    /// Defaults to 255.
    max_speed: u8,

    /// Proportional constant between pixel error and PWM value.
    /// Defaults to 1.0.
    gain: F,
}

impl<F: FloatCore> Default for MotorSpeedParams<F> {
    fn default() -> Self {
        MotorSpeedParams {
            min_speed: 100,
            max_speed: 255,
            gain: F::one(),
        }
    }
}

impl<F: FloatCore> MotorSpeedParams<F> {
    /// Returns the minimum nonzero speed magnitude.
    pub fn min_speed(&self) -> u8 {
        self.min_speed
    }

    /// Returns the saturation limit.
    pub fn max_speed(&self) -> u8 {
        self.max_speed
    }

    /// Returns the proportional gain.
    pub fn gain(&self) -> F {
        self.gain
    }

    /// Sets the speed bounds.
    ///
    /// # Arguments
    /// - `min_speed`: The speed magnitude at which the motor starts moving.
    /// - `max_speed`: The saturation limit.
    ///
    /// # Returns
    /// - `Ok(())` if the bounds were set successfully.
    /// - `Err(SpeedParamsError::InvalidSpeedRange)` if `min_speed >= max_speed`. The previous
    ///   bounds are kept.
    pub fn set_speed_range(&mut self, min_speed: u8, max_speed: u8) -> Result<(), SpeedParamsError> {
        if min_speed >= max_speed {
            return Err(SpeedParamsError::InvalidSpeedRange);
        }
        self.min_speed = min_speed;
        self.max_speed = max_speed;
        Ok(())
    }

    /// Sets the proportional gain.
    ///
    /// The gain must be finite and greater than zero, otherwise the commanded direction could
    /// disagree with the direction of the error.
    pub fn set_gain(&mut self, gain: F) -> Result<(), SpeedParamsError> {
        if gain <= F::zero() || !gain.is_finite() {
            return Err(SpeedParamsError::InvalidGain);
        }
        self.gain = gain;
        Ok(())
    }
}

/// Builder for [`MotorSpeedParams`]; every value is validated once in [`build`](Self::build).
#[derive(Copy, Clone, Debug)]
pub struct MotorSpeedParamsBuilder<F: FloatCore> {
    min_speed: u8,
    max_speed: u8,
    gain: F,
}

impl<F: FloatCore> Default for MotorSpeedParamsBuilder<F> {
    fn default() -> Self {
        let params = MotorSpeedParams::default();
        Self {
            min_speed: params.min_speed,
            max_speed: params.max_speed,
            gain: params.gain,
        }
    }
}

impl<F: FloatCore> MotorSpeedParamsBuilder<F> {
    /// Sets the minimum and maximum speed magnitudes. Checked by [`build`](Self::build).
    pub fn speed_range(mut self, min_speed: u8, max_speed: u8) -> Self {
        self.min_speed = min_speed;
        self.max_speed = max_speed;
        self
    }

    /// Sets the proportional gain. Checked by [`build`](Self::build).
    pub fn gain(mut self, gain: F) -> Self {
        self.gain = gain;
        self
    }

    /// Validates the collected values and returns the parameters.
    ///
    /// # Errors
    /// - [`SpeedParamsError::InvalidSpeedRange`] unless `min_speed < max_speed`
    /// - [`SpeedParamsError::InvalidGain`] unless the gain is finite and strictly positive
    pub fn build(self) -> Result<MotorSpeedParams<F>, SpeedParamsError> {
        let mut params = MotorSpeedParams::default();
        params.set_speed_range(self.min_speed, self.max_speed)?;
        params.set_gain(self.gain)?;
        Ok(params)
    }
}

/// Maps a signed pixel error to a signed motor speed.
///
/// This is memoryless proportional control:
/// - `|error| <= deadzone` yields exactly zero (the comparison is inclusive);
/// - otherwise the speed is `gain * error`, saturated to `max_speed` and lifted to `min_speed` in
///   magnitude, carrying the sign of `error`.
///
/// The magnitude of the result is therefore either `0` or within `[min_speed, max_speed]`.
pub fn motor_speed<F>(error: i32, deadzone: u32, params: &MotorSpeedParams<F>) -> F
where
    F: FloatCore + 'static,
    i32: AsPrimitive<F>,
    u8: AsPrimitive<F>,
{
    if error.unsigned_abs() <= deadzone {
        return F::zero();
    }

    // error is nonzero here since deadzone >= 0
    let direction = if error > 0 { F::one() } else { -F::one() };
    let max_speed: F = params.max_speed.as_();
    let min_speed: F = params.min_speed.as_();

    let error: F = error.as_();
    let raw = params.gain * error;

    if raw.abs() > max_speed {
        return direction * max_speed;
    }

    if raw.abs() < min_speed {
        return direction * min_speed;
    }

    raw
}

/// Speed law bound to one axis: its parameters plus the deadzone radius of the frame reference.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AxisSpeedLaw<F: FloatCore> {
    params: MotorSpeedParams<F>,
    deadzone: u32,
}

impl<F> AxisSpeedLaw<F>
where
    F: FloatCore + 'static,
    i32: AsPrimitive<F>,
    u8: AsPrimitive<F>,
{
    /// Binds `params` to an axis with the given deadzone.
    pub fn new(params: MotorSpeedParams<F>, deadzone: u32) -> Self {
        Self { params, deadzone }
    }

    /// Returns the speed law parameters.
    pub fn params(&self) -> &MotorSpeedParams<F> {
        &self.params
    }

    /// Returns the deadzone radius in pixels.
    pub fn deadzone(&self) -> u32 {
        self.deadzone
    }

    /// Evaluates [`motor_speed`] for this axis.
    pub fn speed(&self, error: i32) -> F {
        motor_speed(error, self.deadzone, &self.params)
    }
}
