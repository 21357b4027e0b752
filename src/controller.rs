// Per-frame targeting decision: select, compute error, compute speeds
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

use crate::command::{ActuatorCommand, MotorCommand};
use crate::speed::{AxisSpeedLaw, MotorSpeedParams};
use crate::target::{select_foe, ClassMap, MarkerObservation, Selection};
use crate::tracking::{compute_error, FrameReference, PixelError};

/// Motor speeds computed for a tracked foe.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aim<F> {
    /// The selected foe
    pub target: MarkerObservation,
    /// Foe center minus aim point
    pub error: PixelError,
    /// Pan speed, zero inside the deadzone
    pub speed_x: F,
    /// Tilt speed, zero inside the deadzone
    pub speed_y: F,
}

impl<F: FloatCore> Aim<F> {
    /// The wire command for this aim.
    pub fn command(&self) -> ActuatorCommand {
        ActuatorCommand::AxisSpeeds {
            x: MotorCommand::from_speed(self.speed_x),
            y: MotorCommand::from_speed(self.speed_y),
        }
    }

    /// Whether the foe sits inside the deadzone on both axes.
    pub fn on_target(&self) -> bool {
        self.speed_x == F::zero() && self.speed_y == F::zero()
    }
}

/// What the controller decided for one frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Decision<F> {
    /// No foe in view; nothing to actuate.
    NoTarget,
    /// Several foes in view; actuation is withheld.
    Ambiguous {
        /// Number of foe observations in the frame
        count: usize,
    },
    /// Exactly one foe in view.
    Track(Aim<F>),
}

impl<F: FloatCore> Decision<F> {
    /// The aim, if a foe is tracked.
    pub fn aim(&self) -> Option<&Aim<F>> {
        match self {
            Decision::Track(aim) => Some(aim),
            _ => None,
        }
    }

    /// The axis command to send, if any.
    pub fn command(&self) -> Option<ActuatorCommand> {
        self.aim().map(Aim::command)
    }
}

/// Session settings needed to build a [`ServoController`] once the frame size is known.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackingSetup<F: FloatCore> {
    /// Foe and friendly marker IDs
    pub classes: ClassMap,
    /// Deadzone half-width in pixels, shared by both axes
    pub deadzone: u32,
    /// Aim point shift from the frame center
    pub aim_offset: (i32, i32),
    /// Pan speed law parameters
    pub x_params: MotorSpeedParams<F>,
    /// Tilt speed law parameters
    pub y_params: MotorSpeedParams<F>,
}

impl<F> TrackingSetup<F>
where
    F: FloatCore + 'static,
    i32: AsPrimitive<F>,
    u8: AsPrimitive<F>,
{
    /// Builds the controller for frames of `width` x `height` pixels.
    pub fn controller(&self, width: u32, height: u32) -> ServoController<F> {
        let (dx, dy) = self.aim_offset;
        let reference = FrameReference::centered(width, height, self.deadzone).with_offset(dx, dy);
        ServoController::new(self.classes.clone(), reference, self.x_params, self.y_params)
    }
}

/// The stateless part of the servo loop.
///
/// The controller holds only session configuration; [`decide`](Self::decide) is a pure function
/// of the frame's observations.
#[derive(Clone, Debug)]
pub struct ServoController<F: FloatCore> {
    classes: ClassMap,
    reference: FrameReference,
    x_law: AxisSpeedLaw<F>,
    y_law: AxisSpeedLaw<F>,
}

impl<F> ServoController<F>
where
    F: FloatCore + 'static,
    i32: AsPrimitive<F>,
    u8: AsPrimitive<F>,
{
    /// Creates a controller; both axes use the deadzone of `reference`.
    pub fn new(
        classes: ClassMap,
        reference: FrameReference,
        x_params: MotorSpeedParams<F>,
        y_params: MotorSpeedParams<F>,
    ) -> Self {
        let deadzone = reference.deadzone();
        Self {
            classes,
            reference,
            x_law: AxisSpeedLaw::new(x_params, deadzone),
            y_law: AxisSpeedLaw::new(y_params, deadzone),
        }
    }

    /// Marker classification used by [`decide`](Self::decide).
    pub fn classes(&self) -> &ClassMap {
        &self.classes
    }

    /// Aim point and deadzone.
    pub fn reference(&self) -> &FrameReference {
        &self.reference
    }

    /// Decides what to do about one frame's observations.
    ///
    /// Several foes yield [`Decision::Ambiguous`] and no foe yields [`Decision::NoTarget`];
    /// otherwise both axis speeds are computed from the foe's pixel error.
    pub fn decide(&self, observations: &[MarkerObservation]) -> Decision<F> {
        match select_foe(observations, &self.classes) {
            Selection::NoFoe => Decision::NoTarget,
            Selection::Ambiguous { count } => Decision::Ambiguous { count },
            Selection::Foe(target) => {
                let error = compute_error(target.center, self.reference.center());
                Decision::Track(Aim {
                    target,
                    error,
                    speed_x: self.x_law.speed(error.x),
                    speed_y: self.y_law.speed(error.y),
                })
            }
        }
    }
}
