// Actuator command literals understood by the turret firmware
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

use core::fmt;
use core::str::FromStr;

use alloc::string::ToString;
use alloc::vec::Vec;
use num_traits::float::FloatCore;

/// Signed per-axis speed as sent on the wire, in `[-255, 255]`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct MotorCommand(pub i16);

impl MotorCommand {
    /// Zero speed
    pub const STOP: MotorCommand = MotorCommand(0);

    /// Converts a continuous speed to the wire value, truncating toward zero.
    ///
    /// Speed bounds are integers, so truncation keeps a magnitude inside `[min_speed, max_speed]`.
    pub fn from_speed<F: FloatCore>(speed: F) -> Self {
        // None only for NaN, which a validated gain never produces
        MotorCommand(speed.to_i16().unwrap_or(0))
    }

    /// The signed wire value.
    pub fn value(&self) -> i16 {
        self.0
    }
}

/// Every command the firmware accepts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ActuatorCommand {
    /// Drive both axis motors, `DC_{x}_{y}`
    AxisSpeeds {
        /// Pan speed
        x: MotorCommand,
        /// Tilt speed
        y: MotorCommand,
    },
    /// Spin up the effector, `GUN_ON`
    EffectorOn,
    /// Spin down the effector, `GUN_OFF`
    EffectorOff,
    /// Fire a single trigger pulse, `TRG`
    PullTrigger,
    /// Link check, `LED_ON`
    LedOn,
    /// Link check, `LED_OFF`
    LedOff,
}

const AXIS_PREFIX: &str = "DC_";
const EFFECTOR_ON: &str = "GUN_ON";
const EFFECTOR_OFF: &str = "GUN_OFF";
const PULL_TRIGGER: &str = "TRG";
const LED_ON: &str = "LED_ON";
const LED_OFF: &str = "LED_OFF";

impl ActuatorCommand {
    /// The bytes written to the transport. No terminator is appended.
    pub fn encode(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for ActuatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActuatorCommand::AxisSpeeds { x, y } => write!(f, "{}{}_{}", AXIS_PREFIX, x.0, y.0),
            ActuatorCommand::EffectorOn => f.write_str(EFFECTOR_ON),
            ActuatorCommand::EffectorOff => f.write_str(EFFECTOR_OFF),
            ActuatorCommand::PullTrigger => f.write_str(PULL_TRIGGER),
            ActuatorCommand::LedOn => f.write_str(LED_ON),
            ActuatorCommand::LedOff => f.write_str(LED_OFF),
        }
    }
}

/// Errors raised when parsing a command literal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum CommandParseError {
    /// Not a command the firmware knows
    #[cfg_attr(feature = "std", error("unknown command literal"))]
    Unknown,

    /// `DC_` not followed by two integers in `[-255, 255]`
    #[cfg_attr(feature = "std", error("malformed axis speed payload"))]
    MalformedAxisSpeeds,
}

impl FromStr for ActuatorCommand {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            EFFECTOR_ON => return Ok(ActuatorCommand::EffectorOn),
            EFFECTOR_OFF => return Ok(ActuatorCommand::EffectorOff),
            PULL_TRIGGER => return Ok(ActuatorCommand::PullTrigger),
            LED_ON => return Ok(ActuatorCommand::LedOn),
            LED_OFF => return Ok(ActuatorCommand::LedOff),
            _ => {}
        }

        let payload = s
            .strip_prefix(AXIS_PREFIX)
            .ok_or(CommandParseError::Unknown)?;
        let (x, y) = payload
            .split_once('_')
            .ok_or(CommandParseError::MalformedAxisSpeeds)?;
        let parse = |v: &str| {
            v.parse::<i16>()
                .map(MotorCommand)
                .map_err(|_| CommandParseError::MalformedAxisSpeeds)
        };
        Ok(ActuatorCommand::AxisSpeeds {
            x: parse(x)?,
            y: parse(y)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals_are_exact() {
        let speeds = ActuatorCommand::AxisSpeeds {
            x: MotorCommand(-255),
            y: MotorCommand(100),
        };
        assert_eq!(speeds.encode(), b"DC_-255_100");
        assert_eq!(ActuatorCommand::EffectorOn.encode(), b"GUN_ON");
        assert_eq!(ActuatorCommand::EffectorOff.encode(), b"GUN_OFF");
        assert_eq!(ActuatorCommand::PullTrigger.encode(), b"TRG");
        assert_eq!(ActuatorCommand::LedOn.encode(), b"LED_ON");
        assert_eq!(ActuatorCommand::LedOff.encode(), b"LED_OFF");
    }

    #[test]
    fn test_stop_encoding() {
        let stop = ActuatorCommand::AxisSpeeds {
            x: MotorCommand::STOP,
            y: MotorCommand::STOP,
        };
        assert_eq!(stop.encode(), b"DC_0_0");
    }

    #[test]
    fn test_speed_truncates_toward_zero() {
        assert_eq!(MotorCommand::from_speed(150.9f64), MotorCommand(150));
        assert_eq!(MotorCommand::from_speed(-150.9f64), MotorCommand(-150));
        assert_eq!(MotorCommand::from_speed(-0.0f64), MotorCommand(0));
        assert_eq!(MotorCommand::from_speed(f64::NAN), MotorCommand(0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(
            "GUN".parse::<ActuatorCommand>(),
            Err(CommandParseError::Unknown)
        );
        assert_eq!(
            "DC_12".parse::<ActuatorCommand>(),
            Err(CommandParseError::MalformedAxisSpeeds)
        );
        assert_eq!(
            "DC_1.5_2".parse::<ActuatorCommand>(),
            Err(CommandParseError::MalformedAxisSpeeds)
        );
        assert_eq!(
            "DC_-12_40".parse::<ActuatorCommand>(),
            Ok(ActuatorCommand::AxisSpeeds {
                x: MotorCommand(-12),
                y: MotorCommand(40)
            })
        );
    }
}
