// Actuation dispatcher: turns actuator operations into command frames
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

use std::io;

use crate::command::{ActuatorCommand, MotorCommand};
use crate::transport::Transport;

/// A command frame could not be written. The command is considered not delivered.
#[derive(Debug, thiserror::Error)]
#[error("failed to write `{command}` to the transport")]
pub struct DispatchError {
    /// The command that was not delivered
    pub command: ActuatorCommand,
    /// Transport failure
    #[source]
    pub source: io::Error,
}

/// Fire-and-forget command sender owning the transport.
#[derive(Debug)]
pub struct Dispatcher<T> {
    transport: T,
}

impl<T: Transport> Dispatcher<T> {
    /// Takes ownership of an opened transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Releases the transport back to the caller.
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Encodes `command` and writes it as one frame.
    pub fn send(&mut self, command: ActuatorCommand) -> Result<(), DispatchError> {
        self.transport
            .write(&command.encode())
            .map_err(|source| DispatchError { command, source })?;
        tracing::trace!(%command, "command sent");
        Ok(())
    }

    /// Commands both axis speeds at once, `DC_{x}_{y}`.
    pub fn set_axis_speeds(&mut self, x: MotorCommand, y: MotorCommand) -> Result<(), DispatchError> {
        self.send(ActuatorCommand::AxisSpeeds { x, y })
    }

    /// Commands zero speed on both axes.
    pub fn stop_axes(&mut self) -> Result<(), DispatchError> {
        self.set_axis_speeds(MotorCommand::STOP, MotorCommand::STOP)
    }

    /// `GUN_ON`
    pub fn enable_effector(&mut self) -> Result<(), DispatchError> {
        self.send(ActuatorCommand::EffectorOn)
    }

    /// `GUN_OFF`
    pub fn disable_effector(&mut self) -> Result<(), DispatchError> {
        self.send(ActuatorCommand::EffectorOff)
    }

    /// Fires one trigger pulse, `TRG`.
    pub fn pull_trigger(&mut self) -> Result<(), DispatchError> {
        self.send(ActuatorCommand::PullTrigger)
    }

    /// Switches the actuator's indicator LED, used to check the link end to end.
    pub fn set_led(&mut self, on: bool) -> Result<(), DispatchError> {
        self.send(if on {
            ActuatorCommand::LedOn
        } else {
            ActuatorCommand::LedOff
        })
    }
}
