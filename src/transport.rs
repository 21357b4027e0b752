// Byte-oriented command channel to the actuator
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

use std::fs::{File, OpenOptions};
use std::io::{self, Write};

use crate::error::DeviceError;

/// A point-to-point link that accepts whole command frames. Dropping it closes the link.
pub trait Transport {
    /// Writes one command frame. No acknowledgement is awaited.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write(bytes)
    }
}

/// A serial device, or any writer standing in for one.
///
/// Line settings (baud rate, parity) are left as configured on the device; the firmware expects
/// the platform defaults.
#[derive(Debug)]
pub struct SerialPort<W = File> {
    name: String,
    inner: W,
}

impl SerialPort<File> {
    /// Opens the serial device `port` for writing, e.g. `/dev/ttyACM0` or `COM7`.
    pub fn open(port: &str) -> Result<Self, DeviceError> {
        let inner = OpenOptions::new()
            .write(true)
            .open(device_path(port))
            .map_err(|source| DeviceError::PortUnavailable {
                port: port.to_owned(),
                source,
            })?;
        tracing::info!(port, "serial port open");
        Ok(Self {
            name: port.to_owned(),
            inner,
        })
    }
}

#[cfg(windows)]
fn device_path(port: &str) -> String {
    // COM10 and above are only reachable through the device namespace
    format!(r"\\.\{port}")
}

#[cfg(not(windows))]
fn device_path(port: &str) -> String {
    port.to_owned()
}

impl<W: Write> SerialPort<W> {
    /// Wraps an already opened writer under a display `name`.
    pub fn from_writer(name: impl Into<String>, inner: W) -> Self {
        Self {
            name: name.into(),
            inner,
        }
    }

    /// Port name as given when opened.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unwraps the writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Transport for SerialPort<W> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)?;
        self.inner.flush()
    }
}

/// Mirrors every command frame onto two transports.
///
/// Both transports are always written; the first failure is reported.
#[derive(Debug)]
pub struct Tee<A, B> {
    primary: A,
    mirror: B,
}

impl<A, B> Tee<A, B> {
    /// Writes go to `primary` first, then `mirror`.
    pub fn new(primary: A, mirror: B) -> Self {
        Self { primary, mirror }
    }

    /// Splits the tee back into `(primary, mirror)`.
    pub fn into_parts(self) -> (A, B) {
        (self.primary, self.mirror)
    }
}

impl<A: Transport, B: Transport> Transport for Tee<A, B> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let primary = self.primary.write(bytes);
        let mirror = self.mirror.write(bytes);
        primary.and(mirror)
    }
}
