// Errors that end a servo session before or while it starts
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

use crate::config::ConfigError;

/// A camera or transport could not be opened.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// No camera at this index, or it delivers no frame
    #[error("camera {index} could not be opened")]
    CameraNotFound {
        /// Requested camera index
        index: u32,
    },

    /// The serial device is missing, busy or not permitted
    #[error("serial port {port} could not be opened")]
    PortUnavailable {
        /// Device path or name as given
        port: String,
        /// Reason reported by the OS
        #[source]
        source: io::Error,
    },
}

/// Conditions that abort a session. Everything else degrades to skipping one cycle.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The camera or the transport could not be opened; nothing was written
    #[error("device unavailable")]
    DeviceUnavailable(#[from] DeviceError),

    /// The config was rejected before any device was opened
    #[error("invalid configuration")]
    InvalidConfiguration(#[from] ConfigError),

    /// [`Session::run`](crate::session::Session::run) was called on a session that already ran
    #[error("session already started")]
    AlreadyStarted,
}
