// Camera collaborator: capture and enumeration
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

use crate::error::DeviceError;
use crate::observe::Frame;

/// A frame could not be read. The control loop treats this as a frame without markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    /// The camera delivered nothing for this read
    #[error("no frame available")]
    Empty,
}

/// An opened camera. Dropping the camera releases it.
pub trait Camera {
    /// Frames this camera delivers
    type Frame: Frame;

    /// Width and height of the frames this camera delivers.
    fn dimensions(&self) -> (u32, u32);

    /// Blocks until the next frame is available.
    fn read_frame(&mut self) -> Result<Self::Frame, ReadError>;
}

/// A camera found during enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraInfo {
    /// Index to pass to [`CameraBackend::open`]
    pub index: u32,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
}

/// Opens cameras by index.
pub trait CameraBackend {
    /// Cameras this backend opens
    type Camera: Camera;

    /// Opens camera `index` for exclusive use until it is dropped.
    fn open(&mut self, index: u32) -> Result<Self::Camera, DeviceError>;

    /// Opens camera `index`, reads one frame and releases the camera again.
    ///
    /// Returns `None` if the camera cannot be opened or delivers no frame.
    fn probe(&mut self, index: u32) -> Option<CameraInfo> {
        let mut camera = match self.open(index) {
            Ok(camera) => camera,
            Err(e) => {
                tracing::debug!(index, error = %e, "camera not available");
                return None;
            }
        };
        if camera.read_frame().is_err() {
            tracing::warn!(index, "camera opened but delivered no frame");
            return None;
        }
        let (width, height) = camera.dimensions();
        tracing::info!(index, width, height, "camera available");
        Some(CameraInfo {
            index,
            width,
            height,
        })
    }

    /// Probes cameras `0..=max_index`.
    fn enumerate(&mut self, max_index: u32) -> Vec<CameraInfo> {
        tracing::info!(max_index, "enumerating cameras");
        (0..=max_index)
            .filter_map(|index| self.probe(index))
            .collect()
    }
}
