// Frame reference and pixel-space tracking error
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

use crate::target::Point;

/// Aim point of the frame plus the deadzone radius around it, in pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameReference {
    center: Point,
    deadzone: u32,
}

impl FrameReference {
    /// Reference with an explicit aim point.
    pub const fn new(center: Point, deadzone: u32) -> Self {
        Self { center, deadzone }
    }

    /// Reference at the geometric center of a `width` x `height` frame.
    pub fn centered(width: u32, height: u32, deadzone: u32) -> Self {
        // u32::MAX / 2 always fits in i32
        let center = Point::new((width / 2) as i32, (height / 2) as i32);
        Self::new(center, deadzone)
    }

    /// Shifts the aim point, e.g. to compensate for a camera mounted off the barrel axis.
    pub fn with_offset(self, dx: i32, dy: i32) -> Self {
        Self {
            center: Point::new(
                self.center.x.saturating_add(dx),
                self.center.y.saturating_add(dy),
            ),
            ..self
        }
    }

    /// The aim point.
    pub fn center(&self) -> Point {
        self.center
    }

    /// Deadzone radius, applied per axis.
    pub fn deadzone(&self) -> u32 {
        self.deadzone
    }
}

/// Signed pixel offset of the target from the aim point, independent per axis.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PixelError {
    /// Positive when the target is right of the aim point
    pub x: i32,
    /// Positive when the target is below the aim point
    pub y: i32,
}

/// Computes `target - reference` on both axes. No clamping is applied.
pub fn compute_error(target: Point, reference: Point) -> PixelError {
    PixelError {
        x: target.x.saturating_sub(reference.x),
        y: target.y.saturating_sub(reference.y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_reference() {
        let reference = FrameReference::centered(640, 480, 50);
        assert_eq!(reference.center(), Point::new(320, 240));
        assert_eq!(reference.deadzone(), 50);

        // odd dimensions round down
        let reference = FrameReference::centered(1279, 719, 0);
        assert_eq!(reference.center(), Point::new(639, 359));
    }

    #[test]
    fn test_offset_reference() {
        let reference = FrameReference::centered(640, 480, 50).with_offset(-20, 15);
        assert_eq!(reference.center(), Point::new(300, 255));
        assert_eq!(reference.deadzone(), 50);
    }

    #[test]
    fn test_error_signs() {
        let center = Point::new(320, 240);
        assert_eq!(
            compute_error(Point::new(400, 200), center),
            PixelError { x: 80, y: -40 }
        );
        assert_eq!(
            compute_error(Point::new(10, 470), center),
            PixelError { x: -310, y: 230 }
        );
        assert_eq!(compute_error(center, center), PixelError::default());
    }
}
