// Adapter between an external fiducial detector and marker observations
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

use alloc::vec::Vec;

use crate::target::MarkerObservation;

/// An image produced by a camera. The control loop only needs its dimensions.
pub trait Frame {
    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// A frame with no pixels carries no observations.
    fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// A marker as reported by the detector: its decoded ID and four sub-pixel corners, in the
/// detector's corner order.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RawDetection {
    /// Decoded marker ID
    pub id: u32,
    /// `[x, y]` image coordinates of the four corners
    pub corners: [[f32; 2]; 4],
}

/// An external fiducial detector.
pub trait MarkerDetector<I: Frame + ?Sized> {
    /// Every marker found in `frame`, in any order.
    fn detect(&mut self, frame: &I) -> Vec<RawDetection>;
}

/// Normalizes a detector's output into [`MarkerObservation`]s.
#[derive(Debug, Default)]
pub struct MarkerObserver<D> {
    detector: D,
}

impl<D> MarkerObserver<D> {
    /// Wraps `detector`.
    pub fn new(detector: D) -> Self {
        Self { detector }
    }

    /// The wrapped detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Unwraps the detector.
    pub fn into_inner(self) -> D {
        self.detector
    }

    /// Observes all markers in `frame`.
    ///
    /// A missing or empty frame yields no observations and the detector is not invoked.
    pub fn observe<I>(&mut self, frame: Option<&I>) -> Vec<MarkerObservation>
    where
        I: Frame + ?Sized,
        D: MarkerDetector<I>,
    {
        match frame {
            Some(frame) if !frame.is_empty() => self
                .detector
                .detect(frame)
                .into_iter()
                .map(|d| MarkerObservation::from_corners(d.id, d.corners))
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Point;

    struct Blank(u32, u32);

    impl Frame for Blank {
        fn width(&self) -> u32 {
            self.0
        }

        fn height(&self) -> u32 {
            self.1
        }
    }

    #[derive(Default)]
    struct Scripted {
        detections: Vec<RawDetection>,
        calls: usize,
    }

    impl MarkerDetector<Blank> for Scripted {
        fn detect(&mut self, _frame: &Blank) -> Vec<RawDetection> {
            self.calls += 1;
            self.detections.clone()
        }
    }

    #[test]
    fn test_observations_follow_detections() {
        let detections = alloc::vec![
            RawDetection {
                id: 0,
                corners: [[10.0, 10.0], [30.0, 10.0], [30.0, 30.0], [10.0, 30.0]],
            },
            RawDetection {
                id: 42,
                corners: [[0.5, 0.5], [8.5, 0.5], [8.5, 8.5], [0.5, 8.5]],
            },
        ];
        let mut observer = MarkerObserver::new(Scripted {
            detections,
            calls: 0,
        });

        let observations = observer.observe(Some(&Blank(640, 480)));
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].id, 0);
        assert_eq!(observations[0].center, Point::new(20, 20));
        assert_eq!(observations[1].id, 42);
        assert_eq!(observations[1].center, Point::new(4, 4));
        assert_eq!(observations[1].corners[0], Point::new(0, 0));
    }

    #[test]
    fn test_missing_or_empty_frame_skips_detector() {
        let mut observer = MarkerObserver::new(Scripted::default());

        assert!(observer.observe::<Blank>(None).is_empty());
        assert!(observer.observe(Some(&Blank(0, 480))).is_empty());
        assert_eq!(observer.detector().calls, 0);
    }
}
