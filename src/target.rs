// Marker observations, identity classes and foe selection
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

use alloc::collections::BTreeMap;

/// Integer pixel coordinate in image space, origin at the top-left corner.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    /// Column, growing to the right
    pub x: i32,
    /// Row, growing downward
    pub y: i32,
}

impl Point {
    /// Creates a point at column `x`, row `y`.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Identity of a detected marker as seen by the targeting logic.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TargetClass {
    /// Never targeted
    Friendly,
    /// Tracked when it is the only foe in view
    Foe,
    /// Not in the legend; ignored
    Unknown,
}

/// One marker detected in the current frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MarkerObservation {
    /// Decoded marker ID
    pub id: u32,
    /// Mean of the corners
    pub center: Point,
    /// Corners in detector order
    pub corners: [Point; 4],
}

impl MarkerObservation {
    /// Builds an observation from sub-pixel detector corners.
    ///
    /// The center is the arithmetic mean of the four corners. Both the center and the corners are
    /// truncated toward zero to integer pixels.
    pub fn from_corners(id: u32, corners: [[f32; 2]; 4]) -> Self {
        let (sum_x, sum_y) = corners
            .iter()
            .fold((0.0f32, 0.0f32), |(sx, sy), c| (sx + c[0], sy + c[1]));
        Self {
            id,
            center: Point::new((sum_x / 4.0) as i32, (sum_y / 4.0) as i32),
            corners: corners.map(|c| Point::new(c[0] as i32, c[1] as i32)),
        }
    }
}

/// Fixed lookup from marker ID to [`TargetClass`]; IDs not in the table are `Unknown`.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassMap {
    classes: BTreeMap<u32, TargetClass>,
}

/// Marker ID of the foe in the default legend.
pub const DEFAULT_FOE_ID: u32 = 0;
/// Marker ID of the friendly target in the default legend.
pub const DEFAULT_FRIENDLY_ID: u32 = 1;

impl Default for ClassMap {
    fn default() -> Self {
        Self::new([DEFAULT_FOE_ID], [DEFAULT_FRIENDLY_ID])
    }
}

impl ClassMap {
    /// Creates a lookup table. An ID listed as both foe and friendly is resolved as friendly, so an
    /// inconsistent legend never makes a friend actionable.
    pub fn new(
        foe_ids: impl IntoIterator<Item = u32>,
        friendly_ids: impl IntoIterator<Item = u32>,
    ) -> Self {
        let mut classes = BTreeMap::new();
        for id in foe_ids {
            classes.insert(id, TargetClass::Foe);
        }
        for id in friendly_ids {
            classes.insert(id, TargetClass::Friendly);
        }
        Self { classes }
    }

    /// Looks up the class of marker `id`.
    pub fn classify(&self, id: u32) -> TargetClass {
        self.classes
            .get(&id)
            .copied()
            .unwrap_or(TargetClass::Unknown)
    }
}

/// Anomalies reported by the target selector.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Anomaly {
    /// More than one foe was observed in the same frame; no target is actionable.
    MultipleFoes {
        /// Foe observations in the frame
        count: usize,
    },
}

/// Outcome of filtering a frame's observations down to the foe.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    /// No foe observed
    NoFoe,
    /// Exactly one foe observed
    Foe(MarkerObservation),
    /// Several foe observations; none is actionable
    Ambiguous {
        /// Foe observations in the frame
        count: usize,
    },
}

impl Selection {
    /// The actionable target, if exactly one foe was observed.
    pub fn target(&self) -> Option<&MarkerObservation> {
        match self {
            Selection::Foe(observation) => Some(observation),
            _ => None,
        }
    }

    /// The anomaly to report for this selection, if any.
    pub fn anomaly(&self) -> Option<Anomaly> {
        match *self {
            Selection::Ambiguous { count } => Some(Anomaly::MultipleFoes { count }),
            _ => None,
        }
    }
}

/// Selects the single foe among `observations`.
///
/// Zero foes select nothing, exactly one foe is selected, and two or more foes are reported as
/// ambiguous without selecting any of them.
pub fn select_foe(observations: &[MarkerObservation], classes: &ClassMap) -> Selection {
    let mut foes = observations
        .iter()
        .filter(|o| classes.classify(o.id) == TargetClass::Foe);

    match (foes.next(), foes.next()) {
        (None, _) => Selection::NoFoe,
        (Some(foe), None) => Selection::Foe(*foe),
        (Some(_), Some(_)) => Selection::Ambiguous {
            count: 2 + foes.count(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(id: u32, x: f32, y: f32) -> MarkerObservation {
        MarkerObservation::from_corners(
            id,
            [[x, y], [x + 10.0, y], [x + 10.0, y + 10.0], [x, y + 10.0]],
        )
    }

    #[test]
    fn test_center_is_corner_mean() {
        let obs = square(3, 100.0, 40.0);
        assert_eq!(obs.center, Point::new(105, 45));
        assert_eq!(obs.corners[2], Point::new(110, 50));
    }

    #[test]
    fn test_center_truncates_subpixel_mean() {
        let obs = MarkerObservation::from_corners(
            0,
            [[0.0, 0.0], [3.0, 0.0], [3.0, 3.0], [0.0, 3.0]],
        );
        // mean is (1.5, 1.5)
        assert_eq!(obs.center, Point::new(1, 1));
    }

    #[test]
    fn test_default_legend() {
        let classes = ClassMap::default();
        assert_eq!(classes.classify(0), TargetClass::Foe);
        assert_eq!(classes.classify(1), TargetClass::Friendly);
        assert_eq!(classes.classify(2), TargetClass::Unknown);
        assert_eq!(classes.classify(249), TargetClass::Unknown);
    }

    #[test]
    fn test_friendly_wins_on_conflicting_legend() {
        let classes = ClassMap::new([4, 5], [5]);
        assert_eq!(classes.classify(4), TargetClass::Foe);
        assert_eq!(classes.classify(5), TargetClass::Friendly);
    }

    #[test]
    fn test_select_no_foe() {
        let classes = ClassMap::default();
        assert_eq!(select_foe(&[], &classes), Selection::NoFoe);

        let friends = [square(1, 0.0, 0.0), square(7, 50.0, 50.0)];
        let selection = select_foe(&friends, &classes);
        assert_eq!(selection, Selection::NoFoe);
        assert!(selection.anomaly().is_none());
    }

    #[test]
    fn test_select_single_foe_among_others() {
        let classes = ClassMap::default();
        let foe = square(0, 200.0, 120.0);
        let observations = [square(1, 0.0, 0.0), foe, square(9, 30.0, 30.0)];
        let selection = select_foe(&observations, &classes);
        assert_eq!(selection.target(), Some(&foe));
        assert!(selection.anomaly().is_none());
    }

    #[test]
    fn test_select_multiple_foes_is_ambiguous() {
        let classes = ClassMap::new([0, 2], [1]);
        let observations = [
            square(0, 0.0, 0.0),
            square(1, 10.0, 10.0),
            square(2, 20.0, 20.0),
            square(0, 80.0, 80.0),
        ];
        let selection = select_foe(&observations, &classes);
        assert!(selection.target().is_none());
        assert_eq!(selection.anomaly(), Some(Anomaly::MultipleFoes { count: 3 }));
    }
}
