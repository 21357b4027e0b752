// Defines traits for time-like objects and clocks, with several implementations
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

use core::ops::Add;
use core::time::Duration;

use core::fmt::Debug;

/// A trait for time-like objects that can be used to measure elapsed time.
/// The control loop uses this trait to measure how long a session has been running and compare
/// it to the session's time budget.
pub trait InstantLike: Sized + Add<Duration, Output = Self> + Clone + Copy + Debug {
    /// Returns the amount of time elapsed from another instant to this one, saturating at zero
    #[must_use]
    fn duration_since(&self, earlier: Self) -> Duration;
}

/// A source of the current time.
///
/// The control loop reads the clock once when the session starts and once per iteration, so a
/// test or a simulation can drive a session deterministically by supplying its own clock.
pub trait Clock {
    /// Instants this clock produces
    type Instant: InstantLike;

    /// Reads the clock.
    fn now(&self) -> Self::Instant;
}

/// A wrapper around an unsigned 64-bit integer representing milliseconds
/// You would wrap the millisecond tick of a simulation or of a hardware timer in this type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Millis(pub u64);

impl InstantLike for Millis {
    fn duration_since(&self, earlier: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for Millis {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Millis(self.0 + rhs.as_millis() as u64)
    }
}

/// A convenient wrapper around `std::time::Instant` satisfying the `InstantLike` trait.
#[cfg(feature = "std")]
mod std_instant {

    use super::{Add, Clock, Duration, InstantLike};

    /// `std::time::Instant` as an [`InstantLike`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    pub struct StdInstant(pub std::time::Instant);

    impl StdInstant {
        /// The current instant.
        pub fn now() -> Self {
            StdInstant(std::time::Instant::now())
        }
    }

    impl InstantLike for StdInstant {
        fn duration_since(&self, other: Self) -> Duration {
            self.0.saturating_duration_since(other.0)
        }
    }

    impl Add<Duration> for StdInstant {
        type Output = Self;

        fn add(self, rhs: Duration) -> Self::Output {
            StdInstant(self.0 + rhs)
        }
    }

    /// The wall clock.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct StdClock;

    impl Clock for StdClock {
        type Instant = StdInstant;

        fn now(&self) -> StdInstant {
            StdInstant::now()
        }
    }

    /// Tests that StdInstant is just one constructor call away from std::time::Instant
    /// and calling duration_since is equivalent to calling the same method on the underlying Instant.
    #[cfg(test)]
    #[test]
    fn test_std_instant_wrapper() {
        let start = StdInstant::now();
        let end = StdInstant(std::time::Instant::now());
        let result = end.duration_since(start);
        let expected = end.0.duration_since(start.0);
        assert_eq!(result, expected);

        // Reversed order saturates instead of panicking
        assert_eq!(start.duration_since(end + Duration::from_secs(1)), Duration::ZERO);
    }
}

#[cfg(feature = "std")]
pub use std_instant::{StdClock, StdInstant};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_arithmetic() {
        let start = Millis(1_000);
        let later = start + Duration::from_millis(250);
        assert_eq!(later, Millis(1_250));
        assert_eq!(later.duration_since(start), Duration::from_millis(250));
        assert_eq!(start.duration_since(later), Duration::ZERO);
    }
}
