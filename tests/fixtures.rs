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

#[cfg(test)]
#[allow(dead_code)]
pub mod test_speed {

    use marker_servo::speed::{MotorSpeedParams, MotorSpeedParamsBuilder};

    pub fn make_params(min_speed: u8, max_speed: u8, gain: f64) -> MotorSpeedParams<f64> {
        MotorSpeedParamsBuilder::default()
            .speed_range(min_speed, max_speed)
            .gain(gain)
            .build()
            .expect("valid speed parameters")
    }
}

#[cfg(all(test, feature = "std"))]
#[allow(dead_code)]
pub mod test_session {

    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::io;
    use std::rc::Rc;

    use marker_servo::camera::{Camera, ReadError};
    use marker_servo::controller::TrackingSetup;
    use marker_servo::observe::{Frame, MarkerDetector, RawDetection};
    use marker_servo::speed::MotorSpeedParams;
    use marker_servo::target::ClassMap;
    use marker_servo::time::{Clock, Millis};
    use marker_servo::transport::Transport;

    pub const WIDTH: u32 = 640;
    pub const HEIGHT: u32 = 480;

    /// Foe 0 / friendly 1, deadzone 50 px, speeds in [100, 255] with unit gain
    pub fn default_setup() -> TrackingSetup<f64> {
        TrackingSetup {
            classes: ClassMap::default(),
            deadzone: 50,
            aim_offset: (0, 0),
            x_params: MotorSpeedParams::default(),
            y_params: MotorSpeedParams::default(),
        }
    }

    /// A 20 px square marker centered on `(cx, cy)`.
    pub fn marker(id: u32, cx: f32, cy: f32) -> RawDetection {
        RawDetection {
            id,
            corners: [
                [cx - 10.0, cy - 10.0],
                [cx + 10.0, cy - 10.0],
                [cx + 10.0, cy + 10.0],
                [cx - 10.0, cy + 10.0],
            ],
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct FakeFrame {
        pub width: u32,
        pub height: u32,
        pub markers: Vec<RawDetection>,
    }

    impl FakeFrame {
        pub fn with(markers: Vec<RawDetection>) -> Self {
            Self {
                width: WIDTH,
                height: HEIGHT,
                markers,
            }
        }
    }

    impl Frame for FakeFrame {
        fn width(&self) -> u32 {
            self.width
        }

        fn height(&self) -> u32 {
            self.height
        }
    }

    /// Replays a script of frames and read failures, then delivers frames without markers.
    pub struct ScriptedCamera {
        script: VecDeque<Result<FakeFrame, ReadError>>,
        released: Rc<Cell<bool>>,
    }

    impl ScriptedCamera {
        pub fn new(script: Vec<Result<FakeFrame, ReadError>>) -> (Self, Rc<Cell<bool>>) {
            let released = Rc::new(Cell::new(false));
            (
                Self {
                    script: script.into(),
                    released: released.clone(),
                },
                released,
            )
        }

        /// Shows the same markers in every frame.
        pub fn repeating(markers: Vec<RawDetection>, frames: usize) -> (Self, Rc<Cell<bool>>) {
            Self::new(vec![Ok(FakeFrame::with(markers)); frames])
        }
    }

    impl Camera for ScriptedCamera {
        type Frame = FakeFrame;

        fn dimensions(&self) -> (u32, u32) {
            (WIDTH, HEIGHT)
        }

        fn read_frame(&mut self) -> Result<FakeFrame, ReadError> {
            self.script
                .pop_front()
                .unwrap_or_else(|| Ok(FakeFrame::with(Vec::new())))
        }
    }

    impl Drop for ScriptedCamera {
        fn drop(&mut self) {
            self.released.set(true);
        }
    }

    /// Passes through the markers a [`FakeFrame`] carries and counts its invocations.
    #[derive(Debug, Default)]
    pub struct FakeDetector {
        pub calls: usize,
    }

    impl MarkerDetector<FakeFrame> for FakeDetector {
        fn detect(&mut self, frame: &FakeFrame) -> Vec<RawDetection> {
            self.calls += 1;
            frame.markers.clone()
        }
    }

    /// Shared view of everything a [`RecordingTransport`] saw.
    #[derive(Debug, Default, Clone)]
    pub struct WireLog {
        pub frames: Rc<RefCell<Vec<String>>>,
        pub attempts: Rc<Cell<usize>>,
        pub released: Rc<Cell<bool>>,
    }

    impl WireLog {
        pub fn frames(&self) -> Vec<String> {
            self.frames.borrow().clone()
        }
    }

    /// Records every frame written; the writes whose zero-based attempt index is listed in
    /// `failing` fail instead.
    pub struct RecordingTransport {
        log: WireLog,
        failing: Vec<usize>,
    }

    impl RecordingTransport {
        pub fn new() -> (Self, WireLog) {
            Self::failing_at(Vec::new())
        }

        pub fn failing_at(failing: Vec<usize>) -> (Self, WireLog) {
            let log = WireLog::default();
            (
                Self {
                    log: log.clone(),
                    failing,
                },
                log,
            )
        }
    }

    impl Transport for RecordingTransport {
        fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
            let attempt = self.log.attempts.get();
            self.log.attempts.set(attempt + 1);
            if self.failing.contains(&attempt) {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "write timed out"));
            }
            self.log
                .frames
                .borrow_mut()
                .push(String::from_utf8_lossy(bytes).into_owned());
            Ok(())
        }
    }

    impl Drop for RecordingTransport {
        fn drop(&mut self) {
            self.log.released.set(true);
        }
    }

    /// Returns the current time and then advances it by a fixed step, so every reading moves time
    /// forward by exactly one step.
    pub struct StepClock {
        now: Cell<u64>,
        step_ms: u64,
    }

    impl StepClock {
        pub fn new(step_ms: u64) -> Self {
            Self {
                now: Cell::new(0),
                step_ms,
            }
        }
    }

    impl Clock for StepClock {
        type Instant = Millis;

        fn now(&self) -> Millis {
            let now = self.now.get();
            self.now.set(now + self.step_ms);
            Millis(now)
        }
    }
}
