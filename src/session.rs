// Control loop driver: owns the devices for one servo session
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

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use num_traits::float::FloatCore;
use num_traits::AsPrimitive;

use crate::camera::Camera;
use crate::config::ServoConfig;
use crate::controller::{Decision, TrackingSetup};
use crate::dispatch::Dispatcher;
use crate::error::{DeviceError, SessionError};
use crate::observe::{MarkerDetector, MarkerObserver};
use crate::target::MarkerObservation;
use crate::time::{Clock, InstantLike};
use crate::tracking::FrameReference;
use crate::transport::Transport;

/// Lifecycle of a [`Session`]. A session runs at most once.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Created; no device opened yet
    Idle,
    /// Devices open, loop iterating
    Running,
    /// Loop finished and devices released
    Stopped,
}

/// Why the loop of a session ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The configured session duration elapsed
    TimeBudget,
    /// The operator requested a stop through a [`StopHandle`]
    Cancelled,
}

/// Requests a cooperative stop of a running session from anywhere, including other threads.
///
/// The request is honored at the top of the next loop iteration; a frame read in progress is not
/// interrupted.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Requests the stop. Repeated calls have no further effect.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Blocks until one line arrives on `input`, then requests the stop.
    ///
    /// End of input and read errors return `false` without cancelling, so a session started
    /// without an interactive terminal runs until its time budget elapses.
    pub fn cancel_on_input<R: BufRead>(&self, mut input: R) -> bool {
        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(n) if n > 0 => {
                tracing::info!("stop requested");
                self.cancel();
                true
            }
            Ok(_) => {
                tracing::debug!("input closed, stop on input disabled");
                false
            }
            Err(e) => {
                tracing::debug!(error = %e, "input unreadable, stop on input disabled");
                false
            }
        }
    }
}

/// How long a session runs and how it ends.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SessionOptions {
    /// Time budget; the loop stops once more than this has elapsed
    pub duration: Duration,
    /// Send `DC_0_0` and `GUN_OFF` when the session stops
    pub safe_stop: bool,
}

impl SessionOptions {
    /// Options with the given time budget and safe stop enabled.
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            safe_stop: true,
        }
    }
}

/// Everything computed in one loop iteration, handed to a [`CycleObserver`].
#[derive(Debug)]
pub struct CycleReport<'a, F> {
    /// Zero-based cycle number
    pub iteration: u64,
    /// Time since the loop started, sampled at the top of the cycle
    pub elapsed: Duration,
    /// Time left of the budget
    pub remaining: Duration,
    /// Aim point and deadzone the decision was made against
    pub reference: FrameReference,
    /// Markers detected in this cycle's frame
    pub observations: &'a [MarkerObservation],
    /// What the controller decided for this frame
    pub decision: &'a Decision<F>,
    /// Whether the axis command of this cycle reached the transport
    pub delivered: bool,
}

/// A sink notified after each cycle, e.g. an overlay renderer.
///
/// Observers run after the command is dispatched and cannot influence it.
pub trait CycleObserver<F> {
    /// Called once per cycle, in order.
    fn on_cycle(&mut self, report: &CycleReport<'_, F>);
}

impl<F, G> CycleObserver<F> for G
where
    G: FnMut(&CycleReport<'_, F>),
{
    fn on_cycle(&mut self, report: &CycleReport<'_, F>) {
        self(report)
    }
}

/// Discards every cycle report.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoObserver;

impl<F> CycleObserver<F> for NoObserver {
    fn on_cycle(&mut self, _report: &CycleReport<'_, F>) {}
}

/// Counters describing a finished session.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SessionReport {
    /// Loop iterations completed
    pub cycles: u64,
    /// Frames that could not be read and counted as empty
    pub frames_dropped: u64,
    /// Axis speed commands delivered to the transport
    pub commands_sent: u64,
    /// Writes that failed, of any command
    pub write_failures: u64,
    /// Cycles in which several foes were visible
    pub ambiguous_cycles: u64,
    /// Why the loop ended
    pub stop_reason: StopReason,
    /// Session clock reading at the stop
    pub elapsed: Duration,
}

/// One servo session: `Idle -> Running -> Stopped`.
///
/// The session owns the camera and the transport from the moment they are opened until it stops;
/// both are released on every exit path.
pub struct Session<F: FloatCore, D, K> {
    setup: TrackingSetup<F>,
    observer: MarkerObserver<D>,
    clock: K,
    options: SessionOptions,
    stop: StopHandle,
    state: SessionState,
}

impl<F, D, K> Session<F, D, K>
where
    F: FloatCore + core::fmt::Debug + 'static,
    i32: AsPrimitive<F>,
    u8: AsPrimitive<F>,
    K: Clock,
{
    /// Creates an `Idle` session. No device is opened until [`Session::run`].
    pub fn new(setup: TrackingSetup<F>, detector: D, clock: K, options: SessionOptions) -> Self {
        Self {
            setup,
            observer: MarkerObserver::new(detector),
            clock,
            options,
            stop: StopHandle::default(),
            state: SessionState::Idle,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// A handle that stops this session when cancelled; may be moved to another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// The marker detector this session observes frames with.
    pub fn detector(&self) -> &D {
        self.observer.detector()
    }

    /// Opens the devices and runs the loop until the time budget elapses or a stop is requested.
    ///
    /// The transport is opened first, then the camera. If either cannot be opened the session
    /// stays `Idle`, nothing is written, and whatever was already opened is released.
    pub fn run<C, T, S>(
        &mut self,
        open_transport: impl FnOnce() -> Result<T, DeviceError>,
        open_camera: impl FnOnce() -> Result<C, DeviceError>,
        sink: &mut S,
    ) -> Result<SessionReport, SessionError>
    where
        C: Camera,
        D: MarkerDetector<C::Frame>,
        T: Transport,
        S: CycleObserver<F>,
    {
        if self.state != SessionState::Idle {
            return Err(SessionError::AlreadyStarted);
        }

        let transport = open_transport().map_err(|e| {
            tracing::error!(error = %e, "transport unavailable, session not started");
            e
        })?;
        // On failure the transport is dropped here, before anything was written to it
        let camera = open_camera().map_err(|e| {
            tracing::error!(error = %e, "camera unavailable, session not started");
            e
        })?;

        Ok(self.run_with(camera, Dispatcher::new(transport), sink))
    }

    /// Runs the loop over devices that are already open.
    fn run_with<C, T, S>(
        &mut self,
        mut camera: C,
        mut dispatcher: Dispatcher<T>,
        sink: &mut S,
    ) -> SessionReport
    where
        C: Camera,
        D: MarkerDetector<C::Frame>,
        T: Transport,
        S: CycleObserver<F>,
    {
        let (width, height) = camera.dimensions();
        let controller = self.setup.controller(width, height);
        let reference = *controller.reference();

        let mut cycles = 0;
        let mut frames_dropped = 0;
        let mut commands_sent = 0;
        let mut write_failures = 0;
        let mut ambiguous_cycles = 0;

        self.state = SessionState::Running;
        tracing::info!(
            width,
            height,
            duration_s = self.options.duration.as_secs_f64(),
            "session running"
        );

        if let Err(e) = dispatcher.enable_effector() {
            tracing::warn!(error = %e, "effector not enabled");
            write_failures += 1;
        }

        let start = self.clock.now();
        let (stop_reason, elapsed) = loop {
            let elapsed = self.clock.now().duration_since(start);
            if self.stop.is_cancelled() {
                break (StopReason::Cancelled, elapsed);
            }
            if elapsed > self.options.duration {
                break (StopReason::TimeBudget, elapsed);
            }

            let frame = match camera.read_frame() {
                Ok(frame) => Some(frame),
                Err(e) => {
                    tracing::warn!(error = %e, "frame dropped");
                    frames_dropped += 1;
                    None
                }
            };
            let observations = self.observer.observe(frame.as_ref());
            let decision = controller.decide(&observations);

            let mut delivered = false;
            match &decision {
                Decision::NoTarget => {}
                Decision::Ambiguous { count } => {
                    tracing::warn!(count, "more than one foe detected, targeting aborted");
                    ambiguous_cycles += 1;
                }
                Decision::Track(aim) => {
                    tracing::debug!(
                        error_x = aim.error.x,
                        error_y = aim.error.y,
                        speed_x = ?aim.speed_x,
                        speed_y = ?aim.speed_y,
                        "tracking foe"
                    );
                    match dispatcher.send(aim.command()) {
                        Ok(()) => {
                            delivered = true;
                            commands_sent += 1;
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "axis command not delivered");
                            write_failures += 1;
                        }
                    }
                }
            }

            sink.on_cycle(&CycleReport {
                iteration: cycles,
                elapsed,
                remaining: self.options.duration.saturating_sub(elapsed),
                reference,
                observations: &observations,
                decision: &decision,
                delivered,
            });
            cycles += 1;
        };

        if self.options.safe_stop {
            for result in [dispatcher.stop_axes(), dispatcher.disable_effector()] {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "safe stop incomplete");
                    write_failures += 1;
                }
            }
        }

        self.state = SessionState::Stopped;
        drop(camera);
        drop(dispatcher);

        tracing::info!(?stop_reason, cycles, commands_sent, "session stopped");

        SessionReport {
            cycles,
            frames_dropped,
            commands_sent,
            write_failures,
            ambiguous_cycles,
            stop_reason,
            elapsed,
        }
    }
}

impl<D, K: Clock> Session<f64, D, K> {
    /// Creates an `Idle` session from a loaded config, which is validated first.
    ///
    /// The config's `safe_stop` setting overrides the default of [`SessionOptions::new`].
    pub fn from_config(
        config: &ServoConfig,
        detector: D,
        clock: K,
        duration: Duration,
    ) -> Result<Self, SessionError> {
        let setup = config.tracking_setup().map_err(|e| {
            tracing::error!(error = %e, "invalid configuration, session not created");
            e
        })?;
        let options = SessionOptions {
            duration,
            safe_stop: config.safe_stop,
        };
        Ok(Self::new(setup, detector, clock, options))
    }
}
