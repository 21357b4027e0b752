// Simulated pan/tilt turret, camera and serial link
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

use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use nalgebra as na;

use crate::camera::{Camera, CameraBackend, ReadError};
use crate::command::ActuatorCommand;
use crate::error::DeviceError;
use crate::observe::{Frame, MarkerDetector, RawDetection};
use crate::time::{Clock, InstantLike, Millis};
use crate::transport::Transport;

pub enum WaveForm {
    Sine,
    Square,
}

pub struct SignalGenerator<I: InstantLike> {
    fcn: fn(f64) -> f64,
    initial_time: I,
    amplitude: f64,
    offset: f64,
    angular_frequency: f64,
}

impl<I: InstantLike> SignalGenerator<I> {
    pub fn new(waveform: WaveForm, initial_time: I, amplitude: f64, offset: f64) -> Self {
        Self {
            fcn: match waveform {
                WaveForm::Sine => f64::sin,
                WaveForm::Square => |x| x.sin().signum(),
            },
            initial_time,
            amplitude,
            offset,
            angular_frequency: 1.0,
        }
    }

    /// Sets the angular frequency in rad/s; defaults to 1.
    pub fn with_angular_frequency(mut self, angular_frequency: f64) -> Self {
        self.angular_frequency = angular_frequency;
        self
    }

    pub fn generate(&self, time: I) -> f64 {
        let t = time.duration_since(self.initial_time).as_secs_f64();
        self.amplitude * (self.fcn)(self.angular_frequency * t) + self.offset
    }
}

/// One classical Runge-Kutta step of `x' = f(x)` with step size `h`.
pub fn rk4_step<const N: usize>(
    f: impl Fn(na::SVector<f64, N>) -> na::SVector<f64, N>,
    x: na::SVector<f64, N>,
    h: f64,
) -> na::SVector<f64, N> {
    let k1 = f(x);
    let k2 = f(x + k1 * (0.5 * h));
    let k3 = f(x + k2 * (0.5 * h));
    let k4 = f(x + k3 * h);
    x + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0)
}

/// Two-axis turret whose pose is expressed as the pixel offset of the camera's view.
///
/// Each axis is a first-order DC motor driven by a PWM command `u` in `[-255, 255]`:
/// ┌    ┐   ┌                 ┐┌    ┐   ┌       ┐
/// │ p' │ = │ 0   I           ││ p  │ + │ 0     │ u
/// │ v' │   │ 0   -1/τ · I    ││ v  │   │ k/τ·I │
/// └    ┘   └                 ┘└    ┘   └       ┘
/// with `p` the view offset in pixels, `v` its rate, `k` the steady-state rate per PWM unit.
#[derive(Debug, Clone)]
pub struct Turret {
    /// Steady-state view rate in pixels per second per PWM unit
    pub motor_gain: f64,
    /// Motor time constant in seconds
    pub time_constant: f64,
    state: na::Vector4<f64>,
    command: na::Vector2<f64>,
    effector_on: bool,
    triggers: usize,
}

impl Default for Turret {
    fn default() -> Self {
        Self::new(2.0, 0.05)
    }
}

impl Turret {
    pub fn new(motor_gain: f64, time_constant: f64) -> Self {
        Self {
            motor_gain,
            time_constant,
            state: na::Vector4::zeros(),
            command: na::Vector2::zeros(),
            effector_on: false,
            triggers: 0,
        }
    }

    pub fn f(&self, x: na::Vector4<f64>, u: na::Vector2<f64>) -> na::Vector4<f64> {
        let inv_tau = 1.0 / self.time_constant;
        #[rustfmt::skip]
        let mat_a = na::Matrix4::new(
            0.0, 0.0, 1.0,      0.0,
            0.0, 0.0, 0.0,      1.0,
            0.0, 0.0, -inv_tau, 0.0,
            0.0, 0.0, 0.0,      -inv_tau,
        );
        let b = self.motor_gain * inv_tau;
        #[rustfmt::skip]
        let mat_b = na::Matrix4x2::new(
            0.0, 0.0,
            0.0, 0.0,
            b,   0.0,
            0.0, b,
        );
        mat_a * x + mat_b * u
    }

    /// Advances the turret by `dt` seconds under the last received speed command.
    pub fn step(&mut self, dt: f64) {
        let u = self.command;
        self.state = rk4_step(|x| self.f(x, u), self.state, dt);
    }

    /// Applies a command as the firmware would.
    pub fn apply(&mut self, command: ActuatorCommand) {
        match command {
            ActuatorCommand::AxisSpeeds { x, y } => {
                self.command = na::Vector2::new(f64::from(x.0), f64::from(y.0));
            }
            ActuatorCommand::EffectorOn => self.effector_on = true,
            ActuatorCommand::EffectorOff => self.effector_on = false,
            ActuatorCommand::PullTrigger => self.triggers += 1,
            ActuatorCommand::LedOn | ActuatorCommand::LedOff => {}
        }
    }

    /// Current view offset in pixels.
    pub fn position(&self) -> na::Vector2<f64> {
        self.state.fixed_rows::<2>(0).into_owned()
    }

    pub fn command(&self) -> na::Vector2<f64> {
        self.command
    }

    pub fn effector_on(&self) -> bool {
        self.effector_on
    }

    pub fn triggers(&self) -> usize {
        self.triggers
    }
}

/// A square marker fixed in the world, optionally swaying along a direction.
pub struct SceneMarker {
    pub id: u32,
    /// World position of the marker center in pixels
    pub anchor: na::Vector2<f64>,
    /// Side length in pixels
    pub size: f64,
    pub sway: Option<(SignalGenerator<Millis>, na::Vector2<f64>)>,
}

impl SceneMarker {
    pub fn fixed(id: u32, anchor: na::Vector2<f64>, size: f64) -> Self {
        Self {
            id,
            anchor,
            size,
            sway: None,
        }
    }

    pub fn swaying(mut self, signal: SignalGenerator<Millis>, direction: na::Vector2<f64>) -> Self {
        self.sway = Some((signal, direction));
        self
    }

    pub fn position(&self, time: Millis) -> na::Vector2<f64> {
        match &self.sway {
            Some((signal, direction)) => self.anchor + direction * signal.generate(time),
            None => self.anchor,
        }
    }
}

struct World {
    turret: Turret,
    markers: Vec<SceneMarker>,
    width: u32,
    height: u32,
    frame_period: Duration,
    time: Millis,
    history: Vec<ActuatorCommand>,
}

impl World {
    fn advance(&mut self) {
        self.turret.step(self.frame_period.as_secs_f64());
        self.time = self.time + self.frame_period;
    }

    /// Projects every marker fully inside the image.
    fn render(&self) -> SimFrame {
        let center = na::Vector2::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0);
        let view = self.turret.position();
        let (w, h) = (f64::from(self.width), f64::from(self.height));

        let detections = self
            .markers
            .iter()
            .filter_map(|marker| {
                let c = marker.position(self.time) - view + center;
                let half = marker.size / 2.0;
                let corners = [
                    [c.x - half, c.y - half],
                    [c.x + half, c.y - half],
                    [c.x + half, c.y + half],
                    [c.x - half, c.y + half],
                ];
                let visible = corners
                    .iter()
                    .all(|p| (0.0..w).contains(&p[0]) && (0.0..h).contains(&p[1]));
                visible.then(|| RawDetection {
                    id: marker.id,
                    corners: corners.map(|p| [p[0] as f32, p[1] as f32]),
                })
            })
            .collect();

        SimFrame {
            width: self.width,
            height: self.height,
            detections,
        }
    }
}

/// A scene observed by a camera mounted on a [`Turret`].
///
/// Cloning the simulation yields another handle to the same scene; the camera, the link and the
/// clock created from it all act on the shared state. Time advances by one frame period per frame
/// read.
#[derive(Clone)]
pub struct Simulation(Rc<RefCell<World>>);

impl Simulation {
    pub fn new(turret: Turret, width: u32, height: u32, frame_period: Duration) -> Self {
        Self(Rc::new(RefCell::new(World {
            turret,
            markers: Vec::new(),
            width,
            height,
            frame_period,
            time: Millis(0),
            history: Vec::new(),
        })))
    }

    pub fn add_marker(&self, marker: SceneMarker) {
        self.0.borrow_mut().markers.push(marker);
    }

    pub fn camera(&self) -> SimCamera {
        SimCamera {
            sim: self.clone(),
            realtime: false,
        }
    }

    pub fn link(&self) -> SimLink {
        SimLink { sim: self.clone() }
    }

    pub fn clock(&self) -> SimClock {
        SimClock { sim: self.clone() }
    }

    pub fn backend(&self, cameras: u32) -> SimBackend {
        SimBackend {
            sim: self.clone(),
            cameras,
            realtime: false,
        }
    }

    pub fn time(&self) -> Millis {
        self.0.borrow().time
    }

    pub fn turret(&self) -> Turret {
        self.0.borrow().turret.clone()
    }

    /// Commands received over the link, in order.
    pub fn history(&self) -> Vec<ActuatorCommand> {
        self.0.borrow().history.clone()
    }

    /// Pixel offset of marker `id` from the image center at the current time, if it exists.
    pub fn offset_from_center(&self, id: u32) -> Option<na::Vector2<f64>> {
        let world = self.0.borrow();
        let view = world.turret.position();
        world
            .markers
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.position(world.time) - view)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimFrame {
    pub width: u32,
    pub height: u32,
    pub detections: Vec<RawDetection>,
}

impl Frame for SimFrame {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

pub struct SimCamera {
    sim: Simulation,
    realtime: bool,
}

impl SimCamera {
    /// Paces frame reads to the frame period in wall-clock time, like a real camera.
    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }
}

impl Camera for SimCamera {
    type Frame = SimFrame;

    fn dimensions(&self) -> (u32, u32) {
        let world = self.sim.0.borrow();
        (world.width, world.height)
    }

    fn read_frame(&mut self) -> Result<SimFrame, ReadError> {
        let mut world = self.sim.0.borrow_mut();
        if self.realtime {
            std::thread::sleep(world.frame_period);
        }
        world.advance();
        Ok(world.render())
    }
}

/// Reads the detections a [`SimFrame`] was rendered with.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimDetector;

impl MarkerDetector<SimFrame> for SimDetector {
    fn detect(&mut self, frame: &SimFrame) -> Vec<RawDetection> {
        frame.detections.clone()
    }
}

/// Serial link into the simulated firmware.
pub struct SimLink {
    sim: Simulation,
}

impl Transport for SimLink {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let command = std::str::from_utf8(bytes)
            .ok()
            .and_then(|text| text.parse::<ActuatorCommand>().ok())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "unrecognized command"))?;
        let mut world = self.sim.0.borrow_mut();
        world.turret.apply(command);
        world.history.push(command);
        Ok(())
    }
}

/// Simulation time; advances only when the camera delivers a frame.
pub struct SimClock {
    sim: Simulation,
}

impl Clock for SimClock {
    type Instant = Millis;

    fn now(&self) -> Millis {
        self.sim.time()
    }
}

/// Offers `cameras` simulated cameras at indices `0..cameras`, all looking at the same scene.
pub struct SimBackend {
    sim: Simulation,
    cameras: u32,
    realtime: bool,
}

impl SimBackend {
    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }
}

impl CameraBackend for SimBackend {
    type Camera = SimCamera;

    fn open(&mut self, index: u32) -> Result<SimCamera, DeviceError> {
        if index >= self.cameras {
            return Err(DeviceError::CameraNotFound { index });
        }
        Ok(self.sim.camera().realtime(self.realtime))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rk4_matches_exponential_decay() {
        let x = na::Vector1::new(1.0);
        let mut state = x;
        for _ in 0..100 {
            state = rk4_step(|x| -x, state, 0.01);
        }
        assert_relative_eq!(state[0], (-1.0f64).exp(), epsilon = 1e-9);
    }

    #[test]
    fn test_turret_reaches_steady_rate() {
        let mut turret = Turret::new(2.0, 0.05);
        turret.apply(ActuatorCommand::AxisSpeeds {
            x: crate::command::MotorCommand(100),
            y: crate::command::MotorCommand(-50),
        });
        for _ in 0..200 {
            turret.step(0.01);
        }
        // 2 s at steady rates of 200 px/s and -100 px/s, minus the lag of one time constant
        let p = turret.position();
        assert_relative_eq!(p.x, 200.0 * (2.0 - 0.05), epsilon = 1e-3);
        assert_relative_eq!(p.y, -100.0 * (2.0 - 0.05), epsilon = 1e-3);
    }

    #[test]
    fn test_render_projects_and_clips_markers() {
        let sim = Simulation::new(Turret::default(), 640, 480, Duration::from_millis(10));
        sim.add_marker(SceneMarker::fixed(0, na::Vector2::new(100.0, -40.0), 20.0));
        // Partially outside the image
        sim.add_marker(SceneMarker::fixed(1, na::Vector2::new(-315.0, 0.0), 20.0));

        let frame = sim.camera().read_frame().unwrap();
        assert_eq!(frame.detections.len(), 1);
        assert_eq!(frame.detections[0].id, 0);
        assert_eq!(frame.detections[0].corners[0], [410.0, 190.0]);
        assert_eq!(sim.time(), Millis(10));
    }

    #[test]
    fn test_link_rejects_unknown_bytes() {
        let sim = Simulation::new(Turret::default(), 640, 480, Duration::from_millis(10));
        let mut link = sim.link();
        assert!(link.write(b"GUN_ON").is_ok());
        assert_eq!(
            link.write(b"FIRE").unwrap_err().kind(),
            io::ErrorKind::InvalidData
        );
        assert!(sim.turret().effector_on());
        assert_eq!(sim.history(), vec![ActuatorCommand::EffectorOn]);
    }

    #[test]
    fn test_backend_index_range() {
        let sim = Simulation::new(Turret::default(), 320, 240, Duration::from_millis(10));
        let mut backend = sim.backend(2);
        assert!(backend.open(1).is_ok());
        assert!(matches!(
            backend.open(2),
            Err(DeviceError::CameraNotFound { index: 2 })
        ));

        let cameras = backend.enumerate(3);
        assert_eq!(cameras.len(), 2);
        assert_eq!((cameras[1].index, cameras[1].width, cameras[1].height), (1, 320, 240));
    }

    #[test]
    fn test_signal_generator_frequency() {
        let sine = SignalGenerator::new(WaveForm::Sine, Millis(0), 2.0, 1.0)
            .with_angular_frequency(std::f64::consts::PI);
        assert_relative_eq!(sine.generate(Millis(500)), 3.0, epsilon = 1e-12);

        let square = SignalGenerator::new(WaveForm::Square, Millis(0), 1.0, 0.0);
        assert_eq!(square.generate(Millis(4000)), -1.0);
    }
}
