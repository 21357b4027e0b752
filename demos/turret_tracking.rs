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

//! Tracks a foe marker swaying on a square wave, printing the pixel error and the commanded
//! speeds once every 100 ms of simulated time as CSV.

#[cfg(feature = "simulation")]
pub fn main() {
    use std::time::Duration;

    use nalgebra as na;

    use marker_servo::camera::CameraBackend;
    use marker_servo::config::ServoConfig;
    use marker_servo::session::{CycleReport, Session, SessionOptions};
    use marker_servo::sim::{SceneMarker, SignalGenerator, SimDetector, Simulation, Turret, WaveForm};
    use marker_servo::time::Millis;

    const FIXED_STEP_SIZE_MS: u64 = 10;

    let mut config = ServoConfig::default();
    config.deadzone_px = 20;
    config.x_axis.gain = 0.8;
    config.y_axis.gain = 0.8;
    let setup = config.tracking_setup().expect("Invalid config");

    let sim = Simulation::new(
        Turret::new(2.0, 0.08),
        640,
        480,
        Duration::from_millis(FIXED_STEP_SIZE_MS),
    );
    let steps = SignalGenerator::new(WaveForm::Square, Millis(0), 120.0, 0.0)
        .with_angular_frequency(std::f64::consts::PI / 4.0);
    sim.add_marker(
        SceneMarker::fixed(0, na::Vector2::new(0.0, 0.0), 50.0)
            .swaying(steps, na::Vector2::new(1.0, -0.5)),
    );
    sim.add_marker(SceneMarker::fixed(1, na::Vector2::new(-60.0, 150.0), 50.0));

    let mut session = Session::new(
        setup,
        SimDetector,
        sim.clock(),
        SessionOptions::new(Duration::from_secs(16)),
    );

    println!("time_s,error_x,error_y,speed_x,speed_y");
    let mut print_row = |report: &CycleReport<'_, f64>| {
        if report.iteration % 10 != 0 {
            return;
        }
        if let Some(aim) = report.decision.aim() {
            println!(
                "{:.2},{},{},{},{}",
                report.elapsed.as_secs_f64(),
                aim.error.x,
                aim.error.y,
                aim.speed_x,
                aim.speed_y
            );
        }
    };

    let mut backend = sim.backend(1);
    let report = session
        .run(|| Ok(sim.link()), || backend.open(0), &mut print_row)
        .expect("Simulated devices are always available");

    eprintln!(
        "{} cycles, {} commands, final turret offset {:?}",
        report.cycles,
        report.commands_sent,
        sim.turret().position()
    );
}

#[cfg(not(feature = "simulation"))]
pub fn main() {
    eprintln!("This demo requires the `simulation` feature");
}
