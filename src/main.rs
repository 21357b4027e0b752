// marker-servo command-line interface
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

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use nalgebra as na;

use marker_servo::camera::CameraBackend;
use marker_servo::config::ServoConfig;
use marker_servo::dispatch::Dispatcher;
use marker_servo::error::{DeviceError, SessionError};
use marker_servo::session::{CycleReport, Session};
use marker_servo::sim::{SceneMarker, SignalGenerator, SimDetector, Simulation, Turret, WaveForm};
use marker_servo::time::{Millis, StdClock};
use marker_servo::transport::{SerialPort, Tee, Transport};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

const FRAME_WIDTH: u32 = 640;
const FRAME_HEIGHT: u32 = 480;
const FRAME_PERIOD: Duration = Duration::from_millis(33);
const SIM_CAMERAS: u32 = 1;

#[derive(Parser)]
#[command(name = "marker-servo")]
#[command(about = "Point a pan/tilt turret at a fiducial marker and keep it there")]
#[command(version)]
struct Cli {
    /// Session configuration (JSON). Built-in defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Track the foe marker for a fixed time. Press Enter or Ctrl-C to stop early.
    Run(RunArgs),

    /// List the cameras that deliver frames.
    Cameras,

    /// Toggle the actuator LED to check the serial link.
    LinkTest {
        /// Serial device; defaults to the configured port.
        #[arg(long)]
        port: Option<String>,

        /// Number of on/off cycles.
        #[arg(long, default_value = "5")]
        cycles: u32,

        /// Time the LED stays in each state.
        #[arg(long, default_value = "2000")]
        interval_ms: u64,
    },

    /// Fire a single trigger pulse.
    Trigger {
        /// Serial device; defaults to the configured port.
        #[arg(long)]
        port: Option<String>,
    },

    /// Print the effective configuration as JSON, defaults filled in.
    ShowConfig,
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    /// Camera index. Cameras are enumerated and you are asked to pick one when omitted.
    #[arg(short = 'c', long)]
    camera_index: Option<u32>,

    /// Operating time in seconds. You are asked for it when omitted.
    #[arg(short = 't', long)]
    time: Option<u64>,

    /// Also send every command to this serial device.
    #[arg(long)]
    port: Option<String>,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ServoConfig::load(path)?,
        None => ServoConfig::default(),
    };

    match cli.command {
        Commands::Run(args) => run_session(&config, &args),
        Commands::Cameras => run_cameras(&config),
        Commands::LinkTest {
            port,
            cycles,
            interval_ms,
        } => run_link_test(
            port.as_deref().unwrap_or(&config.serial_port),
            cycles,
            Duration::from_millis(interval_ms),
        ),
        Commands::Trigger { port } => {
            run_trigger(port.as_deref().unwrap_or(&config.serial_port))
        }
        Commands::ShowConfig => {
            println!("{}", config.to_json()?);
            Ok(())
        }
    }
}

fn prompt<T>(message: &str) -> CliResult<T>
where
    T: FromStr,
    T::Err: std::error::Error + 'static,
{
    print!("{message}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().parse()?)
}

/// The demonstration scene: a swaying foe next to a fixed friendly marker.
fn build_scene(config: &ServoConfig) -> Simulation {
    let sim = Simulation::new(Turret::default(), FRAME_WIDTH, FRAME_HEIGHT, FRAME_PERIOD);

    let foe_id = config.foe_ids.first().copied().unwrap_or_default();
    let sway = SignalGenerator::new(WaveForm::Sine, Millis(0), 120.0, 0.0).with_angular_frequency(0.5);
    sim.add_marker(
        SceneMarker::fixed(foe_id, na::Vector2::new(150.0, -80.0), 60.0)
            .swaying(sway, na::Vector2::new(1.0, 0.3)),
    );
    if let Some(&friendly_id) = config.friendly_ids.first() {
        sim.add_marker(SceneMarker::fixed(
            friendly_id,
            na::Vector2::new(-180.0, 60.0),
            60.0,
        ));
    }
    sim
}

// ── cameras ────────────────────────────────────────────────────────────

fn run_cameras(config: &ServoConfig) -> CliResult<()> {
    let sim = build_scene(config);
    let cameras = sim.backend(SIM_CAMERAS).enumerate(config.max_camera_index);

    println!("Found {} camera(s)", cameras.len());
    for camera in &cameras {
        println!(
            "  camera idx: {}, resolution: {} x {}",
            camera.index, camera.width, camera.height
        );
    }
    Ok(())
}

// ── run ────────────────────────────────────────────────────────────────

fn run_session(config: &ServoConfig, args: &RunArgs) -> CliResult<()> {
    // Reject a bad config before touching any device
    config.validate().map_err(SessionError::from)?;

    let sim = build_scene(config);
    let mut backend = sim.backend(SIM_CAMERAS).realtime(true);

    let camera_index = match args.camera_index {
        Some(index) => index,
        None => {
            let cameras = backend.enumerate(config.max_camera_index);
            if cameras.is_empty() {
                return Err("no cameras found".into());
            }
            for camera in &cameras {
                println!(
                    "  camera idx: {}, resolution: {} x {}",
                    camera.index, camera.width, camera.height
                );
            }
            let index = prompt::<u32>("Select camera index: ")?;
            tracing::info!(index, "camera selected");
            index
        }
    };
    let seconds = match args.time {
        Some(seconds) => seconds,
        None => prompt::<u64>("Enter desired operating time in seconds: ")?,
    };

    let mut session = Session::from_config(
        config,
        SimDetector,
        StdClock,
        Duration::from_secs(seconds),
    )?;

    // Both stop paths go through the session so the safe stop still runs
    let stop = session.stop_handle();
    ctrlc::set_handler(move || {
        tracing::info!("interrupt received, stopping");
        stop.cancel();
    })?;
    let stop = session.stop_handle();
    std::thread::spawn(move || stop.cancel_on_input(io::stdin().lock()));

    let open_transport = || -> Result<Box<dyn Transport>, DeviceError> {
        match &args.port {
            Some(port) => Ok(Box::new(Tee::new(SerialPort::open(port)?, sim.link()))),
            None => Ok(Box::new(sim.link())),
        }
    };

    let mut overlay = |report: &CycleReport<'_, f64>| {
        // Roughly once per second at the simulated frame rate
        if report.iteration % 30 == 0 {
            tracing::info!(
                time_left_s = report.remaining.as_secs_f64(),
                markers = report.observations.len(),
                on_target = report.decision.aim().map(|aim| aim.on_target()),
                "status"
            );
        }
    };

    let report = session.run(open_transport, || backend.open(camera_index), &mut overlay)?;

    println!("Session finished ({:?})", report.stop_reason);
    println!("  elapsed:          {:.2} s", report.elapsed.as_secs_f64());
    println!("  cycles:           {}", report.cycles);
    println!("  commands sent:    {}", report.commands_sent);
    println!("  write failures:   {}", report.write_failures);
    println!("  frames dropped:   {}", report.frames_dropped);
    println!("  ambiguous cycles: {}", report.ambiguous_cycles);
    Ok(())
}

// ── link-test ──────────────────────────────────────────────────────────

fn run_link_test(port: &str, cycles: u32, interval: Duration) -> CliResult<()> {
    let mut dispatcher = Dispatcher::new(SerialPort::open(port)?);

    for _ in 0..cycles {
        tracing::info!("turning LED on");
        dispatcher.set_led(true)?;
        std::thread::sleep(interval);
        tracing::info!("turning LED off");
        dispatcher.set_led(false)?;
        std::thread::sleep(interval);
    }

    tracing::info!("link test done");
    Ok(())
}

// ── trigger ────────────────────────────────────────────────────────────

fn run_trigger(port: &str) -> CliResult<()> {
    let mut dispatcher = Dispatcher::new(SerialPort::open(port)?);
    dispatcher.pull_trigger()?;
    tracing::info!(port, "trigger pulled");
    Ok(())
}
