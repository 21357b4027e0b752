#![warn(missing_docs)]

//! # Marker Servo
//!
//! Visual servoing of a pan/tilt turret onto a fiducial marker.
//!
//! Each camera frame goes through the same pipeline:
//!
//! - Markers reported by an external detector are normalized into [`target::MarkerObservation`]s.
//! - Exactly one foe marker is selected by identity; friendly and unknown markers are ignored, and
//!   several visible foes abort actuation for the frame.
//! - The pixel error between the foe and the aim point is turned into one motor speed per axis by
//!   a proportional law with deadzone, saturation and a minimum speed.
//! - The speeds are written to the actuator over a serial link as `DC_<x>_<y>` command frames.
//!
//! The decision logic in [`speed`], [`target`], [`tracking`] and [`controller`] is pure and
//! available without `std`. The session driver, devices, configuration and logging need the
//! default `std` feature.
//!
//! ## Usage
//!
//! ```rust
//! use marker_servo::controller::ServoController;
//! use marker_servo::speed::MotorSpeedParams;
//! use marker_servo::target::{ClassMap, MarkerObservation};
//! use marker_servo::tracking::FrameReference;
//!
//! let servo = ServoController::new(
//!     ClassMap::default(),
//!     FrameReference::centered(640, 480, 50),
//!     MotorSpeedParams::<f64>::default(),
//!     MotorSpeedParams::default(),
//! );
//!
//! // Foe marker (ID 0) up and to the right of the frame center
//! let foe = MarkerObservation::from_corners(
//!     0,
//!     [[460.0, 80.0], [480.0, 80.0], [480.0, 100.0], [460.0, 100.0]],
//! );
//! let decision = servo.decide(&[foe]);
//! assert_eq!(decision.command().unwrap().to_string(), "DC_150_-150");
//! ```
//!
//! ## License
//!
//! MIT
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// Actuator commands and their `DC_<x>_<y>` / `GUN_ON` wire encoding
pub mod command;

/// The per-frame decision: select the foe, measure its error, compute both axis speeds
pub mod controller;

/// Frames and the marker detector seam
pub mod observe;

/// The proportional speed law with deadzone, saturation and minimum speed
pub mod speed;

/// Marker observations, classes and foe selection
pub mod target;

/// Time sources measuring a session against its duration
pub mod time;

/// Aim point and pixel error
pub mod tracking;

/// Cameras and their enumeration
#[cfg(feature = "std")]
pub mod camera;

/// JSON session configuration
#[cfg(feature = "std")]
pub mod config;

/// High-level actuator operations over a transport
#[cfg(feature = "std")]
pub mod dispatch;

/// Errors that prevent or abort a session
#[cfg(feature = "std")]
pub mod error;

/// The control loop driver
#[cfg(feature = "std")]
pub mod session;

/// Byte links to the actuator firmware
#[cfg(feature = "std")]
pub mod transport;

#[doc(hidden)]
#[cfg(feature = "simulation")]
pub mod sim;

#[doc = include_str!("../README.md")]
#[cfg(doctest)]
pub struct ReadmeDoctests;
