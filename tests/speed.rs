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

mod fixtures;
use fixtures::test_speed;

use marker_servo::speed::{motor_speed, MotorSpeedParams, MotorSpeedParamsBuilder, SpeedParamsError};

mod test_speed_params {

    use super::*;

    // Zero, negative and non-finite gains are invalid
    const INVALID_GAIN_VALUES: &[f64; 5] = &[0.0, -0.5, f64::INFINITY, f64::NEG_INFINITY, f64::NAN];

    // Empty and inverted ranges are invalid
    const INVALID_SPEED_RANGES: &[(u8, u8); 3] = &[(100, 100), (255, 0), (200, 150)];

    #[test]
    fn test_get_and_set_gain() {
        let mut params = MotorSpeedParams::<f64>::default();

        // Default gain is 1
        assert_eq!(params.gain(), 1.0);

        assert!(params.set_gain(2.5).is_ok());
        assert_eq!(params.gain(), 2.5);

        for it in INVALID_GAIN_VALUES {
            assert_eq!(params.set_gain(*it), Err(SpeedParamsError::InvalidGain));

            // Failing to set the gain should not change the value
            assert_eq!(params.gain(), 2.5);
        }
    }

    #[test]
    fn test_build_gain() {
        let params = MotorSpeedParamsBuilder::default().gain(0.25).build();
        assert!(params.is_ok_and(|p: MotorSpeedParams<f64>| p.gain() == 0.25));

        for it in INVALID_GAIN_VALUES {
            assert_eq!(
                MotorSpeedParamsBuilder::default().gain(*it).build(),
                Err(SpeedParamsError::InvalidGain)
            );
        }
    }

    #[test]
    fn test_get_and_set_speed_range() {
        let mut params = MotorSpeedParams::<f32>::default();

        // Default range is [100, 255]
        assert_eq!((params.min_speed(), params.max_speed()), (100, 255));

        assert!(params.set_speed_range(0, 1).is_ok());
        assert_eq!((params.min_speed(), params.max_speed()), (0, 1));

        for (min, max) in INVALID_SPEED_RANGES {
            assert_eq!(
                params.set_speed_range(*min, *max),
                Err(SpeedParamsError::InvalidSpeedRange)
            );

            // Both bounds are kept on failure
            assert_eq!((params.min_speed(), params.max_speed()), (0, 1));
        }
    }

    #[test]
    fn test_build_speed_range() {
        let params = test_speed::make_params(60, 200, 1.0);
        assert_eq!((params.min_speed(), params.max_speed()), (60, 200));

        for (min, max) in INVALID_SPEED_RANGES {
            assert_eq!(
                MotorSpeedParamsBuilder::<f64>::default()
                    .speed_range(*min, *max)
                    .build(),
                Err(SpeedParamsError::InvalidSpeedRange)
            );
        }
    }
}

mod test_speed_law {

    use super::test_speed::make_params;
    use super::*;

    #[test]
    fn test_inside_deadzone_is_zero() {
        let params = make_params(100, 255, 1.0);
        assert_eq!(motor_speed(10, 20, &params), 0.0);
        assert_eq!(motor_speed(-10, 20, &params), 0.0);

        // The boundary belongs to the deadzone
        assert_eq!(motor_speed(20, 20, &params), 0.0);
        assert_eq!(motor_speed(-20, 20, &params), 0.0);
        assert_eq!(motor_speed(21, 20, &params), 100.0);

        // Zero error with zero deadzone
        assert_eq!(motor_speed(0, 0, &params), 0.0);
    }

    #[test]
    fn test_saturates_at_max_speed() {
        let params = make_params(100, 255, 100.0);
        assert_eq!(motor_speed(10, 0, &params), 255.0);
        assert_eq!(motor_speed(-10, 0, &params), -255.0);
    }

    #[test]
    fn test_lifts_to_min_speed() {
        let params = make_params(100, 255, 0.0001);
        assert_eq!(motor_speed(10, 0, &params), 100.0);
        assert_eq!(motor_speed(-10, 0, &params), -100.0);
    }

    #[test]
    fn test_proportional_band_is_exact() {
        let params = make_params(100, 255, 1.0);
        assert_eq!(motor_speed(150, 50, &params), 150.0);
        assert_eq!(motor_speed(-150, 50, &params), -150.0);

        let params = make_params(100, 255, 0.75);
        assert_eq!(motor_speed(200, 50, &params), 150.0);
    }

    /// Negating the error negates the speed exactly, for every error and both float widths
    #[test]
    fn test_odd_symmetry() {
        let params = make_params(100, 255, 1.3);
        let params_f32 = MotorSpeedParamsBuilder::<f32>::default()
            .gain(1.3)
            .build()
            .unwrap();

        for error in (-400..=400).step_by(7) {
            assert_eq!(motor_speed(-error, 30, &params), -motor_speed(error, 30, &params));
            assert_eq!(
                motor_speed(-error, 30, &params_f32),
                -motor_speed(error, 30, &params_f32)
            );
        }
    }

    /// Every nonzero speed lies in [min_speed, max_speed] in magnitude and carries the error's sign
    #[test]
    fn test_magnitude_bounds_and_sign() {
        for gain in [0.01, 0.5, 1.0, 3.0, 1000.0] {
            let params = make_params(40, 180, gain);
            for error in [-100_000, -1000, -61, -60, 0, 60, 61, 1000, 100_000, i32::MAX, i32::MIN] {
                let speed = motor_speed(error, 60, &params);
                if error.unsigned_abs() <= 60 {
                    assert_eq!(speed, 0.0);
                } else {
                    assert!((40.0..=180.0).contains(&speed.abs()), "speed {speed} out of bounds");
                    assert_eq!(speed > 0.0, error > 0);
                }
            }
        }
    }

    #[test]
    fn test_speed_law_is_pure() {
        let params = make_params(100, 255, 1.7);
        let first = motor_speed(123, 10, &params);
        for _ in 0..100 {
            assert_eq!(motor_speed(123, 10, &params), first);
        }
    }
}
