//! Behavioral properties of the steering controller.

use speedybee::config::{ConfigError, ControlParams, SpeedModulation};
use speedybee::controller::{clamp_speed, shape_error, ControllerState, MotorCommand};

const CENTER: i32 = 2000;

fn assert_close(actual: f32, expected: f32, tolerance: f32) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {} within {}, got {}",
        expected,
        tolerance,
        actual
    );
}

// ============================================================================
// Convergence
// ============================================================================

#[test]
fn centered_line_converges_to_base_speed() {
    let params = ControlParams::default();
    // Start from a disturbed state
    let mut state = ControllerState::with_errors(400.0, 500.0);

    let mut last = MotorCommand::STOP;
    for _ in 0..200 {
        last = state.update(&params, CENTER, CENTER);
    }

    assert!(state.filtered_error.abs() < 1e-3);
    assert!(state.last_error.abs() < 1e-3);
    assert_eq!(last, MotorCommand::new(60, 60));
}

#[test]
fn constant_error_converges_geometrically() {
    let params = ControlParams::default().with_alpha(0.82);
    let mut state = ControllerState::initialize(&params).unwrap();
    let error = 600.0_f32;

    let mut ratio = 1.0_f32;
    for _ in 0..30 {
        state.update(&params, CENTER + error as i32, CENTER);
        ratio *= 0.82;
        let expected_gap = ratio * error;
        assert_close((state.filtered_error - error).abs(), expected_gap, 1e-2);
    }
}

#[test]
fn filter_gap_shrinks_every_cycle() {
    let params = ControlParams::default().with_alpha(0.5);
    let mut state = ControllerState::with_errors(-300.0, -300.0);

    let mut gap = f32::MAX;
    for _ in 0..20 {
        state.update(&params, CENTER + 1000, CENTER);
        let next = (state.filtered_error - 1000.0).abs();
        assert!(next < gap);
        gap = next;
    }
}

// ============================================================================
// Shaping
// ============================================================================

#[test]
fn shaping_is_odd_at_all_magnitudes() {
    for e in [1e-3_f32, 0.5, 1.0, 50.0, 300.0, 600.0, 2000.0, 5000.0, 1e6] {
        assert_eq!(shape_error(-e, 600.0), -shape_error(e, 600.0), "e = {}", e);
    }
}

#[test]
fn shaping_is_flat_near_zero_and_saturates() {
    assert!(shape_error(30.0, 600.0).abs() < 1e-3);
    assert!(shape_error(6000.0, 600.0) > 0.99);
    assert!(shape_error(-6000.0, 600.0) < -0.99);
}

// ============================================================================
// Clamping
// ============================================================================

#[test]
fn clamp_is_idempotent() {
    for x in [-100_000, -201, -200, -1, 0, 1, 199, 200, 201, 100_000] {
        let once = clamp_speed(x, 200);
        assert_eq!(clamp_speed(once, 200), once);
        assert!((-200..=200).contains(&once));
    }
}

#[test]
fn outputs_never_exceed_max_speed() {
    let params = ControlParams::default()
        .with_gains(10_000.0, 50.0)
        .with_base_speed(150)
        .with_max_speed(200);
    let mut state = ControllerState::initialize(&params).unwrap();

    for position in [0, 4000, 0, 4000, 2000, 3999, 1] {
        let cmd = state.update(&params, position, CENTER);
        assert!(cmd.left.abs() <= 200, "{:?}", cmd);
        assert!(cmd.right.abs() <= 200, "{:?}", cmd);
    }
}

// ============================================================================
// Symmetry
// ============================================================================

#[test]
fn mirrored_error_mirrors_command() {
    let params = ControlParams::default();
    for (e, filtered, last) in [(600, 120.0, 80.0), (1500, -40.0, 10.0), (37, 0.0, 0.0)] {
        let mut a = ControllerState::with_errors(filtered, last);
        let mut b = ControllerState::with_errors(-filtered, -last);

        let cmd_a = a.update(&params, CENTER + e, CENTER);
        let cmd_b = b.update(&params, CENTER - e, CENTER);

        assert_eq!(cmd_a, cmd_b.mirrored());
        assert_eq!(a.filtered_error, -b.filtered_error);
    }
}

#[test]
fn mirrored_error_mirrors_command_with_modulation() {
    let params = ControlParams::default().with_speed_modulation(Some(SpeedModulation::default()));
    let mut a = ControllerState::default();
    let mut b = ControllerState::default();

    for e in [200, 900, 1800, 400] {
        let cmd_a = a.update(&params, CENTER + e, CENTER);
        let cmd_b = b.update(&params, CENTER - e, CENTER);
        assert_eq!(cmd_a, cmd_b.mirrored());
    }
}

// ============================================================================
// Golden Scenario
// ============================================================================

#[test]
fn golden_unit_gain_scenario() {
    let params = ControlParams::default()
        .with_gains(1.0, 0.0)
        .with_alpha(0.5)
        .with_base_speed(100)
        .with_max_speed(200);
    let mut state = ControllerState::initialize(&params).unwrap();

    let first = state.step(&params, 2000, CENTER);
    assert_eq!(first.raw_error, 0);
    assert_eq!(first.filtered_error, 0.0);
    assert_eq!(first.command(), MotorCommand::new(100, 100));

    let second = state.step(&params, 2600, CENTER);
    assert_eq!(second.raw_error, 600);
    assert_close(second.filtered_error, 300.0, 1e-4);
    // (0.5)^3 / (1 + 0.5^3) = 1/9
    assert_close(second.shaped_error, 1.0 / 9.0, 1e-6);
    assert_close(second.correction, 1.0 / 9.0, 1e-6);
    // 100 -/+ 0.111 rounds back to 100
    assert_eq!(second.command(), MotorCommand::new(100, 100));
}

// ============================================================================
// Configuration Rejection
// ============================================================================

#[test]
fn initialize_rejects_alpha_above_one() {
    let params = ControlParams::default().with_alpha(1.5);
    assert_eq!(
        ControllerState::initialize(&params),
        Err(ConfigError::AlphaOutOfRange(1.5))
    );
}

#[test]
fn initialize_rejects_zero_max_speed() {
    let params = ControlParams::default().with_alpha(0.5).with_max_speed(0);
    assert_eq!(
        ControllerState::initialize(&params),
        Err(ConfigError::NonPositiveMaxSpeed(0))
    );
}
