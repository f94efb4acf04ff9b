//! End-to-end tests for the control cycle using the mock HAL.

use speedybee::chime::Chime;
use speedybee::config::{LoopConfig, SensorConfig};
use speedybee::expander::Mcp23017;
use speedybee::hal::{
    MockButtons, MockDelay, MockDisplay, MockDrive, MockI2c, MockInputPin, MockLineSensor,
    MockReflectance, MockTone,
};
use speedybee::sensor::{LinePolarity, QtrArray};
use speedybee::traits::{Keypad, LineSensor, StatusDisplay};
use speedybee::{
    forward_button, ControlParams, LineFollower, LoggingMenu, MotorCommand, RobotConfig,
    RobotError, SensorFault,
};

fn robot_with(
    positions: &[u16],
    config: RobotConfig,
) -> LineFollower<MockLineSensor, MockDrive> {
    let mut sensor = MockLineSensor::new(config.sensor.channel_count);
    sensor.queue_positions(positions);
    LineFollower::new(sensor, MockDrive::new(), config).unwrap()
}

// ============================================================================
// Control Cycle
// ============================================================================

#[test]
fn straight_line_runs_at_base_speed() {
    let mut robot = robot_with(&[2000; 10], RobotConfig::default());
    for _ in 0..10 {
        robot.step().unwrap();
    }
    assert!(robot.drive().commands.iter().all(|&c| c == (60, 60)));
    assert_eq!(robot.cycles(), 10);
}

#[test]
fn line_to_the_left_speeds_up_right_wheel() {
    let mut robot = robot_with(&[2000, 3000, 3000, 3000], RobotConfig::default());
    robot.step().unwrap();

    for _ in 0..3 {
        let report = robot.step().unwrap();
        assert!(report.command.right > report.command.left, "{:?}", report);
    }
}

#[test]
fn line_to_the_right_speeds_up_left_wheel() {
    let mut robot = robot_with(&[2000, 1000, 1000], RobotConfig::default());
    robot.step().unwrap();

    let report = robot.step().unwrap();
    assert!(report.command.left > report.command.right);
}

#[test]
fn tuned_gain_golden_scenario() {
    let config = RobotConfig::default().with_control(
        ControlParams::default()
            .with_gains(90.0, 0.0)
            .with_alpha(0.5)
            .with_base_speed(100),
    );
    let mut robot = robot_with(&[2000, 2600], config);

    assert_eq!(robot.step().unwrap().command, MotorCommand::new(100, 100));
    // 90 * 1/9 = 10
    assert_eq!(robot.step().unwrap().command, MotorCommand::new(90, 110));
    assert_eq!(robot.drive().last(), Some((90, 110)));
}

#[test]
fn calibrate_resets_controller_memory() {
    let mut robot = robot_with(&[4000, 4000, 4000], RobotConfig::default());
    robot.step().unwrap();
    robot.step().unwrap();
    assert!(robot.controller().state().filtered_error > 0.0);

    robot.calibrate().unwrap();
    assert_eq!(robot.controller().state().filtered_error, 0.0);
    assert_eq!(robot.controller().state().last_error, 0.0);
}

#[test]
fn telemetry_breakdown_matches_command() {
    let config = RobotConfig::default().with_loop(LoopConfig::default().with_telemetry(true));
    let mut robot = robot_with(&[2600], config);

    let report = robot.step().unwrap();
    let telemetry = report.telemetry.unwrap();
    assert_eq!(telemetry.command(), report.command);
    assert_eq!(telemetry.raw_error, 600);

    let line = telemetry.to_line();
    assert!(line.starts_with("2600,600,"));
    assert!(line.ends_with(&format!(",{},{}", report.command.left, report.command.right)));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn drive_error_propagates() {
    let mut drive = MockDrive::new();
    drive.fail = true;
    let mut robot = LineFollower::new(MockLineSensor::new(5), drive, RobotConfig::default()).unwrap();
    assert_eq!(robot.step(), Err(RobotError::Drive(())));
    assert_eq!(robot.cycles(), 0);
}

#[test]
fn sensor_error_leaves_controller_untouched() {
    let mut robot = robot_with(&[3000], RobotConfig::default());
    robot.step().unwrap();
    let before = *robot.controller().state();

    robot.sensor_mut().fail_next_read();
    assert!(robot.step().is_err());
    assert_eq!(*robot.controller().state(), before);
}

// ============================================================================
// Line-Lost Detection
// ============================================================================

#[test]
fn line_lost_stops_and_freezes_then_recovers() {
    let config = RobotConfig::default().with_loop(LoopConfig::default().with_line_lost_cycles(3));
    let mut robot = robot_with(&[4000, 4000, 4000, 4000, 2000], config);

    robot.step().unwrap();
    let report = robot.step().unwrap();
    assert_eq!(report.fault, None);
    assert!(!report.fault_onset);
    let frozen = *robot.controller().state();

    for onset in [true, false] {
        let report = robot.step().unwrap();
        assert_eq!(report.fault, Some(SensorFault::LineLost));
        assert_eq!(report.fault_onset, onset);
        assert_eq!(report.command, MotorCommand::STOP);
        assert!(report.telemetry.is_none());
        assert_eq!(*robot.controller().state(), frozen);
    }
    assert_eq!(robot.drive().last(), Some((0, 0)));

    let report = robot.step().unwrap();
    assert_eq!(report.fault, None);
    assert!(!report.fault_onset);
    assert!(report.telemetry.is_some());
    assert_ne!(*robot.controller().state(), frozen);
}

#[test]
fn line_lost_disabled_by_default() {
    let mut robot = robot_with(&[0; 50], RobotConfig::default());
    for _ in 0..50 {
        assert_eq!(robot.step().unwrap().fault, None);
    }
    // Hard turn toward the right: left wheel leads
    let (left, right) = robot.drive().last().unwrap();
    assert!(left > right);
}

// ============================================================================
// Reflectance Pipeline
// ============================================================================

#[test]
fn qtr_array_drives_the_runner() {
    let mut reader = MockReflectance::<5>::new();
    reader.queue([100; 5]);
    reader.queue([2500; 5]);
    // Dark line under channel 3
    reader.queue([100, 100, 100, 2500, 100]);

    let qtr = QtrArray::new(reader, LinePolarity::DarkOnLight, 50);
    let config =
        RobotConfig::default().with_sensor(SensorConfig::default().with_calibration_samples(2));
    let mut robot = LineFollower::new(qtr, MockDrive::new(), config).unwrap();

    robot.calibrate().unwrap();
    assert!(robot.sensor().calibration().is_calibrated());

    let report = robot.step().unwrap();
    assert_eq!(report.reading.position, 3000);
    assert_eq!(report.reading.intensities.as_slice(), &[0, 0, 0, 1000, 0]);
    assert!(report.command.right > report.command.left);
}

#[test]
fn qtr_lost_line_snaps_to_last_side() {
    let mut reader = MockReflectance::<5>::new();
    reader.queue([100; 5]);
    reader.queue([2500; 5]);
    reader.queue([100, 100, 100, 100, 2500]);
    // Off the tape entirely
    reader.queue([100; 5]);

    let mut qtr = QtrArray::new(reader, LinePolarity::DarkOnLight, 50);
    qtr.calibrate(2).unwrap();

    assert_eq!(qtr.read_line().unwrap().position, 4000);
    assert_eq!(qtr.read_line().unwrap().position, 4000);
}

#[test]
fn light_line_polarity() {
    let mut reader = MockReflectance::<5>::new();
    reader.queue([100; 5]);
    reader.queue([2500; 5]);
    // Bright line under channel 1 on a dark floor
    reader.queue([2500, 100, 2500, 2500, 2500]);

    let mut qtr = QtrArray::new(reader, LinePolarity::LightOnDark, 50);
    qtr.calibrate(2).unwrap();
    assert_eq!(qtr.read_line().unwrap().position, 1000);
}

// ============================================================================
// Peripherals
// ============================================================================

#[test]
fn expander_buttons_reach_menu() {
    let mut i2c = MockI2c::new();
    // INTFA: pin 5 (Btn1), then INTCAP read
    i2c.queue_read(&[0b0010_0000, 0]);
    i2c.queue_read(&[0, 0]);

    let mut expander = Mcp23017::new(i2c).with_interrupt_pin(MockInputPin::low());
    let mut menu = LoggingMenu::new();

    assert_eq!(
        forward_button(&mut expander, &mut menu).unwrap(),
        Some(Keypad::Btn1)
    );

    // INT released after the capture read
    expander.interrupt_pin_mut().low = false;
    for _ in 0..10 {
        assert_eq!(forward_button(&mut expander, &mut menu).unwrap(), None);
    }
    assert_eq!(menu.presses(), 1);
    assert_eq!(expander.release().writes.len(), 2);
}

#[test]
fn buttons_do_not_disturb_steering() {
    let mut robot = robot_with(&[2600, 2600], RobotConfig::default());
    let mut reference = robot_with(&[2600, 2600], RobotConfig::default());
    let mut buttons = MockButtons::new();
    buttons.press(Keypad::Key1);
    buttons.press(Keypad::Key4);
    let mut menu = LoggingMenu::new();

    for _ in 0..2 {
        let a = robot.step().unwrap();
        forward_button(&mut buttons, &mut menu).unwrap();
        let b = reference.step().unwrap();
        assert_eq!(a.command, b.command);
    }
    assert_eq!(menu.last(), Some(Keypad::Key4));
}

#[test]
fn startup_sequence_feedback() {
    let mut tone = MockTone::new();
    let mut delay = MockDelay::new();
    let mut display = MockDisplay::new();

    display.init().unwrap();
    display.show_message("SpeedyBee!", Some("Starting...")).unwrap();
    Chime::Startup.play(&mut tone, &mut delay).unwrap();
    Chime::Ready.play(&mut tone, &mut delay).unwrap();

    assert!(display.initialized);
    assert_eq!(display.last_message(), Some("SpeedyBee!"));
    assert_eq!(tone.history, vec![523, 659, 784, 1047, 0, 2000, 0]);
    assert_eq!(delay.total_ms(), 1100);
}

#[test]
fn fault_chime_plays_once_per_fault() {
    let config = RobotConfig::default().with_loop(LoopConfig::default().with_line_lost_cycles(2));
    let mut robot = robot_with(&[4000, 4000, 4000, 4000, 2000, 4000, 4000], config);
    let mut tone = MockTone::new();
    let mut delay = MockDelay::new();

    let mut chimes = 0;
    for _ in 0..7 {
        if robot.step().unwrap().fault_onset {
            Chime::Fault.play(&mut tone, &mut delay).unwrap();
            chimes += 1;
        }
    }

    // One per run of lost-line cycles
    assert_eq!(chimes, 2);
    assert_eq!(tone.history, vec![440, 0, 440, 0, 440, 0, 440, 0]);
}

#[test]
fn display_renders_reading() {
    let mut robot = robot_with(&[1500], RobotConfig::default());
    let mut display = MockDisplay::new();

    let report = robot.step().unwrap();
    display
        .render_sensors(&report.reading.intensities, report.reading.position)
        .unwrap();

    assert_eq!(display.renders.len(), 1);
    assert_eq!(display.renders[0].1, 1500);
}
