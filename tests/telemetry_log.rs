//! Per-cycle telemetry reaches an `Info`-level logger.

use std::sync::Mutex;

use log::{Level, LevelFilter, Log, Metadata, Record};
use speedybee::config::LoopConfig;
use speedybee::hal::{MockDrive, MockLineSensor};
use speedybee::robot::TELEMETRY_TARGET;
use speedybee::{LineFollower, RobotConfig};

/// Captures records the way a firmware logger at its default level would.
struct CaptureLogger {
    lines: Mutex<Vec<(Level, String, String)>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.lines.lock().unwrap().push((
                record.level(),
                record.target().to_string(),
                record.args().to_string(),
            ));
        }
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger {
    lines: Mutex::new(Vec::new()),
};

fn telemetry_lines() -> Vec<(Level, String)> {
    LOGGER
        .lines
        .lock()
        .unwrap()
        .iter()
        .filter(|(_, target, _)| target == TELEMETRY_TARGET)
        .map(|(level, _, line)| (*level, line.clone()))
        .collect()
}

fn run(config: RobotConfig, cycles: usize) {
    let mut sensor = MockLineSensor::new(5);
    sensor.queue_positions(&[2600]);
    let mut robot = LineFollower::new(sensor, MockDrive::new(), config).unwrap();
    for _ in 0..cycles {
        robot.step().unwrap();
    }
}

// Single test: the logger is process-global.
#[test]
fn telemetry_flag_controls_info_lines() {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(LevelFilter::Info);

    run(RobotConfig::default(), 3);
    assert!(telemetry_lines().is_empty());

    let config = RobotConfig::default().with_loop(LoopConfig::default().with_telemetry(true));
    run(config, 3);

    let lines = telemetry_lines();
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|(level, _)| *level == Level::Info));
    assert!(lines[0].1.starts_with("2600,600,"), "{}", lines[0].1);
}
