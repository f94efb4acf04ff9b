//! ESP32 line-following robot firmware.
//!
//! Brings up the peripherals, calibrates the reflectance array, then runs
//! the fixed-delay control loop forever:
//! - Reads the line position and steers the wheels
//! - Polls the keypad and forwards presses to the menu handler
//! - Renders sensor bars to the OLED display (if enabled)
//!
//! # Build
//!
//! ```bash
//! # Basic (sensor + motors + keypad)
//! cargo build --release --features esp32 --bin esp32_main
//!
//! # With display
//! cargo build --release --features esp32,display --bin esp32_main
//! ```
//!
//! Set `SPEEDYBEE_TELEMETRY=1` at build time to log every cycle.

use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{IOPin, OutputPin, PinDriver};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::prelude::*;
use speedybee::chime::Chime;
use speedybee::expander::Mcp23017;
use speedybee::hal::esp32::{pins, Esp32Buzzer, Esp32Clock, Esp32Drive, Esp32QtrReader, WheelPins};
use speedybee::imu::Bmi323;
use speedybee::traits::{Clock, MotionSensor};
use speedybee::{forward_button, LineFollower, LoggingMenu, LoopConfig, QtrArray, RobotConfig};
use std::thread;
use std::time::Duration;

/// Sensor channels on the robot.
const CHANNELS: usize = 5;

/// Cycles between display refreshes (I2C redraw is slower than a cycle)
#[cfg(feature = "display")]
const DISPLAY_EVERY: u64 = 20;

/// Cycles between loop-rate reports
const RATE_REPORT_EVERY: u64 = 2000;

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    // =========================================================================
    // Configuration
    // =========================================================================
    let telemetry = option_env!("SPEEDYBEE_TELEMETRY").is_some_and(|v| v == "1");
    let config = RobotConfig::default()
        .with_loop(LoopConfig::default().with_telemetry(telemetry));
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    log::info!("================================");
    log::info!("  {}", config.device.name);
    log::info!("================================");

    let peripherals = Peripherals::take()?;
    let mut delay = FreeRtos;

    // =========================================================================
    // Buzzer (LEDC timer1 / channel2)
    // =========================================================================
    let mut buzzer = Esp32Buzzer::new(
        peripherals.ledc.timer1,
        peripherals.ledc.channel2,
        peripherals.pins.gpio23,
    )?;
    Chime::Boot.play(&mut buzzer, &mut delay)?;
    log::info!("[OK] Buzzer initialized (GPIO{})", pins::BUZZER);

    // =========================================================================
    // Display (SSD1306 on GPIO4/5) - Optional
    // =========================================================================
    #[cfg(feature = "display")]
    let mut display = {
        use speedybee::hal::esp32::Esp32Display;
        use speedybee::traits::StatusDisplay;

        let i2c = I2cDriver::new(
            peripherals.i2c0,
            peripherals.pins.gpio4, // SDA
            peripherals.pins.gpio5, // SCL
            &I2cConfig::new().baudrate(400.kHz().into()),
        )?;

        let mut disp =
            Esp32Display::new(i2c).map_err(|e| anyhow::anyhow!("Display init failed: {:?}", e))?;
        disp.init()
            .map_err(|e| anyhow::anyhow!("Display init failed: {:?}", e))?;
        let _ = disp.show_message(&config.device.name, Some("Starting..."));
        log::info!(
            "[OK] Display initialized (0x{:02X}, GPIO{}/{} I2C)",
            pins::OLED_I2C_ADDR,
            pins::OLED_SDA,
            pins::OLED_SCL
        );
        disp
    };

    // =========================================================================
    // Sensor bus (GPIO21/22): IMU check, then the keypad expander
    // =========================================================================
    let bus = I2cDriver::new(
        peripherals.i2c1,
        peripherals.pins.gpio21, // SDA
        peripherals.pins.gpio22, // SCL
        &I2cConfig::new().baudrate(400.kHz().into()),
    )?;

    let mut imu = Bmi323::new(bus);
    match imu.begin(&mut delay) {
        Ok(()) => {
            let id = imu.chip_id().unwrap_or(0);
            match imu.read_sample() {
                Ok(sample) => log::info!(
                    "[OK] IMU 0x{:02X}: accel {:?} gyro {:?} {:.1} C",
                    id,
                    sample.accel,
                    sample.gyro,
                    sample.temperature_c
                ),
                Err(e) => log::warn!("[WARN] IMU read failed: {:?}", e),
            }
        }
        Err(e) => log::warn!("[SKIP] IMU not responding: {:?}", e),
    }
    // The IMU is diagnostics only; the bus belongs to the keypad from here on
    let bus = imu.release();

    // Polls stay off the bus until INTA (GPIO32) goes low
    let mut expander =
        Mcp23017::new(bus).with_interrupt_pin(PinDriver::input(peripherals.pins.gpio32)?);
    expander
        .setup()
        .map_err(|e| anyhow::anyhow!("Expander setup failed: {:?}", e))?;
    log::info!(
        "[OK] Expander initialized (0x22, GPIO{}/{} I2C, INT GPIO{})",
        pins::I2C_SDA,
        pins::I2C_SCL,
        pins::EXPANDER_INT
    );

    // =========================================================================
    // Drive (TB6612 on GPIO25/26/27 and GPIO14/12/13)
    // =========================================================================
    let drive = Esp32Drive::new(
        peripherals.ledc.timer0,
        peripherals.ledc.channel0,
        peripherals.ledc.channel1,
        WheelPins {
            in1: peripherals.pins.gpio25.downgrade_output(),
            in2: peripherals.pins.gpio26.downgrade_output(),
            pwm: peripherals.pins.gpio27.downgrade_output(),
        },
        WheelPins {
            in1: peripherals.pins.gpio14.downgrade_output(),
            in2: peripherals.pins.gpio12.downgrade_output(),
            pwm: peripherals.pins.gpio13.downgrade_output(),
        },
    )?;
    log::info!(
        "[OK] Drive initialized (left GPIO{}/{}/{}, right GPIO{}/{}/{})",
        pins::AIN1,
        pins::AIN2,
        pins::PWMA,
        pins::BIN1,
        pins::BIN2,
        pins::PWMB
    );

    // =========================================================================
    // Reflectance array (RC on GPIO15..19)
    // =========================================================================
    let reader = Esp32QtrReader::<CHANNELS>::new([
        peripherals.pins.gpio15.downgrade(),
        peripherals.pins.gpio16.downgrade(),
        peripherals.pins.gpio17.downgrade(),
        peripherals.pins.gpio18.downgrade(),
        peripherals.pins.gpio19.downgrade(),
    ])?;
    let qtr = QtrArray::new(reader, config.sensor.polarity, config.sensor.noise_floor);
    log::info!(
        "[OK] Line sensor initialized ({} channels, GPIO{:?})",
        CHANNELS,
        pins::QTR
    );

    Chime::Startup.play(&mut buzzer, &mut delay)?;

    // =========================================================================
    // Calibration
    // =========================================================================
    let mut robot = LineFollower::new(qtr, drive, config)
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    #[cfg(feature = "display")]
    {
        use speedybee::traits::StatusDisplay;
        let _ = display.show_message("Calibrating", Some("Sweep over line"));
    }
    robot.calibrate()?;
    Chime::Ready.play(&mut buzzer, &mut delay)?;

    let clock = Esp32Clock::new();
    let mut menu = LoggingMenu::new();
    let cycle_delay = Duration::from_millis(u64::from(robot.cycle_delay_ms()));
    let mut window_start = clock.now_ms();
    let mut next_report = RATE_REPORT_EVERY;

    log::info!(
        "Starting control loop ({} ms cycle delay)...",
        robot.cycle_delay_ms()
    );

    // =========================================================================
    // Main Control Loop
    // =========================================================================
    loop {
        match robot.step() {
            Ok(report) => {
                if report.fault_onset {
                    // Wheels are already stopped
                    if let Err(e) = Chime::Fault.play(&mut buzzer, &mut delay) {
                        log::warn!("Fault chime failed: {:?}", e);
                    }
                }

                #[cfg(feature = "display")]
                if robot.cycles() % DISPLAY_EVERY == 0 {
                    use speedybee::traits::StatusDisplay;
                    let _ = match report.fault {
                        Some(fault) => display.show_message("Stopped", Some(&fault.to_string())),
                        None => display
                            .render_sensors(&report.reading.intensities, report.reading.position),
                    };
                }
                #[cfg(not(feature = "display"))]
                let _ = report;
            }
            Err(e) => {
                log::error!("Cycle failed: {}", e);
                let _ = robot.stop();
            }
        }

        // ---------------------------------------------------------------------
        // Keypad (independent of steering)
        // ---------------------------------------------------------------------
        if let Err(e) = forward_button(&mut expander, &mut menu) {
            log::warn!("Keypad poll failed: {:?}", e);
        }

        // ---------------------------------------------------------------------
        // Loop rate
        // ---------------------------------------------------------------------
        if robot.cycles() >= next_report {
            next_report += RATE_REPORT_EVERY;
            let now = clock.now_ms();
            let elapsed = now.saturating_sub(window_start).max(1);
            let (left, right) = robot.drive().outputs();
            log::info!(
                "{} cycles, {} Hz, wheels {:?} / {:?}",
                robot.cycles(),
                RATE_REPORT_EVERY * 1000 / elapsed,
                left,
                right
            );
            window_start = now;
        }

        thread::sleep(cycle_delay);
    }
}
