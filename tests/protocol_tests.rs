//! Integration tests for the serial command loop

use ploptart::hal::{MockClock, MockSerial, MockStepper};
use ploptart::protocol::{encode_move, parse_telemetry};
use ploptart::traits::Clock;
use ploptart::{Command, Config, PlotterController, SerialConfig, SerialServiceRunner};

type Runner = SerialServiceRunner<MockStepper, MockSerial>;

fn runner_with(config: Config) -> Runner {
    let serial_config = config.serial.clone();
    let controller =
        PlotterController::new(config, [MockStepper::new(), MockStepper::new()]).unwrap();
    SerialServiceRunner::new(controller, MockSerial::new(), &serial_config)
}

fn runner() -> Runner {
    runner_with(Config::default())
}

fn tick_until_idle(runner: &mut Runner, clock: &mut MockClock) {
    loop {
        runner.tick(clock.now_us()).unwrap();
        clock.advance(50);
        if !runner.controller().is_running() && runner.serial().pending_input() == 0 {
            break;
        }
        assert!(clock.now_us() < 60_000_000, "runner never settled");
    }
}

// ============================================================================
// Moves
// ============================================================================

#[test]
fn move_then_telemetry() {
    let mut runner = runner();
    let mut clock = MockClock::new();

    runner.serial_mut().queue_input(b"M 300 -150\n");
    tick_until_idle(&mut runner, &mut clock);

    runner.serial_mut().queue_input(b"T");
    runner.tick(clock.now_us()).unwrap();
    assert_eq!(runner.serial().output_str(), "300,-150\n");
}

#[test]
fn host_encoded_move_round_trip() {
    let mut runner = runner();
    let mut clock = MockClock::new();

    runner.serial_mut().queue_input(encode_move(&[-42, 17]).as_bytes());
    tick_until_idle(&mut runner, &mut clock);
    runner.serial_mut().queue_input(b"T");
    runner.tick(clock.now_us()).unwrap();

    let reply = runner.serial_mut().take_output();
    assert_eq!(parse_telemetry(&reply).unwrap().as_slice(), &[-42, 17]);
}

#[test]
fn telemetry_mid_motion_matches_positions() {
    let mut runner = runner();
    let mut clock = MockClock::new();

    runner.serial_mut().queue_input(b"M 4095 2048\n");
    while clock.now_us() < 1_500_000 {
        runner.tick(clock.now_us()).unwrap();
        clock.advance(50);
    }

    let before = runner.controller().positions();
    runner.serial_mut().queue_input(b"T");
    let report = runner.tick(clock.now_us()).unwrap();
    assert_eq!(report.command, Some(Command::Telemetry));

    let reply = runner.serial_mut().take_output();
    let reported = parse_telemetry(&reply).unwrap();
    assert_eq!(reported, before);
    assert!(reported[0] > 0 && reported[0] < 4095);
    assert!(runner.controller().is_running());
}

#[test]
fn new_move_retargets_in_flight() {
    let mut runner = runner();
    let mut clock = MockClock::new();

    runner.serial_mut().queue_input(b"M 1000 1000\n");
    for _ in 0..10_000 {
        runner.tick(clock.now_us()).unwrap();
        clock.advance(50);
    }
    runner.serial_mut().queue_input(b"M 0 0\n");
    tick_until_idle(&mut runner, &mut clock);

    assert_eq!(runner.controller().positions().as_slice(), &[0, 0]);
}

#[test]
fn stepping_continues_while_bytes_trickle_in() {
    let mut runner = runner();
    let mut clock = MockClock::new();

    runner.serial_mut().queue_input(b"M 2000 2000\n");
    runner.tick(clock.now_us()).unwrap();

    // A slow host: one byte per tick.
    let mut steps = 0;
    for byte in b"M 2000 1000\n" {
        clock.advance(20_000);
        runner.serial_mut().queue_input(&[*byte]);
        steps += runner.tick(clock.now_us()).unwrap().steps;
    }
    assert!(steps > 0);
    assert_eq!(runner.controller().targets().as_slice(), &[2000, 1000]);
}

// ============================================================================
// Malformed input
// ============================================================================

#[test]
fn short_move_leaves_state_unchanged() {
    let mut runner = runner();
    let before = runner.controller().state();

    runner.serial_mut().queue_input(b"M 10\n");
    let report = runner.tick(0).unwrap();

    assert_eq!(report.command, None);
    assert_eq!(runner.controller().state(), before);
    assert_eq!(runner.serial().output_str(), "");
}

#[test]
fn garbage_between_commands_is_skipped() {
    let mut runner = runner();
    let mut clock = MockClock::new();

    runner
        .serial_mut()
        .queue_input(b"hello\nM 1 two\nM 5 5 5\n\r\nM 20 -20\n");
    tick_until_idle(&mut runner, &mut clock);

    assert_eq!(runner.controller().positions().as_slice(), &[20, -20]);
    assert_eq!(runner.serial().output_str(), "");
}

#[test]
fn overflowing_line_is_dropped() {
    let config = Config::default().with_serial(SerialConfig::default().with_line_capacity(12));
    let mut runner = runner_with(config);
    let mut clock = MockClock::new();

    runner
        .serial_mut()
        .queue_input(b"M 1000000000 1000000000\nM 7 8\n");
    tick_until_idle(&mut runner, &mut clock);

    assert_eq!(runner.controller().positions().as_slice(), &[7, 8]);
}

#[test]
fn telemetry_byte_mid_line_is_not_a_request() {
    let mut runner = runner();
    let mut clock = MockClock::new();

    runner.serial_mut().queue_input(b"M 1 T\n");
    tick_until_idle(&mut runner, &mut clock);

    assert_eq!(runner.serial().output_str(), "");
    assert!(!runner.controller().is_running());
    assert_eq!(runner.controller().positions().as_slice(), &[0, 0]);
}
