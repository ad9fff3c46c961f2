//! Desktop simulator: the plotter firmware loop with stdin/stdout as the
//! serial link and mock stepper drivers.
//!
//! Type protocol commands directly, or use `goto <x_mm> <y_mm>` to have the
//! host-side cable geometry compute the step targets:
//!
//! ```text
//! M 4095 -2048
//! T
//! goto 100 120
//! ```
//!
//! Telemetry replies go to stdout; logs go to stderr.
//!
//! # Usage
//!
//! ```sh
//! cargo run --example desktop_sim --features sim
//! cargo run --example desktop_sim --features sim -- plotter.json
//! ```
//!
//! The optional JSON file overrides any [`Config`] field, for example
//! `{"motion": {"sync_policy": "speed_and_acceleration"}}`.

use std::io::{self, BufRead};
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use ploptart::hal::{ChannelSerial, HostSerialError, MockStepper, StdClock};
use ploptart::kinematics::{CableGeometry, Point};
use ploptart::protocol::encode_move;
use ploptart::traits::Clock;
use ploptart::{Config, PlotterController, RunnerError, SerialServiceRunner};

/// Idle sleep between loop ticks when nothing is moving.
const IDLE_SLEEP: Duration = Duration::from_millis(1);

fn main() -> anyhow::Result<()> {
    init_logging()?;

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path))?;
            Config::from_json(&json).with_context(|| format!("parsing config {}", path))?
        }
        None => Config::default(),
    };
    config.validate()?;

    log::info!("=================================");
    log::info!("  {} desktop simulator", config.device.name);
    log::info!("=================================");

    let home_steps = [
        config.axes.first().map_or(0, |a| a.home_position),
        config.axes.get(1).map_or(0, |a| a.home_position),
    ];
    let geometry = CableGeometry::new(config.geometry.clone()).with_home_steps(home_steps);

    let (tx, rx) = mpsc::channel();
    spawn_host_input(geometry.clone(), tx)?;

    let serial_config = config.serial.clone();
    let drivers = (0..config.axes.len()).map(|_| MockStepper::new());
    let controller = PlotterController::new(config, drivers)?;
    let mut runner = SerialServiceRunner::new(
        controller,
        ChannelSerial::new(rx, io::stdout()),
        &serial_config,
    );
    let clock = StdClock::new();
    let mut was_running = false;

    loop {
        match runner.tick(clock.now_us()) {
            Ok(report) => {
                let running = runner.controller().is_running();
                if was_running && !running {
                    report_idle(runner.controller(), &geometry)?;
                }
                was_running = running;
                if report.command.is_none() && !running {
                    thread::sleep(IDLE_SLEEP);
                }
            }
            Err(RunnerError::Serial(HostSerialError::Disconnected)) => {
                // Input closed: finish the current move, then exit.
                while runner.controller().is_running() {
                    runner.controller_mut().poll(clock.now_us()).ok();
                }
                report_idle(runner.controller(), &geometry)?;
                return Ok(());
            }
            Err(e) => log::error!("{}", e),
        }
    }
}

fn init_logging() -> anyhow::Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:5} {}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .level_for("ploptart", log::LevelFilter::Debug)
        .chain(io::stderr())
        .apply()?;
    Ok(())
}

fn report_idle<D: ploptart::StepperDriver>(
    controller: &PlotterController<D>,
    geometry: &CableGeometry,
) -> anyhow::Result<()> {
    let state = serde_json::to_string(&controller.state())?;
    log::info!("idle: {}", state);
    let positions = controller.positions();
    if let [left, right, ..] = positions.as_slice() {
        match geometry.pen_for([*left, *right]) {
            Some(pen) => log::info!("pen at ({:.1}, {:.1}) mm", pen.x, pen.y),
            None => log::warn!("cable lengths do not meet; pen position unknown"),
        }
    }
    Ok(())
}

/// Forward stdin to the serial channel, translating `goto` lines into moves.
fn spawn_host_input(geometry: CableGeometry, tx: Sender<u8>) -> io::Result<()> {
    thread::Builder::new()
        .name("host-input".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        log::warn!("stdin read failed: {}", e);
                        break;
                    }
                };
                let bytes = match translate(&geometry, &line) {
                    Some(encoded) => encoded,
                    None => format!("{}\n", line),
                };
                if bytes.bytes().try_for_each(|b| tx.send(b)).is_err() {
                    break;
                }
            }
        })?;
    Ok(())
}

fn translate(geometry: &CableGeometry, line: &str) -> Option<String> {
    let mut tokens = line.split_whitespace();
    if tokens.next()? != "goto" {
        return None;
    }
    let x: f32 = tokens.next()?.parse().ok()?;
    let y: f32 = tokens.next()?.parse().ok()?;
    let targets = geometry.targets_for(Point::new(x, y));
    log::info!("goto ({}, {}) mm -> steps {:?}", x, y, targets);
    Some(encode_move(&targets).as_str().to_string())
}
