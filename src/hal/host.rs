//! Desktop implementations for running the plotter loop on a host machine.
//!
//! The polling loop must never block, so stdin is read on a helper thread
//! and handed over through a channel.

use std::fmt;
use std::io::{self, Read, Write};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Instant;

use crate::traits::{Clock, SerialPort};

/// Monotonic clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    start: Instant,
}

impl StdClock {
    /// Clock with its epoch at creation time.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    fn now_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

/// Error from a [`ChannelSerial`].
#[derive(Debug)]
pub enum HostSerialError {
    /// The sending side of the input channel is gone.
    Disconnected,
    /// Writing output failed.
    Io(io::Error),
}

impl fmt::Display for HostSerialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostSerialError::Disconnected => write!(f, "input channel closed"),
            HostSerialError::Io(e) => write!(f, "write failed: {}", e),
        }
    }
}

impl std::error::Error for HostSerialError {}

/// Serial link over a byte channel (input) and any writer (output).
pub struct ChannelSerial<W: Write> {
    input: Receiver<u8>,
    output: W,
}

impl<W: Write> ChannelSerial<W> {
    /// Build from an input channel and an output writer.
    pub fn new(input: Receiver<u8>, output: W) -> Self {
        Self { input, output }
    }

    /// Borrow the output writer.
    pub fn output(&self) -> &W {
        &self.output
    }
}

/// Forward every byte from `reader` into `tx` on a background thread.
///
/// The thread exits at end of input or when the receiver is dropped.
pub fn spawn_reader<R>(reader: R, tx: Sender<u8>) -> io::Result<thread::JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name("serial-input".into())
        .spawn(move || {
            for byte in reader.bytes() {
                match byte {
                    Ok(byte) => {
                        if tx.send(byte).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        log::warn!("input read failed: {}", e);
                        break;
                    }
                }
            }
        })
}

impl<W: Write> SerialPort for ChannelSerial<W> {
    type Error = HostSerialError;

    fn read_byte(&mut self) -> Result<Option<u8>, Self::Error> {
        match self.input.try_recv() {
            Ok(byte) => Ok(Some(byte)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(HostSerialError::Disconnected),
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.output.write_all(bytes).map_err(HostSerialError::Io)?;
        self.output.flush().map_err(HostSerialError::Io)
    }
}
