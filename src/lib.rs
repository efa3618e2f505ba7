/*!
    serial command link for OpenCat-style quadruped robots.

    This crate translates logical motion commands ([Task]) into the robot's
    wire protocol and drives them over a byte-oriented serial link:

    - [frame] encodes a task into the exact byte sequence for the wire
    - [guard] clamps joint angles to the servo range and splits corrections
      into follow-up tasks
    - [link] defines the [Transport] contract, chunked transmission under the
      device's small intake buffer, and the acknowledgment polling loop
    - [dispatch] orchestrates the whole send/ack cycle for one task or an
      ordered sequence

    The `serial` feature (default) provides a [serial::SerialLink] transport
    backed by an actual serial port.
*/

pub mod task;
pub mod frame;
pub mod guard;
pub mod link;
pub mod dispatch;
#[cfg(feature = "serial")]
pub mod serial;

pub use task::{Task, Payload, TaskQueue};
pub use link::{Transport, Reply};
pub use dispatch::Dispatcher;

use thiserror::Error;

/// error regarding the robot command link
#[derive(Error, Debug)]
pub enum Error {
    /// task is structurally invalid (missing header fields, empty command word)
    #[error("malformed task: {0}")]
    MalformedTask(&'static str),
    /// a command word that should carry an integer does not parse as one
    #[error("not an integer: {0:?}")]
    Decode(String),
    /// a value does not fit the one-byte wire width declared by its token
    #[error("value {0} does not fit in one wire byte")]
    Range(i32),
    /// problem with the serial link
    #[error("problem with the serial link")]
    Io(#[from] std::io::Error),
}
