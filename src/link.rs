/*!
    link discipline: the transport contract, chunked transmission and the
    acknowledgment polling loop.

    The device has a tiny serial intake buffer and needs pauses between
    writes, so a frame is never handed to the transport in one piece
    ([transmit]). After a command, the device echoes its token back as a
    line; [await_ack] polls for that line under an escalating deadline.
*/

use std::{
    io,
    time::Duration,
    };
use log::*;
use tokio::time::{Instant, sleep};

use crate::task::ack_matches;


/// largest write the device's intake buffer tolerates
pub const MAX_CHUNK: usize = 20;
/// default pause between consecutive chunks of one frame
pub const CHUNK_PACING: Duration = Duration::from_millis(1);

/// pause between two polls of the reply buffer
const POLL_TICK: Duration = Duration::from_millis(1);
/// each missed deadline extends the threshold by this much
const THRESHOLD_STEP: Duration = Duration::from_secs(2);
/// a threshold extended beyond this gives up instead
const THRESHOLD_CEILING: Duration = Duration::from_secs(5);


/** byte-oriented transport carrying frames to the robot

    implementations must make [read_line](Transport::read_line) non-blocking:
    it yields an empty buffer when no complete line is waiting.
*/
pub trait Transport {
    /// put bytes on the wire
    async fn send_data(&mut self, data: &[u8]) -> io::Result<()>;
    /// next buffered reply line (terminator included), empty if none waiting
    async fn read_line(&mut self) -> io::Result<Vec<u8>>;
    /// drain everything currently buffered
    async fn read_all(&mut self) -> io::Result<Vec<u8>>;
    /// release the underlying device
    async fn close(&mut self) -> io::Result<()>;
}

/// outcome of waiting for an acknowledgment
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    /// the device acknowledged the sent token
    Ack {
        /// the matching line, as received
        line: String,
        /// concatenation of the non-matching lines seen while waiting
        chatter: String,
    },
    /// no acknowledgment arrived in time, or the send failed altogether
    TimedOut,
}


/**
    deliver a frame as consecutive chunks of at most [MAX_CHUNK] bytes,
    pausing `pacing` after each write.

    write failures propagate, nothing is retried here.
*/
pub async fn transmit<T: Transport>(port: &mut T, frame: &[u8], pacing: Duration) -> io::Result<()> {
    for chunk in frame.chunks(MAX_CHUNK) {
        port.send_data(chunk).await?;
        sleep(pacing).await;
    }
    debug!("sent frame: {:?}", frame);
    Ok(())
}

/**
    poll the transport until a line acknowledges `token`, or give up.

    Replies are decoded leniently (each byte taken as one character, the
    device is not strict UTF-8) and trimmed at their first carriage-return
    before matching. The deadline starts at 4s for `k`/`K` commands (skills
    take longer to settle) and 3s otherwise; each miss extends it by 2s until
    it would pass 5s, at which point the wait fails. A caller-supplied
    `timeout` that elapses first fails the wait regardless.

    Lines seen before the match are returned as diagnostic chatter.
*/
pub async fn await_ack<T: Transport>(
    port: &mut T,
    token: char,
    timeout: Option<Duration>,
) -> io::Result<Reply> {
    let start = Instant::now();
    let mut threshold =
        if token.eq_ignore_ascii_case(&'k') {Duration::from_secs(4)}
        else {Duration::from_secs(3)};
    let mut chatter = String::new();
    loop {
        sleep(POLL_TICK).await;
        let bytes = port.read_line().await?;
        if !bytes.is_empty() {
            let line = decode_lenient(&bytes);
            debug!("response: {:?}", line);
            if ack_matches(token, &line) {
                return Ok(Reply::Ack {line, chatter})
            }
            chatter.push_str(&line);
        }
        let elapsed = start.elapsed();
        if elapsed > threshold {
            debug!("no acknowledgment of {:?} after {:?}", token, threshold);
            threshold += THRESHOLD_STEP;
            if threshold > THRESHOLD_CEILING {
                return Ok(Reply::TimedOut)
            }
        }
        if let Some(timeout) = timeout {
            if timeout > Duration::ZERO && elapsed > timeout {
                return Ok(Reply::TimedOut)
            }
        }
    }
}

/// decode one byte per character, so non-ASCII protocol bytes survive
pub fn decode_lenient(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| byte as char).collect()
}
