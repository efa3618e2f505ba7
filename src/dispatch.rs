/*!
    orchestration of complete send/ack cycles.

    The [Dispatcher] runs one task at a time against a transport: expand
    through the angle guard, drain stale input, encode, transmit in paced
    chunks, wait for the acknowledgment, pause. Nothing overlaps: a task is
    fully acknowledged (or given up on) before the next one starts.
*/

use std::{
    io,
    time::Duration,
    };
use log::*;
use tokio::time::sleep;

use crate::{
    Error,
    frame, guard,
    link::{Transport, Reply, transmit, await_ack, decode_lenient, CHUNK_PACING},
    task::Task,
    };


/// joint commands are given this long to be echoed, whatever the caller asked
const JOINT_ACK_TIMEOUT: Duration = Duration::from_secs(1);


/// runs tasks to completion against a transport
#[derive(Clone, Debug)]
pub struct Dispatcher {
    /// pause between consecutive wire chunks of one frame
    pub chunk_pacing: Duration,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self {chunk_pacing: CHUNK_PACING}
    }
}

impl Dispatcher {
    pub fn new() -> Self {Self::default()}

    /**
        run one logical task: expand it through the angle guard, then send
        each resulting task strictly in order and wait for its
        acknowledgment.

        A failure while sending one task is logged and degraded to
        [Reply::TimedOut] so a caller iterating a command sequence never
        aborts on one bad task. With no transport at hand the task is
        dropped and [Reply::TimedOut] returned without any I/O.

        Returns the last task's reply.
    */
    pub async fn send<T: Transport>(
        &self,
        port: Option<&mut T>,
        task: Task,
        timeout: Option<Duration>,
    ) -> Reply {
        debug!("task: {:?}", task);
        let Some(port) = port else {
            warn!("no serial link, dropping task");
            return Reply::TimedOut
        };
        let mut last = Reply::TimedOut;
        for task in guard::expand(task) {
            last = match self.send_one(port, &task, timeout).await {
                Ok(reply) => reply,
                Err(error) => {
                    error!("error while sending task {:?}: {}", task, error);
                    Reply::TimedOut
                },
            };
        }
        last
    }

    /// run an ordered sequence of logical tasks, returning the last reply
    pub async fn send_queue<T: Transport>(
        &self,
        port: Option<&mut T>,
        tasks: impl IntoIterator<Item=Task>,
        timeout: Option<Duration>,
    ) -> Reply {
        let Some(port) = port else {
            warn!("no serial link, dropping task queue");
            return Reply::TimedOut
        };
        let mut last = Reply::TimedOut;
        for task in tasks {
            last = self.send(Some(&mut *port), task, timeout).await;
        }
        last
    }

    /// one encode/transmit/await/pace cycle for an already expanded task
    async fn send_one<T: Transport>(
        &self,
        port: &mut T,
        task: &Task,
        timeout: Option<Duration>,
    ) -> Result<Reply, Error> {
        let stale = port.read_all().await?;
        if !stale.is_empty() {
            debug!("previous buffer: {:?}", decode_lenient(&stale));
        }

        let frame = frame::encode(task)?;
        transmit(port, &frame, self.chunk_pacing).await?;

        let token = task.token()?;
        // joint commands are echoed fast or not at all
        let timeout = match token {
            'I' | 'L' => Some(JOINT_ACK_TIMEOUT),
            _ => timeout,
        };
        let reply = await_ack(port, token, timeout).await?;
        sleep(task.pacing).await;
        Ok(reply)
    }

    /**
        shut down a whole set of ports.

        With `clear_first`, a universal stop (`d`) is broadcast to every
        port before any close, so the robot rests instead of freezing
        mid-motion; the vector is emptied afterwards. Each close gets its
        own failure boundary: a failed close is retried once, and a port
        that still refuses does not prevent the remaining ports from being
        closed. The first persistent failure is reported at the end.
    */
    pub async fn close_all<T: Transport>(
        &self,
        ports: &mut Vec<T>,
        clear_first: bool,
    ) -> Result<(), Error> {
        if clear_first {
            for port in ports.iter_mut() {
                self.send(Some(port), Task::bare("d", Duration::ZERO), Some(Duration::from_secs(1))).await;
            }
        }
        let mut failure = None;
        for port in ports.iter_mut() {
            match close_with_retry(port).await {
                Ok(()) => info!("closed the serial port"),
                Err(error) => {
                    error!("failed to close a serial port: {}", error);
                    failure.get_or_insert(error);
                },
            }
        }
        if clear_first {
            ports.clear();
        }
        match failure {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }
}

async fn close_with_retry<T: Transport>(port: &mut T) -> io::Result<()> {
    if let Err(error) = port.close().await {
        warn!("close failed, retrying: {}", error);
        port.close().await?;
    }
    Ok(())
}
