#![allow(dead_code)]

use std::{
    collections::VecDeque,
    io,
    sync::{Arc, Mutex},
    };

use quadlink::Transport;


/// scripted state of one mock port, inspectable after the port is consumed
#[derive(Default)]
pub struct State {
    /// every chunk handed to `send_data`, in order
    pub written: Vec<Vec<u8>>,
    /// reply lines served one per `read_line` call
    pub replies: VecDeque<Vec<u8>>,
    /// bytes pretending to be left over from before the current command
    pub stale: Vec<u8>,
    /// number of `send_data` calls that should fail before writes succeed
    pub failing_writes: usize,
    /// number of `close` calls that should fail before closing succeeds
    pub failing_closes: usize,
    pub close_calls: usize,
    pub closed: bool,
}

/// in-memory transport driven by a [State] script
pub struct MockPort {
    pub name: &'static str,
    pub state: Arc<Mutex<State>>,
    /// cross-port journal of writes/drains/closes, shared between mocks
    pub journal: Arc<Mutex<Vec<String>>>,
}

impl MockPort {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Arc::default(),
            journal: Arc::default(),
        }
    }
    /// a mock sharing the journal of another, to assert cross-port ordering
    pub fn sharing_journal(name: &'static str, other: &Self) -> Self {
        Self {
            name,
            state: Arc::default(),
            journal: other.journal.clone(),
        }
    }
    pub fn reply(&self, line: &[u8]) {
        self.state.lock().unwrap().replies.push_back(line.to_vec());
    }
    /// all written chunks concatenated back together
    pub fn wire(&self) -> Vec<u8> {
        self.state.lock().unwrap().written.concat()
    }
    pub fn journal_entries(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }
    fn record(&self, action: &str) {
        self.journal.lock().unwrap().push(format!("{} {}", self.name, action));
    }
}

impl Transport for MockPort {
    async fn send_data(&mut self, data: &[u8]) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_writes > 0 {
            state.failing_writes -= 1;
            return Err(io::ErrorKind::BrokenPipe.into())
        }
        state.written.push(data.to_vec());
        drop(state);
        self.record("write");
        Ok(())
    }

    async fn read_line(&mut self) -> io::Result<Vec<u8>> {
        Ok(self.state.lock().unwrap().replies.pop_front().unwrap_or_default())
    }

    async fn read_all(&mut self) -> io::Result<Vec<u8>> {
        let drained = std::mem::take(&mut self.state.lock().unwrap().stale);
        self.record("drain");
        Ok(drained)
    }

    async fn close(&mut self) -> io::Result<()> {
        self.record("close");
        let mut state = self.state.lock().unwrap();
        state.close_calls += 1;
        if state.failing_closes > 0 {
            state.failing_closes -= 1;
            return Err(io::ErrorKind::BrokenPipe.into())
        }
        state.closed = true;
        Ok(())
    }
}
