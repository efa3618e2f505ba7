/*!
    concrete [Transport] over a real serial port.

    The robot's console is 8N1 at 115200 baud by default. Reads are buffered
    internally so [read_line](Transport::read_line) can stay non-blocking:
    the port is only polled for a very short while, and an empty buffer is
    returned when the device has nothing to say yet.
*/

use std::{
    io,
    path::{Path, PathBuf},
    time::Duration,
    };
use serial2_tokio::{SerialPort, CharSize, StopBits, Parity};
use tokio::time::timeout;

use crate::link::Transport;


/// baud rate of the robot's console
pub const DEFAULT_BAUD: u32 = 115_200;

/// how long one poll of the port may block
const POLL_WINDOW: Duration = Duration::from_millis(1);


/// serial port transport with buffered line reads
pub struct SerialLink {
    port: Option<SerialPort>,
    buffer: Vec<u8>,
}

impl SerialLink {
    /// open the given serial port file at the given baud rate
    pub fn open(path: impl AsRef<Path>, rate: u32) -> io::Result<Self> {
        let port = SerialPort::open(path, |mut settings: serial2_tokio::Settings| {
                settings.set_raw();
                settings.set_baud_rate(rate)?;
                settings.set_char_size(CharSize::Bits8);
                settings.set_stop_bits(StopBits::One);
                settings.set_parity(Parity::None);
                Ok(settings)
                })?;
        Ok(Self {
            port: Some(port),
            buffer: Vec::new(),
        })
    }

    /// serial port files present on this machine
    pub fn available_ports() -> io::Result<Vec<PathBuf>> {
        SerialPort::available_ports()
    }

    /// poll the port once, appending whatever arrived to the internal buffer
    async fn poll_port(&mut self) -> io::Result<()> {
        let Some(port) = &self.port
            else {return Err(io::ErrorKind::NotConnected.into())};
        let mut scratch = [0u8; 256];
        match timeout(POLL_WINDOW, port.read(&mut scratch)).await {
            Ok(Ok(received)) => self.buffer.extend_from_slice(&scratch[.. received]),
            Ok(Err(error)) if error.kind() == io::ErrorKind::TimedOut => {},
            Ok(Err(error)) => return Err(error),
            // nothing arrived within the window
            Err(_) => {},
        }
        Ok(())
    }

    /// pop the first complete line out of the internal buffer, if any
    fn pop_line(&mut self) -> Option<Vec<u8>> {
        let end = self.buffer.iter().position(|&byte| byte == b'\n')?;
        let rest = self.buffer.split_off(end + 1);
        Some(std::mem::replace(&mut self.buffer, rest))
    }
}

impl Transport for SerialLink {
    async fn send_data(&mut self, data: &[u8]) -> io::Result<()> {
        let Some(port) = &self.port
            else {return Err(io::ErrorKind::NotConnected.into())};
        port.write_all(data).await
    }

    async fn read_line(&mut self) -> io::Result<Vec<u8>> {
        if let Some(line) = self.pop_line() {
            return Ok(line)
        }
        self.poll_port().await?;
        Ok(self.pop_line().unwrap_or_default())
    }

    async fn read_all(&mut self) -> io::Result<Vec<u8>> {
        self.poll_port().await?;
        Ok(std::mem::take(&mut self.buffer))
    }

    async fn close(&mut self) -> io::Result<()> {
        match self.port.take() {
            // dropping the port closes the file descriptor
            Some(port) => drop(port),
            None => return Err(io::ErrorKind::NotConnected.into()),
        }
        self.buffer.clear();
        Ok(())
    }
}
