//! Per-connection state.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::path::PathBuf;

/// Server-to-client line terminator (LF then CR).
pub const LINE_END: &str = "\n\r";

/// Queued reply bytes at which a session stops being read from and stops
/// dispatching buffered commands until the peer drains its output.
pub const OUTPUT_HIGH_WATER: usize = 64 * 1024;

/// Accumulates raw bytes and yields complete command lines.
#[derive(Debug, Default)]
pub struct InputBuffer {
    bytes: Vec<u8>,
}

impl InputBuffer {
    pub fn extend(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    /// Next complete line without its terminator. CR, LF and CRLF all end a
    /// line; blank lines are dropped.
    pub fn next_line(&mut self) -> Option<String> {
        loop {
            let end = self.bytes.iter().position(|b| *b == b'\n' || *b == b'\r')?;
            let line: Vec<u8> = self.bytes.drain(..=end).collect();
            if end > 0 {
                return Some(String::from_utf8_lossy(&line[..end]).into_owned());
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> usize {
        self.bytes.len()
    }
}

pub enum ReadOutcome {
    Data(usize),
    WouldBlock,
    Eof,
}

pub struct Session {
    stream: TcpStream,
    peer: SocketAddr,
    cwd: PathBuf,
    input: InputBuffer,
    output: Vec<u8>,
}

impl Session {
    pub fn new(stream: TcpStream, peer: SocketAddr, cwd: PathBuf) -> Self {
        Session { stream, peer, cwd, input: InputBuffer::default(), output: Vec::new() }
    }

    pub fn stream(&self) -> &TcpStream {
        &self.stream
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn cwd_mut(&mut self) -> &mut PathBuf {
        &mut self.cwd
    }

    /// One read of at most `cap` bytes into the input buffer.
    pub fn fill(&mut self, cap: usize) -> io::Result<ReadOutcome> {
        let mut chunk = vec![0u8; cap];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => return Ok(ReadOutcome::Eof),
                Ok(n) => {
                    self.input.extend(&chunk[..n]);
                    return Ok(ReadOutcome::Data(n));
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(ReadOutcome::WouldBlock),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    pub fn next_line(&mut self) -> Option<String> {
        self.input.next_line()
    }

    pub fn queue_line(&mut self, line: &str) {
        self.output.extend_from_slice(line.as_bytes());
        self.output.extend_from_slice(LINE_END.as_bytes());
    }

    pub fn has_pending_output(&self) -> bool {
        !self.output.is_empty()
    }

    pub fn output_congested(&self) -> bool {
        self.output.len() >= OUTPUT_HIGH_WATER
    }

    #[cfg(test)]
    pub(crate) fn queued_output(&self) -> usize {
        self.output.len()
    }

    #[cfg(test)]
    pub(crate) fn pending_input(&self) -> usize {
        self.input.pending()
    }

    /// Writes as much queued output as the socket takes without blocking.
    pub fn flush(&mut self) -> io::Result<()> {
        while !self.output.is_empty() {
            match self.stream.write(&self.output) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => {
                    self.output.drain(..n);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
