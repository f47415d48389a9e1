//! Single-threaded readiness loop over the listener and every session.
//!
//! The only blocking call is `poll(2)`. Each tick builds the poll set from the
//! live sessions, turns the returned flags into [`Event`]s and handles them all
//! before waiting again.

use std::collections::BTreeMap;
use std::io;
use std::net::{SocketAddr, TcpListener};
use std::os::fd::AsFd;
use std::path::PathBuf;

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::dispatch::dispatch;
use crate::error::ServerError;
use crate::fs::{Filesystem, LocalFs};
use crate::parser::parse_line;
use crate::session::{ReadOutcome, Session};

pub const GREETING: &str = "Enter --help";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Token(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Accept,
    Read(Token),
    Write(Token),
}

pub struct Server<F: Filesystem = LocalFs> {
    listener: TcpListener,
    sessions: BTreeMap<Token, Session>,
    next_token: u64,
    root: PathBuf,
    read_cap: usize,
    fs: F,
}

impl Server<LocalFs> {
    pub fn bind(config: &Config) -> Result<Self, ServerError> {
        Server::with_fs(config, LocalFs)
    }
}

impl<F: Filesystem> Server<F> {
    pub fn with_fs(config: &Config, fs: F) -> Result<Self, ServerError> {
        let root = fs
            .canonicalize(&config.root)
            .map_err(|source| ServerError::Root { path: config.root.clone(), source })?;
        if !fs.is_dir(&root) {
            return Err(ServerError::RootNotDirectory(root));
        }
        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&addr).map_err(|source| ServerError::Bind { addr, source })?;
        listener.set_nonblocking(true)?;
        Ok(Server {
            listener,
            sessions: BTreeMap::new(),
            next_token: 0,
            root,
            read_cap: config.read_cap,
            fs,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Runs until the readiness wait itself fails.
    pub fn run(&mut self) -> Result<(), ServerError> {
        info!(addr = ?self.local_addr().ok(), root = %self.root.display(), "server started");
        loop {
            self.tick()?;
        }
    }

    /// One readiness wait followed by handling every ready event.
    pub fn tick(&mut self) -> Result<(), ServerError> {
        for event in self.wait()? {
            match event {
                Event::Accept => self.accept_ready(),
                Event::Read(token) => self.read_ready(token),
                Event::Write(token) => self.write_ready(token),
            }
        }
        Ok(())
    }

    fn wait(&self) -> Result<Vec<Event>, ServerError> {
        let mut tokens = Vec::with_capacity(self.sessions.len());
        let mut fds = Vec::with_capacity(self.sessions.len() + 1);
        fds.push(PollFd::new(self.listener.as_fd(), PollFlags::POLLIN));
        for (token, session) in &self.sessions {
            // a congested session is only drained, not read
            let mut flags = if session.output_congested() { PollFlags::empty() } else { PollFlags::POLLIN };
            if session.has_pending_output() {
                flags |= PollFlags::POLLOUT;
            }
            fds.push(PollFd::new(session.stream().as_fd(), flags));
            tokens.push(*token);
        }
        loop {
            match poll(&mut fds, PollTimeout::NONE) {
                Ok(_) => break,
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(ServerError::Poll(e)),
            }
        }

        let mut events = Vec::new();
        if fds[0].revents().is_some_and(|r| r.contains(PollFlags::POLLIN)) {
            events.push(Event::Accept);
        }
        // hangup and error surface through the read path as EOF or an io error
        let readable = PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR | PollFlags::POLLNVAL;
        for (pfd, token) in fds[1..].iter().zip(tokens) {
            let Some(revents) = pfd.revents() else { continue };
            if revents.intersects(readable) {
                events.push(Event::Read(token));
            }
            if revents.contains(PollFlags::POLLOUT) {
                events.push(Event::Write(token));
            }
        }
        Ok(events)
    }

    fn accept_ready(&mut self) {
        let (stream, peer) = match self.listener.accept() {
            Ok(pair) => pair,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
            Err(e) => {
                warn!(error = %e, "accept failed");
                return;
            }
        };
        if let Err(e) = stream.set_nonblocking(true) {
            warn!(%peer, error = %e, "cannot make connection non-blocking, dropping");
            return;
        }
        let token = Token(self.next_token);
        self.next_token += 1;
        info!(%peer, token = token.0, "client accepted");

        let mut session = Session::new(stream, peer, self.root.clone());
        session.queue_line(GREETING);
        if let Err(e) = session.flush() {
            info!(%peer, token = token.0, error = %e, "client disconnected");
            return;
        }
        self.sessions.insert(token, session);
    }

    fn read_ready(&mut self, token: Token) {
        let Some(session) = self.sessions.get_mut(&token) else { return };
        match session.fill(self.read_cap) {
            Ok(ReadOutcome::Data(n)) => debug!(token = token.0, bytes = n, "read"),
            Ok(ReadOutcome::WouldBlock) => return,
            Ok(ReadOutcome::Eof) => return self.close(token, "end of stream"),
            Err(e) => return self.close(token, &e.to_string()),
        }
        self.serve(token);
    }

    fn write_ready(&mut self, token: Token) {
        let Some(session) = self.sessions.get_mut(&token) else { return };
        if let Err(e) = session.flush() {
            return self.close(token, &e.to_string());
        }
        // commands held back while congested resume once output drains
        self.serve(token);
    }

    /// Dispatches buffered lines while the output queue is below the
    /// high-water mark, flushing between rounds. Stops when the input holds no
    /// complete line or the socket stops taking bytes.
    fn serve(&mut self, token: Token) {
        let Some(session) = self.sessions.get_mut(&token) else { return };
        loop {
            let mut exhausted = false;
            while !session.output_congested() {
                let Some(line) = session.next_line() else {
                    exhausted = true;
                    break;
                };
                let Some(cmd) = parse_line(&line) else {
                    debug!(token = token.0, "unrecognized command ignored");
                    continue;
                };
                debug!(token = token.0, verb = cmd.verb.as_str(), args = cmd.args.len(), "dispatching");
                for reply in dispatch(&self.fs, session.cwd_mut(), &cmd) {
                    session.queue_line(&reply);
                }
            }
            if let Err(e) = session.flush() {
                return self.close(token, &e.to_string());
            }
            if exhausted || session.output_congested() {
                break;
            }
        }
    }

    fn close(&mut self, token: Token, reason: &str) {
        if let Some(session) = self.sessions.remove(&token) {
            info!(peer = %session.peer(), token = token.0, reason, "client disconnected");
        }
    }
}
