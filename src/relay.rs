//! Fan-out relay.
//!
//! A kernel pipe hands each byte to one reader only, so broadcasting a
//! stage's output goes through a relay process: it drains the producer
//! completely, then every consumer gets its own copy from its own writer
//! process. A consumer that stops reading only loses its own copy.

use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::OwnedFd;

use nix::sys::signal::{self, SigHandler, Signal};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};

use crate::channel::{self, RelayEnds};
use crate::error::{ShellResult, SysContext};

const RELAY_INITIAL_CAPACITY: usize = 1024;
const RELAY_CHUNK: usize = 4096;

/// Reads `feed` to end of file into a buffer that doubles whenever it fills up.
pub fn drain<R: Read>(feed: &mut R) -> io::Result<Vec<u8>> {
	let mut data: Vec<u8> = Vec::with_capacity(RELAY_INITIAL_CAPACITY);
	let mut chunk = [0u8; RELAY_CHUNK];
	loop {
		let n = match feed.read(&mut chunk) {
			Ok(0) => break,
			Ok(n) => n,
			Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
			Err(e) => return Err(e),
		};
		if data.len() + n > data.capacity() {
			let want = std::cmp::max(data.capacity() * 2, data.len() + n);
			data.reserve_exact(want - data.len());
		}
		data.extend_from_slice(&chunk[.. n]);
	}
	Ok(data)
}

/// Writes the whole buffer to one consumer. A consumer that has gone away is not an error.
pub fn deliver<W: Write>(outlet: &mut W, data: &[u8]) -> io::Result<()> {
	match outlet.write_all(data).and_then(|_| outlet.flush()) {
		Err(ref e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
		r => r,
	}
}

fn deliver_to(outlet: OwnedFd, data: &[u8]) -> bool {
	let mut file = File::from(outlet);
	match deliver(&mut file, data) {
		Ok(()) => true,
		Err(e) => {
			let _ = writeln!(io::stderr(), "relay: write: {}", e);
			false
		},
	}
}

fn broadcast(data: &[u8], outlets: Vec<OwnedFd>) -> ShellResult<bool> {
	let mut outlets: Vec<Option<OwnedFd>> = outlets.into_iter().map(Some).collect();
	let mut writers: Vec<Pid> = Vec::with_capacity(outlets.len());
	let last = outlets.len().saturating_sub(1);

	for k in 0 .. last {
		match unsafe { unistd::fork() }.sys("fork")? {
			ForkResult::Parent { child } => {
				writers.push(child);
				if let Some(fd) = outlets[k].take() {
					channel::close(fd)?;
				}
			},
			ForkResult::Child => {
				let mine = outlets[k].take();
				for other in outlets.iter_mut() {
					if let Some(fd) = other.take() {
						channel::close(fd)?;
					}
				}
				let ok = mine.map_or(true, |fd| deliver_to(fd, data));
				unsafe { libc::_exit(if ok { 0 } else { 1 }) }
			},
		}
	}

	let mut ok = match outlets.get_mut(last).and_then(|o| o.take()) {
		Some(fd) => deliver_to(fd, data),
		None => true,
	};
	for pid in writers {
		match waitpid(pid, None).sys("wait")? {
			WaitStatus::Exited(_, 0) => {},
			_ => ok = false,
		}
	}
	Ok(ok)
}

fn relay(ends: RelayEnds) -> ShellResult<bool> {
	let mut feed = File::from(ends.feed);
	let data = drain(&mut feed)?;
	drop(feed);
	broadcast(&data, ends.outlets)
}

/// Body of the relay process. Never returns.
pub fn run(ends: RelayEnds) -> ! {
	let _ = unsafe { signal::signal(Signal::SIGINT, SigHandler::SigDfl) };
	let _ = unsafe { signal::signal(Signal::SIGPIPE, SigHandler::SigIgn) };
	let status = match relay(ends) {
		Ok(true) => 0,
		Ok(false) => 1,
		Err(e) => {
			let _ = writeln!(io::stderr(), "relay: {}", e);
			1
		},
	};
	unsafe { libc::_exit(status) }
}
