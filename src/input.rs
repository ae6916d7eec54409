use std::os::fd::{BorrowedFd, RawFd};

use nix::errno::Errno;
use nix::poll::{self, PollFd, PollFlags};
use nix::sys::signal::{self, SigSet, SigmaskHow, Signal};
use nix::unistd;

use crate::error::{ShellError, ShellResult, SysContext};

const READ_CHUNK: usize = 1024;

#[derive(Debug, PartialEq, Eq)]
pub enum ReadLine {
	/// A line, including its newline if it had one.
	Line(Vec<u8>),
	Interrupted,
	Eof,
}

/// Line reader working directly on a descriptor, so that a signal can cut a
/// blocked read short instead of it being retried.
#[derive(Debug)]
pub struct LineReader {
	fd: RawFd,
	buf: Vec<u8>,
	eof: bool,
}

impl LineReader {
	pub fn new(fd: RawFd) -> LineReader {
		LineReader { fd: fd, buf: Vec::with_capacity(READ_CHUNK), eof: false }
	}

	pub fn stdin() -> LineReader {
		LineReader::new(libc::STDIN_FILENO)
	}

	/// Reads the next line. `cancelled` is asked before each blocking read and
	/// after an interrupted one; when it says yes the partial line is dropped.
	///
	/// SIGINT stays blocked between the check and the wait, and is let through
	/// only while `ppoll` sleeps, so a signal landing right after the check still
	/// cuts the wait short.
	pub fn read_line<F>(&mut self, mut cancelled: F) -> ShellResult<ReadLine> where F: FnMut() -> bool {
		let mut sigint = SigSet::empty();
		sigint.add(Signal::SIGINT);
		let mut waiting = SigSet::empty();
		signal::pthread_sigmask(SigmaskHow::SIG_BLOCK, Some(&sigint), Some(&mut waiting)).sys("sigprocmask")?;
		let r = self.fill(&mut cancelled, waiting);
		signal::pthread_sigmask(SigmaskHow::SIG_SETMASK, Some(&waiting), None).sys("sigprocmask")?;
		r
	}

	fn fill<F>(&mut self, cancelled: &mut F, waiting: SigSet) -> ShellResult<ReadLine> where F: FnMut() -> bool {
		let mut chunk = [0u8; READ_CHUNK];
		loop {
			if let Some(pos) = self.buf.iter().position(|&c| c == b'\n') {
				let line: Vec<u8> = self.buf.drain(.. pos + 1).collect();
				return Ok(ReadLine::Line(line));
			}
			if self.eof {
				if self.buf.is_empty() {
					return Ok(ReadLine::Eof);
				}
				return Ok(ReadLine::Line(std::mem::take(&mut self.buf)));
			}
			if cancelled() {
				self.buf.clear();
				return Ok(ReadLine::Interrupted);
			}
			let fd = unsafe { BorrowedFd::borrow_raw(self.fd) };
			match poll::ppoll(&mut [PollFd::new(fd, PollFlags::POLLIN)], None, Some(waiting)) {
				Ok(_) => {},
				Err(Errno::EINTR) => continue,
				Err(e) => return Err(ShellError::Sys { op: "ppoll", source: e }),
			}
			match unistd::read(self.fd, &mut chunk) {
				Ok(0) => self.eof = true,
				Ok(n) => self.buf.extend_from_slice(&chunk[.. n]),
				Err(Errno::EINTR) => continue,
				Err(e) => return Err(ShellError::Sys { op: "read", source: e }),
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs::File;
	use std::io::Write;
	use std::os::fd::IntoRawFd;
	use nix::fcntl::OFlag;

	fn reader_over(content: &[u8]) -> LineReader {
		let (r, w) = unistd::pipe2(OFlag::O_CLOEXEC).unwrap();
		File::from(w).write_all(content).unwrap();
		LineReader::new(r.into_raw_fd())
	}

	#[test]
	fn lines_then_eof() {
		let mut reader = reader_over(b"echo a\nls | wc\ntail");
		assert_eq!(reader.read_line(|| false).unwrap(), ReadLine::Line(b"echo a\n".to_vec()));
		assert_eq!(reader.read_line(|| false).unwrap(), ReadLine::Line(b"ls | wc\n".to_vec()));
		assert_eq!(reader.read_line(|| false).unwrap(), ReadLine::Line(b"tail".to_vec()));
		assert_eq!(reader.read_line(|| false).unwrap(), ReadLine::Eof);
		assert_eq!(reader.read_line(|| false).unwrap(), ReadLine::Eof);
	}

	#[test]
	fn buffered_line_wins_over_cancel() {
		let (r, w) = unistd::pipe2(OFlag::O_CLOEXEC).unwrap();
		let mut w = File::from(w);
		w.write_all(b"one\ntwo\n").unwrap();
		let mut reader = LineReader::new(r.into_raw_fd());
		assert_eq!(reader.read_line(|| false).unwrap(), ReadLine::Line(b"one\n".to_vec()));
		// "two" is already buffered, so no read is needed and cancel is never asked
		assert_eq!(reader.read_line(|| true).unwrap(), ReadLine::Line(b"two\n".to_vec()));
		assert_eq!(reader.read_line(|| true).unwrap(), ReadLine::Interrupted);
	}

	#[test]
	fn cancel_drops_partial_line() {
		let (r, w) = unistd::pipe2(OFlag::O_CLOEXEC).unwrap();
		let mut w = File::from(w);
		w.write_all(b"partial").unwrap();
		let mut reader = LineReader::new(r.into_raw_fd());
		let mut calls = 0;
		let got = reader.read_line(|| { calls += 1; calls > 1 }).unwrap();
		assert_eq!(got, ReadLine::Interrupted);
		w.write_all(b"fresh\n").unwrap();
		assert_eq!(reader.read_line(|| false).unwrap(), ReadLine::Line(b"fresh\n".to_vec()));
	}
}
