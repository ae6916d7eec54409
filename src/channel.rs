//! Pipe endpoints for one pipeline run.
//!
//! Every endpoint is an `OwnedFd` held in exactly one slot of the table and is
//! closed by whoever takes it out. After a fork both processes hold their own
//! table and close what they don't use.

use std::os::fd::{AsRawFd, IntoRawFd, OwnedFd, RawFd};

use nix::fcntl::{self, FcntlArg, FdFlag, OFlag};
use nix::unistd;

use crate::error::{ShellResult, SysContext};
use crate::plan::{Plan, Sink};

/// Ends a relay works with: the producer's output and one write end per consumer.
#[derive(Debug)]
pub struct RelayEnds {
	pub feed: OwnedFd,
	pub outlets: Vec<OwnedFd>,
}

/// Ends wired to a stage's standard input and output.
#[derive(Debug, Default)]
pub struct StageEnds {
	pub stdin: Option<OwnedFd>,
	pub stdout: Option<OwnedFd>,
}

#[derive(Debug)]
pub struct ChannelTable {
	readers: Vec<Option<OwnedFd>>,
	writers: Vec<Option<OwnedFd>>,
	relays: Vec<Option<RelayEnds>>,
}

impl ChannelTable {
	/// Opens every pipe the plan needs, `O_CLOEXEC` so exec'd programs only see what was installed.
	pub fn open(plan: &Plan) -> ShellResult<ChannelTable> {
		let n = plan.len();
		let mut table = ChannelTable {
			readers: (0 .. n).map(|_| None).collect(),
			writers: (0 .. n).map(|_| None).collect(),
			relays: (0 .. n).map(|_| None).collect(),
		};
		// One pipe per used slot; a relayed producer's slots become relay outlets.
		let mut outlets: Vec<Vec<OwnedFd>> = (0 .. n).map(|_| vec![]).collect();
		for consumer in 1 .. n {
			let producer = match plan.upstream(consumer) {
				Some(p) => p,
				None => continue,
			};
			let (r, w) = unistd::pipe2(OFlag::O_CLOEXEC).sys("pipe")?;
			table.readers[consumer] = Some(r);
			match *plan.sink(producer) {
				Sink::Relay(_) => outlets[producer].push(w),
				_ => table.writers[producer] = Some(w),
			}
		}
		for (producer, outlets) in outlets.into_iter().enumerate() {
			if outlets.is_empty() {
				continue;
			}
			let (feed, w) = unistd::pipe2(OFlag::O_CLOEXEC).sys("pipe")?;
			table.writers[producer] = Some(w);
			table.relays[producer] = Some(RelayEnds { feed: feed, outlets: outlets });
		}
		Ok(table)
	}

	pub fn take_stage(&mut self, i: usize) -> StageEnds {
		StageEnds { stdin: self.readers[i].take(), stdout: self.writers[i].take() }
	}

	pub fn take_relay(&mut self, producer: usize) -> Option<RelayEnds> {
		self.relays[producer].take()
	}

	/// Closes the ends belonging to stage `i` in this process.
	pub fn close_stage(&mut self, i: usize) -> ShellResult<()> {
		let ends = self.take_stage(i);
		ends.close()
	}

	pub fn close_relay(&mut self, producer: usize) -> ShellResult<()> {
		match self.take_relay(producer) {
			Some(relay) => relay.close(),
			None => Ok(()),
		}
	}

	/// Closes every endpoint still held.
	pub fn close_all(&mut self) -> ShellResult<()> {
		for i in 0 .. self.readers.len() {
			self.close_stage(i)?;
			self.close_relay(i)?;
		}
		Ok(())
	}

}

impl StageEnds {
	pub fn close(self) -> ShellResult<()> {
		if let Some(fd) = self.stdin { close(fd)?; }
		if let Some(fd) = self.stdout { close(fd)?; }
		Ok(())
	}
}

impl RelayEnds {
	pub fn close(self) -> ShellResult<()> {
		close(self.feed)?;
		for fd in self.outlets {
			close(fd)?;
		}
		Ok(())
	}
}

pub fn close(fd: OwnedFd) -> ShellResult<()> {
	unistd::close(fd.into_raw_fd()).sys("close")
}

/// Makes `fd` the descriptor `target` and releases the original.
pub fn install(fd: OwnedFd, target: RawFd) -> ShellResult<()> {
	if fd.as_raw_fd() == target {
		fcntl::fcntl(target, FcntlArg::F_SETFD(FdFlag::empty())).sys("fcntl")?;
		let _ = fd.into_raw_fd();
		return Ok(());
	}
	unistd::dup2(fd.as_raw_fd(), target).sys("dup2")?;
	close(fd)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::parser;

	fn table(line: &str) -> ChannelTable {
		let plan = Plan::build(&parser::parse(line.as_bytes()).stages);
		ChannelTable::open(&plan).unwrap()
	}

	fn held(t: &ChannelTable) -> (Vec<bool>, Vec<bool>) {
		(t.readers.iter().map(|e| e.is_some()).collect(), t.writers.iter().map(|e| e.is_some()).collect())
	}

	#[test]
	fn no_channels_for_sequential() {
		let t = table("a , b");
		assert_eq!(held(&t), (vec![false, false], vec![false, false]));
		assert!(t.relays.iter().all(|r| r.is_none()));
	}

	#[test]
	fn one_pipe_two_ends() {
		let mut t = table("a | b");
		assert_eq!(held(&t), (vec![false, true], vec![true, false]));
		let ends = t.take_stage(0);
		assert!(ends.stdin.is_none());
		assert!(ends.stdout.is_some());
		ends.close().unwrap();
		t.close_all().unwrap();
		assert_eq!(held(&t), (vec![false, false], vec![false, false]));
	}

	#[test]
	fn relay_ends() {
		let mut t = table("a || b | c");
		// stage 0 writes the relay feed, stages 1 and 2 read relay outlets
		assert_eq!(held(&t), (vec![false, true, true], vec![true, false, false]));
		let relay = t.take_relay(0).unwrap();
		assert_eq!(relay.outlets.len(), 2);
		relay.close().unwrap();
		assert!(t.take_relay(0).is_none());
		assert!(t.take_stage(1).stdin.is_some());
		t.close_all().unwrap();
		assert_eq!(held(&t), (vec![false, false, false], vec![false, false, false]));
	}

	#[test]
	fn relay_then_pipe() {
		let t = table("a || b | c | d");
		assert_eq!(held(&t), (vec![false, true, true, true], vec![true, false, true, false]));
		assert!(t.relays[0].is_some());
		assert!(t.relays[2].is_none());
	}
}
