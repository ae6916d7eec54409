use std::fmt;
use std::io::{self, Write};

use nix::errno::Errno;
use nix::sys::wait::{self, WaitStatus};
use nix::unistd::{self, Pid};

use crate::error::{ShellError, ShellResult, SysContext};

/// What a forked process is doing for the pipeline.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Role {
	Stage(usize),
	/// Relay broadcasting the output of the given stage.
	Relay(usize),
}

pub trait WaitStatusExt {
	/// The status word as wait(2) would have stored it.
	fn raw(self) -> i32;
	fn is_terminated(self) -> bool;
}

impl WaitStatusExt for WaitStatus {
	fn raw(self) -> i32 {
		match self {
			WaitStatus::Exited(_, code) => (code & 0xff) << 8,
			WaitStatus::Signaled(_, sig, core) => (sig as i32) | if core { 0x80 } else { 0 },
			WaitStatus::Stopped(_, sig) => ((sig as i32) << 8) | 0x7f,
			WaitStatus::Continued(_) => 0xffff,
			_ => 0,
		}
	}

	fn is_terminated(self) -> bool {
		match self {
			WaitStatus::Exited(..) | WaitStatus::Signaled(..) => true,
			_ => false,
		}
	}
}

/// One forked process. Once reaped its status is final and it is reported.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Report {
	pub pid: Pid,
	pub role: Role,
	pub status: WaitStatus,
}

impl Report {
	pub fn raw_status(&self) -> i32 {
		self.status.raw()
	}
}

impl fmt::Display for Report {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let (kind, idx) = match self.role {
			Role::Stage(i) => ("Process", i),
			Role::Relay(i) => ("Relay", i),
		};
		write!(f, "-------- {}[{}] pid: {} status: {} --------", kind, idx, self.pid, self.raw_status())
	}
}

#[derive(Debug, Default)]
pub struct Job {
	pub processes: Vec<Report>,
}

impl Job {
	fn pending(&self) -> usize {
		self.processes.iter().filter(|pr| !pr.status.is_terminated()).count()
	}

	/// Blocks until every process of the job has terminated, returning them in completion order.
	pub fn wait(&mut self) -> ShellResult<Vec<Report>> {
		let mut reports = Vec::with_capacity(self.processes.len());
		while self.pending() > 0 {
			let status = match wait::wait() {
				Ok(s) => s,
				Err(Errno::EINTR) => continue,
				Err(e) => return Err(ShellError::Sys { op: "wait", source: e }),
			};
			let pid = match status.pid() {
				Some(pid) => pid,
				None => continue,
			};
			match self.processes.iter_mut().find(|pr| pr.pid == pid) {
				Some(pr) => {
					pr.status = status;
					if status.is_terminated() {
						tracing::debug!(pid = pid.as_raw(), ?status, "reaped");
						reports.push(*pr);
					}
				},
				None => tracing::warn!(pid = pid.as_raw(), "reaped a process this job never started"),
			}
		}
		Ok(reports)
	}
}

#[derive(Debug)]
pub struct JobBuilder {
	imp: Job,
}

impl JobBuilder {
	pub fn new(size_hint: usize) -> JobBuilder {
		JobBuilder {
			imp: Job { processes: Vec::with_capacity(size_hint) }
		}
	}

	/// Forks, recording the child in the parent.
	pub fn push_fork(&mut self, role: Role) -> ShellResult<unistd::ForkResult> {
		let _ = io::stdout().flush();
		let _ = io::stderr().flush();
		let r = unsafe { unistd::fork() }.sys("fork")?;
		if let unistd::ForkResult::Parent { child } = r {
			tracing::debug!(pid = child.as_raw(), ?role, "forked");
			self.imp.processes.push(Report { pid: child, role: role, status: WaitStatus::StillAlive });
		}
		Ok(r)
	}

	pub fn build(self) -> Job {
		self.imp
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use nix::sys::signal::Signal;

	#[test]
	fn raw_status_encoding() {
		let pid = Pid::from_raw(42);
		assert_eq!(WaitStatus::Exited(pid, 0).raw(), 0);
		assert_eq!(WaitStatus::Exited(pid, 1).raw(), 256);
		assert_eq!(WaitStatus::Signaled(pid, Signal::SIGINT, false).raw(), 2);
		assert_eq!(WaitStatus::Signaled(pid, Signal::SIGSEGV, true).raw(), 11 | 0x80);
	}

	#[test]
	fn report_line() {
		let r = Report { pid: Pid::from_raw(7), role: Role::Stage(1), status: WaitStatus::Exited(Pid::from_raw(7), 2) };
		assert_eq!(r.to_string(), "-------- Process[1] pid: 7 status: 512 --------");
		let r = Report { pid: Pid::from_raw(8), role: Role::Relay(0), status: WaitStatus::Exited(Pid::from_raw(8), 0) };
		assert_eq!(r.to_string(), "-------- Relay[0] pid: 8 status: 0 --------");
	}

	#[test]
	fn empty_job_waits_for_nothing() {
		let mut job = JobBuilder::new(0).build();
		assert!(job.wait().unwrap().is_empty());
	}
}
