use std::convert::Infallible;
use std::ffi::{CStr, CString, OsStr};
use std::fs;
use std::io::{self, Write};
use std::os::fd::{FromRawFd, OwnedFd, RawFd};
use std::os::unix::ffi::OsStrExt;

use nix::errno::Errno;
use nix::fcntl::{self, OFlag};
use nix::sys::stat::Mode;
use nix::unistd;
use thiserror::Error;

use crate::builtin::{self, Flow};
use crate::channel::{self, ChannelTable, StageEnds};
use crate::error::{BuiltinError, ShellError, ShellResult, StageError, SysContext};
use crate::global;
use crate::interrupt;
use crate::job::{JobBuilder, Report, Role};
use crate::plan::Plan;
use crate::relay;
use crate::types::{Pipeline, RedirectMode, Stage};

const CREATE_MODE: libc::mode_t = 0o666;

#[derive(Debug, Error)]
enum ExecError {
	#[error(transparent)]
	Wiring(#[from] ShellError),
	#[error("execvp: {name}: {source}")]
	Exec { name: String, #[source] source: Errno },
}

impl ExecError {
	fn status(&self) -> i32 {
		match *self {
			ExecError::Wiring(_) => 1,
			ExecError::Exec { source: Errno::ENOENT, .. } => 127,
			ExecError::Exec { .. } => 126,
		}
	}
}

/// A stage with every string already converted for exec, so the child has nothing left to allocate.
struct Prepared {
	argv: Vec<CString>,
	input: Option<CString>,
	output: Option<(CString, RedirectMode)>,
}

impl Prepared {
	fn new(stage: &Stage) -> Result<Prepared, StageError> {
		let argv: Result<Vec<CString>, _> = stage.argv.iter().map(|w| CString::new(&w[..])).collect();
		let input = match stage.input_file() {
			Some(t) => Some(CString::new(t)?),
			None => None,
		};
		let output = match stage.output_file() {
			Some((t, mode)) => Some((CString::new(t)?, mode)),
			None => None,
		};
		Ok(Prepared { argv: argv?, input: input, output: output })
	}
}

#[derive(Debug, Default)]
pub struct Outcome {
	/// Reaped processes in completion order.
	pub reports: Vec<Report>,
	/// `exit` ran; the REPL should stop.
	pub exit: bool,
}

fn redirect_file(path: &CStr, flags: OFlag, target: RawFd) -> ShellResult<()> {
	let fd = fcntl::open(path, flags | OFlag::O_CLOEXEC, Mode::from_bits_truncate(CREATE_MODE)).sys("open")?;
	let fd = unsafe { OwnedFd::from_raw_fd(fd) };
	channel::install(fd, target)
}

fn do_exec_stage(stage: &Prepared, ends: StageEnds, table: &mut ChannelTable) -> Result<Infallible, ExecError> {
	interrupt::reset_for_child().sys("signal")?;

	if let Some(fd) = ends.stdin {
		channel::install(fd, libc::STDIN_FILENO)?;
	}
	if let Some(fd) = ends.stdout {
		channel::install(fd, libc::STDOUT_FILENO)?;
	}
	if let Some(ref path) = stage.input {
		redirect_file(path, OFlag::O_RDONLY, libc::STDIN_FILENO)?;
	}
	if let Some((ref path, mode)) = stage.output {
		let flags = match mode {
			RedirectMode::Truncate => OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
			RedirectMode::Append => OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_APPEND,
		};
		redirect_file(path, flags, libc::STDOUT_FILENO)?;
	}
	table.close_all()?;

	let name = &stage.argv[0];
	unistd::execvp(name, &stage.argv).map_err(|e| ExecError::Exec {
		name: name.to_string_lossy().into_owned(),
		source: e,
	})
}

fn exec_stage(stage: &Prepared, ends: StageEnds, table: &mut ChannelTable) -> ! {
	let status = match do_exec_stage(stage, ends, table) {
		Ok(never) => match never {},
		Err(e) => {
			let _ = writeln!(&mut io::stderr(), "{}", e);
			e.status()
		},
	};
	unsafe { libc::_exit(status) }
}

fn spawn_relay(producer: usize, table: &mut ChannelTable, job_builder: &mut JobBuilder) -> ShellResult<()> {
	let ends = match table.take_relay(producer) {
		Some(ends) => ends,
		None => return Ok(()),
	};
	match job_builder.push_fork(Role::Relay(producer))? {
		unistd::ForkResult::Parent { .. } => ends.close(),
		unistd::ForkResult::Child => {
			if let Err(e) = table.close_all() {
				let _ = writeln!(&mut io::stderr(), "relay: {}", e);
				unsafe { libc::_exit(1) }
			}
			relay::run(ends)
		},
	}
}

fn run_builtin(state: &mut global::State, func: builtin::Builtin, stage: &Stage, out: &mut dyn Write) -> Flow {
	let r = match stage.output_file() {
		Some((target, mode)) => {
			let mut oopt = fs::OpenOptions::new();
			let _ = match mode {
				RedirectMode::Truncate => oopt.write(true).create(true).truncate(true),
				RedirectMode::Append => oopt.append(true).create(true),
			};
			oopt.open(OsStr::from_bytes(target))
				.map_err(BuiltinError::from)
				.and_then(|mut file| func(state, &stage.argv, &mut file))
		},
		None => func(state, &stage.argv, out),
	};
	match r {
		Ok(flow) => flow,
		Err(e) => {
			let _ = writeln!(&mut io::stderr(), "fansh: {}", e);
			Flow::Continue
		},
	}
}

fn spawn_stages(state: &mut global::State, stages: &[Stage], table: &mut ChannelTable,
                job_builder: &mut JobBuilder, out: &mut dyn Write) -> ShellResult<bool> {
	for (i, stage) in stages.iter().enumerate() {
		let name = match stage.name() {
			Some(name) => name,
			None => {
				table.close_stage(i)?;
				table.close_relay(i)?;
				continue;
			},
		};

		if let Some(func) = builtin::match_builtin(name) {
			table.close_stage(i)?;
			table.close_relay(i)?;
			if run_builtin(state, func, stage, out) == Flow::Exit {
				return Ok(true);
			}
			continue;
		}

		let prepared = match Prepared::new(stage) {
			Ok(p) => p,
			Err(e) => {
				let _ = writeln!(&mut io::stderr(), "fansh: {}", e);
				table.close_stage(i)?;
				table.close_relay(i)?;
				continue;
			},
		};

		tracing::debug!(stage = i, argv = ?prepared.argv, "spawning");
		match job_builder.push_fork(Role::Stage(i))? {
			unistd::ForkResult::Parent { .. } => table.close_stage(i)?,
			unistd::ForkResult::Child => {
				let ends = table.take_stage(i);
				exec_stage(&prepared, ends, table)
			},
		}
		spawn_relay(i, table, job_builder)?;
	}
	Ok(false)
}

/// Runs one pipeline: forks every stage left to right, then reaps them all.
///
/// Built-ins run in the shell itself, writing to `out`. A failed system call
/// is returned as an error and is meant to end the shell.
pub fn run(state: &mut global::State, pipeline: &Pipeline, out: &mut dyn Write) -> ShellResult<Outcome> {
	let stages = &pipeline.stages;
	if stages.is_empty() {
		return Ok(Outcome::default());
	}

	let plan = Plan::build(stages);
	let mut table = ChannelTable::open(&plan)?;
	let mut job_builder = JobBuilder::new(stages.len() + plan.relay_count());

	let spawned = spawn_stages(state, stages, &mut table, &mut job_builder, out);
	let closed = table.close_all();
	let exit = spawned?;
	closed?;

	let mut job = job_builder.build();
	let reports = job.wait()?;
	Ok(Outcome { reports: reports, exit: exit })
}
