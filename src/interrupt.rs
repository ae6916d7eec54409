//! SIGINT handling for the shell process.
//!
//! While a line is being read or parsed the shell is interruptible: the
//! handler raises a flag, the reader's wait ends with `EINTR` and the REPL starts
//! over with a fresh prompt. While a pipeline runs the shell ignores SIGINT,
//! and every forked child goes back to the default disposition, so the
//! foreground programs die from Ctrl-C and the shell does not.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd;

use crate::error::{ShellResult, SysContext};

/// Conventional exit status of a process killed by SIGINT.
pub const INTERRUPT_STATUS: i32 = 130;

static SHELL_PID: AtomicI32 = AtomicI32::new(0);
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_interrupt(_: libc::c_int) {
	if unistd::getpid().as_raw() != SHELL_PID.load(Ordering::SeqCst) {
		unsafe { libc::_exit(INTERRUPT_STATUS) }
	}
	INTERRUPTED.store(true, Ordering::SeqCst);
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Disposition { Ignoring, Interruptible }

#[derive(Debug)]
pub struct InterruptController {
	disposition: Disposition,
}

impl InterruptController {
	/// Remembers the current process as the shell and starts out ignoring SIGINT.
	pub fn install() -> ShellResult<InterruptController> {
		SHELL_PID.store(unistd::getpid().as_raw(), Ordering::SeqCst);
		let mut this = InterruptController { disposition: Disposition::Interruptible };
		this.ignore()?;
		Ok(this)
	}

	/// Installs the handler. No `SA_RESTART`, so the reader's wait is cut short.
	pub fn interruptible(&mut self) -> ShellResult<()> {
		INTERRUPTED.store(false, Ordering::SeqCst);
		let action = SigAction::new(SigHandler::Handler(on_interrupt), SaFlags::empty(), SigSet::empty());
		unsafe { signal::sigaction(Signal::SIGINT, &action) }.sys("sigaction")?;
		self.disposition = Disposition::Interruptible;
		Ok(())
	}

	pub fn ignore(&mut self) -> ShellResult<()> {
		if self.disposition == Disposition::Ignoring {
			return Ok(());
		}
		let action = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
		unsafe { signal::sigaction(Signal::SIGINT, &action) }.sys("sigaction")?;
		self.disposition = Disposition::Ignoring;
		Ok(())
	}

	/// Whether SIGINT arrived since the shell became interruptible. Clears the flag.
	pub fn take_interrupt(&self) -> bool {
		INTERRUPTED.swap(false, Ordering::SeqCst)
	}

	/// Peeks at the flag without clearing it.
	pub fn is_interrupted(&self) -> bool {
		INTERRUPTED.load(Ordering::SeqCst)
	}
}

/// Default dispositions for a freshly forked child.
pub fn reset_for_child() -> nix::Result<()> {
	unsafe {
		signal::signal(Signal::SIGINT, SigHandler::SigDfl)?;
		signal::signal(Signal::SIGPIPE, SigHandler::SigDfl)?;
	}
	Ok(())
}
