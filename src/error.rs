use std::{ffi, io};

use nix::errno::Errno;
use thiserror::Error;

/// Failures that end the shell.
#[derive(Debug, Error)]
pub enum ShellError {
	#[error("{op}: {source}")]
	Sys { op: &'static str, #[source] source: Errno },
	#[error(transparent)]
	Io(#[from] io::Error),
}

pub type ShellResult<T> = Result<T, ShellError>;

/// Attaches the name of the failing call to a nix result.
pub trait SysContext<T> {
	fn sys(self, op: &'static str) -> ShellResult<T>;
}

impl<T> SysContext<T> for nix::Result<T> {
	fn sys(self, op: &'static str) -> ShellResult<T> {
		self.map_err(|e| ShellError::Sys { op: op, source: e })
	}
}

/// Argument problems in built-ins; reported, then the prompt comes back.
#[derive(Debug, Error)]
pub enum BuiltinError {
	#[error("{0}: expected argument")]
	MissingArgument(&'static str),
	#[error("cd: {path}: {source}")]
	ChangeDir { path: String, #[source] source: Errno },
	#[error("unalias: {0}: not found")]
	UnknownAlias(String),
	#[error(transparent)]
	Io(#[from] io::Error),
}

/// A stage that cannot be turned into an exec call.
#[derive(Debug, Error)]
pub enum StageError {
	#[error("nul byte in argument: {0}")]
	Nul(#[from] ffi::NulError),
}
