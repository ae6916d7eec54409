use std::io::Write;

use nix::unistd;

use crate::error::BuiltinError;
use crate::global;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Flow { Continue, Exit }

pub type BuiltinResult = Result<Flow, BuiltinError>;
pub type Builtin = fn(&mut global::State, &[Vec<u8>], &mut dyn Write) -> BuiltinResult;

fn lossy(s: &[u8]) -> String {
	String::from_utf8_lossy(s).into_owned()
}

pub fn builtin_cd(_: &mut global::State, argv: &[Vec<u8>], _: &mut dyn Write) -> BuiltinResult {
	let path = argv.get(1).ok_or(BuiltinError::MissingArgument("cd"))?;
	unistd::chdir(&path[..]).map_err(|e| BuiltinError::ChangeDir { path: lossy(path), source: e })?;
	Ok(Flow::Continue)
}

pub fn builtin_exit(_: &mut global::State, _: &[Vec<u8>], _: &mut dyn Write) -> BuiltinResult {
	Ok(Flow::Exit)
}

/// Lists history, most recent first, leaving out the `history` line being run.
pub fn builtin_history(state: &mut global::State, _: &[Vec<u8>], out: &mut dyn Write) -> BuiltinResult {
	for entry in state.history.iter().skip(1) {
		out.write_all(entry)?;
		out.write_all(b"\n")?;
	}
	out.flush()?;
	Ok(Flow::Continue)
}

pub fn builtin_alias(state: &mut global::State, argv: &[Vec<u8>], out: &mut dyn Write) -> BuiltinResult {
	match argv.len() {
		0 | 1 => {
			for (name, value) in state.aliases.iter() {
				out.write_all(name)?;
				out.write_all(b"='")?;
				out.write_all(value)?;
				out.write_all(b"'\n")?;
			}
			out.flush()?;
		},
		2 => return Err(BuiltinError::MissingArgument("alias")),
		_ => state.aliases.define(&argv[1], &argv[2 ..]),
	}
	Ok(Flow::Continue)
}

pub fn builtin_unalias(state: &mut global::State, argv: &[Vec<u8>], _: &mut dyn Write) -> BuiltinResult {
	let name = argv.get(1).ok_or(BuiltinError::MissingArgument("unalias"))?;
	if !state.aliases.remove(name) {
		return Err(BuiltinError::UnknownAlias(lossy(name)));
	}
	Ok(Flow::Continue)
}

pub fn match_builtin(name: &[u8]) -> Option<Builtin> {
	match name {
		b"cd" => Some(builtin_cd),
		b"exit" => Some(builtin_exit),
		b"history" => Some(builtin_history),
		b"alias" => Some(builtin_alias),
		b"unalias" => Some(builtin_unalias),
		_ => None,
	}
}
