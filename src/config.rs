use argh::FromArgs;

pub const DEFAULT_HISTORY_SIZE: usize = 1000;

/// Interactive shell with fan-out pipes.
#[derive(FromArgs, Debug, PartialEq, Eq, Clone)]
pub struct Config {
	/// print the prompt without colours
	#[argh(switch)]
	pub plain: bool,

	/// do not print a completion line per process
	#[argh(switch, short = 'q')]
	pub quiet: bool,

	/// number of history entries to keep, 0 for no limit
	#[argh(option, default = "DEFAULT_HISTORY_SIZE")]
	pub history_size: usize,
}

impl Default for Config {
	fn default() -> Config {
		Config { plain: false, quiet: false, history_size: DEFAULT_HISTORY_SIZE }
	}
}
