use crate::alias::AliasTable;
use crate::config::Config;
use crate::history::History;

/// Everything a session owns, built once at start-up.
#[derive(Debug)]
pub struct State {
	pub history: History,
	pub aliases: AliasTable,
	pub config: Config,
}

impl State {
	pub fn new(config: Config) -> State {
		let history = History::new(config.history_size);
		let aliases = AliasTable::new();
		State { history: history, aliases: aliases, config: config }
	}
}

impl Default for State {
	fn default() -> State {
		State::new(Config::default())
	}
}
