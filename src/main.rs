use anyhow::Context;
use tracing_subscriber::EnvFilter;

use fansh::config::Config;
use fansh::global;
use fansh::input::LineReader;
use fansh::interrupt::InterruptController;
use fansh::repl;

const LOG_ENV: &str = "FANSH_LOG";

fn main() -> anyhow::Result<()> {
	let config: Config = argh::from_env();

	let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();

	let mut state = global::State::new(config);
	let mut interrupts = InterruptController::install().context("cannot set up SIGINT handling")?;
	let mut reader = LineReader::stdin();
	repl::run(&mut state, &mut interrupts, &mut reader).context("fansh")?;
	Ok(())
}
