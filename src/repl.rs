use std::env;
use std::io::{self, Write};
use std::path::Path;

use crate::config::Config;
use crate::error::ShellResult;
use crate::eval;
use crate::global;
use crate::input::{LineReader, ReadLine};
use crate::interrupt::InterruptController;
use crate::parser;
use crate::types::Pipeline;

const BOLD_GREEN: &str = "\x1b[1;32m";
const GREEN: &str = "\x1b[0;32m";
const RESET: &str = "\x1b[0m";

pub fn prompt(config: &Config, cwd: Option<&Path>) -> String {
	let dir = cwd.map(|p| p.display().to_string());
	match (config.plain, dir) {
		(true, Some(dir)) => format!("{}:=> ", dir),
		(true, None) => ":=> ".to_string(),
		(false, Some(dir)) => format!("{}{}{}:=> {}", BOLD_GREEN, dir, GREEN, RESET),
		(false, None) => format!("{}:=> {}", GREEN, RESET),
	}
}

fn show_prompt(config: &Config) {
	let cwd = env::current_dir().ok();
	let mut stdout = io::stdout();
	let _ = stdout.write_all(prompt(config, cwd.as_deref()).as_bytes());
	let _ = stdout.flush();
}

/// Records a raw line and parses it after alias substitution. `None` when
/// SIGINT arrived meanwhile, in which case the line is dropped unrun.
fn accept_line<F>(state: &mut global::State, line: &[u8], interrupted: F) -> Option<Pipeline> where F: FnOnce() -> bool {
	let command = state.aliases.substitute(line).into_owned();
	state.history.record(line);
	let pipeline = parser::parse(&command);
	if interrupted() {
		tracing::debug!("interrupted while parsing");
		return None;
	}
	Some(pipeline)
}

/// Reads, parses, runs and reports lines until `exit` or end of input.
pub fn run(state: &mut global::State, interrupts: &mut InterruptController, reader: &mut LineReader) -> ShellResult<()> {
	loop {
		interrupts.interruptible()?;
		show_prompt(&state.config);

		let line = match reader.read_line(|| interrupts.is_interrupted())? {
			ReadLine::Line(line) => line,
			ReadLine::Interrupted => {
				interrupts.take_interrupt();
				println!();
				continue;
			},
			ReadLine::Eof => {
				println!();
				break;
			},
		};

		let pipeline = match accept_line(state, &line, || interrupts.take_interrupt()) {
			Some(pipeline) => pipeline,
			None => {
				println!();
				continue;
			},
		};

		interrupts.ignore()?;
		let outcome = eval::run(state, &pipeline, &mut io::stdout())?;
		drop(pipeline);

		if !state.config.quiet {
			let stdout = io::stdout();
			let mut stdout = stdout.lock();
			for report in &outcome.reports {
				let _ = writeln!(stdout, "{}", report);
			}
			let _ = stdout.flush();
		}
		if outcome.exit {
			break;
		}
	}
	interrupts.ignore()
}
