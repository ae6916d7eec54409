use crate::split;
use crate::types::*;

const ARGV_INITIAL_CAPACITY: usize = 4;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Mode {
	CommandBegin,
	CommandRead,
	ArgsBegin,
	ArgsRead,
	InputBegin,
	InputRead,
	OutputBegin,
	OutputRead,
}

struct Parser<'a> {
	clause: &'a [u8],
	i: usize,
	mode: Mode,
	word: Vec<u8>,
	output_mode: RedirectMode,
	stage: Stage,
}

impl<'a> Parser<'a> {
	fn new(clause: &'a [u8], fanout: usize) -> Parser<'a> {
		Parser {
			clause: clause,
			i: 0,
			mode: Mode::CommandBegin,
			word: vec![],
			output_mode: RedirectMode::Truncate,
			stage: Stage { argv: Vec::with_capacity(ARGV_INITIAL_CAPACITY), fanout: fanout, ..Stage::default() },
		}
	}

	fn is_whitespace(c: u8) -> bool {
		match c {
			b' ' | b'\t' | b'\n' | b'\x0c' | b'\x0b' | b'\r' => true,
			_ => false,
		}
	}

	fn push_arg(&mut self, word: Vec<u8>) {
		let argv = &mut self.stage.argv;
		if argv.len() == argv.capacity() {
			let extra = std::cmp::max(argv.capacity() / 2, 1);
			argv.reserve_exact(extra);
		}
		argv.push(word);
	}

	/// Ends the word being read, if any, and files it according to the mode.
	fn finish_word(&mut self) {
		let word = std::mem::take(&mut self.word);
		match self.mode {
			Mode::CommandRead | Mode::ArgsRead => self.push_arg(word),
			Mode::InputRead => self.stage.input = Some(word),
			Mode::OutputRead => self.stage.output = Some(OutputRedirect { target: word, mode: self.output_mode }),
			_ => { return; },
		}
		self.mode = Mode::ArgsBegin;
	}

	fn start_word(&mut self) {
		self.mode = match self.mode {
			Mode::CommandBegin => Mode::CommandRead,
			Mode::ArgsBegin => Mode::ArgsRead,
			Mode::InputBegin => Mode::InputRead,
			Mode::OutputBegin => Mode::OutputRead,
			read => read,
		};
	}

	fn parse(mut self) -> Stage {
		while let Some(&c) = self.clause.get(self.i) {
			match c {
				b'<' => {
					self.finish_word();
					self.stage.input = None;
					self.mode = Mode::InputBegin;
				},
				b'>' => {
					self.finish_word();
					if self.clause.get(self.i + 1) == Some(&b'>') {
						self.i += 1;
						self.output_mode = RedirectMode::Append;
					} else {
						self.output_mode = RedirectMode::Truncate;
					}
					self.stage.output = None;
					self.mode = Mode::OutputBegin;
				},
				c if Parser::is_whitespace(c) => self.finish_word(),
				c => {
					self.start_word();
					self.word.push(c);
				},
			}
			self.i += 1;
		}
		self.finish_word();
		self.stage
	}
}

/// Parses one clause into a stage. Never fails: a missing file name leaves
/// the redirection unset and an empty clause gives a stage without words.
pub fn parse_clause(clause: &[u8], fanout: usize) -> Stage {
	Parser::new(clause, fanout).parse()
}

pub fn parse(line: &[u8]) -> Pipeline {
	let stages: Vec<Stage> = split::clauses(line)
		.map(|c| parse_clause(c.text, c.fanout))
		.collect();
	tracing::trace!(stages = stages.len(), "parsed line");
	Pipeline { stages: stages }
}
