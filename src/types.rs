/// Largest number of consumers one stage's output can be broadcast to.
pub const MAX_FANOUT: usize = 3;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RedirectMode { Truncate, Append }

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct OutputRedirect {
	pub target: Vec<u8>,
	pub mode: RedirectMode,
}

/// The execution-ready form of one clause.
///
/// All byte strings are owned copies of the input line.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Stage {
	pub argv: Vec<Vec<u8>>,
	pub input: Option<Vec<u8>>,
	pub output: Option<OutputRedirect>,
	/// 0 for a `,` or the end of the line, otherwise the length of the `|` run (capped).
	pub fanout: usize,
}

impl Stage {
	pub fn name(&self) -> Option<&[u8]> {
		self.argv.first().map(|w| &w[..])
	}

	/// Input file, if one was given and it looks like a file name.
	pub fn input_file(&self) -> Option<&[u8]> {
		self.input.as_deref().filter(|t| is_valid_filename(t))
	}

	pub fn output_file(&self) -> Option<(&[u8], RedirectMode)> {
		self.output.as_ref()
			.filter(|o| is_valid_filename(&o.target))
			.map(|o| (&o.target[..], o.mode))
	}
}

/// A redirection target is honored only when it holds at least one letter.
pub fn is_valid_filename(name: &[u8]) -> bool {
	name.iter().any(|c| c.is_ascii_alphabetic())
}

#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Pipeline {
	pub stages: Vec<Stage>,
}

impl Pipeline {
	pub fn len(&self) -> usize {
		self.stages.len()
	}

	pub fn is_empty(&self) -> bool {
		self.stages.is_empty()
	}
}
