use crate::types::MAX_FANOUT;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Clause<'a> {
	pub text: &'a [u8],
	pub fanout: usize,
}

/// Splits a raw line on `,` and runs of `|`.
///
/// Leading whitespace before each clause is skipped; once only whitespace
/// remains the iterator is exhausted for good.
pub struct Clauses<'a> {
	line: &'a [u8],
	i: usize,
}

pub fn clauses(line: &[u8]) -> Clauses<'_> {
	Clauses { line: line, i: 0 }
}

impl<'a> Clauses<'a> {
	fn proceed_while<F>(&mut self, f: F) where F: Fn(u8) -> bool {
		while let Some(&c) = self.line.get(self.i) {
			if !f(c) { break; }
			self.i += 1;
		}
	}
}

impl<'a> Iterator for Clauses<'a> {
	type Item = Clause<'a>;

	fn next(&mut self) -> Option<Clause<'a>> {
		self.proceed_while(|c| c.is_ascii_whitespace() || c == 0x0b);
		if self.i >= self.line.len() {
			return None;
		}
		let orig = self.i;
		self.proceed_while(|c| c != b'|' && c != b',');
		let text = &self.line[orig .. self.i];

		let mut fanout = 0;
		match self.line.get(self.i) {
			Some(&b',') => { self.i += 1; },
			Some(&b'|') => {
				let run = self.i;
				self.proceed_while(|c| c == b'|');
				fanout = std::cmp::min(self.i - run, MAX_FANOUT);
			},
			_ => {},
		}
		Some(Clause { text: text, fanout: fanout })
	}
}

impl<'a> std::iter::FusedIterator for Clauses<'a> {}

#[cfg(test)]
mod tests {
	use super::*;

	fn collect(line: &[u8]) -> Vec<(&[u8], usize)> {
		clauses(line).map(|c| (c.text, c.fanout)).collect()
	}

	#[test]
	fn single_clause() {
		assert_eq!(collect(b"ls -l\n"), vec![(&b"ls -l\n"[..], 0)]);
	}

	#[test]
	fn blank_line_has_no_clauses() {
		assert!(collect(b"  \t\n").is_empty());
		assert!(collect(b"").is_empty());
	}

	#[test]
	fn separators() {
		assert_eq!(collect(b"a | b, c"), vec![(&b"a "[..], 1), (&b"b"[..], 0), (&b"c"[..], 0)]);
	}

	#[test]
	fn pipe_run_is_degree() {
		assert_eq!(collect(b"a || b | c"), vec![(&b"a "[..], 2), (&b"b "[..], 1), (&b"c"[..], 0)]);
		assert_eq!(collect(b"a ||||| b"), vec![(&b"a "[..], MAX_FANOUT), (&b"b"[..], 0)]);
	}

	#[test]
	fn empty_clauses_between_separators() {
		assert_eq!(collect(b"a , , b"), vec![(&b"a "[..], 0), (&b""[..], 0), (&b"b"[..], 0)]);
		assert_eq!(collect(b"| b"), vec![(&b""[..], 1), (&b"b"[..], 0)]);
	}

	#[test]
	fn trailing_separator_yields_nothing_more() {
		assert_eq!(collect(b"a ,  "), vec![(&b"a "[..], 0)]);
		assert_eq!(collect(b"a |"), vec![(&b"a "[..], 1)]);
	}

	#[test]
	fn fused_after_end() {
		let mut it = clauses(b"a");
		assert!(it.next().is_some());
		assert!(it.next().is_none());
		assert!(it.next().is_none());
	}
}
