use std::collections::VecDeque;

/// Append-only log of input lines.
#[derive(Debug, Default)]
pub struct History {
	entries: VecDeque<Vec<u8>>,
	limit: usize,
}

impl History {
	/// `limit` of 0 keeps everything.
	pub fn new(limit: usize) -> History {
		History { entries: VecDeque::new(), limit: limit }
	}

	/// Records a raw line. Blank lines are skipped; the trailing newline is not kept.
	pub fn record(&mut self, line: &[u8]) {
		let trimmed = trim_end_newline(line);
		if trimmed.iter().all(|c| c.is_ascii_whitespace()) {
			return;
		}
		if self.limit > 0 && self.entries.len() == self.limit {
			self.entries.pop_front();
		}
		self.entries.push_back(trimmed.to_vec());
	}

	/// Most recent first.
	pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
		self.entries.iter().rev().map(|e| &e[..])
	}
}

fn trim_end_newline(line: &[u8]) -> &[u8] {
	let mut end = line.len();
	while end > 0 && (line[end - 1] == b'\n' || line[end - 1] == b'\r') {
		end -= 1;
	}
	&line[.. end]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn most_recent_first() {
		let mut h = History::new(0);
		h.record(b"ls\n");
		h.record(b"pwd\n");
		h.record(b"cat a | wc\n");
		let got: Vec<&[u8]> = h.iter().collect();
		assert_eq!(got, vec![&b"cat a | wc"[..], &b"pwd"[..], &b"ls"[..]]);
	}

	#[test]
	fn blank_lines_are_skipped() {
		let mut h = History::new(0);
		h.record(b"\n");
		h.record(b"");
		h.record(b"  \t\n");
		assert_eq!(h.iter().count(), 0);
	}

	#[test]
	fn limit_drops_oldest() {
		let mut h = History::new(2);
		h.record(b"a");
		h.record(b"b");
		h.record(b"c");
		assert_eq!(h.iter().count(), 2);
		assert_eq!(h.iter().last(), Some(&b"b"[..]));
	}
}
