use std::borrow::Cow;
use std::collections::BTreeMap;

/// Name substitution applied to the first word of a raw line.
#[derive(Debug, Default)]
pub struct AliasTable {
	imp: BTreeMap<Vec<u8>, Vec<u8>>,
}

fn is_blank(c: u8) -> bool {
	c.is_ascii_whitespace() || c == 0x0b
}

impl AliasTable {
	pub fn new() -> AliasTable {
		AliasTable { imp: BTreeMap::new() }
	}

	pub fn define(&mut self, name: &[u8], words: &[Vec<u8>]) {
		self.imp.insert(name.to_vec(), words.join(&b' '));
	}

	pub fn remove(&mut self, name: &[u8]) -> bool {
		self.imp.remove(name).is_some()
	}

	/// Sorted by name.
	pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
		self.imp.iter().map(|(k, v)| (&k[..], &v[..]))
	}

	/// Replaces the line's first word when it names an alias. Not recursive.
	pub fn substitute<'a>(&self, line: &'a [u8]) -> Cow<'a, [u8]> {
		let start = match line.iter().position(|&c| !is_blank(c)) {
			Some(s) => s,
			None => return Cow::Borrowed(line),
		};
		let len = line[start ..].iter()
			.position(|&c| is_blank(c) || c == b'|' || c == b',' || c == b'<' || c == b'>')
			.unwrap_or(line.len() - start);
		let end = start + len;
		match self.imp.get(&line[start .. end]) {
			Some(value) => {
				let mut out = Vec::with_capacity(line.len() + value.len());
				out.extend_from_slice(&line[.. start]);
				out.extend_from_slice(value);
				out.extend_from_slice(&line[end ..]);
				Cow::Owned(out)
			},
			None => Cow::Borrowed(line),
		}
	}
}
