//! Channel planning: which stage reads which stage's output.
//!
//! A stage with fan-out degree D claims the next stages as consumers, one per
//! pipe separator, until it has D of them or reaches a `,`. Consumers other
//! than the last one claimed write to the shell's standard output; the last
//! one carries on with its own separator.

use crate::types::Stage;

/// Where a stage's standard output goes.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Sink {
	Inherit,
	/// Plain hand-off to the next stage.
	Pipe(usize),
	/// Broadcast through a relay to every listed stage.
	Relay(Vec<usize>),
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Plan {
	/// `upstream[k]` feeds stage `k + 1`; there are always `len - 1` slots.
	upstream: Vec<Option<usize>>,
	sinks: Vec<Sink>,
}

impl Plan {
	pub fn build(stages: &[Stage]) -> Plan {
		let n = stages.len();
		let mut upstream: Vec<Option<usize>> = vec![None; n.saturating_sub(1)];
		let mut sinks: Vec<Sink> = vec![Sink::Inherit; n];

		let mut i = 0;
		while i < n {
			let degree = stages[i].fanout;
			let mut consumers: Vec<usize> = Vec::with_capacity(degree);
			let mut j = i + 1;
			while consumers.len() < degree && j < n {
				upstream[j - 1] = Some(i);
				consumers.push(j);
				if stages[j].fanout == 0 {
					break;
				}
				j += 1;
			}
			sinks[i] = match consumers.len() {
				0 => Sink::Inherit,
				1 => Sink::Pipe(consumers[0]),
				_ => Sink::Relay(consumers.clone()),
			};
			i = match consumers.last() {
				Some(&last) => last,
				None => i + 1,
			};
		}

		let plan = Plan { upstream: upstream, sinks: sinks };
		tracing::debug!(stages = n, channels = plan.channel_count(), relays = plan.relay_count(), "planned pipeline");
		plan
	}

	pub fn len(&self) -> usize {
		self.sinks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.sinks.is_empty()
	}

	/// Stage whose output feeds stage `i`.
	pub fn upstream(&self, i: usize) -> Option<usize> {
		if i == 0 { None } else { self.upstream.get(i - 1).cloned().unwrap_or(None) }
	}

	pub fn sink(&self, i: usize) -> &Sink {
		&self.sinks[i]
	}

	/// Inter-stage channels actually in use.
	pub fn channel_count(&self) -> usize {
		self.upstream.iter().filter(|u| u.is_some()).count()
	}

	pub fn relay_count(&self) -> usize {
		self.sinks.iter().filter(|s| match **s { Sink::Relay(_) => true, _ => false }).count()
	}
}
