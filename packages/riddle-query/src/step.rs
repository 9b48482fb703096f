use std::{fmt::Display, ops::Range, sync::Arc};

use serde::Serialize;

use crate::{Error, Result, lookup::FieldCondition};

pub const RELEVANCE_KEY: &str = "@relevance";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
	Asc,
	Desc,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SortKey {
	Relevance,
	Attribute { name: String, direction: Direction },
}
impl SortKey {
	/// `@relevance`, `-attr` (descending) or `attr` (ascending).
	pub fn parse(raw: &str) -> Result<Self> {
		if raw == RELEVANCE_KEY {
			return Ok(Self::Relevance);
		}

		let (name, direction) = match raw.strip_prefix('-') {
			Some(name) => (name, Direction::Desc),
			None => (raw, Direction::Asc),
		};

		if name.is_empty() {
			return Err(Error::argument(format!("sort key '{raw}' is missing an attribute name.")));
		}

		Ok(Self::Attribute { name: name.to_string(), direction })
	}
}
impl Display for SortKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Relevance => f.write_str(RELEVANCE_KEY),
			Self::Attribute { name, direction: Direction::Asc } => f.write_str(name),
			Self::Attribute { name, direction: Direction::Desc } => write!(f, "-{name}"),
		}
	}
}

/// The conditions of one `filter()` or `exclude()` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterClause {
	pub conditions: Vec<FieldCondition>,
	pub negated: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
	Query(String),
	Filter(FilterClause),
	OrderBy(Vec<SortKey>),
	Values(Vec<String>),
	ValuesDict(Vec<String>),
	Slice(Range<usize>),
}

struct StepNode {
	step: Step,
	prev: Option<Arc<StepNode>>,
}

/// Persistent, append-only log of builder calls.
///
/// Appending shares the existing history with the log it was derived from, so branching a
/// partially built query copies nothing.
#[derive(Clone, Default)]
pub struct StepLog {
	head: Option<Arc<StepNode>>,
	len: usize,
}
impl StepLog {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&self, step: Step) -> Self {
		Self { head: Some(Arc::new(StepNode { step, prev: self.head.clone() })), len: self.len + 1 }
	}

	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Steps in the order they were declared.
	pub fn steps(&self) -> Vec<&Step> {
		let mut steps = Vec::with_capacity(self.len);
		let mut cursor = self.head.as_deref();

		while let Some(node) = cursor {
			steps.push(&node.step);

			cursor = node.prev.as_deref();
		}

		steps.reverse();

		steps
	}
}
impl std::fmt::Debug for StepLog {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_list().entries(self.steps()).finish()
	}
}
impl Drop for StepLog {
	// Unlink uniquely owned nodes one at a time; the default recursive drop can overflow the
	// stack on very long chains.
	fn drop(&mut self) {
		let mut next = self.head.take();

		while let Some(node) = next {
			match Arc::try_unwrap(node) {
				Ok(mut node) => next = node.prev.take(),
				Err(_) => break,
			}
		}
	}
}
