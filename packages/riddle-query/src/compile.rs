use std::{ops::Range, sync::LazyLock};

use regex::{Captures, Regex};
use serde::Serialize;

use crate::{
	Error, Result,
	client::SortMode,
	consolidate::{self, Constraint},
	search::SearchMeta,
	step::{Direction, RELEVANCE_KEY, SortKey, Step, StepLog},
};

const DEFAULT_ORDERING: &[SortKey] = &[SortKey::Relevance];

// A dash glued to the preceding term reads as "exclude the next term" to the daemon.
static GLUED_DASHES: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(\S)(-+)").expect("dash pattern is valid"));

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "attributes", rename_all = "snake_case")]
pub enum SortSpec {
	Relevance,
	AttributeList(Vec<(String, Direction)>),
}
impl SortSpec {
	pub fn from_keys(keys: &[SortKey]) -> Self {
		if keys == DEFAULT_ORDERING {
			return Self::Relevance;
		}

		Self::AttributeList(
			keys.iter()
				.map(|key| match key {
					SortKey::Relevance => (RELEVANCE_KEY.to_string(), Direction::Desc),
					SortKey::Attribute { name, direction } => (name.clone(), *direction),
				})
				.collect(),
		)
	}

	/// The daemon sort mode and clause for this spec.
	///
	/// Only relevance ranking has a known mapping. Attribute sorts are refused rather than
	/// guessed at.
	pub fn sort_mode(&self) -> Result<(SortMode, &'static str)> {
		match self {
			Self::Relevance => Ok((SortMode::Relevance, "")),
			Self::AttributeList(attributes) => {
				let keys = attributes
					.iter()
					.map(|(name, direction)| match direction {
						Direction::Asc => name.clone(),
						Direction::Desc => format!("-{name}"),
					})
					.collect::<Vec<_>>()
					.join(", ");

				Err(Error::unsupported(format!(
					"sorting by [{keys}] is not supported; only {RELEVANCE_KEY} ordering is."
				)))
			},
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "fields", rename_all = "snake_case")]
pub enum Projection {
	#[default]
	None,
	List(Vec<String>),
	Dict(Vec<String>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Limits {
	pub offset: usize,
	pub limit: usize,
}
impl From<&Range<usize>> for Limits {
	fn from(range: &Range<usize>) -> Self {
		Self { offset: range.start, limit: range.end - range.start }
	}
}

/// Everything the daemon client needs to run one query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CompiledRequest {
	pub index: String,
	pub query: String,
	pub constraints: Vec<Constraint>,
	pub sort: SortSpec,
	pub projection: Projection,
	pub limits: Option<Limits>,
}

/// Folds the step log into a request. Later order, projection and slice steps override earlier
/// ones; filters accumulate.
pub fn compile(meta: &SearchMeta, steps: &StepLog) -> Result<CompiledRequest> {
	let mut clauses = Vec::new();
	let mut query = None;
	let mut ordering = None;
	let mut projection = Projection::None;
	let mut limits = None;

	for step in steps.steps() {
		match step {
			Step::Query(text) => query = Some(text.as_str()),
			Step::Filter(clause) => clauses.push(clause),
			Step::OrderBy(keys) => ordering = Some(keys.as_slice()),
			Step::Values(fields) => projection = Projection::List(fields.clone()),
			Step::ValuesDict(fields) => projection = Projection::Dict(fields.clone()),
			Step::Slice(range) => limits = Some(Limits::from(range)),
		}
	}

	let constraints = consolidate::consolidate(clauses)?;
	let keys = match ordering {
		Some(keys) if !keys.is_empty() => keys,
		_ if !meta.ordering.is_empty() => meta.ordering.as_slice(),
		_ => DEFAULT_ORDERING,
	};
	let sort = SortSpec::from_keys(keys);

	sort.sort_mode()?;

	let request = CompiledRequest {
		index: meta.index.clone(),
		query: query.map(sanitize_query).unwrap_or_default(),
		constraints,
		sort,
		projection,
		limits,
	};

	tracing::debug!(
		index = %request.index,
		constraints = request.constraints.len(),
		steps = steps.len(),
		"Compiled search request."
	);

	Ok(request)
}

/// Strips query syntax the daemon would misread: dashes glued to a preceding term are escaped
/// and `^`/`$` anchors are dropped.
pub fn sanitize_query(query: &str) -> String {
	let escaped = GLUED_DASHES.replace_all(query, |caps: &Captures<'_>| {
		format!("{}{}", &caps[1], r"\-".repeat(caps[2].len()))
	});

	escaped.replace(['^', '$'], "")
}

#[cfg(test)]
mod tests {
	use crate::{
		compile::{Projection, SortSpec, sanitize_query},
		step::{Direction, SortKey},
	};

	#[test]
	fn anchors_are_removed() {
		assert_eq!(sanitize_query("^$gerbil"), "gerbil");
		assert_eq!(sanitize_query("cost$ ^now"), "cost now");
	}

	#[test]
	fn glued_dashes_are_escaped() {
		assert_eq!(sanitize_query("x-ray"), r"x\-ray");
		assert_eq!(sanitize_query("a--b"), r"a\-\-b");
		assert_eq!(sanitize_query("fire-fox-os"), r"fire\-fox\-os");
	}

	#[test]
	fn leading_and_spaced_dashes_are_kept() {
		assert_eq!(sanitize_query("-spam"), "-spam");
		assert_eq!(sanitize_query("eggs -spam"), "eggs -spam");
		assert_eq!(sanitize_query("eggs\t-spam"), "eggs\t-spam");
		assert_eq!(sanitize_query("x --y"), r"x -\-y");
	}

	#[test]
	fn dash_after_anchor_stays_escaped() {
		assert_eq!(sanitize_query("^-a"), r"\-a");
	}

	#[test]
	fn relevance_alone_is_relevance() {
		let spec = SortSpec::from_keys(&[SortKey::Relevance]);

		assert_eq!(spec, SortSpec::Relevance);
		assert!(spec.sort_mode().is_ok());
	}

	#[test]
	fn attribute_sorts_are_unsupported() {
		let spec = SortSpec::from_keys(&[
			SortKey::Attribute { name: "price".to_string(), direction: Direction::Desc },
			SortKey::Relevance,
		]);

		assert_eq!(
			spec,
			SortSpec::AttributeList(vec![
				("price".to_string(), Direction::Desc),
				("@relevance".to_string(), Direction::Desc),
			])
		);

		let err = spec.sort_mode().expect_err("attribute sort has no mapping");

		assert!(err.to_string().contains("[-price, -@relevance]"), "Unexpected error: {err}");
	}

	#[test]
	fn projection_defaults_to_none() {
		assert_eq!(Projection::default(), Projection::None);
	}
}
