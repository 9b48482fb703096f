use std::{ops::Range, sync::Arc, time::Duration};

use serde::Serialize;
use serde_json::Value;

use crate::{
	DocId, Error, Result,
	client::{ClientError, DaemonStatus, Match, MatchMode, RankingMode, SearchClient},
	compile::{self, CompiledRequest, Projection},
	consolidate::ConstraintKind,
	lookup::{FieldCondition, FilterArg},
	results::{DictShape, ObjectShape, SearchResults, TupleShape},
	step::{FilterClause, SortKey, Step, StepLog},
	store::{RecordStore, Row},
};

/// The key `query()` takes its text from.
pub const QUERY_TEXT_KEY: &str = "any_";

/// Search metadata for one kind of record: the daemon index holding it and its default
/// ordering. An empty ordering means none was declared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchMeta {
	pub index: String,
	pub ordering: Vec<SortKey>,
}
impl SearchMeta {
	pub fn new(index: impl Into<String>) -> Self {
		Self { index: index.into(), ordering: Vec::new() }
	}

	pub fn with_ordering(mut self, ordering: Vec<SortKey>) -> Self {
		self.ordering = ordering;

		self
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DaemonTarget {
	pub host: String,
	pub port: u16,
	pub connect_timeout: Option<Duration>,
}
impl Default for DaemonTarget {
	fn default() -> Self {
		Self::from(&riddle_config::Daemon::default())
	}
}
impl From<&riddle_config::Daemon> for DaemonTarget {
	fn from(cfg: &riddle_config::Daemon) -> Self {
		Self {
			host: cfg.host.clone(),
			port: cfg.port,
			connect_timeout: cfg.connect_timeout_ms.map(Duration::from_millis),
		}
	}
}

/// Materialized results, shaped by the last `values()`/`values_dict()` call.
#[derive(Clone, Debug)]
pub enum Hits<R> {
	Objects(SearchResults<R>),
	Dicts(SearchResults<Row>),
	Tuples(SearchResults<Vec<Value>>),
}
impl<R> Hits<R> {
	pub fn ids(&self) -> &[DocId] {
		match self {
			Self::Objects(results) => results.ids(),
			Self::Dicts(results) => results.ids(),
			Self::Tuples(results) => results.ids(),
		}
	}

	pub fn len(&self) -> usize {
		match self {
			Self::Objects(results) => results.len(),
			Self::Dicts(results) => results.len(),
			Self::Tuples(results) => results.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// A lazy search whose API is a subset of a full-text search client's.
///
/// Every chained call returns a new `Search` and leaves the receiver untouched, so a partially
/// built search can be reused and branched freely. Nothing talks to the daemon until
/// [`Search::raw`] or [`Search::execute`].
#[derive(Clone, Debug)]
pub struct Search {
	meta: Arc<SearchMeta>,
	target: Arc<DaemonTarget>,
	steps: StepLog,
}
impl Search {
	pub fn new(meta: SearchMeta) -> Self {
		Self {
			meta: Arc::new(meta),
			target: Arc::new(DaemonTarget::default()),
			steps: StepLog::new(),
		}
	}

	pub fn with_target(&self, target: DaemonTarget) -> Self {
		Self { meta: self.meta.clone(), target: Arc::new(target), steps: self.steps.clone() }
	}

	pub fn meta(&self) -> &SearchMeta {
		&self.meta
	}

	pub fn target(&self) -> &DaemonTarget {
		&self.target
	}

	pub fn steps(&self) -> &StepLog {
		&self.steps
	}

	/// Uses the value of the `any_` key as the query text.
	///
	/// The daemon searches all fields with one string, so any other key is ignored rather than
	/// rejected.
	pub fn query(&self, kwargs: &[(&str, &str)]) -> Result<Self> {
		let mut text = None;

		for (key, value) in kwargs {
			if *key == QUERY_TEXT_KEY {
				text = Some(*value);
			} else {
				tracing::debug!(key = %key, "Ignoring unsupported query() argument.");
			}
		}

		let text = text.ok_or_else(|| {
			Error::argument(format!("query() must have an `{QUERY_TEXT_KEY}` argument."))
		})?;

		Ok(self.with_query(text))
	}

	pub fn with_query(&self, text: impl Into<String>) -> Self {
		self.push(Step::Query(text.into()))
	}

	pub fn filter(&self, lookups: &[(&str, FilterArg)]) -> Result<Self> {
		Ok(self.with_filter(parse_lookups(lookups)?, false))
	}

	pub fn exclude(&self, lookups: &[(&str, FilterArg)]) -> Result<Self> {
		Ok(self.with_filter(parse_lookups(lookups)?, true))
	}

	pub fn with_filter(&self, conditions: Vec<FieldCondition>, negated: bool) -> Self {
		self.push(Step::Filter(FilterClause { conditions, negated }))
	}

	pub fn order_by(&self, keys: &[&str]) -> Result<Self> {
		let keys = keys.iter().map(|key| SortKey::parse(key)).collect::<Result<Vec<_>>>()?;

		Ok(self.with_order(keys))
	}

	pub fn with_order(&self, keys: Vec<SortKey>) -> Self {
		self.push(Step::OrderBy(keys))
	}

	pub fn values(&self, fields: &[&str]) -> Self {
		self.with_fields(fields.iter().map(|field| field.to_string()).collect(), false)
	}

	pub fn values_dict(&self, fields: &[&str]) -> Self {
		self.with_fields(fields.iter().map(|field| field.to_string()).collect(), true)
	}

	pub fn with_fields(&self, names: Vec<String>, as_dict: bool) -> Self {
		if as_dict { self.push(Step::ValuesDict(names)) } else { self.push(Step::Values(names)) }
	}

	/// Restricts the search to the ranked matches in `range`.
	pub fn slice(&self, range: Range<usize>) -> Result<Self> {
		if range.start >= range.end {
			return Err(Error::argument(format!(
				"slice {}..{} must select at least one match.",
				range.start, range.end
			)));
		}

		Ok(self.push(Step::Slice(range)))
	}

	pub fn facet(&self, _fields: &[&str]) -> Result<Self> {
		Err(Error::unsupported("the search daemon does not support faceting."))
	}

	pub fn weight(&self, _weights: &[(&str, f32)]) -> Result<Self> {
		Err(Error::unsupported("per-field weighting is not supported yet."))
	}

	pub fn compile(&self) -> Result<CompiledRequest> {
		compile::compile(&self.meta, &self.steps)
	}

	/// Runs the search and returns the daemon's matches for it, in ranking order.
	pub fn raw<C>(&self, client: &mut C) -> Result<Vec<Match>>
	where
		C: SearchClient + ?Sized,
	{
		let request = self.compile()?;

		parametrize(client, &self.target, &request)?;

		run(client, &request)
	}

	/// Runs the search and hydrates the matches from `store` with one fetch.
	pub fn execute<C, S>(&self, client: &mut C, store: &S) -> Result<Hits<S::Record>>
	where
		C: SearchClient + ?Sized,
		S: RecordStore + ?Sized,
	{
		let request = self.compile()?;

		parametrize(client, &self.target, &request)?;

		let ids = run(client, &request)?.into_iter().map(|found| found.id).collect::<Vec<_>>();
		let hits = match request.projection {
			Projection::None =>
				Hits::Objects(SearchResults::materialize(&ObjectShape::default(), store, ids)?),
			Projection::List(fields) =>
				Hits::Tuples(SearchResults::materialize(&TupleShape::new(fields), store, ids)?),
			Projection::Dict(fields) =>
				Hits::Dicts(SearchResults::materialize(&DictShape::new(fields), store, ids)?),
		};

		Ok(hits)
	}

	fn push(&self, step: Step) -> Self {
		Self { meta: self.meta.clone(), target: self.target.clone(), steps: self.steps.push(step) }
	}
}

/// Configures `client` to run `request`. Filters and modes must be set before the query is
/// added or they do not apply to it.
pub fn parametrize<C>(client: &mut C, target: &DaemonTarget, request: &CompiledRequest) -> Result<()>
where
	C: SearchClient + ?Sized,
{
	let (sort_mode, sort_clause) = request.sort.sort_mode()?;

	client.set_server(&target.host, target.port);

	if let Some(timeout) = target.connect_timeout {
		client.set_connect_timeout(timeout);
	}

	client.set_match_mode(MatchMode::Extended2);
	client.set_ranking_mode(RankingMode::ProximityBm25);

	for constraint in &request.constraints {
		match &constraint.kind {
			ConstraintKind::EqOrIn { values } =>
				client.set_filter(&constraint.field, values, constraint.negated),
			ConstraintKind::Range { low, high } =>
				client.set_filter_range(&constraint.field, *low, *high, constraint.negated),
		}
	}

	client.set_sort_mode(sort_mode, sort_clause);

	if let Some(limits) = request.limits {
		client.set_limits(limits.offset, limits.limit);
	}

	client.add_query(&request.query, &request.index);

	Ok(())
}

fn run<C>(client: &mut C, request: &CompiledRequest) -> Result<Vec<Match>>
where
	C: SearchClient + ?Sized,
{
	let results = client.run_queries().map_err(|err| match err {
		ClientError::Timeout => {
			tracing::error!(index = %request.index, "Query has timed out.");

			Error::SearchUnavailable { message: "Query has timed out.".to_string() }
		},
		ClientError::Socket(err) => {
			tracing::error!(error = %err, index = %request.index, "Query socket error.");

			Error::SearchUnavailable { message: "Could not execute your search.".to_string() }
		},
		ClientError::Other(message) => {
			tracing::error!(
				error = %message,
				index = %request.index,
				"Search daemon client failed unexpectedly."
			);

			Error::SearchUnavailable {
				message: "Search daemon client failed unexpectedly.".to_string(),
			}
		},
	})?;
	let Some(first) = results.into_iter().next() else {
		tracing::error!(index = %request.index, "Search daemon returned no results.");

		return Err(Error::SearchDaemon { message: "Search daemon returned no results.".to_string() });
	};

	match first.status {
		DaemonStatus::Ok => {},
		DaemonStatus::Warning => {
			tracing::warn!(warning = %first.warning, index = %request.index, "Search daemon warning.");
		},
		DaemonStatus::Retry => {
			tracing::error!(
				error = %first.error,
				index = %request.index,
				"Search daemon asked for a retry."
			);

			return Err(Error::SearchUnavailable {
				message: "Search daemon is temporarily unavailable.".to_string(),
			});
		},
		DaemonStatus::Error => {
			tracing::error!(
				error = %first.error,
				index = %request.index,
				"Search daemon failed to perform the query."
			);

			return Err(Error::SearchDaemon {
				message: "Search daemon had an error while performing the query.".to_string(),
			});
		},
	}

	Ok(first.matches)
}

fn parse_lookups(lookups: &[(&str, FilterArg)]) -> Result<Vec<FieldCondition>> {
	lookups
		.iter()
		.map(|(lookup, value)| FieldCondition::parse(lookup, value.clone()))
		.collect()
}

#[cfg(test)]
mod tests {
	use crate::{
		Error,
		search::{Search, SearchMeta},
		step::Step,
	};

	fn biscuits() -> Search {
		Search::new(SearchMeta::new("biscuit"))
	}

	#[test]
	fn query_requires_text_key() {
		let err = biscuits().query(&[("title", "gerbil")]).expect_err("any_ is required");

		assert!(matches!(err, Error::Argument { .. }));
	}

	#[test]
	fn query_ignores_other_keys() {
		let search =
			biscuits().query(&[("any_", "gerbil"), ("ignored_kwarg", "dummy")]).expect("valid");

		assert_eq!(search.steps().steps(), vec![&Step::Query("gerbil".to_string())]);
	}

	#[test]
	fn chaining_never_mutates_the_receiver() {
		let base = biscuits().filter(&[("a", 1.into())]).expect("valid lookup");
		let left = base.values(&["name"]);
		let right = base.values_dict(&["name"]);

		assert_eq!(base.steps().len(), 1);
		assert_eq!(left.steps().len(), 2);
		assert_eq!(right.steps().len(), 2);
		assert_ne!(left.steps().steps()[1], right.steps().steps()[1]);
	}

	#[test]
	fn facet_and_weight_are_unsupported() {
		assert!(matches!(biscuits().facet(&["category"]), Err(Error::Unsupported { .. })));
		assert!(matches!(biscuits().weight(&[("title", 2.0)]), Err(Error::Unsupported { .. })));
	}

	#[test]
	fn empty_slices_are_rejected() {
		assert!(matches!(biscuits().slice(5..5), Err(Error::Argument { .. })));
		assert!(biscuits().slice(0..20).is_ok());
	}

	#[test]
	fn builders_are_shareable_across_threads() {
		fn assert_send_sync<T: Send + Sync>() {}

		assert_send_sync::<Search>();
	}
}
