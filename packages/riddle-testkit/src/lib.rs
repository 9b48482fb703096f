mod logs;

pub use logs::LogCapture;

use std::{
	collections::BTreeMap,
	io,
	sync::atomic::{AtomicUsize, Ordering},
	time::Duration,
};

use color_eyre::eyre;
use serde_json::Value;

use riddle_query::{
	ClientError, DaemonStatus, DocId, Keyed, Match, MatchMode, QueryResult, RankingMode,
	RecordStore, Row, SearchClient, SortMode, store::ID_FIELD,
};

/// One call made on a [`RecordingClient`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
	SetServer { host: String, port: u16 },
	SetConnectTimeout(Duration),
	SetMatchMode(MatchMode),
	SetRankingMode(RankingMode),
	SetSortMode(SortMode, String),
	SetFilter { attribute: String, values: Vec<i64>, exclude: bool },
	SetFilterRange { attribute: String, min: i64, max: i64, exclude: bool },
	SetLimits { offset: usize, limit: usize },
	AddQuery { query: String, index: String },
	RunQueries,
}
impl Call {
	pub fn filter(attribute: &str, values: &[i64], exclude: bool) -> Self {
		Self::SetFilter { attribute: attribute.to_string(), values: values.to_vec(), exclude }
	}

	pub fn filter_range(attribute: &str, min: i64, max: i64, exclude: bool) -> Self {
		Self::SetFilterRange { attribute: attribute.to_string(), min, max, exclude }
	}

	pub fn add_query(query: &str, index: &str) -> Self {
		Self::AddQuery { query: query.to_string(), index: index.to_string() }
	}
}

/// What `run_queries` answers.
#[derive(Clone, Debug)]
pub enum Reply {
	Results(Vec<QueryResult>),
	Timeout,
	Socket(io::ErrorKind),
	Failure(String),
}

/// A daemon client that records every call and answers `run_queries` from a script.
#[derive(Debug)]
pub struct RecordingClient {
	calls: Vec<Call>,
	reply: Reply,
}
impl RecordingClient {
	/// Answers with one successful, empty result set.
	pub fn new() -> Self {
		Self::replying(Reply::Results(vec![QueryResult::ok(Vec::new())]))
	}

	/// Answers with one successful result set matching `ids` in order.
	pub fn matching(ids: &[DocId]) -> Self {
		Self::replying(Reply::Results(vec![QueryResult::ok(
			ids.iter().map(|id| Match::new(*id)).collect(),
		)]))
	}

	/// Answers with one result set carrying `status` and `message`.
	pub fn with_status(status: DaemonStatus, message: &str, ids: &[DocId]) -> Self {
		let mut result = QueryResult::ok(ids.iter().map(|id| Match::new(*id)).collect());

		result.status = status;

		match status {
			DaemonStatus::Warning => result.warning = message.to_string(),
			_ => result.error = message.to_string(),
		}

		Self::replying(Reply::Results(vec![result]))
	}

	pub fn replying(reply: Reply) -> Self {
		Self { calls: Vec::new(), reply }
	}

	pub fn calls(&self) -> &[Call] {
		&self.calls
	}

	/// Only the filter calls, in the order they were made.
	pub fn filters(&self) -> Vec<Call> {
		self.calls
			.iter()
			.filter(|call| matches!(call, Call::SetFilter { .. } | Call::SetFilterRange { .. }))
			.cloned()
			.collect()
	}

	pub fn position(&self, wanted: &Call) -> Option<usize> {
		self.calls.iter().position(|call| call == wanted)
	}
}
impl Default for RecordingClient {
	fn default() -> Self {
		Self::new()
	}
}
impl SearchClient for RecordingClient {
	fn set_server(&mut self, host: &str, port: u16) {
		self.calls.push(Call::SetServer { host: host.to_string(), port });
	}

	fn set_connect_timeout(&mut self, timeout: Duration) {
		self.calls.push(Call::SetConnectTimeout(timeout));
	}

	fn set_match_mode(&mut self, mode: MatchMode) {
		self.calls.push(Call::SetMatchMode(mode));
	}

	fn set_ranking_mode(&mut self, mode: RankingMode) {
		self.calls.push(Call::SetRankingMode(mode));
	}

	fn set_sort_mode(&mut self, mode: SortMode, clause: &str) {
		self.calls.push(Call::SetSortMode(mode, clause.to_string()));
	}

	fn set_filter(&mut self, attribute: &str, values: &[i64], exclude: bool) {
		self.calls.push(Call::filter(attribute, values, exclude));
	}

	fn set_filter_range(&mut self, attribute: &str, min: i64, max: i64, exclude: bool) {
		self.calls.push(Call::filter_range(attribute, min, max, exclude));
	}

	fn set_limits(&mut self, offset: usize, limit: usize) {
		self.calls.push(Call::SetLimits { offset, limit });
	}

	fn add_query(&mut self, query: &str, index: &str) {
		self.calls.push(Call::add_query(query, index));
	}

	fn run_queries(&mut self) -> Result<Vec<QueryResult>, ClientError> {
		self.calls.push(Call::RunQueries);

		match &self.reply {
			Reply::Results(results) => Ok(results.clone()),
			Reply::Timeout => Err(ClientError::Timeout),
			Reply::Socket(kind) => Err(ClientError::Socket(io::Error::from(*kind))),
			Reply::Failure(message) => Err(ClientError::Other(message.clone())),
		}
	}
}

/// A stored record: its ID plus every other field.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
	pub id: DocId,
	pub fields: Row,
}
impl Keyed for Document {
	fn doc_id(&self) -> DocId {
		self.id
	}
}

/// An in-memory record store that counts its round trips.
#[derive(Debug, Default)]
pub struct MemoryStore {
	rows: BTreeMap<DocId, Row>,
	round_trips: AtomicUsize,
	failure: Option<String>,
}
impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Stores a record. Non-object `fields` are stored as an empty record.
	pub fn with_record(mut self, id: DocId, fields: Value) -> Self {
		let mut row = match fields {
			Value::Object(map) => map,
			_ => Row::new(),
		};

		row.insert(ID_FIELD.to_string(), Value::from(id));
		self.rows.insert(id, row);

		self
	}

	/// Makes every fetch fail with `message`.
	pub fn failing(mut self, message: &str) -> Self {
		self.failure = Some(message.to_string());

		self
	}

	pub fn round_trips(&self) -> usize {
		self.round_trips.load(Ordering::SeqCst)
	}

	fn begin(&self) -> color_eyre::Result<()> {
		self.round_trips.fetch_add(1, Ordering::SeqCst);

		match &self.failure {
			Some(message) => Err(eyre::eyre!("{message}")),
			None => Ok(()),
		}
	}
}
impl RecordStore for MemoryStore {
	type Record = Document;

	fn fetch(&self, ids: &[DocId]) -> color_eyre::Result<Vec<Document>> {
		self.begin()?;

		Ok(ids
			.iter()
			.filter_map(|id| self.rows.get(id).map(|row| (*id, row)))
			.map(|(id, row)| {
				let mut fields = row.clone();

				fields.remove(ID_FIELD);

				Document { id, fields }
			})
			.collect())
	}

	fn fetch_fields(&self, ids: &[DocId], fields: &[String]) -> color_eyre::Result<Vec<Row>> {
		self.begin()?;

		Ok(ids
			.iter()
			.filter_map(|id| self.rows.get(id))
			.map(|row| {
				if fields.is_empty() {
					return row.clone();
				}

				fields
					.iter()
					.filter_map(|field| row.get(field).map(|value| (field.clone(), value.clone())))
					.collect()
			})
			.collect())
	}
}
