//! The search daemon client seam.
//!
//! The query core never speaks the daemon protocol itself. It parametrizes a client through
//! these calls and runs the one query it added.

use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::DocId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
	All,
	Any,
	Phrase,
	Boolean,
	Extended,
	FullScan,
	Extended2,
}
impl MatchMode {
	pub fn code(&self) -> u32 {
		match self {
			Self::All => 0,
			Self::Any => 1,
			Self::Phrase => 2,
			Self::Boolean => 3,
			Self::Extended => 4,
			Self::FullScan => 5,
			Self::Extended2 => 6,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMode {
	ProximityBm25,
	Bm25,
	None,
	WordCount,
	Proximity,
}
impl RankingMode {
	pub fn code(&self) -> u32 {
		match self {
			Self::ProximityBm25 => 0,
			Self::Bm25 => 1,
			Self::None => 2,
			Self::WordCount => 3,
			Self::Proximity => 4,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
	Relevance,
	AttrDesc,
	AttrAsc,
	TimeSegments,
	Extended,
	Expr,
}
impl SortMode {
	pub fn code(&self) -> u32 {
		match self {
			Self::Relevance => 0,
			Self::AttrDesc => 1,
			Self::AttrAsc => 2,
			Self::TimeSegments => 3,
			Self::Extended => 4,
			Self::Expr => 5,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DaemonStatus {
	Ok,
	Error,
	Retry,
	Warning,
}
impl DaemonStatus {
	pub fn from_code(code: u32) -> Option<Self> {
		match code {
			0 => Some(Self::Ok),
			1 => Some(Self::Error),
			2 => Some(Self::Retry),
			3 => Some(Self::Warning),
			_ => None,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Match {
	pub id: DocId,
	pub weight: i64,
	pub attrs: Map<String, Value>,
}
impl Match {
	pub fn new(id: DocId) -> Self {
		Self { id, weight: 1, attrs: Map::new() }
	}
}

/// One result set, as returned for each query added to the client.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryResult {
	pub status: DaemonStatus,
	pub error: String,
	pub warning: String,
	pub matches: Vec<Match>,
}
impl QueryResult {
	pub fn ok(matches: Vec<Match>) -> Self {
		Self { status: DaemonStatus::Ok, error: String::new(), warning: String::new(), matches }
	}
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
	#[error("Query timed out.")]
	Timeout,
	#[error(transparent)]
	Socket(#[from] std::io::Error),
	#[error("{0}")]
	Other(String),
}

pub trait SearchClient {
	fn set_server(&mut self, host: &str, port: u16);

	fn set_connect_timeout(&mut self, timeout: Duration);

	fn set_match_mode(&mut self, mode: MatchMode);

	fn set_ranking_mode(&mut self, mode: RankingMode);

	fn set_sort_mode(&mut self, mode: SortMode, clause: &str);

	fn set_filter(&mut self, attribute: &str, values: &[i64], exclude: bool);

	fn set_filter_range(&mut self, attribute: &str, min: i64, max: i64, exclude: bool);

	fn set_limits(&mut self, offset: usize, limit: usize);

	fn add_query(&mut self, query: &str, index: &str);

	fn run_queries(&mut self) -> Result<Vec<QueryResult>, ClientError>;
}
