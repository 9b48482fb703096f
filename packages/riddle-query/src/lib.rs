//! A lazy, chainable search builder that compiles to search daemon client calls.
//!
//! ```text
//! Search::new(meta).filter(..)?.exclude(..)?.order_by(..)?   -- steps only
//!     .compile()   -> CompiledRequest (consolidated filters, sort, projection)
//!     .raw(client) -> daemon matches
//!     .execute(client, store) -> matches hydrated from the record store
//! ```

pub mod client;
pub mod compile;
pub mod consolidate;
pub mod lookup;
pub mod results;
pub mod search;
pub mod step;
pub mod store;

mod error;

pub use client::{
	ClientError, DaemonStatus, Match, MatchMode, QueryResult, RankingMode, SearchClient, SortMode,
};
pub use compile::{CompiledRequest, Limits, Projection, SortSpec, sanitize_query};
pub use consolidate::{Constraint, ConstraintKind, MAX_LONG, MIN_LONG};
pub use error::{Error, Result};
pub use lookup::{Comparator, FieldCondition, FilterArg};
pub use results::{DictShape, ObjectShape, SearchResults, Shape, TupleShape};
pub use search::{DaemonTarget, Hits, Search, SearchMeta};
pub use step::{Direction, SortKey, Step, StepLog};
pub use store::{Keyed, RecordStore, Row};

/// Document ID as assigned by the search daemon.
pub type DocId = u64;
