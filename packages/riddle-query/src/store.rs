use serde_json::{Map, Value};

use crate::DocId;

/// A projected record: field name to value.
pub type Row = Map<String, Value>;

pub const ID_FIELD: &str = "id";

/// A full record that knows its own document ID.
pub trait Keyed {
	fn doc_id(&self) -> DocId;
}

/// The store the daemon's document IDs are hydrated from.
///
/// Both methods receive the complete ID set of one search and must answer it in a single round
/// trip. IDs the store no longer has are simply absent from the answer.
pub trait RecordStore {
	type Record: Keyed;

	fn fetch(&self, ids: &[DocId]) -> color_eyre::Result<Vec<Self::Record>>;

	/// Fetches the given fields of each record. An empty `fields` slice means every field,
	/// `id` included.
	fn fetch_fields(&self, ids: &[DocId], fields: &[String]) -> color_eyre::Result<Vec<Row>>;
}
