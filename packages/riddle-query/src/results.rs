//! Hydration of daemon matches into caller-visible records.
//!
//! The daemon only knows document IDs (plus numeric attributes), so every result set is paired
//! back with the record store: one store query per search, never one per ID.

use std::{collections::HashMap, marker::PhantomData};

use serde_json::Value;

use crate::{
	DocId, Error, Result,
	store::{ID_FIELD, Keyed, RecordStore, Row},
};

/// How a result set is fetched from the store and keyed by document ID.
pub trait Shape<S>
where
	S: RecordStore + ?Sized,
{
	type Fetched;
	type Item;

	fn fetch(&self, store: &S, ids: &[DocId]) -> color_eyre::Result<Vec<Self::Fetched>>;

	/// Keys one fetched value. `None` drops it.
	fn pair(&self, fetched: Self::Fetched) -> Option<(DocId, Self::Item)>;
}

/// Full records, as the store returns them.
#[derive(Clone, Copy, Debug)]
pub struct ObjectShape<R> {
	_record: PhantomData<fn() -> R>,
}
impl<R> Default for ObjectShape<R> {
	fn default() -> Self {
		Self { _record: PhantomData }
	}
}
impl<S, R> Shape<S> for ObjectShape<R>
where
	S: RecordStore<Record = R> + ?Sized,
	R: Keyed,
{
	type Fetched = R;
	type Item = R;

	fn fetch(&self, store: &S, ids: &[DocId]) -> color_eyre::Result<Vec<R>> {
		store.fetch(ids)
	}

	fn pair(&self, record: R) -> Option<(DocId, R)> {
		Some((record.doc_id(), record))
	}
}

/// One map of the requested fields per record.
#[derive(Clone, Debug)]
pub struct DictShape {
	fields: Vec<String>,
	strip_id: bool,
}
impl DictShape {
	pub fn new(fields: Vec<String>) -> Self {
		let strip_id = !fields.is_empty() && !fields.iter().any(|field| field == ID_FIELD);

		Self { fields, strip_id }
	}

	// The ID is always fetched so rows can be put back in daemon order.
	fn fetch_rows<S>(&self, store: &S, ids: &[DocId]) -> color_eyre::Result<Vec<Row>>
	where
		S: RecordStore + ?Sized,
	{
		if self.strip_id {
			let mut fields = self.fields.clone();

			fields.push(ID_FIELD.to_string());

			store.fetch_fields(ids, &fields)
		} else {
			store.fetch_fields(ids, &self.fields)
		}
	}
}
impl<S> Shape<S> for DictShape
where
	S: RecordStore + ?Sized,
{
	type Fetched = Row;
	type Item = Row;

	fn fetch(&self, store: &S, ids: &[DocId]) -> color_eyre::Result<Vec<Row>> {
		self.fetch_rows(store, ids)
	}

	fn pair(&self, mut row: Row) -> Option<(DocId, Row)> {
		let id = row_id(&row)?;

		if self.strip_id {
			row.remove(ID_FIELD);
		}

		Some((id, row))
	}
}

/// One tuple of the requested fields per record, in request order.
#[derive(Clone, Debug)]
pub struct TupleShape {
	dict: DictShape,
}
impl TupleShape {
	pub fn new(fields: Vec<String>) -> Self {
		Self { dict: DictShape::new(fields) }
	}
}
impl<S> Shape<S> for TupleShape
where
	S: RecordStore + ?Sized,
{
	type Fetched = Row;
	type Item = Vec<Value>;

	fn fetch(&self, store: &S, ids: &[DocId]) -> color_eyre::Result<Vec<Row>> {
		self.dict.fetch_rows(store, ids)
	}

	fn pair(&self, row: Row) -> Option<(DocId, Vec<Value>)> {
		let id = row_id(&row)?;
		let tuple = self
			.dict
			.fields
			.iter()
			.map(|field| row.get(field).cloned().unwrap_or(Value::Null))
			.collect();

		Some((id, tuple))
	}
}

/// Results in the order the daemon ranked them.
///
/// The daemon may still return IDs of records that have since been deleted from the store; those
/// are skipped during iteration.
#[derive(Clone, Debug)]
pub struct SearchResults<T> {
	ids: Vec<DocId>,
	records: HashMap<DocId, T>,
}
impl<T> SearchResults<T> {
	pub fn materialize<S, P>(shape: &P, store: &S, ids: Vec<DocId>) -> Result<Self>
	where
		S: RecordStore + ?Sized,
		P: Shape<S, Item = T>,
	{
		if ids.is_empty() {
			return Ok(Self { ids, records: HashMap::new() });
		}

		let fetched = shape.fetch(store, &ids).map_err(|err| {
			tracing::error!(error = %err, ids = ids.len(), "Record store fetch failed.");

			Error::Store { message: err.to_string() }
		})?;
		let records = fetched.into_iter().filter_map(|value| shape.pair(value)).collect();

		Ok(Self { ids, records })
	}

	/// Every ID the daemon matched, including ones the store no longer has.
	pub fn ids(&self) -> &[DocId] {
		&self.ids
	}

	pub fn get(&self, id: DocId) -> Option<&T> {
		self.records.get(&id)
	}

	pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
		self.ids.iter().filter_map(|id| self.records.get(id))
	}

	/// Number of hydrated records.
	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}
}
impl<'a, T> IntoIterator for &'a SearchResults<T> {
	type IntoIter = Box<dyn Iterator<Item = &'a T> + 'a>;
	type Item = &'a T;

	fn into_iter(self) -> Self::IntoIter {
		Box::new(self.iter())
	}
}

fn row_id(row: &Row) -> Option<DocId> {
	let id = row.get(ID_FIELD).and_then(Value::as_u64);

	if id.is_none() {
		tracing::warn!("Record store row is missing a numeric id.");
	}

	id
}

#[cfg(test)]
mod tests {
	use std::{cell::Cell, collections::BTreeMap};

	use serde_json::{Value, json};

	use crate::{
		DocId,
		results::{DictShape, ObjectShape, SearchResults, TupleShape},
		store::{Keyed, RecordStore, Row},
	};

	#[derive(Clone, Debug, PartialEq)]
	struct Biscuit {
		id: DocId,
		name: String,
	}
	impl Keyed for Biscuit {
		fn doc_id(&self) -> DocId {
			self.id
		}
	}

	struct Pantry {
		rows: BTreeMap<DocId, Row>,
		calls: Cell<usize>,
		requested: Cell<Option<Vec<String>>>,
	}
	impl Pantry {
		fn new(ids: &[DocId]) -> Self {
			let rows = ids
				.iter()
				.map(|id| {
					let row = json!({ "id": id, "name": format!("biscuit-{id}"), "crumbs": id * 10 });

					(*id, row.as_object().cloned().unwrap_or_default())
				})
				.collect();

			Self { rows, calls: Cell::new(0), requested: Cell::new(None) }
		}
	}
	impl RecordStore for Pantry {
		type Record = Biscuit;

		fn fetch(&self, ids: &[DocId]) -> color_eyre::Result<Vec<Biscuit>> {
			self.calls.set(self.calls.get() + 1);

			Ok(ids
				.iter()
				.filter(|id| self.rows.contains_key(*id))
				.map(|id| Biscuit { id: *id, name: format!("biscuit-{id}") })
				.collect())
		}

		fn fetch_fields(&self, ids: &[DocId], fields: &[String]) -> color_eyre::Result<Vec<Row>> {
			self.calls.set(self.calls.get() + 1);
			self.requested.set(Some(fields.to_vec()));

			Ok(ids
				.iter()
				.filter_map(|id| self.rows.get(id))
				.map(|row| {
					if fields.is_empty() {
						row.clone()
					} else {
						row.iter()
							.filter(|(key, _)| fields.contains(*key))
							.map(|(key, value)| (key.clone(), value.clone()))
							.collect()
					}
				})
				.collect())
		}
	}

	#[test]
	fn stale_ids_are_skipped_in_daemon_order() {
		let store = Pantry::new(&[2, 9]);
		let results: SearchResults<Biscuit> =
			SearchResults::materialize(&ObjectShape::default(), &store, vec![5, 2, 9])
				.expect("store answers");
		let ids = results.iter().map(|biscuit| biscuit.id).collect::<Vec<_>>();

		assert_eq!(ids, vec![2, 9]);
		assert_eq!(results.get(9).map(|biscuit| biscuit.name.as_str()), Some("biscuit-9"));
		assert_eq!(results.len(), 2);
		assert_eq!(results.ids(), &[5, 2, 9]);
		assert_eq!(store.calls.get(), 1);
	}

	#[test]
	fn dicts_strip_the_internal_id() {
		let store = Pantry::new(&[1, 3]);
		let shape = DictShape::new(vec!["name".to_string()]);
		let results =
			SearchResults::materialize(&shape, &store, vec![3, 1]).expect("store answers");
		let rows = results.iter().cloned().collect::<Vec<_>>();

		assert_eq!(store.requested.take(), Some(vec!["name".to_string(), "id".to_string()]));
		assert_eq!(rows[0], json!({ "name": "biscuit-3" }).as_object().cloned().unwrap_or_default());
		assert_eq!(rows[1].get("name"), Some(&Value::from("biscuit-1")));
		assert!(rows.iter().all(|row| !row.contains_key("id")));
	}

	#[test]
	fn dicts_keep_a_requested_id() {
		let store = Pantry::new(&[4]);
		let shape = DictShape::new(vec!["id".to_string(), "crumbs".to_string()]);
		let results = SearchResults::materialize(&shape, &store, vec![4]).expect("store answers");

		assert_eq!(store.requested.take(), Some(vec!["id".to_string(), "crumbs".to_string()]));
		assert_eq!(results.get(4).and_then(|row| row.get("id")), Some(&Value::from(4)));
	}

	#[test]
	fn empty_dict_fields_fetch_everything() {
		let store = Pantry::new(&[4]);
		let results = SearchResults::materialize(&DictShape::new(Vec::new()), &store, vec![4])
			.expect("store answers");

		assert_eq!(store.requested.take(), Some(Vec::new()));
		assert_eq!(results.get(4).map(|row| row.len()), Some(3));
	}

	#[test]
	fn tuples_follow_requested_field_order() {
		let store = Pantry::new(&[7, 8]);
		let shape = TupleShape::new(vec!["crumbs".to_string(), "name".to_string(), "gone".to_string()]);
		let results = SearchResults::materialize(&shape, &store, vec![8, 7]).expect("store answers");
		let tuples = results.iter().cloned().collect::<Vec<_>>();

		assert_eq!(
			tuples,
			vec![
				vec![Value::from(80), Value::from("biscuit-8"), Value::Null],
				vec![Value::from(70), Value::from("biscuit-7"), Value::Null],
			]
		);
	}

	#[test]
	fn no_ids_skip_the_store() {
		let store = Pantry::new(&[1]);
		let results: SearchResults<Biscuit> =
			SearchResults::materialize(&ObjectShape::default(), &store, Vec::new())
				.expect("nothing to fetch");

		assert!(results.is_empty());
		assert_eq!(store.calls.get(), 0);
	}
}
