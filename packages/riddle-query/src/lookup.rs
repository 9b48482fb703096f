//! Field lookups as accepted by `filter()` and `exclude()`.
//!
//! A lookup is `field` (equality) or `field__<suffix>` where the suffix is one of `in`, `gte`
//! or `lte`. The daemon only filters on integer attributes, so every value is an `i64`.

use serde::Serialize;

use crate::{Error, Result};

const LOOKUP_SEPARATOR: &str = "__";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
	Eq,
	In,
	Gte,
	Lte,
}
impl Comparator {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Eq => "eq",
			Self::In => "in",
			Self::Gte => "gte",
			Self::Lte => "lte",
		}
	}

	fn from_suffix(suffix: &str) -> Option<Self> {
		match suffix {
			"in" => Some(Self::In),
			"gte" => Some(Self::Gte),
			"lte" => Some(Self::Lte),
			_ => None,
		}
	}
}

/// A filter value as written by the caller: one scalar or a set of them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterArg {
	Scalar(i64),
	Set(Vec<i64>),
}
impl FilterArg {
	/// Equality and membership both compile to a value set; a scalar becomes a singleton.
	pub fn into_set(self) -> Vec<i64> {
		match self {
			Self::Scalar(value) => vec![value],
			Self::Set(values) => values,
		}
	}
}
impl From<i64> for FilterArg {
	fn from(value: i64) -> Self {
		Self::Scalar(value)
	}
}
impl From<i32> for FilterArg {
	fn from(value: i32) -> Self {
		Self::Scalar(value.into())
	}
}
impl From<u32> for FilterArg {
	fn from(value: u32) -> Self {
		Self::Scalar(value.into())
	}
}
impl From<bool> for FilterArg {
	fn from(value: bool) -> Self {
		Self::Scalar(value.into())
	}
}
impl From<Vec<i64>> for FilterArg {
	fn from(values: Vec<i64>) -> Self {
		Self::Set(values)
	}
}
impl From<&[i64]> for FilterArg {
	fn from(values: &[i64]) -> Self {
		Self::Set(values.to_vec())
	}
}
impl<const N: usize> From<[i64; N]> for FilterArg {
	fn from(values: [i64; N]) -> Self {
		Self::Set(values.to_vec())
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldCondition {
	pub field: String,
	pub comparator: Comparator,
	pub value: FilterArg,
}
impl FieldCondition {
	pub fn new(field: impl Into<String>, comparator: Comparator, value: impl Into<FilterArg>) -> Self {
		Self { field: field.into(), comparator, value: value.into() }
	}

	/// Parses a `field[__suffix]` lookup and checks that the value fits the comparator.
	pub fn parse(lookup: &str, value: FilterArg) -> Result<Self> {
		let (field, comparator) = match lookup.rsplit_once(LOOKUP_SEPARATOR) {
			Some((field, suffix)) => {
				let comparator = Comparator::from_suffix(suffix).ok_or_else(|| {
					Error::argument(format!(
						"lookup '{lookup}' has unsupported suffix '{suffix}', expected one of: in, gte, lte."
					))
				})?;

				(field, comparator)
			},
			None => (lookup, Comparator::Eq),
		};

		if field.is_empty() {
			return Err(Error::argument(format!("lookup '{lookup}' is missing a field name.")));
		}
		if matches!(comparator, Comparator::Gte | Comparator::Lte)
			&& matches!(value, FilterArg::Set(_))
		{
			return Err(Error::argument(format!(
				"lookup '{lookup}' takes a single bound, not a set."
			)));
		}

		Ok(Self { field: field.to_string(), comparator, value })
	}

	pub(crate) fn bound(&self) -> Option<i64> {
		match self.value {
			FilterArg::Scalar(value) => Some(value),
			FilterArg::Set(_) => None,
		}
	}
}
