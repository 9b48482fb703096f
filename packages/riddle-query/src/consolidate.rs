//! Filter consolidation.
//!
//! The daemon exposes two filter primitives: a value-set filter and a range filter that always
//! takes one inclusive lower and one inclusive upper bound. Consolidation turns the raw
//! conditions of every `filter()`/`exclude()` call into the fewest primitive calls that express
//! them, so `a__gte=1, a__lte=10` becomes one range instead of two half-open ones.

use std::collections::HashMap;

use serde::Serialize;

use crate::{
	Error, Result,
	lookup::{Comparator, FieldCondition},
	step::FilterClause,
};

/// Open lower bound for a range filter.
pub const MIN_LONG: i64 = i64::MIN;
/// Open upper bound for a range filter.
pub const MAX_LONG: i64 = i64::MAX;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ConstraintKind {
	Range { low: i64, high: i64 },
	EqOrIn { values: Vec<i64> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Constraint {
	pub field: String,
	#[serde(flatten)]
	pub kind: ConstraintKind,
	pub negated: bool,
}
impl Constraint {
	pub fn range(field: impl Into<String>, low: i64, high: i64, negated: bool) -> Self {
		Self { field: field.into(), kind: ConstraintKind::Range { low, high }, negated }
	}

	pub fn eq_or_in(field: impl Into<String>, values: Vec<i64>, negated: bool) -> Self {
		Self { field: field.into(), kind: ConstraintKind::EqOrIn { values }, negated }
	}
}

/// Conditions that may merge with each other.
///
/// Positive conditions from every call share a group per field since the daemon ANDs them.
/// Negated conditions stay within the `exclude()` call that declared them: two separate
/// exclusions mean `NOT a AND NOT b`, which one merged exclusion range would not express.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct GroupKey {
	field: String,
	negated: bool,
	clause: Option<usize>,
}

#[derive(Debug, Default)]
struct RangeGroup {
	low: Option<i64>,
	high: Option<i64>,
}

enum Slot {
	Range(usize),
	Equality(Constraint),
}

pub fn consolidate<'a, I>(clauses: I) -> Result<Vec<Constraint>>
where
	I: IntoIterator<Item = &'a FilterClause>,
{
	let mut slots = Vec::new();
	let mut ranges: Vec<(GroupKey, RangeGroup)> = Vec::new();
	let mut range_index: HashMap<GroupKey, usize> = HashMap::new();

	for (clause_idx, clause) in clauses.into_iter().enumerate() {
		for condition in &clause.conditions {
			let upper = match condition.comparator {
				Comparator::Eq | Comparator::In => {
					slots.push(Slot::Equality(Constraint::eq_or_in(
						condition.field.clone(),
						condition.value.clone().into_set(),
						clause.negated,
					)));

					continue;
				},
				Comparator::Gte => false,
				Comparator::Lte => true,
			};
			let key = GroupKey {
				field: condition.field.clone(),
				negated: clause.negated,
				clause: clause.negated.then_some(clause_idx),
			};
			let idx = match range_index.get(&key) {
				Some(idx) => *idx,
				None => {
					let idx = ranges.len();

					range_index.insert(key.clone(), idx);
					ranges.push((key, RangeGroup::default()));
					slots.push(Slot::Range(idx));

					idx
				},
			};

			merge_bound(&mut ranges[idx].1, condition, upper)?;
		}
	}

	Ok(slots
		.into_iter()
		.map(|slot| match slot {
			Slot::Equality(constraint) => constraint,
			Slot::Range(idx) => {
				let (key, group) = &ranges[idx];

				Constraint::range(
					key.field.clone(),
					group.low.unwrap_or(MIN_LONG),
					group.high.unwrap_or(MAX_LONG),
					key.negated,
				)
			},
		})
		.collect())
}

fn merge_bound(group: &mut RangeGroup, condition: &FieldCondition, upper: bool) -> Result<()> {
	let Some(bound) = condition.bound() else {
		return Err(Error::argument(format!(
			"{} bound on field '{}' must be a single value.",
			condition.comparator.as_str(),
			condition.field
		)));
	};
	let (slot, label) = if upper { (&mut group.high, "upper") } else { (&mut group.low, "lower") };

	if let Some(existing) = *slot {
		return Err(Error::argument(format!(
			"field '{}' has more than one {label} bound ({existing} and {bound}).",
			condition.field
		)));
	}

	*slot = Some(bound);

	Ok(())
}
