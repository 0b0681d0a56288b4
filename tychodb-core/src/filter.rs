//! Filter Builder data model (spec §3, §4.3, C3). This module only holds the
//! accumulated Filter Nodes; rendering them to parameterized SQL is the
//! storage engine's job (`tychodb::filter_sql`), since it needs the concrete
//! query builder.

use chrono::{DateTime, Utc};

use crate::path::FieldPath;

/// Scalar comparators a Filter Node can apply (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
	Equals,
	NotEquals,
	StartsWith,
	EndsWith,
	Contains,
	GreaterThan,
	GreaterThanOrEqualTo,
	LessThan,
	LessThanOrEqualTo,
}

/// Join/group connective nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
	And,
	Or,
	OpenGroup,
	CloseGroup,
}

/// A user-supplied comparison value, tagged so the renderer can pick
/// numeric/boolean/datetime-aware SQL without re-inspecting the path.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
	Str(Box<str>),
	Int(i64),
	Float(f64),
	Bool(bool),
	DateTime(DateTime<Utc>),
}

impl From<&str> for FilterValue {
	fn from(value: &str) -> Self {
		Self::Str(value.into())
	}
}
impl From<String> for FilterValue {
	fn from(value: String) -> Self {
		Self::Str(value.into())
	}
}
impl From<i64> for FilterValue {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}
impl From<f64> for FilterValue {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}
impl From<bool> for FilterValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}
impl From<DateTime<Utc>> for FilterValue {
	fn from(value: DateTime<Utc>) -> Self {
		Self::DateTime(value)
	}
}

/// One node in a Filter's node sequence (spec §3).
#[derive(Debug, Clone)]
pub enum FilterNode {
	/// A comparator applied directly to a scalar path.
	Predicate { comparator: Comparator, path: FieldPath, value: FilterValue },
	/// An existential predicate: at least one element of the array at
	/// `array_path` satisfies `comparator` on its `item_path` member.
	SubtreePredicate { comparator: Comparator, array_path: FieldPath, item_path: FieldPath, value: FilterValue },
	/// A connective/grouping node.
	Join(Connective),
}

/// An ordered sequence of Filter Nodes, built fluently (spec §4.3).
#[derive(Debug, Clone, Default)]
pub struct Filter {
	nodes: Vec<FilterNode>,
}

impl Filter {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn nodes(&self) -> &[FilterNode] {
		&self.nodes
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Appends a scalar predicate node.
	pub fn predicate(&mut self, comparator: Comparator, path: FieldPath, value: impl Into<FilterValue>) -> &mut Self {
		self.nodes.push(FilterNode::Predicate { comparator, path, value: value.into() });
		self
	}

	/// Appends an existential (subtree) predicate node.
	pub fn any(
		&mut self,
		comparator: Comparator,
		array_path: FieldPath,
		item_path: FieldPath,
		value: impl Into<FilterValue>,
	) -> &mut Self {
		self.nodes.push(FilterNode::SubtreePredicate { comparator, array_path, item_path, value: value.into() });
		self
	}

	pub fn and(&mut self) -> &mut Self {
		self.nodes.push(FilterNode::Join(Connective::And));
		self
	}

	pub fn or(&mut self) -> &mut Self {
		self.nodes.push(FilterNode::Join(Connective::Or));
		self
	}

	pub fn open_group(&mut self) -> &mut Self {
		self.nodes.push(FilterNode::Join(Connective::OpenGroup));
		self
	}

	pub fn close_group(&mut self) -> &mut Self {
		self.nodes.push(FilterNode::Join(Connective::CloseGroup));
		self
	}

	pub fn equals(&mut self, path: FieldPath, value: impl Into<FilterValue>) -> &mut Self {
		self.predicate(Comparator::Equals, path, value)
	}
	pub fn not_equals(&mut self, path: FieldPath, value: impl Into<FilterValue>) -> &mut Self {
		self.predicate(Comparator::NotEquals, path, value)
	}
	pub fn starts_with(&mut self, path: FieldPath, value: impl Into<FilterValue>) -> &mut Self {
		self.predicate(Comparator::StartsWith, path, value)
	}
	pub fn ends_with(&mut self, path: FieldPath, value: impl Into<FilterValue>) -> &mut Self {
		self.predicate(Comparator::EndsWith, path, value)
	}
	pub fn contains(&mut self, path: FieldPath, value: impl Into<FilterValue>) -> &mut Self {
		self.predicate(Comparator::Contains, path, value)
	}
	pub fn greater_than(&mut self, path: FieldPath, value: impl Into<FilterValue>) -> &mut Self {
		self.predicate(Comparator::GreaterThan, path, value)
	}
	pub fn greater_than_or_equal_to(&mut self, path: FieldPath, value: impl Into<FilterValue>) -> &mut Self {
		self.predicate(Comparator::GreaterThanOrEqualTo, path, value)
	}
	pub fn less_than(&mut self, path: FieldPath, value: impl Into<FilterValue>) -> &mut Self {
		self.predicate(Comparator::LessThan, path, value)
	}
	pub fn less_than_or_equal_to(&mut self, path: FieldPath, value: impl Into<FilterValue>) -> &mut Self {
		self.predicate(Comparator::LessThanOrEqualTo, path, value)
	}

	/// Existential variant of [`Filter::greater_than`] over an embedded array.
	pub fn greater_than_any(&mut self, array_path: FieldPath, item_path: FieldPath, value: impl Into<FilterValue>) -> &mut Self {
		self.any(Comparator::GreaterThan, array_path, item_path, value)
	}
	pub fn equals_any(&mut self, array_path: FieldPath, item_path: FieldPath, value: impl Into<FilterValue>) -> &mut Self {
		self.any(Comparator::Equals, array_path, item_path, value)
	}
}
