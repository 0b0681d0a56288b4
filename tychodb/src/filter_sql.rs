//! Renders a storage-agnostic [`Filter`] into a parameterized SQL fragment
//! (spec §4.3, C3). All user-supplied values are bound through
//! `QueryBuilder::push_bind` rather than interpolated into the SQL text —
//! the spec's Design Notes flag the source's raw interpolation as unsafe and
//! require parameter binding while preserving which rows match.

use sqlx::{QueryBuilder, Sqlite};
use tychodb_core::codec::Codec;
use tychodb_core::error::{TychoError, TychoResult};
use tychodb_core::filter::{Comparator, Connective, Filter, FilterNode, FilterValue};
use tychodb_core::path::FieldPath;

/// Appends `\nAND (<fragment>\n)` to `qb` when `filter` has any nodes, so the
/// fragment always glues onto a preceding `WHERE 1=1` clause with a leading
/// connective (spec §8's filter-rendering invariant). A no-op for an empty filter.
pub(crate) fn render_where<C: Codec>(qb: &mut QueryBuilder<'_, Sqlite>, filter: &Filter, codec: &C) -> TychoResult<()> {
	if filter.is_empty() {
		return Ok(());
	}
	qb.push("\nAND (");
	for node in filter.nodes() {
		match node {
			FilterNode::Join(connective) => {
				qb.push(connective_token(*connective));
			}
			FilterNode::Predicate { comparator, path, value } => {
				qb.push("\n");
				push_scalar_predicate(qb, "Data", path, *comparator, value, codec)?;
			}
			FilterNode::SubtreePredicate { comparator, array_path, item_path, value } => {
				qb.push("\n");
				push_existential_predicate(qb, array_path, item_path, *comparator, value, codec)?;
			}
		}
	}
	qb.push("\n)");
	Ok(())
}

fn connective_token(connective: Connective) -> &'static str {
	match connective {
		Connective::And => "\nAND",
		Connective::Or => "\nOR",
		Connective::OpenGroup => "\n(",
		Connective::CloseGroup => "\n)",
	}
}

/// Renders one scalar predicate against `json_extract(<source>, path)`,
/// following the type-flavor rules in spec §4.3 item 2.
fn push_scalar_predicate<C: Codec>(
	qb: &mut QueryBuilder<'_, Sqlite>,
	source: &str,
	path: &FieldPath,
	comparator: Comparator,
	value: &FilterValue,
	codec: &C,
) -> TychoResult<()> {
	let extract = format!("json_extract({source}, '{}')", path.as_str());
	match comparator {
		Comparator::StartsWith | Comparator::EndsWith | Comparator::Contains => {
			let needle = escape_like(&string_value(value));
			let pattern = match comparator {
				Comparator::StartsWith => format!("{needle}%"),
				Comparator::EndsWith => format!("%{needle}"),
				_ => format!("%{needle}%"),
			};
			qb.push(format!("{extract} LIKE "));
			qb.push_bind(pattern);
			qb.push(" ESCAPE '\\'");
		}
		Comparator::GreaterThan | Comparator::GreaterThanOrEqualTo | Comparator::LessThan | Comparator::LessThanOrEqualTo => {
			let op = range_operator(comparator);
			if path.is_datetime() {
				// ISO-8601 text with a fixed-width, zero-padded format sorts the
				// same lexicographically as chronologically, so compare as text
				// rather than CASTing (which truncates to the leading digit run).
				qb.push(format!("{extract} {op} "));
				qb.push_bind(datetime_value(value, codec));
			} else {
				qb.push(format!("CAST({extract} AS NUMERIC) {op} "));
				qb.push_bind(numeric_value(value)?);
			}
		}
		Comparator::Equals | Comparator::NotEquals => {
			let op = if matches!(comparator, Comparator::Equals) { "=" } else { "!=" };
			if path.is_bool() {
				qb.push(format!("{extract} {op} "));
				qb.push_bind(i64::from(bool_value(value)));
			} else if path.is_numeric() {
				qb.push(format!("CAST({extract} AS NUMERIC) {op} "));
				qb.push_bind(numeric_value(value)?);
			} else if path.is_datetime() {
				qb.push(format!("{extract} {op} "));
				qb.push_bind(datetime_value(value, codec));
			} else {
				qb.push(format!("{extract} {op} "));
				qb.push_bind(string_value(value));
			}
		}
	}
	Ok(())
}

/// `EXISTS(SELECT 1 FROM json_tree(Data, arrayPath) AS jt, json_each(jt.value)
/// AS elem WHERE jt.type='array' AND <comparator over elem.value/itemPath>)`
/// (spec §4.3 item 3). `json_tree` locates the array node at `arrayPath` at
/// any depth; `json_each` then iterates its elements.
fn push_existential_predicate<C: Codec>(
	qb: &mut QueryBuilder<'_, Sqlite>,
	array_path: &FieldPath,
	item_path: &FieldPath,
	comparator: Comparator,
	value: &FilterValue,
	codec: &C,
) -> TychoResult<()> {
	qb.push(format!(
		"EXISTS(SELECT 1 FROM json_tree(Data, '{}') AS jt, json_each(jt.value) AS elem WHERE jt.type = 'array' AND ",
		array_path.as_str()
	));
	push_scalar_predicate(qb, "elem.value", item_path, comparator, value, codec)?;
	qb.push(")");
	Ok(())
}

/// Escapes SQLite `LIKE` metacharacters (`%`, `_`) and the escape character
/// itself, so a literal value containing them is matched literally rather
/// than as a wildcard (paired with the `ESCAPE '\'` clause at the call site).
fn escape_like(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());
	for ch in raw.chars() {
		if matches!(ch, '%' | '_' | '\\') {
			out.push('\\');
		}
		out.push(ch);
	}
	out
}

fn range_operator(comparator: Comparator) -> &'static str {
	match comparator {
		Comparator::GreaterThan => ">",
		Comparator::GreaterThanOrEqualTo => ">=",
		Comparator::LessThan => "<",
		Comparator::LessThanOrEqualTo => "<=",
		_ => unreachable!("range_operator only called for range comparators"),
	}
}

fn string_value(value: &FilterValue) -> String {
	match value {
		FilterValue::Str(s) => s.to_string(),
		FilterValue::Int(i) => i.to_string(),
		FilterValue::Float(f) => f.to_string(),
		FilterValue::Bool(b) => b.to_string(),
		FilterValue::DateTime(dt) => dt.to_rfc3339(),
	}
}

fn numeric_value(value: &FilterValue) -> TychoResult<f64> {
	Ok(match value {
		FilterValue::Int(i) => *i as f64,
		FilterValue::Float(f) => *f,
		FilterValue::Bool(b) => {
			if *b {
				1.0
			} else {
				0.0
			}
		}
		FilterValue::Str(s) => s
			.parse()
			.map_err(|e: std::num::ParseFloatError| TychoError::read_failed(format!("filter value `{s}` is not numeric"), Box::new(e)))?,
		FilterValue::DateTime(dt) => dt.timestamp() as f64,
	})
}

fn bool_value(value: &FilterValue) -> bool {
	match value {
		FilterValue::Bool(b) => *b,
		FilterValue::Int(i) => *i != 0,
		FilterValue::Str(s) => s.eq_ignore_ascii_case("true"),
		_ => false,
	}
}

fn datetime_value<C: Codec>(value: &FilterValue, codec: &C) -> String {
	match value {
		FilterValue::DateTime(dt) => dt.format(codec.date_time_serialization_format()).to_string(),
		other => string_value(other),
	}
}
