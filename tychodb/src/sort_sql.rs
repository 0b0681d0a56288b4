//! Renders a storage-agnostic [`Sort`] into an `ORDER BY` clause (spec §4.4,
//! C4). Extraction uses the `->>` JSON path operator rather than a cast, per
//! the spec's explicit choice of lexicographic comparison; callers who need
//! numeric ordering register the path as numeric and cast elsewhere.

use sqlx::{QueryBuilder, Sqlite};
use tychodb_core::sort::{Direction, Sort};

/// Appends ` ORDER BY <term>, <term>, …` to `qb`. A no-op for an empty sort.
pub(crate) fn render_order_by(qb: &mut QueryBuilder<'_, Sqlite>, sort: &Sort) {
	if sort.is_empty() {
		return;
	}
	qb.push(" ORDER BY ");
	for (i, term) in sort.terms().iter().enumerate() {
		if i > 0 {
			qb.push(", ");
		}
		let direction = match term.direction {
			Direction::Asc => "ASC",
			Direction::Desc => "DESC",
		};
		qb.push(format!("Data->>'{}' {direction}", term.path.as_str()));
	}
}
