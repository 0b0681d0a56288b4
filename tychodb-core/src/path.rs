//! Path Compiler (spec §4.1, C1).
//!
//! The original design compiles a lambda expression tree into a JSON path.
//! Rust has no expression trees, so the compiler here takes the builder-API
//! shape spec §9's Design Notes call out explicitly: callers describe a chain
//! of member accesses as field-descriptor segments (usually through the
//! [`path!`] macro) and get back a [`FieldPath`] carrying the `$.A.B.C` string
//! plus the numeric/bool/datetime flags C1 requires.

use crate::error::{TychoError, TychoResult};

/// Which SQL-relevant flavor the path's terminal member has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathFlavor {
	/// No special handling; compared as quoted strings.
	Plain,
	/// Integer or floating member; comparisons cast to numeric.
	Numeric,
	/// Boolean member; comparisons use unquoted `0`/`1`.
	Bool,
	/// Date-or-instant member; comparisons serialize via the codec's canonical format.
	DateTime,
}

/// A compiled JSON path plus the type flags the Filter/Sort builders need to
/// choose numeric/boolean/datetime-aware SQL (spec §4.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
	path: Box<str>,
	is_numeric: bool,
	is_bool: bool,
	is_datetime: bool,
}

impl FieldPath {
	/// Builds a path from root-to-leaf member-name segments. Determinism
	/// (spec §4.1): the same segments in the same order always yield the same
	/// `$.`-prefixed string — callers whose underlying traversal walks
	/// leaf-to-root must reverse the segments themselves before calling this,
	/// since this function does not re-order its input.
	pub fn try_new(segments: &[&str], flavor: PathFlavor) -> TychoResult<Self> {
		if segments.is_empty() {
			return Err(TychoError::InvalidPath("path must have at least one member".into()));
		}
		for seg in segments {
			validate_member(seg)?;
		}
		let mut path = String::from("$");
		for seg in segments {
			path.push('.');
			path.push_str(seg);
		}
		Ok(Self {
			path: path.into_boxed_str(),
			is_numeric: flavor == PathFlavor::Numeric,
			is_bool: flavor == PathFlavor::Bool,
			is_datetime: flavor == PathFlavor::DateTime,
		})
	}

	/// Parses a dotted member chain such as `"Values.FloatProperty"` into a
	/// path, validating each segment is a plain public-member-style
	/// identifier. Rejects anything resembling a method call (`()`), an
	/// indexer (`[]`), or a captured variable reference, returning
	/// `InvalidPath` for those, the way the original expression-tree compiler
	/// rejects non-member-access nodes.
	pub fn parse(dotted: &str, flavor: PathFlavor) -> TychoResult<Self> {
		let segments: Vec<&str> = dotted.split('.').collect();
		Self::try_new(&segments, flavor)
	}

	pub fn as_str(&self) -> &str {
		&self.path
	}

	pub fn is_numeric(&self) -> bool {
		self.is_numeric
	}

	pub fn is_bool(&self) -> bool {
		self.is_bool
	}

	pub fn is_datetime(&self) -> bool {
		self.is_datetime
	}
}

impl std::fmt::Display for FieldPath {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.path)
	}
}

fn validate_member(seg: &str) -> TychoResult<()> {
	let mut chars = seg.chars();
	let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
	let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
	if seg.is_empty() || !first_ok || !rest_ok {
		return Err(TychoError::InvalidPath(format!(
			"`{seg}` is not a plain member access (method calls, indexers and captured variables are not accessor expressions)"
		)));
	}
	Ok(())
}

/// Builds a [`FieldPath`] from a dotted chain of member-access identifiers.
///
/// ```
/// use tychodb_core::path::{field_path, PathFlavor};
/// let p = field_path!(IntProperty: PathFlavor::Numeric).expect("valid path");
/// assert_eq!(p.as_str(), "$.IntProperty");
/// let p = field_path!(Values.FloatProperty: PathFlavor::Numeric).expect("valid path");
/// assert_eq!(p.as_str(), "$.Values.FloatProperty");
/// ```
#[macro_export]
macro_rules! field_path {
	($($seg:ident).+ : $flavor:expr) => {
		$crate::path::FieldPath::try_new(&[$(stringify!($seg)),+], $flavor)
	};
}

pub use field_path;
