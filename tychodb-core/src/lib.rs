//! Storage-agnostic types for TychoDB: errors, the path compiler, the type
//! registry, the Codec collaborator interface, and the Filter/Sort node
//! model. See `tychodb` for the SQLite-backed engine built on top of these.

pub mod codec;
pub mod error;
pub mod filter;
pub mod key;
pub mod path;
pub mod registry;
pub mod sort;

pub mod prelude {
	pub use crate::codec::{Codec, JsonCodec};
	pub use crate::error::{TychoError, TychoResult};
	pub use crate::filter::{Comparator, Connective, Filter, FilterNode, FilterValue};
	pub use crate::key::{Key, Partition};
	pub use crate::path::{field_path, FieldPath, PathFlavor};
	pub use crate::registry::{full_type_name, safe_name, IdValue, TypeRegistry};
	pub use crate::sort::{Direction, Sort, SortTerm};
}
