//! Type Registry (spec §4.2, C2).
//!
//! Rust has no runtime reflection over arbitrary user types, so
//! `register_by_convention` cannot scan a type's members the way the
//! original CLR-based design does. The contract spec §4.2 gives for that
//! case — registration still succeeds, but a later call that needs the
//! selector fails fast with `MissingIdSelector` — is implemented literally:
//! `register_by_convention` always resolves to "no selector found". This
//! decision is recorded in `DESIGN.md`.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, RwLock};

use crate::error::{TychoError, TychoResult};
use crate::path::{FieldPath, PathFlavor};

/// The id value extracted from a document by its registered (or per-call) selector.
#[derive(Debug, Clone, PartialEq)]
pub enum IdValue {
	Str(Box<str>),
	Int(i64),
}

impl IdValue {
	pub fn as_storage_string(&self) -> String {
		match self {
			Self::Str(s) => s.to_string(),
			Self::Int(i) => i.to_string(),
		}
	}
}

type SelectorAny = Arc<dyn Any + Send + Sync>;
type ComparerAny = Arc<dyn Any + Send + Sync>;

/// Erases a typed selector closure behind `Any`. Stores the fat
/// `Arc<dyn Fn(&T) -> IdValue + Send + Sync>` itself as the `Any` payload (one
/// more indirection than erasing `F` directly) so `downcast_ref` on the
/// trait-object type later succeeds.
fn erase_selector<T, F>(selector: F) -> SelectorAny
where
	T: 'static,
	F: Fn(&T) -> IdValue + Send + Sync + 'static,
{
	let typed: Arc<dyn Fn(&T) -> IdValue + Send + Sync> = Arc::new(selector);
	Arc::new(typed)
}

fn erase_comparer<C>(comparer: C) -> ComparerAny
where
	C: Fn(&IdValue, &IdValue) -> bool + Send + Sync + 'static,
{
	let typed: Arc<dyn Fn(&IdValue, &IdValue) -> bool + Send + Sync> = Arc::new(comparer);
	Arc::new(typed)
}

struct TypeRecord {
	full_type_name: Box<str>,
	id_path: Option<FieldPath>,
	is_numeric: bool,
	selector: Option<SelectorAny>,
	comparer: Option<ComparerAny>,
}

/// Append-only registry of per-type id metadata (spec §5: "the type registry
/// is append-only after construction and read-only during operations").
#[derive(Default)]
pub struct TypeRegistry {
	records: RwLock<HashMap<TypeId, TypeRecord>>,
}

impl TypeRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// `register<T>(id_selector, id_comparer?)`: stores a compiled id-path
	/// plus a typed selector/comparer pair.
	pub fn register<T, F, C>(&self, id_path: FieldPath, selector: F, comparer: Option<C>)
	where
		T: 'static,
		F: Fn(&T) -> IdValue + Send + Sync + 'static,
		C: Fn(&IdValue, &IdValue) -> bool + Send + Sync + 'static,
	{
		let is_numeric = id_path.is_numeric();
		let record = TypeRecord {
			full_type_name: full_type_name::<T>(),
			id_path: Some(id_path),
			is_numeric,
			selector: Some(erase_selector::<T, F>(selector)),
			comparer: comparer.map(erase_comparer::<C>),
		};
		self.records.write().unwrap_or_else(|e| e.into_inner()).insert(TypeId::of::<T>(), record);
	}

	/// `register_by_convention<T>()`: always registers with no selector (see
	/// module docs). Callers that never need `id_for`/`compare_ids` (e.g. only
	/// ever pass an explicit key at the call site) are unaffected.
	pub fn register_by_convention<T: 'static>(&self) {
		let record = TypeRecord {
			full_type_name: full_type_name::<T>(),
			id_path: None,
			is_numeric: false,
			selector: None,
			comparer: None,
		};
		self.records.write().unwrap_or_else(|e| e.into_inner()).insert(TypeId::of::<T>(), record);
	}

	/// `register_with_custom_key_selector<T>(selector, comparer?)`: like
	/// `register`, but without an accessor expression — the registry stores a
	/// synthetic, non-numeric path.
	pub fn register_with_custom_key_selector<T, F, C>(&self, selector: F, comparer: Option<C>)
	where
		T: 'static,
		F: Fn(&T) -> IdValue + Send + Sync + 'static,
		C: Fn(&IdValue, &IdValue) -> bool + Send + Sync + 'static,
	{
		let synthetic = FieldPath::try_new(&["__key__"], PathFlavor::Plain)
			.unwrap_or_else(|e| unreachable!("synthetic path is always valid: {e}"));
		let record = TypeRecord {
			full_type_name: full_type_name::<T>(),
			id_path: Some(synthetic),
			is_numeric: false,
			selector: Some(erase_selector::<T, F>(selector)),
			comparer: comparer.map(erase_comparer::<C>),
		};
		self.records.write().unwrap_or_else(|e| e.into_inner()).insert(TypeId::of::<T>(), record);
	}

	/// Whether `T` has been registered at all (by any of the three paths above).
	pub fn is_registered<T: 'static>(&self) -> bool {
		self.records.read().unwrap_or_else(|e| e.into_inner()).contains_key(&TypeId::of::<T>())
	}

	pub fn id_path<T: 'static>(&self) -> Option<FieldPath> {
		self.records.read().unwrap_or_else(|e| e.into_inner()).get(&TypeId::of::<T>()).and_then(|r| r.id_path.clone())
	}

	/// Whether `T`'s registered id path is numeric, used by the Index Manager
	/// when a caller asks it to index the id path itself.
	pub fn id_is_numeric<T: 'static>(&self) -> Option<bool> {
		self.records.read().unwrap_or_else(|e| e.into_inner()).get(&TypeId::of::<T>()).map(|r| r.is_numeric)
	}

	/// `id_for(value)`: invokes the stored selector.
	pub fn id_for<T: 'static>(&self, value: &T) -> TychoResult<IdValue> {
		let records = self.records.read().unwrap_or_else(|e| e.into_inner());
		let record = records
			.get(&TypeId::of::<T>())
			.ok_or_else(|| TychoError::NotRegistered(full_type_name::<T>().to_string()))?;
		let selector = record
			.selector
			.as_ref()
			.ok_or_else(|| TychoError::MissingIdSelector(record.full_type_name.to_string()))?;
		let selector = selector
			.downcast_ref::<Arc<dyn Fn(&T) -> IdValue + Send + Sync>>()
			.unwrap_or_else(|| unreachable!("selector stored under TypeId::of::<T>() always downcasts to T's closure type"));
		Ok(selector(value))
	}

	/// `compare_ids(a, b)`: uses the registered comparer, defaulting to value equality.
	pub fn compare_ids<T: 'static>(&self, a: &IdValue, b: &IdValue) -> bool {
		let records = self.records.read().unwrap_or_else(|e| e.into_inner());
		let comparer = records.get(&TypeId::of::<T>()).and_then(|r| r.comparer.as_ref());
		match comparer {
			Some(comparer) => {
				let comparer = comparer
					.downcast_ref::<Arc<dyn Fn(&IdValue, &IdValue) -> bool + Send + Sync>>()
					.unwrap_or_else(|| unreachable!("comparer stored under TypeId::of::<T>() always downcasts to T's closure type"));
				comparer(a, b)
			}
			None => a == b,
		}
	}

	/// Resolves `T`'s `FullTypeName` for storage, honoring
	/// `require_type_registration`: when strict mode is on and `T` has never
	/// been registered, fails with `NotRegistered` (spec §4.2).
	pub fn resolve_full_type_name<T: 'static>(&self, require_registration: bool) -> TychoResult<Box<str>> {
		if self.is_registered::<T>() {
			return Ok(full_type_name::<T>());
		}
		if require_registration {
			return Err(TychoError::NotRegistered(full_type_name::<T>().to_string()));
		}
		Ok(full_type_name::<T>())
	}
}

/// `T`'s fully-qualified name, used verbatim as the `FullTypeName` discriminator.
pub fn full_type_name<T: 'static>() -> Box<str> {
	std::any::type_name::<T>().into()
}

/// `safe_name<T>()`: a cached, generics-free textual form of `T`'s name
/// (module paths dropped, `<`/`>`/`,` turned into `_`), suitable for use
/// inside a SQL identifier, e.g. as the `<safe-T>` suffix of an index name.
pub fn safe_name<T: 'static>() -> Box<str> {
	static CACHE: OnceLock<Mutex<HashMap<TypeId, Box<str>>>> = OnceLock::new();
	let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));
	let mut cache = cache.lock().unwrap_or_else(|e| e.into_inner());
	cache
		.entry(TypeId::of::<T>())
		.or_insert_with(|| safe_name_from_type_name(std::any::type_name::<T>()).into())
		.clone()
}

/// Turns a Rust `type_name` such as `alloc::vec::Vec<my_crate::User>` into a
/// generics-free, identifier-safe form such as `Vec_User_`: module-path
/// segments are dropped (kept only up to the last `::`), and `<`, `>`, `,`
/// become `_`.
fn safe_name_from_type_name(name: &str) -> String {
	let mut out = String::new();
	let mut ident = String::new();
	let mut chars = name.chars().peekable();
	while let Some(c) = chars.next() {
		match c {
			':' => {
				if chars.peek() == Some(&':') {
					chars.next();
				}
				ident.clear();
			}
			'<' | '>' | ',' => {
				out.push_str(&ident);
				ident.clear();
				out.push('_');
			}
			' ' => {}
			_ => ident.push(c),
		}
	}
	out.push_str(&ident);
	out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
	use super::*;

	struct TestClassA {
		string_property: Box<str>,
	}

	#[test]
	fn register_and_id_for_roundtrip() {
		let registry = TypeRegistry::new();
		let id_path = FieldPath::try_new(&["StringProperty"], PathFlavor::Plain).unwrap();
		registry.register::<TestClassA, _, fn(&IdValue, &IdValue) -> bool>(
			id_path,
			|v: &TestClassA| IdValue::Str(v.string_property.clone()),
			None,
		);

		let value = TestClassA { string_property: "Test String".into() };
		let id = registry.id_for(&value).unwrap();
		assert_eq!(id, IdValue::Str("Test String".into()));
	}

	#[test]
	fn register_by_convention_fails_fast_on_id_for() {
		struct Unresolvable;
		let registry = TypeRegistry::new();
		registry.register_by_convention::<Unresolvable>();
		assert!(registry.is_registered::<Unresolvable>());
		let err = registry.id_for(&Unresolvable).unwrap_err();
		assert!(matches!(err, TychoError::MissingIdSelector(_)));
	}

	#[test]
	fn unregistered_type_is_not_registered_error() {
		struct NeverRegistered;
		let registry = TypeRegistry::new();
		let err = registry.id_for(&NeverRegistered).unwrap_err();
		assert!(matches!(err, TychoError::NotRegistered(_)));
	}

	#[test]
	fn resolve_full_type_name_strict_mode() {
		struct Unregistered;
		let registry = TypeRegistry::new();
		assert!(registry.resolve_full_type_name::<Unregistered>(false).is_ok());
		assert!(matches!(
			registry.resolve_full_type_name::<Unregistered>(true),
			Err(TychoError::NotRegistered(_))
		));
	}

	#[test]
	fn safe_name_strips_generics_and_module_path() {
		assert_eq!(&*safe_name::<TestClassA>(), "TestClassA");
		assert_eq!(&*safe_name::<Vec<TestClassA>>(), "Vec_TestClassA_");
	}

	#[test]
	fn custom_comparer_overrides_default_equality() {
		let registry = TypeRegistry::new();
		let id_path = FieldPath::try_new(&["StringProperty"], PathFlavor::Plain).unwrap();
		registry.register::<TestClassA, _, _>(
			id_path,
			|v: &TestClassA| IdValue::Str(v.string_property.clone()),
			Some(|_a: &IdValue, _b: &IdValue| true),
		);
		let a = IdValue::Str("x".into());
		let b = IdValue::Str("y".into());
		assert!(registry.compare_ids::<TestClassA>(&a, &b));
	}
}
