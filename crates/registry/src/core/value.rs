//! Type-erased values and type keys.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifies a Rust type at runtime.
///
/// Equality and hashing only consider the [`TypeId`]; the name is carried for
/// diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
	id: TypeId,
	name: &'static str,
}

impl TypeKey {
	/// Returns the key for `T`.
	pub fn of<T: Any>() -> Self {
		Self {
			id: TypeId::of::<T>(),
			name: std::any::type_name::<T>(),
		}
	}

	pub fn id(&self) -> TypeId {
		self.id
	}

	/// Fully qualified type name, as reported by [`std::any::type_name`].
	pub fn name(&self) -> &'static str {
		self.name
	}
}

impl PartialEq for TypeKey {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

impl fmt::Debug for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TypeKey({})", self.name)
	}
}

impl fmt::Display for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name)
	}
}

/// An owned value whose concrete type is only known at runtime.
///
/// Values handed to [`crate::ConversionRegistry::convert`] and produced by
/// converters travel in this form. The originating type is remembered so
/// errors can name it.
pub struct Value {
	inner: Box<dyn Any + Send + Sync>,
	ty: TypeKey,
}

impl Value {
	pub fn new<T: Any + Send + Sync>(value: T) -> Self {
		Self {
			inner: Box::new(value),
			ty: TypeKey::of::<T>(),
		}
	}

	/// Returns true if the wrapped value is a `T`.
	#[inline]
	pub fn is<T: Any>(&self) -> bool {
		self.inner.is::<T>()
	}

	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.inner.downcast_ref::<T>()
	}

	/// Unwraps the value as a `T`, handing it back untouched on a type mismatch.
	pub fn downcast<T: Any>(self) -> Result<T, Self> {
		let Self { inner, ty } = self;
		match inner.downcast::<T>() {
			Ok(value) => Ok(*value),
			Err(inner) => Err(Self { inner, ty }),
		}
	}

	pub fn type_key(&self) -> TypeKey {
		self.ty
	}

	pub fn type_name(&self) -> &'static str {
		self.ty.name
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Value<{}>", self.ty.name)
	}
}
