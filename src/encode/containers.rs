//! Keyed and unkeyed containers on the encoding side.

use indexmap::IndexMap;
use tracing::trace;

use super::arena::{Arena, Node, NodeId, Slot};
use super::{encode_child, Encode, SuperEncoder};
use crate::error::Result;
use crate::path::{Path, PathComponent};
use crate::policy::FormatPolicy;
use crate::value::Value;

/// Writes the entries of a mapping.
///
/// Encoding a key that already exists replaces its value without moving the
/// key from its original position.
pub struct KeyedEncoder<'a> {
	arena: &'a mut Arena,
	policy: &'a FormatPolicy,
	path: Path,
	node: NodeId,
}

impl<'a> KeyedEncoder<'a> {
	pub(super) fn new(arena: &'a mut Arena, policy: &'a FormatPolicy, path: Path, node: NodeId) -> Self {
		KeyedEncoder {
			arena,
			policy,
			path,
			node,
		}
	}

	/// Returns the path of the mapping itself.
	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn encode<T>(&mut self, key: &str, value: &T) -> Result<()>
	where
		T: Encode + ?Sized,
	{
		let id = encode_child(&mut *self.arena, self.policy, self.path.key(key), value)?;
		self.arena.upsert(self.node, key.to_owned(), id);
		Ok(())
	}

	pub fn encode_nil(&mut self, key: &str) -> Result<()> {
		let id = self.arena.insert(Node::Scalar(Value::Null));
		self.arena.upsert(self.node, key.to_owned(), id);
		Ok(())
	}

	/// Encodes the contents of `value` if present, and otherwise leaves `key`
	/// out of the mapping entirely.
	pub fn encode_if_some<T>(&mut self, key: &str, value: &Option<T>) -> Result<()>
	where
		T: Encode,
	{
		match value {
			Some(value) => self.encode(key, value),
			None => Ok(()),
		}
	}

	/// Stores a new, empty mapping under `key` and returns a container for it.
	pub fn nested_container(&mut self, key: &str) -> KeyedEncoder<'_> {
		let id = self.arena.insert(Node::Mapping(IndexMap::new()));
		self.arena.upsert(self.node, key.to_owned(), id);
		KeyedEncoder::new(&mut *self.arena, self.policy, self.path.key(key), id)
	}

	/// Stores a new, empty sequence under `key` and returns a container for it.
	pub fn nested_unkeyed_container(&mut self, key: &str) -> UnkeyedEncoder<'_> {
		let id = self.arena.insert(Node::Sequence(Vec::new()));
		self.arena.upsert(self.node, key.to_owned(), id);
		UnkeyedEncoder::new(&mut *self.arena, self.policy, self.path.key(key), id)
	}

	/// Reserves the `"super"` key for a base value's representation.
	pub fn super_encoder(&mut self) -> SuperEncoder<'_> {
		self.reserve(PathComponent::SUPER_KEY, PathComponent::Super)
	}

	/// Reserves `key` for a base value's representation.
	pub fn super_encoder_for_key(&mut self, key: &str) -> SuperEncoder<'_> {
		self.reserve(key, PathComponent::Key(key.to_owned()))
	}

	fn reserve(&mut self, key: &str, component: PathComponent) -> SuperEncoder<'_> {
		let placeholder = self.arena.insert(Node::Scalar(Value::Null));
		self.arena.upsert(self.node, key.to_owned(), placeholder);
		trace!(path = %self.path, key, "reserved super encoder slot");
		let slot = Slot::Key {
			owner: self.node,
			key: key.to_owned(),
		};
		SuperEncoder::new(&mut *self.arena, self.policy, self.path.join(component), slot)
	}
}

/// Appends the elements of a sequence.
pub struct UnkeyedEncoder<'a> {
	arena: &'a mut Arena,
	policy: &'a FormatPolicy,
	path: Path,
	node: NodeId,
}

impl<'a> UnkeyedEncoder<'a> {
	pub(super) fn new(arena: &'a mut Arena, policy: &'a FormatPolicy, path: Path, node: NodeId) -> Self {
		UnkeyedEncoder {
			arena,
			policy,
			path,
			node,
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Returns the number of elements encoded so far.
	pub fn count(&self) -> usize {
		self.arena.sequence_len(self.node)
	}

	pub fn encode<T>(&mut self, value: &T) -> Result<()>
	where
		T: Encode + ?Sized,
	{
		let path = self.path.index(self.count());
		let id = encode_child(&mut *self.arena, self.policy, path, value)?;
		self.arena.push_element(self.node, id);
		Ok(())
	}

	pub fn encode_nil(&mut self) -> Result<()> {
		let id = self.arena.insert(Node::Scalar(Value::Null));
		self.arena.push_element(self.node, id);
		Ok(())
	}

	/// Appends a new, empty mapping and returns a container for it.
	pub fn nested_container(&mut self) -> KeyedEncoder<'_> {
		let id = self.arena.insert(Node::Mapping(IndexMap::new()));
		let index = self.arena.push_element(self.node, id);
		KeyedEncoder::new(&mut *self.arena, self.policy, self.path.index(index), id)
	}

	/// Appends a new, empty sequence and returns a container for it.
	pub fn nested_unkeyed_container(&mut self) -> UnkeyedEncoder<'_> {
		let id = self.arena.insert(Node::Sequence(Vec::new()));
		let index = self.arena.push_element(self.node, id);
		UnkeyedEncoder::new(&mut *self.arena, self.policy, self.path.index(index), id)
	}

	/// Reserves the next element for a base value's representation.
	pub fn super_encoder(&mut self) -> SuperEncoder<'_> {
		let placeholder = self.arena.insert(Node::Scalar(Value::Null));
		let index = self.arena.push_element(self.node, placeholder);
		trace!(path = %self.path, index, "reserved super encoder slot");
		let slot = Slot::Index {
			owner: self.node,
			index,
		};
		SuperEncoder::new(&mut *self.arena, self.policy, self.path.index(index), slot)
	}
}

#[cfg(test)]
mod tests {
	use crate::encode::{to_value, Encode, Encoder};
	use crate::error::{Error, Result};
	use crate::path::{Path, PathComponent};
	use crate::policy::FormatPolicy;
	use crate::value::Value;

	struct Base(i64);

	impl Encode for Base {
		fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
			encoder.encode_i64(self.0)
		}
	}

	struct Derived {
		name: &'static str,
		base: Base,
	}

	impl Encode for Derived {
		fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
			let mut container = encoder.container();
			container.encode("name", self.name)?;
			let mut base = container.super_encoder();
			self.base.encode(&mut base)?;
			base.finish();
			container.encode("after", &true)
		}
	}

	#[test]
	fn super_encoder_fills_reserved_key() {
		let value = to_value(
			&Derived {
				name: "d",
				base: Base(7),
			},
			&FormatPolicy::json(),
		)
		.unwrap();
		let expected: Value = [
			("name", Value::from("d")),
			("super", Value::Integer(7)),
			("after", Value::Bool(true)),
		]
		.into_iter()
		.collect();
		assert_eq!(value, expected);
	}

	struct Unfinished;

	impl Encode for Unfinished {
		fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
			let mut seq = encoder.unkeyed_container();
			seq.encode(&1_i64)?;
			let mut base = seq.super_encoder();
			base.encode_i64(2)?;
			drop(base);
			seq.encode(&3_i64)
		}
	}

	#[test]
	fn unfinished_super_encoder_leaves_placeholder() {
		let value = to_value(&Unfinished, &FormatPolicy::json()).unwrap();
		assert_eq!(
			value,
			Value::Sequence(vec![Value::Integer(1), Value::Null, Value::Integer(3)])
		);
	}

	struct FailingBase;

	impl Encode for FailingBase {
		fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
			let mut container = encoder.container();
			container.encode("partial", &1_i64)?;
			container.encode("bad", &f64::NAN)
		}
	}

	struct FailingDerived;

	impl Encode for FailingDerived {
		fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
			let mut container = encoder.container();
			let mut base = container.super_encoder_for_key("base");
			FailingBase.encode(&mut base)?;
			base.finish();
			Ok(())
		}
	}

	#[test]
	fn failing_super_encoder_reports_path() {
		let err = to_value(&FailingDerived, &FormatPolicy::json()).unwrap_err();
		assert!(matches!(err, Error::InvalidValue { .. }));
		assert_eq!(err.path(), &Path::root().key("base").key("bad"));
	}

	struct Nested;

	impl Encode for Nested {
		fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
			let mut root = encoder.container();
			{
				let mut inner = root.nested_container("inner");
				let mut list = inner.nested_unkeyed_container("list");
				list.encode(&"x")?;
				let mut deeper = list.nested_container();
				assert_eq!(
					deeper.path(),
					&Path::root().key("inner").key("list").index(1)
				);
				deeper.encode("y", &2_u8)?;
			}
			let mut base = root.super_encoder();
			assert_eq!(base.path().last(), Some(&PathComponent::Super));
			base.container().encode("z", &3_u8)?;
			base.finish();
			Ok(())
		}
	}

	#[test]
	fn nested_containers_write_in_place() {
		let value = to_value(&Nested, &FormatPolicy::json()).unwrap();
		assert_eq!(
			serde_json::to_string(&value).unwrap(),
			r#"{"inner":{"list":["x",{"y":2}]},"super":{"z":3}}"#
		);
	}
}
