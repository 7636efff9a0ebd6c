//! Keyed and unkeyed containers on the decoding side.

use super::{Decode, Decoder};
use crate::boxing::{self, NULL};
use crate::error::{Error, Result};
use crate::path::{Path, PathComponent};
use crate::policy::FormatPolicy;
use crate::value::{Map, Value};

/// Reads the entries of a mapping by key.
pub struct KeyedDecoder<'a> {
	entries: &'a Map,
	policy: &'a FormatPolicy,
	path: Path,
}

impl<'a> KeyedDecoder<'a> {
	pub(super) fn new(entries: &'a Map, policy: &'a FormatPolicy, path: Path) -> Self {
		KeyedDecoder { entries, policy, path }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Returns the keys of the mapping in their stored order.
	pub fn keys(&self) -> impl Iterator<Item = &'a str> {
		let entries: &'a Map = self.entries;
		entries.keys().map(String::as_str)
	}

	pub fn contains(&self, key: &str) -> bool {
		self.entries.contains_key(key)
	}

	fn child(&self, key: &str) -> Result<Decoder<'a>> {
		let path = self.path.key(key);
		match self.entries.get(key) {
			Some(node) => Ok(Decoder::new(node, self.policy, path)),
			None => Err(Error::KeyNotFound {
				path,
				key: key.to_owned(),
			}),
		}
	}

	pub fn decode<T: Decode>(&self, key: &str) -> Result<T> {
		T::decode(&self.child(key)?)
	}

	/// Returns whether the value for `key` is null.
	pub fn decode_nil(&self, key: &str) -> Result<bool> {
		Ok(self.child(key)?.is_nil())
	}

	/// Decodes the value for `key`, or returns `None` if the key is absent or
	/// its value is null.
	pub fn decode_if_present<T: Decode>(&self, key: &str) -> Result<Option<T>> {
		match self.entries.get(key) {
			Some(node) if !boxing::resolve(node, self.policy).is_null() => {
				T::decode(&Decoder::new(node, self.policy, self.path.key(key))).map(Some)
			}
			_ => Ok(None),
		}
	}

	pub fn nested_container(&self, key: &str) -> Result<KeyedDecoder<'a>> {
		self.child(key)?.container()
	}

	pub fn nested_unkeyed_container(&self, key: &str) -> Result<UnkeyedDecoder<'a>> {
		self.child(key)?.unkeyed_container()
	}

	/// Returns a decoder for the base value stored under `"super"`, which
	/// reads as null if the key is absent.
	pub fn super_decoder(&self) -> Decoder<'a> {
		let node = self.entries.get(PathComponent::SUPER_KEY).unwrap_or(&NULL);
		Decoder::new(node, self.policy, self.path.join(PathComponent::Super))
	}

	/// Returns a decoder for the base value stored under `key`, which reads
	/// as null if the key is absent.
	pub fn super_decoder_for_key(&self, key: &str) -> Decoder<'a> {
		let node = self.entries.get(key).unwrap_or(&NULL);
		Decoder::new(node, self.policy, self.path.key(key))
	}
}

/// Reads the elements of a sequence in order.
///
/// The cursor advances past an element only when it decodes successfully.
pub struct UnkeyedDecoder<'a> {
	elements: Vec<&'a Value>,
	policy: &'a FormatPolicy,
	path: Path,
	index: usize,
}

impl<'a> UnkeyedDecoder<'a> {
	pub(super) fn new(elements: Vec<&'a Value>, policy: &'a FormatPolicy, path: Path) -> Self {
		UnkeyedDecoder {
			elements,
			policy,
			path,
			index: 0,
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn count(&self) -> usize {
		self.elements.len()
	}

	pub fn is_at_end(&self) -> bool {
		self.index >= self.elements.len()
	}

	pub fn current_index(&self) -> usize {
		self.index
	}

	fn current(&self) -> Result<Decoder<'a>> {
		let path = self.path.index(self.index);
		match self.elements.get(self.index) {
			Some(&node) => Ok(Decoder::new(node, self.policy, path)),
			None => Err(Error::UnkeyedOutOfRange {
				path,
				count: self.elements.len(),
			}),
		}
	}

	/// Runs `f` on the current element and advances past it on success.
	fn advance<T>(&mut self, f: impl FnOnce(&Decoder<'a>) -> Result<T>) -> Result<T> {
		let value = f(&self.current()?)?;
		self.index += 1;
		Ok(value)
	}

	pub fn decode<T: Decode>(&mut self) -> Result<T> {
		self.advance(T::decode)
	}

	/// Returns whether the current element is null, advancing past it only
	/// if it is.
	pub fn decode_nil(&mut self) -> Result<bool> {
		let nil = self.current()?.is_nil();
		if nil {
			self.index += 1;
		}
		Ok(nil)
	}

	/// Decodes the current element, or returns `None` if it is null.
	pub fn decode_if_present<T: Decode>(&mut self) -> Result<Option<T>> {
		if self.decode_nil()? {
			return Ok(None);
		}
		self.decode().map(Some)
	}

	pub fn nested_container(&mut self) -> Result<KeyedDecoder<'a>> {
		self.advance(Decoder::container)
	}

	pub fn nested_unkeyed_container(&mut self) -> Result<UnkeyedDecoder<'a>> {
		self.advance(Decoder::unkeyed_container)
	}

	/// Returns a decoder for the current element and advances past it.
	pub fn super_decoder(&mut self) -> Result<Decoder<'a>> {
		let decoder = self.current()?;
		self.index += 1;
		Ok(decoder)
	}
}
