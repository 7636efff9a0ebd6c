//! The encoding engine: converts typed values into a [`Value`] tree.
//!
//! A type takes part in encoding by implementing [`Encode`], writing itself
//! to the [`Encoder`] it receives in one of three shapes:
//!
//! - **Single**: one of the `encode_*` scalar methods, or
//!   [`Encoder::encode_value`] to delegate to another type.
//! - **Keyed**: the mapping returned by [`Encoder::container`].
//! - **Unkeyed**: the sequence returned by [`Encoder::unkeyed_container`].
//!
//! Containers encode their children through fresh engine instances, so a type
//! never needs to know how deeply it is nested. A type that builds on another
//! type's representation can also hand a [`SuperEncoder`] to that type's
//! `encode` implementation, without either side knowing the container shape
//! chosen by the other.
//!
//! # Panics
//!
//! Each engine instance produces exactly one node. Encoding a second scalar
//! into the same [`Encoder`], requesting containers of two different shapes
//! from it, or returning from `encode` without producing anything, indicates
//! a broken `Encode` implementation rather than bad input, and panics.

use std::ops::{Deref, DerefMut};

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::trace;

use crate::boxing;
use crate::error::Result;
use crate::path::Path;
use crate::policy::{BinaryStrategy, DateStrategy, FormatPolicy};
use crate::value::Value;

mod arena;
mod containers;
mod impls;

use arena::{Arena, Node, NodeId, Shape, Slot};

pub use containers::{KeyedEncoder, UnkeyedEncoder};

/// A value that can write itself to an [`Encoder`].
pub trait Encode {
	fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()>;
}

/// Encodes `value` into a [`Value`] tree using `policy`.
pub fn to_value<T>(value: &T, policy: &FormatPolicy) -> Result<Value>
where
	T: Encode + ?Sized,
{
	let mut arena = Arena::new();
	let root = encode_child(&mut arena, policy, Path::root(), value)?;
	Ok(arena.into_value(root))
}

/// Runs `value`'s encode logic in a fresh engine instance at `path`, returning
/// the one node that it produced.
fn encode_child<T>(arena: &mut Arena, policy: &FormatPolicy, path: Path, value: &T) -> Result<NodeId>
where
	T: Encode + ?Sized,
{
	let mut child = Encoder::new(arena, policy, path, None);
	value.encode(&mut child)?;
	match child.produced {
		Some(id) => Ok(id),
		None => panic!("value at {} did not encode any values", child.path),
	}
}

/// The engine instance that a single value encodes itself through.
pub struct Encoder<'a> {
	arena: &'a mut Arena,
	policy: &'a FormatPolicy,
	path: Path,
	produced: Option<NodeId>,
	slot: Option<Slot>,
}

impl<'a> Encoder<'a> {
	fn new(arena: &'a mut Arena, policy: &'a FormatPolicy, path: Path, slot: Option<Slot>) -> Self {
		Encoder {
			arena,
			policy,
			path,
			produced: None,
			slot,
		}
	}

	/// Returns the path of the value being encoded.
	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn policy(&self) -> &FormatPolicy {
		self.policy
	}

	/// Returns a keyed container that encodes this value as a mapping.
	///
	/// Requesting a keyed container again returns a container for the same
	/// mapping.
	pub fn container(&mut self) -> KeyedEncoder<'_> {
		let node = self.request(Shape::Keyed);
		KeyedEncoder::new(&mut *self.arena, self.policy, self.path.clone(), node)
	}

	/// Returns an unkeyed container that encodes this value as a sequence.
	///
	/// Requesting an unkeyed container again returns a container for the same
	/// sequence, which continues appending after any existing elements.
	pub fn unkeyed_container(&mut self) -> UnkeyedEncoder<'_> {
		let node = self.request(Shape::Unkeyed);
		UnkeyedEncoder::new(&mut *self.arena, self.policy, self.path.clone(), node)
	}

	/// Returns the container node that this instance produces in the
	/// requested shape, creating it on first use.
	fn request(&mut self, shape: Shape) -> NodeId {
		if let Some(id) = self.produced {
			if self.arena.shape(id) == shape {
				return id;
			}
		}
		self.assert_vacant(shape);
		let id = self.arena.insert(match shape {
			Shape::Unkeyed => Node::Sequence(Vec::new()),
			Shape::Keyed => Node::Mapping(IndexMap::new()),
			Shape::Single => unreachable!("scalars are stored, not requested"),
		});
		self.produced = Some(id);
		id
	}

	fn assert_vacant(&self, shape: Shape) {
		if let Some(id) = self.produced {
			panic!(
				"cannot encode a {shape:?} value at {} after encoding a {:?} value there",
				self.path,
				self.arena.shape(id),
			);
		}
	}

	fn store(&mut self, value: Value) {
		self.assert_vacant(Shape::Single);
		self.produced = Some(self.arena.insert(Node::Scalar(value)));
	}

	pub fn encode_nil(&mut self) -> Result<()> {
		self.store(Value::Null);
		Ok(())
	}

	pub fn encode_bool(&mut self, b: bool) -> Result<()> {
		self.store(boxing::box_bool(b, self.policy));
		Ok(())
	}

	pub fn encode_i64(&mut self, n: i64) -> Result<()> {
		self.encode_i128(i128::from(n))
	}

	pub fn encode_u64(&mut self, n: u64) -> Result<()> {
		self.encode_i128(i128::from(n))
	}

	pub fn encode_i128(&mut self, n: i128) -> Result<()> {
		self.store(Value::Integer(n));
		Ok(())
	}

	/// Encodes a float, applying the policy's non-finite float strategy.
	pub fn encode_f64(&mut self, f: f64) -> Result<()> {
		let value = boxing::box_f64(f, self.policy, &self.path)?;
		self.store(value);
		Ok(())
	}

	pub fn encode_str(&mut self, s: &str) -> Result<()> {
		self.store(Value::String(s.to_owned()));
		Ok(())
	}

	pub fn encode_decimal(&mut self, d: &BigDecimal) -> Result<()> {
		self.store(boxing::box_decimal(d, self.policy));
		Ok(())
	}

	/// Encodes a date using the policy's date strategy.
	pub fn encode_date(&mut self, date: &DateTime<Utc>) -> Result<()> {
		let policy = self.policy;
		let value = match &policy.date {
			DateStrategy::Deferred => boxing::date_to_rfc3339(date, true),
			DateStrategy::Iso8601 => boxing::date_to_rfc3339(date, false),
			DateStrategy::SecondsSinceEpoch => boxing::date_to_seconds(date),
			DateStrategy::MillisecondsSinceEpoch => boxing::date_to_millis(date),
			DateStrategy::Formatted(format) => boxing::date_to_formatted(date, format, &self.path)?,
			DateStrategy::Custom { encode, .. } => return encode(date, self),
		};
		self.store(value);
		Ok(())
	}

	/// Encodes a binary blob using the policy's binary strategy.
	pub fn encode_bytes(&mut self, bytes: &[u8]) -> Result<()> {
		let policy = self.policy;
		match &policy.binary {
			BinaryStrategy::Base64 => {
				self.store(boxing::box_base64(bytes));
				Ok(())
			}
			BinaryStrategy::Deferred => {
				let mut seq = self.unkeyed_container();
				for byte in bytes {
					seq.encode(byte)?;
				}
				Ok(())
			}
			BinaryStrategy::Custom { encode, .. } => encode(bytes, self),
		}
	}

	/// Encodes this value through `value`'s own encode logic, as though the two
	/// were the same value.
	pub fn encode_value<T>(&mut self, value: &T) -> Result<()>
	where
		T: Encode + ?Sized,
	{
		self.assert_vacant(Shape::Single);
		let id = encode_child(&mut *self.arena, self.policy, self.path.clone(), value)?;
		self.produced = Some(id);
		Ok(())
	}
}

/// An [`Encoder`] bound to a slot reserved in its parent container.
///
/// A super encoder commits its node to the reserved slot only when
/// [`finish`](SuperEncoder::finish) is called. Until then, the slot holds a
/// null placeholder. If the delegated encode logic fails and the error is
/// propagated, `finish` is never reached and the placeholder remains.
#[must_use = "a super encoder commits nothing until `finish` is called"]
pub struct SuperEncoder<'a> {
	encoder: Encoder<'a>,
}

impl<'a> SuperEncoder<'a> {
	fn new(arena: &'a mut Arena, policy: &'a FormatPolicy, path: Path, slot: Slot) -> Self {
		SuperEncoder {
			encoder: Encoder::new(arena, policy, path, Some(slot)),
		}
	}

	/// Replaces the reserved placeholder with the node produced through this
	/// encoder, if any.
	pub fn finish(self) {
		let Encoder {
			arena,
			path,
			produced,
			slot,
			..
		} = self.encoder;
		match (produced, slot) {
			(Some(id), Some(slot)) => {
				trace!(%path, "committing super encoder");
				arena.fill(&slot, id);
			}
			_ => trace!(%path, "super encoder produced nothing; leaving placeholder"),
		}
	}
}

impl<'a> Deref for SuperEncoder<'a> {
	type Target = Encoder<'a>;

	fn deref(&self) -> &Encoder<'a> {
		&self.encoder
	}
}

impl<'a> DerefMut for SuperEncoder<'a> {
	fn deref_mut(&mut self) -> &mut Encoder<'a> {
		&mut self.encoder
	}
}
