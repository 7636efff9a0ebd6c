//! The decoding engine: reads typed values back out of a [`Value`] tree.
//!
//! Decoding mirrors encoding. A type implements [`Decode`] by asking the
//! [`Decoder`] it receives for a scalar, a keyed container, or an unkeyed
//! container, and reports a shape disagreement as an error rather than a
//! panic, since the tree being read usually comes from outside the program.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

use crate::boxing;
use crate::error::{Error, Result};
use crate::path::Path;
use crate::policy::{ArrayEncoding, BinaryStrategy, DateStrategy, FormatPolicy};
use crate::value::{Map, Value};

mod containers;
mod impls;

pub use containers::{KeyedDecoder, UnkeyedDecoder};

/// A value that can read itself from a [`Decoder`].
pub trait Decode: Sized {
	fn decode(decoder: &Decoder<'_>) -> Result<Self>;
}

/// Decodes a `T` from `value` using `policy`.
pub fn from_value<T: Decode>(value: &Value, policy: &FormatPolicy) -> Result<T> {
	T::decode(&Decoder::new(value, policy, Path::root()))
}

/// The engine instance that a single value decodes itself from.
pub struct Decoder<'a> {
	node: &'a Value,
	policy: &'a FormatPolicy,
	path: Path,
}

impl<'a> Decoder<'a> {
	pub(crate) fn new(node: &'a Value, policy: &'a FormatPolicy, path: Path) -> Self {
		Decoder { node, policy, path }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn policy(&self) -> &'a FormatPolicy {
		self.policy
	}

	/// Returns the node being decoded, as stored in the tree.
	pub fn value(&self) -> &'a Value {
		self.node
	}

	/// Returns true if the node is null, or an empty string that the policy
	/// treats as null.
	pub fn is_nil(&self) -> bool {
		boxing::resolve(self.node, self.policy).is_null()
	}

	/// Returns a keyed container over the node, which must be a mapping.
	pub fn container(&self) -> Result<KeyedDecoder<'a>> {
		match boxing::resolve(self.node, self.policy) {
			Value::Mapping(entries) => Ok(KeyedDecoder::new(entries, self.policy, self.path.clone())),
			node => Err(Error::type_mismatch(self.path.clone(), "mapping", node)),
		}
	}

	/// Returns an unkeyed container over the node, which must be a sequence.
	///
	/// Under [`ArrayEncoding::Indexed`], a mapping whose keys are exactly the
	/// indices `"0"` to `"n-1"` is read as a sequence too.
	pub fn unkeyed_container(&self) -> Result<UnkeyedDecoder<'a>> {
		let elements = match boxing::resolve(self.node, self.policy) {
			Value::Sequence(elements) => elements.iter().collect(),
			Value::Mapping(entries) if self.policy.arrays == ArrayEncoding::Indexed => {
				match indexed_elements(entries) {
					Some(elements) => elements,
					None => {
						return Err(Error::type_mismatch(
							self.path.clone(),
							"sequence",
							self.node,
						))
					}
				}
			}
			node => return Err(Error::type_mismatch(self.path.clone(), "sequence", node)),
		};
		Ok(UnkeyedDecoder::new(elements, self.policy, self.path.clone()))
	}

	/// Succeeds only if the node is null.
	pub fn decode_nil(&self) -> Result<()> {
		if self.is_nil() {
			return Ok(());
		}
		Err(Error::TypeMismatch {
			path: self.path.clone(),
			expected: "null",
			found: self.node.describe(),
		})
	}

	pub fn decode_bool(&self) -> Result<bool> {
		boxing::unbox_bool(self.node, self.policy, &self.path)
	}

	pub fn decode_i64(&self) -> Result<i64> {
		boxing::unbox_integer(self.node, self.policy, &self.path)
	}

	pub fn decode_u64(&self) -> Result<u64> {
		boxing::unbox_integer(self.node, self.policy, &self.path)
	}

	pub fn decode_i128(&self) -> Result<i128> {
		boxing::unbox_integer(self.node, self.policy, &self.path)
	}

	/// Decodes a float, accepting the policy's non-finite float strings.
	pub fn decode_f64(&self) -> Result<f64> {
		boxing::unbox_f64(self.node, self.policy, &self.path)
	}

	pub fn decode_f32(&self) -> Result<f32> {
		boxing::unbox_f32(self.node, self.policy, &self.path)
	}

	pub fn decode_str(&self) -> Result<&'a str> {
		boxing::unbox_str(self.node, self.policy, &self.path)
	}

	pub fn decode_decimal(&self) -> Result<BigDecimal> {
		boxing::unbox_decimal(self.node, self.policy, &self.path)
	}

	/// Decodes a date using the policy's date strategy.
	pub fn decode_date(&self) -> Result<DateTime<Utc>> {
		match &self.policy.date {
			DateStrategy::Deferred | DateStrategy::Iso8601 => {
				boxing::unbox_rfc3339(self.node, self.policy, &self.path)
			}
			DateStrategy::SecondsSinceEpoch => boxing::unbox_seconds(self.node, self.policy, &self.path),
			DateStrategy::MillisecondsSinceEpoch => boxing::unbox_millis(self.node, self.policy, &self.path),
			DateStrategy::Formatted(format) => {
				boxing::unbox_formatted(self.node, format, self.policy, &self.path)
			}
			DateStrategy::Custom { decode, .. } => decode(self),
		}
	}

	/// Decodes a binary blob using the policy's binary strategy.
	pub fn decode_bytes(&self) -> Result<Vec<u8>> {
		match &self.policy.binary {
			BinaryStrategy::Base64 => boxing::unbox_base64(self.node, self.policy, &self.path),
			BinaryStrategy::Deferred => {
				let mut seq = self.unkeyed_container()?;
				let mut bytes = Vec::with_capacity(seq.count());
				while !seq.is_at_end() {
					bytes.push(seq.decode::<u8>()?);
				}
				Ok(bytes)
			}
			BinaryStrategy::Custom { decode, .. } => decode(self),
		}
	}

	/// Decodes this node through `T`'s own decode logic, as though the two
	/// were the same value.
	pub fn decode_value<T: Decode>(&self) -> Result<T> {
		T::decode(self)
	}
}

/// Returns the values of a mapping keyed by `"0"` to `"n-1"`, in index order.
fn indexed_elements(entries: &Map) -> Option<Vec<&Value>> {
	(0..entries.len())
		.map(|index| entries.get(index.to_string().as_str()))
		.collect()
}

#[cfg(test)]
mod tests {
	use chrono::TimeZone;

	use super::*;

	fn indexed() -> FormatPolicy {
		let mut policy = FormatPolicy::url();
		policy.arrays = ArrayEncoding::Indexed;
		policy
	}

	#[test]
	fn indexed_mappings_read_as_sequences() {
		let node: Value = [("1", "b"), ("0", "a")].into_iter().collect();
		let decoded: Vec<String> = from_value(&node, &indexed()).unwrap();
		assert_eq!(decoded, ["a", "b"]);

		let err = from_value::<Vec<String>>(&node, &FormatPolicy::url()).unwrap_err();
		assert!(matches!(err, Error::TypeMismatch { expected: "sequence", .. }));

		let gappy: Value = [("0", "a"), ("2", "c")].into_iter().collect();
		assert!(from_value::<Vec<String>>(&gappy, &indexed()).is_err());
	}

	#[test]
	fn shape_disagreement_is_an_error() {
		let node = Value::Sequence(vec![]);
		let policy = FormatPolicy::json();
		let decoder = Decoder::new(&node, &policy, Path::root());
		assert!(matches!(
			decoder.container(),
			Err(Error::TypeMismatch { expected: "mapping", .. })
		));
		assert!(decoder.decode_nil().is_err());
	}

	#[test]
	fn dates_follow_the_strategy() {
		let date = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap();
		let mut policy = FormatPolicy::json();
		let node = Value::from("2021-03-04T05:06:07Z");
		assert_eq!(from_value::<DateTime<Utc>>(&node, &policy).unwrap(), date);

		policy.date = DateStrategy::SecondsSinceEpoch;
		let node = Value::Integer(1_614_834_367);
		assert_eq!(from_value::<DateTime<Utc>>(&node, &policy).unwrap(), date);

		policy.date = DateStrategy::custom(
			|date, encoder| encoder.encode_i64(date.timestamp() / 86_400),
			|decoder| {
				let days = decoder.decode_i64()?;
				DateTime::from_timestamp(days * 86_400, 0)
					.ok_or_else(|| Error::data_corrupted(decoder.path().clone(), "day out of range"))
			},
		);
		let node = Value::Integer(18_690);
		assert_eq!(
			from_value::<DateTime<Utc>>(&node, &policy).unwrap(),
			Utc.with_ymd_and_hms(2021, 3, 4, 0, 0, 0).unwrap()
		);
	}
}
