//! Per-format strategies for scalars that a wire format cannot represent
//! natively.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::decode::Decoder;
use crate::encode::Encoder;
use crate::error::Result;

/// Encodes a date through an arbitrary representation.
pub type DateEncodeFn = dyn Fn(&DateTime<Utc>, &mut Encoder<'_>) -> Result<()> + Send + Sync;

/// Decodes a date from the representation written by a [`DateEncodeFn`].
pub type DateDecodeFn = dyn Fn(&Decoder<'_>) -> Result<DateTime<Utc>> + Send + Sync;

/// Encodes a binary blob through an arbitrary representation.
pub type BinaryEncodeFn = dyn Fn(&[u8], &mut Encoder<'_>) -> Result<()> + Send + Sync;

/// Decodes a binary blob from the representation written by a
/// [`BinaryEncodeFn`].
pub type BinaryDecodeFn = dyn Fn(&Decoder<'_>) -> Result<Vec<u8>> + Send + Sync;

/// How dates are represented in the value tree.
#[derive(Clone, Default)]
pub enum DateStrategy {
	/// The date's own textual form: RFC 3339 in UTC with as much sub-second
	/// precision as the date carries.
	#[default]
	Deferred,
	/// A number of seconds since the Unix epoch, with fractional seconds.
	SecondsSinceEpoch,
	/// A number of milliseconds since the Unix epoch, with fractional
	/// milliseconds.
	MillisecondsSinceEpoch,
	/// An RFC 3339 calendar string truncated to whole seconds, such as
	/// `2021-03-04T05:06:07Z`.
	Iso8601,
	/// A calendar string following a [chrono format string][fmt], interpreted
	/// in UTC.
	///
	/// [fmt]: chrono::format::strftime
	Formatted(String),
	/// A pair of functions that encode and decode through the engine.
	Custom {
		encode: Arc<DateEncodeFn>,
		decode: Arc<DateDecodeFn>,
	},
}

impl DateStrategy {
	pub fn custom<E, D>(encode: E, decode: D) -> DateStrategy
	where
		E: Fn(&DateTime<Utc>, &mut Encoder<'_>) -> Result<()> + Send + Sync + 'static,
		D: Fn(&Decoder<'_>) -> Result<DateTime<Utc>> + Send + Sync + 'static,
	{
		DateStrategy::Custom {
			encode: Arc::new(encode),
			decode: Arc::new(decode),
		}
	}
}

impl fmt::Debug for DateStrategy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			DateStrategy::Deferred => f.write_str("Deferred"),
			DateStrategy::SecondsSinceEpoch => f.write_str("SecondsSinceEpoch"),
			DateStrategy::MillisecondsSinceEpoch => f.write_str("MillisecondsSinceEpoch"),
			DateStrategy::Iso8601 => f.write_str("Iso8601"),
			DateStrategy::Formatted(fmt) => f.debug_tuple("Formatted").field(fmt).finish(),
			DateStrategy::Custom { .. } => f.write_str("Custom"),
		}
	}
}

/// How binary blobs are represented in the value tree.
#[derive(Clone)]
pub enum BinaryStrategy {
	/// A sequence of byte-sized integers.
	Deferred,
	/// A standard, padded base64 string.
	Base64,
	/// A pair of functions that encode and decode through the engine.
	Custom {
		encode: Arc<BinaryEncodeFn>,
		decode: Arc<BinaryDecodeFn>,
	},
}

impl BinaryStrategy {
	pub fn custom<E, D>(encode: E, decode: D) -> BinaryStrategy
	where
		E: Fn(&[u8], &mut Encoder<'_>) -> Result<()> + Send + Sync + 'static,
		D: Fn(&Decoder<'_>) -> Result<Vec<u8>> + Send + Sync + 'static,
	{
		BinaryStrategy::Custom {
			encode: Arc::new(encode),
			decode: Arc::new(decode),
		}
	}
}

impl fmt::Debug for BinaryStrategy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			BinaryStrategy::Deferred => f.write_str("Deferred"),
			BinaryStrategy::Base64 => f.write_str("Base64"),
			BinaryStrategy::Custom { .. } => f.write_str("Custom"),
		}
	}
}

/// How arbitrary-precision decimals are represented in the value tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecimalStrategy {
	/// A float when the decimal survives a round trip through `f64`, and its
	/// exact string form otherwise.
	Number,
	/// The decimal's exact string form.
	String,
}

/// What to do with infinite and NaN floats, which neither JSON nor URL queries
/// can represent natively.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum NonFiniteFloatStrategy {
	/// Fail with [`crate::Error::InvalidValue`].
	#[default]
	Throw,
	/// Substitute the given strings, and accept them back when decoding.
	ConvertToString {
		positive_infinity: String,
		negative_infinity: String,
		nan: String,
	},
}

/// The literal strings that stand for booleans in formats without a native
/// boolean.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoolTokens {
	pub true_token: String,
	pub false_token: String,
}

impl Default for BoolTokens {
	fn default() -> Self {
		BoolTokens {
			true_token: "true".to_owned(),
			false_token: "false".to_owned(),
		}
	}
}

/// How sequence elements are named in bracket notation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ArrayEncoding {
	/// Anonymous `name[]` elements. Containers cannot be nested inside these.
	#[default]
	Brackets,
	/// Indexed `name[0]` elements, which decode as mappings with numeric keys.
	Indexed,
}

/// The complete set of scalar conversion choices for one wire format.
///
/// A policy is an immutable record once an encoder or decoder holds it, and is
/// cheap to clone; custom strategies are shared behind [`Arc`]s.
#[derive(Clone, Debug)]
pub struct FormatPolicy {
	pub date: DateStrategy,
	pub binary: BinaryStrategy,
	pub decimal: DecimalStrategy,
	pub non_finite_floats: NonFiniteFloatStrategy,
	/// When set, booleans are written as and read from these strings rather
	/// than native boolean nodes.
	pub bool_tokens: Option<BoolTokens>,
	pub arrays: ArrayEncoding,
	/// Whether numeric types may be decoded by parsing string nodes.
	pub parse_numeric_strings: bool,
	/// Whether an empty string node decodes as null.
	pub empty_string_is_null: bool,
}

impl FormatPolicy {
	/// The policy for JSON value trees.
	pub fn json() -> FormatPolicy {
		FormatPolicy {
			date: DateStrategy::Deferred,
			binary: BinaryStrategy::Base64,
			decimal: DecimalStrategy::Number,
			non_finite_floats: NonFiniteFloatStrategy::Throw,
			bool_tokens: None,
			arrays: ArrayEncoding::Brackets,
			parse_numeric_strings: false,
			empty_string_is_null: false,
		}
	}

	/// The policy for bracket-notation URL queries, where every scalar is
	/// ultimately a string.
	pub fn url() -> FormatPolicy {
		FormatPolicy {
			date: DateStrategy::Deferred,
			binary: BinaryStrategy::Base64,
			decimal: DecimalStrategy::String,
			non_finite_floats: NonFiniteFloatStrategy::Throw,
			bool_tokens: Some(BoolTokens::default()),
			arrays: ArrayEncoding::Brackets,
			parse_numeric_strings: true,
			empty_string_is_null: true,
		}
	}
}

impl Default for FormatPolicy {
	fn default() -> Self {
		FormatPolicy::json()
	}
}
