//! The bracket-notation URL query format.
//!
//! A query is a flat list of [`QueryItem`]s whose names encode the nesting of
//! a value tree, like `user[addresses][][city]=Metropolis`. Every scalar in a
//! query is a string, so the URL [`FormatPolicy`] writes booleans as tokens,
//! parses numbers back out of strings, and reads empty values as absent.

use tracing::debug;

use crate::decode::{self, Decode};
use crate::encode::{self, Encode};
use crate::error::Result;
use crate::policy::{
	ArrayEncoding, BinaryStrategy, BoolTokens, DateStrategy, DecimalStrategy, FormatPolicy,
	NonFiniteFloatStrategy,
};
use crate::value::Value;

pub mod brackets;
pub mod charset;
pub mod query;

pub use charset::TextEncoding;

/// A single `name=value` pair of a query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryItem {
	pub name: String,
	/// The value, or `None` for a bare `name` with no `=`.
	pub value: Option<String>,
}

impl QueryItem {
	pub fn new<N, V>(name: N, value: Option<V>) -> QueryItem
	where
		N: Into<String>,
		V: Into<String>,
	{
		QueryItem {
			name: name.into(),
			value: value.map(Into::into),
		}
	}
}

macro_rules! policy_setters {
	() => {
		pub fn date_strategy(mut self, strategy: DateStrategy) -> Self {
			self.policy.date = strategy;
			self
		}

		pub fn binary_strategy(mut self, strategy: BinaryStrategy) -> Self {
			self.policy.binary = strategy;
			self
		}

		pub fn non_finite_float_strategy(mut self, strategy: NonFiniteFloatStrategy) -> Self {
			self.policy.non_finite_floats = strategy;
			self
		}

		pub fn decimal_strategy(mut self, strategy: DecimalStrategy) -> Self {
			self.policy.decimal = strategy;
			self
		}

		pub fn array_encoding(mut self, arrays: ArrayEncoding) -> Self {
			self.policy.arrays = arrays;
			self
		}

		pub fn bool_tokens(mut self, tokens: BoolTokens) -> Self {
			self.policy.bool_tokens = Some(tokens);
			self
		}

		pub fn text_encoding(mut self, encoding: TextEncoding) -> Self {
			self.text_encoding = encoding;
			self
		}

		pub fn policy(&self) -> &FormatPolicy {
			&self.policy
		}
	};
}

/// Encodes values as URL queries.
#[derive(Clone, Debug)]
pub struct UrlEncoder {
	policy: FormatPolicy,
	text_encoding: TextEncoding,
}

impl UrlEncoder {
	pub fn new() -> UrlEncoder {
		UrlEncoder::with_policy(FormatPolicy::url())
	}

	pub fn with_policy(policy: FormatPolicy) -> UrlEncoder {
		UrlEncoder {
			policy,
			text_encoding: TextEncoding::default(),
		}
	}

	policy_setters!();

	pub fn encode_value<T: Encode + ?Sized>(&self, value: &T) -> Result<Value> {
		encode::to_value(value, &self.policy)
	}

	pub fn encode_items<T: Encode + ?Sized>(&self, value: &T) -> Result<Vec<QueryItem>> {
		let items = brackets::serialize(&self.encode_value(value)?, self.policy.arrays)?;
		debug!(items = items.len(), "encoded query items");
		Ok(items)
	}

	pub fn encode_query_string<T: Encode + ?Sized>(&self, value: &T) -> Result<String> {
		Ok(query::to_query_string(&self.encode_items(value)?))
	}

	pub fn encode<T: Encode + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
		let bytes = charset::encode(&self.encode_query_string(value)?, self.text_encoding);
		debug!(bytes = bytes.len(), encoding = ?self.text_encoding, "encoded query");
		Ok(bytes)
	}
}

impl Default for UrlEncoder {
	fn default() -> Self {
		UrlEncoder::new()
	}
}

/// Decodes values from URL queries.
#[derive(Clone, Debug)]
pub struct UrlDecoder {
	policy: FormatPolicy,
	text_encoding: TextEncoding,
}

impl UrlDecoder {
	pub fn new() -> UrlDecoder {
		UrlDecoder::with_policy(FormatPolicy::url())
	}

	pub fn with_policy(policy: FormatPolicy) -> UrlDecoder {
		UrlDecoder {
			policy,
			text_encoding: TextEncoding::default(),
		}
	}

	policy_setters!();

	pub fn decode_value<T: Decode>(&self, value: &Value) -> Result<T> {
		decode::from_value(value, &self.policy)
	}

	pub fn decode_items<T: Decode>(&self, items: &[QueryItem]) -> Result<T> {
		debug!(items = items.len(), "decoding query items");
		self.decode_value(&brackets::deserialize(items)?)
	}

	pub fn decode_query_string<T: Decode>(&self, text: &str) -> Result<T> {
		self.decode_items(&query::parse_query_string(text)?)
	}

	pub fn decode<T: Decode>(&self, bytes: &[u8]) -> Result<T> {
		debug!(bytes = bytes.len(), encoding = ?self.text_encoding, "decoding query");
		self.decode_query_string(&charset::decode(bytes, self.text_encoding)?)
	}
}

impl Default for UrlDecoder {
	fn default() -> Self {
		UrlDecoder::new()
	}
}
