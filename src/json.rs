//! The JSON data format.

use std::str;

use tracing::debug;

use crate::decode::{self, Decode};
use crate::encode::{self, Encode};
use crate::error::{Error, Result};
use crate::path::Path;
use crate::policy::{BinaryStrategy, DateStrategy, DecimalStrategy, FormatPolicy, NonFiniteFloatStrategy};
use crate::value::Value;

/// Options for the text written by a [`JsonEncoder`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutputFormatting {
	/// Indent nested values across multiple lines.
	pub pretty: bool,
	/// Write mapping keys in lexicographic order rather than insertion order.
	pub sorted_keys: bool,
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

		pub fn policy(&self) -> &FormatPolicy {
			&self.policy
		}
	};
}

/// Encodes values as JSON.
#[derive(Clone, Debug)]
pub struct JsonEncoder {
	policy: FormatPolicy,
	formatting: OutputFormatting,
}

impl JsonEncoder {
	pub fn new() -> JsonEncoder {
		JsonEncoder::with_policy(FormatPolicy::json())
	}

	pub fn with_policy(policy: FormatPolicy) -> JsonEncoder {
		JsonEncoder {
			policy,
			formatting: OutputFormatting::default(),
		}
	}

	policy_setters!();

	pub fn pretty(mut self, pretty: bool) -> Self {
		self.formatting.pretty = pretty;
		self
	}

	pub fn sorted_keys(mut self, sorted_keys: bool) -> Self {
		self.formatting.sorted_keys = sorted_keys;
		self
	}

	pub fn formatting(&self) -> OutputFormatting {
		self.formatting
	}

	/// Encodes `value` as a tree, sorting its keys if the output formatting
	/// asks for it.
	pub fn encode_value<T: Encode + ?Sized>(&self, value: &T) -> Result<Value> {
		let mut tree = encode::to_value(value, &self.policy)?;
		if self.formatting.sorted_keys {
			tree.sort_keys();
		}
		Ok(tree)
	}

	pub fn encode<T: Encode + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
		let tree = self.encode_value(value)?;
		let result = match self.formatting.pretty {
			true => serde_json::to_vec_pretty(&tree),
			false => serde_json::to_vec(&tree),
		};
		let bytes = result.map_err(|err| Error::invalid_value(Path::root(), err.to_string()))?;
		debug!(bytes = bytes.len(), pretty = self.formatting.pretty, "encoded JSON");
		Ok(bytes)
	}

	pub fn encode_to_string<T: Encode + ?Sized>(&self, value: &T) -> Result<String> {
		let bytes = self.encode(value)?;
		// serde_json only ever writes UTF-8.
		String::from_utf8(bytes).map_err(|err| Error::invalid_value(Path::root(), err.to_string()))
	}
}

impl Default for JsonEncoder {
	fn default() -> Self {
		JsonEncoder::new()
	}
}

/// Decodes values from JSON.
#[derive(Clone, Debug)]
pub struct JsonDecoder {
	policy: FormatPolicy,
}

impl JsonDecoder {
	pub fn new() -> JsonDecoder {
		JsonDecoder::with_policy(FormatPolicy::json())
	}

	pub fn with_policy(policy: FormatPolicy) -> JsonDecoder {
		JsonDecoder { policy }
	}

	policy_setters!();

	pub fn decode_value<T: Decode>(&self, value: &Value) -> Result<T> {
		decode::from_value(value, &self.policy)
	}

	/// Decodes JSON text from a byte slice.
	///
	/// Per RFC 8259, JSON exchanged between systems must be UTF-8, and the
	/// whole input is checked as such before parsing begins.
	pub fn decode<T: Decode>(&self, bytes: &[u8]) -> Result<T> {
		debug!(bytes = bytes.len(), "decoding JSON");
		let text = str::from_utf8(bytes)
			.map_err(|err| Error::data_corrupted_by(Path::root(), "JSON text is not valid UTF-8", err))?;
		self.decode_str(text)
	}

	pub fn decode_str<T: Decode>(&self, text: &str) -> Result<T> {
		let tree: Value = serde_json::from_str(text)
			.map_err(|err| Error::data_corrupted_by(Path::root(), "invalid JSON text", err))?;
		self.decode_value(&tree)
	}
}

impl Default for JsonDecoder {
	fn default() -> Self {
		JsonDecoder::new()
	}
}
