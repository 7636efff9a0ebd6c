//! The format-agnostic value tree shared by every wire format.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// The ordered mapping type of [`Value::Mapping`].
pub type Map = IndexMap<String, Value>;

/// An encoded value, independent of any particular wire format.
///
/// Every encoder produces a `Value`, and every decoder consumes one. JSON can
/// represent any `Value` directly, while URL queries require a top-level
/// mapping and impose restrictions on nesting (see [`crate::url`]).
///
/// Mappings preserve the insertion order of their keys, and replacing the value
/// of an existing key keeps that key at its original position. Bracket-notation
/// queries depend on this ordering; for JSON the ordering is incidental, but is
/// preserved anyway so that both formats behave the same way.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
	#[default]
	Null,
	Bool(bool),
	Integer(i128),
	Float(f64),
	String(String),
	Sequence(Vec<Value>),
	Mapping(Map),
}

impl Value {
	/// Returns a short name for the kind of this value, for use in error
	/// messages.
	pub fn kind(&self) -> &'static str {
		match self {
			Value::Null => "null",
			Value::Bool(_) => "bool",
			Value::Integer(_) => "integer",
			Value::Float(_) => "float",
			Value::String(_) => "string",
			Value::Sequence(_) => "sequence",
			Value::Mapping(_) => "mapping",
		}
	}

	/// Describes this value for an error message, including the value itself
	/// for scalars.
	pub(crate) fn describe(&self) -> String {
		match self {
			Value::Null => "null".to_owned(),
			Value::Bool(b) => format!("bool {b}"),
			Value::Integer(n) => format!("integer {n}"),
			Value::Float(f) => format!("float {f}"),
			Value::String(s) => format!("string {s:?}"),
			Value::Sequence(v) => format!("sequence of {} elements", v.len()),
			Value::Mapping(m) => format!("mapping of {} entries", m.len()),
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_sequence(&self) -> Option<&[Value]> {
		match self {
			Value::Sequence(v) => Some(v),
			_ => None,
		}
	}

	pub fn as_mapping(&self) -> Option<&Map> {
		match self {
			Value::Mapping(m) => Some(m),
			_ => None,
		}
	}

	/// Looks up `key` if this value is a mapping.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.as_mapping().and_then(|m| m.get(key))
	}

	/// Recursively sorts the keys of every mapping in this value.
	pub fn sort_keys(&mut self) {
		match self {
			Value::Sequence(v) => v.iter_mut().for_each(Value::sort_keys),
			Value::Mapping(m) => {
				m.sort_keys();
				m.values_mut().for_each(Value::sort_keys);
			}
			_ => {}
		}
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Value::Bool(b)
	}
}

impl From<i64> for Value {
	fn from(n: i64) -> Self {
		Value::Integer(i128::from(n))
	}
}

impl From<u64> for Value {
	fn from(n: u64) -> Self {
		Value::Integer(i128::from(n))
	}
}

impl From<f64> for Value {
	fn from(f: f64) -> Self {
		Value::Float(f)
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Value::String(s.to_owned())
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Value::String(s)
	}
}

impl From<Vec<Value>> for Value {
	fn from(v: Vec<Value>) -> Self {
		Value::Sequence(v)
	}
}

impl From<Map> for Value {
	fn from(m: Map) -> Self {
		Value::Mapping(m)
	}
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Value::Mapping(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}

impl Serialize for Value {
	fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match self {
			Value::Null => s.serialize_unit(),
			Value::Bool(b) => s.serialize_bool(*b),
			Value::Integer(n) => {
				// Formats without 128-bit support can still take anything that
				// originally came from a 64-bit integer.
				if let Ok(n) = i64::try_from(*n) {
					s.serialize_i64(n)
				} else if let Ok(n) = u64::try_from(*n) {
					s.serialize_u64(n)
				} else {
					s.serialize_i128(*n)
				}
			}
			Value::Float(f) => s.serialize_f64(*f),
			Value::String(v) => s.serialize_str(v),
			Value::Sequence(v) => v.serialize(s),
			Value::Mapping(m) => {
				let mut s = s.serialize_map(Some(m.len()))?;
				for (k, v) in m {
					s.serialize_entry(k, v)?;
				}
				s.end()
			}
		}
	}
}

/// Implements [`de::Visitor`] methods that simply shove values into [`Value`]s.
///
/// This macro is non-hygienic, and not intended for use outside of this module.
macro_rules! treecodec_impl_value_visitors {
	($($name:ident($($arg:ident: $ty:ty)?) => $result:expr;)*) => {
		$(fn $name<E: de::Error>(self, $($arg: $ty)?) -> Result<Self::Value, E> {
			Ok($result)
		})*
	};
}

impl<'de> Deserialize<'de> for Value {
	fn deserialize<D>(d: D) -> Result<Value, D::Error>
	where
		D: Deserializer<'de>,
	{
		struct Visitor;

		impl<'de> de::Visitor<'de> for Visitor {
			type Value = Value;

			fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
				f.write_str("any supported value")
			}

			treecodec_impl_value_visitors! {
				visit_unit() => Value::Null;
				visit_none() => Value::Null;

				visit_bool(v: bool) => Value::Bool(v);

				visit_i64(v: i64) => Value::Integer(i128::from(v));
				visit_i128(v: i128) => Value::Integer(v);
				visit_u64(v: u64) => Value::Integer(i128::from(v));

				visit_f64(v: f64) => Value::Float(v);

				visit_str(v: &str) => Value::String(v.to_owned());
				visit_string(v: String) => Value::String(v);
			}

			fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
				Value::deserialize(d)
			}

			fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
				let mut vec = Vec::with_capacity(seq.size_hint().unwrap_or(0));
				while let Some(e) = seq.next_element()? {
					vec.push(e);
				}
				Ok(Value::Sequence(vec))
			}

			fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
				let mut m = Map::with_capacity(map.size_hint().unwrap_or(0));
				while let Some((k, v)) = map.next_entry::<String, Value>()? {
					m.insert(k, v);
				}
				Ok(Value::Mapping(m))
			}
		}

		d.deserialize_any(Visitor)
	}
}
