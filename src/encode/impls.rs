//! [`Encode`] implementations for standard and ecosystem types.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use super::{Encode, Encoder};
use crate::binary::Binary;
use crate::error::{Error, Result};
use crate::value::Value;

macro_rules! encode_via {
	($method:ident as $wide:ty: $($ty:ty),*) => {
		$(impl Encode for $ty {
			fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
				encoder.$method(<$wide>::from(*self))
			}
		})*
	};
}

encode_via!(encode_i64 as i64: i8, i16, i32, i64);
encode_via!(encode_u64 as u64: u8, u16, u32, u64);
encode_via!(encode_f64 as f64: f32, f64);
encode_via!(encode_bool as bool: bool);
encode_via!(encode_i128 as i128: i128);

impl Encode for u128 {
	fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
		match i128::try_from(*self) {
			Ok(n) => encoder.encode_i128(n),
			Err(_) => Err(Error::invalid_value(
				encoder.path().clone(),
				format!("{self} exceeds the integer range of the value tree"),
			)),
		}
	}
}

impl Encode for isize {
	fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
		encoder.encode_i128(*self as i128)
	}
}

impl Encode for usize {
	fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
		encoder.encode_i128(*self as i128)
	}
}

impl Encode for char {
	fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
		encoder.encode_str(self.encode_utf8(&mut [0; 4]))
	}
}

impl Encode for str {
	fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
		encoder.encode_str(self)
	}
}

impl Encode for String {
	fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
		encoder.encode_str(self)
	}
}

impl Encode for () {
	fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
		encoder.encode_nil()
	}
}

impl<T: Encode + ?Sized> Encode for &T {
	fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
		(**self).encode(encoder)
	}
}

impl<T: Encode + ?Sized> Encode for Box<T> {
	fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
		(**self).encode(encoder)
	}
}

impl<T: Encode> Encode for Option<T> {
	fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
		match self {
			Some(value) => value.encode(encoder),
			None => encoder.encode_nil(),
		}
	}
}

impl<T: Encode> Encode for [T] {
	fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
		let mut seq = encoder.unkeyed_container();
		for element in self {
			seq.encode(element)?;
		}
		Ok(())
	}
}

impl<T: Encode> Encode for Vec<T> {
	fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
		self.as_slice().encode(encoder)
	}
}

impl<T: Encode, const N: usize> Encode for [T; N] {
	fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
		self.as_slice().encode(encoder)
	}
}

macro_rules! encode_map {
	($($map:ident<K, V $(, $s:ident)?>),*) => {
		$(impl<K, V $(, $s)?> Encode for $map<K, V $(, $s)?>
		where
			K: AsRef<str>,
			V: Encode,
			$($s: BuildHasher,)?
		{
			fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
				let mut container = encoder.container();
				for (key, value) in self {
					container.encode(key.as_ref(), value)?;
				}
				Ok(())
			}
		})*
	};
}

encode_map!(BTreeMap<K, V>, HashMap<K, V, S>, IndexMap<K, V, S>);

impl Encode for Value {
	fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
		match self {
			Value::Null => encoder.encode_nil(),
			Value::Bool(b) => encoder.encode_bool(*b),
			Value::Integer(n) => encoder.encode_i128(*n),
			Value::Float(f) => encoder.encode_f64(*f),
			Value::String(s) => encoder.encode_str(s),
			Value::Sequence(elements) => elements.encode(encoder),
			Value::Mapping(entries) => entries.encode(encoder),
		}
	}
}

impl Encode for DateTime<Utc> {
	fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
		encoder.encode_date(self)
	}
}

impl Encode for Binary {
	fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
		encoder.encode_bytes(self)
	}
}

impl Encode for BigDecimal {
	fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
		encoder.encode_decimal(self)
	}
}
