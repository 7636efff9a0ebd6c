//! [`Decode`] implementations for standard and ecosystem types.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use super::{Decode, Decoder};
use crate::binary::Binary;
use crate::boxing;
use crate::error::{Error, Result};
use crate::value::Value;

macro_rules! decode_integers {
	($($ty:ty),*) => {
		$(impl Decode for $ty {
			fn decode(decoder: &Decoder<'_>) -> Result<Self> {
				boxing::unbox_integer(decoder.value(), decoder.policy(), decoder.path())
			}
		})*
	};
}

decode_integers!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl Decode for bool {
	fn decode(decoder: &Decoder<'_>) -> Result<Self> {
		decoder.decode_bool()
	}
}

impl Decode for f32 {
	fn decode(decoder: &Decoder<'_>) -> Result<Self> {
		decoder.decode_f32()
	}
}

impl Decode for f64 {
	fn decode(decoder: &Decoder<'_>) -> Result<Self> {
		decoder.decode_f64()
	}
}

impl Decode for char {
	fn decode(decoder: &Decoder<'_>) -> Result<Self> {
		boxing::unbox_char(decoder.value(), decoder.policy(), decoder.path())
	}
}

impl Decode for String {
	fn decode(decoder: &Decoder<'_>) -> Result<Self> {
		decoder.decode_str().map(str::to_owned)
	}
}

impl Decode for () {
	fn decode(decoder: &Decoder<'_>) -> Result<Self> {
		decoder.decode_nil()
	}
}

impl<T: Decode> Decode for Option<T> {
	fn decode(decoder: &Decoder<'_>) -> Result<Self> {
		if decoder.is_nil() {
			return Ok(None);
		}
		T::decode(decoder).map(Some)
	}
}

impl<T: Decode> Decode for Box<T> {
	fn decode(decoder: &Decoder<'_>) -> Result<Self> {
		T::decode(decoder).map(Box::new)
	}
}

impl<T: Decode> Decode for Vec<T> {
	fn decode(decoder: &Decoder<'_>) -> Result<Self> {
		let mut seq = decoder.unkeyed_container()?;
		let mut elements = Vec::with_capacity(seq.count());
		while !seq.is_at_end() {
			elements.push(seq.decode()?);
		}
		Ok(elements)
	}
}

impl<T: Decode, const N: usize> Decode for [T; N] {
	fn decode(decoder: &Decoder<'_>) -> Result<Self> {
		let elements = Vec::<T>::decode(decoder)?;
		let count = elements.len();
		elements.try_into().map_err(|_| Error::TypeMismatch {
			path: decoder.path().clone(),
			expected: "fixed-length sequence",
			found: format!("sequence of {count} elements"),
		})
	}
}

impl<V: Decode> Decode for BTreeMap<String, V> {
	fn decode(decoder: &Decoder<'_>) -> Result<Self> {
		decode_entries(decoder)
	}
}

impl<V: Decode, S: BuildHasher + Default> Decode for HashMap<String, V, S> {
	fn decode(decoder: &Decoder<'_>) -> Result<Self> {
		decode_entries(decoder)
	}
}

impl<V: Decode, S: BuildHasher + Default> Decode for IndexMap<String, V, S> {
	fn decode(decoder: &Decoder<'_>) -> Result<Self> {
		decode_entries(decoder)
	}
}

fn decode_entries<V, M>(decoder: &Decoder<'_>) -> Result<M>
where
	V: Decode,
	M: FromIterator<(String, V)>,
{
	let container = decoder.container()?;
	container
		.keys()
		.map(|key| container.decode(key).map(|value| (key.to_owned(), value)))
		.collect()
}

/// Reads the node as stored, without applying the policy to its scalars.
impl Decode for Value {
	fn decode(decoder: &Decoder<'_>) -> Result<Self> {
		Ok(decoder.value().clone())
	}
}

impl Decode for DateTime<Utc> {
	fn decode(decoder: &Decoder<'_>) -> Result<Self> {
		decoder.decode_date()
	}
}

impl Decode for Binary {
	fn decode(decoder: &Decoder<'_>) -> Result<Self> {
		decoder.decode_bytes().map(Binary)
	}
}

impl Decode for BigDecimal {
	fn decode(decoder: &Decoder<'_>) -> Result<Self> {
		decoder.decode_decimal()
	}
}
