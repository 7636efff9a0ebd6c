//! A byte buffer that encodes through the binary strategy.

use std::ops::{Deref, DerefMut};

/// A blob of bytes.
///
/// `Vec<u8>` encodes as a sequence of integers like any other vector. Wrapping
/// it in `Binary` routes it through the policy's
/// [`BinaryStrategy`](crate::policy::BinaryStrategy) instead.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Binary(pub Vec<u8>);

impl Binary {
	pub fn into_inner(self) -> Vec<u8> {
		self.0
	}
}

impl From<Vec<u8>> for Binary {
	fn from(bytes: Vec<u8>) -> Self {
		Binary(bytes)
	}
}

impl From<&[u8]> for Binary {
	fn from(bytes: &[u8]) -> Self {
		Binary(bytes.to_vec())
	}
}

impl Deref for Binary {
	type Target = Vec<u8>;

	fn deref(&self) -> &Vec<u8> {
		&self.0
	}
}

impl DerefMut for Binary {
	fn deref_mut(&mut self) -> &mut Vec<u8> {
		&mut self.0
	}
}
