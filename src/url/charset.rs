//! Byte encodings for query strings.

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::str;

use crate::error::{Error, Result};
use crate::path::Path;

const BOM: char = '\u{FEFF}';

/// The character encoding of a query string's byte form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextEncoding {
	#[default]
	Utf8,
	/// UTF-16, written little-endian with a byte order mark.
	Utf16,
}

/// Encodes `text` as bytes.
pub fn encode(text: &str, encoding: TextEncoding) -> Vec<u8> {
	match encoding {
		TextEncoding::Utf8 => text.as_bytes().to_vec(),
		TextEncoding::Utf16 => {
			let mut buf = Vec::with_capacity(2 + text.len() * 2);
			for unit in std::iter::once(0xFEFF_u16).chain(text.encode_utf16()) {
				buf.extend_from_slice(&unit.to_le_bytes());
			}
			buf
		}
	}
}

/// Decodes bytes to text, dropping any leading byte order mark.
pub fn decode(bytes: &[u8], encoding: TextEncoding) -> Result<String> {
	let text = match encoding {
		TextEncoding::Utf8 => str::from_utf8(bytes)
			.map_err(|err| Error::data_corrupted_by(Path::root(), "query is not valid UTF-8", err))?
			.to_owned(),
		TextEncoding::Utf16 => decode_utf16(bytes)
			.map_err(|err| Error::data_corrupted_by(Path::root(), "query is not valid UTF-16", err))?,
	};
	Ok(match text.strip_prefix(BOM) {
		Some(rest) => rest.to_owned(),
		None => text,
	})
}

fn decode_utf16(bytes: &[u8]) -> std::result::Result<String, EncodingError> {
	if bytes.len() % 2 != 0 {
		return Err(EncodingError::OddLength(bytes.len()));
	}
	let endianness = Endianness::detect(bytes);
	let mut units = Utf16Units {
		bytes,
		pos: 0,
		endianness,
	};

	let mut text = String::with_capacity(bytes.len() / 2);
	while let Some((pos, lead)) = units.next() {
		if !(0xD800..=0xDFFF).contains(&lead) {
			text.extend(char::from_u32(u32::from(lead)));
			continue;
		}
		if lead >= 0xDC00 {
			// A trailing surrogate with no leading surrogate.
			return Err(EncodingError::Unpaired { unit: lead, pos });
		}
		let (pos, trail) = units.next().ok_or(EncodingError::Unpaired { unit: lead, pos })?;
		if !(0xDC00..=0xDFFF).contains(&trail) {
			return Err(EncodingError::Unpaired { unit: trail, pos });
		}
		let ch = 0x1_0000 + (u32::from(lead - 0xD800) << 10 | u32::from(trail - 0xDC00));
		text.extend(char::from_u32(ch));
	}
	Ok(text)
}

/// Code units of a UTF-16 byte slice with their byte offsets.
struct Utf16Units<'a> {
	bytes: &'a [u8],
	pos: usize,
	endianness: Endianness,
}

impl Iterator for Utf16Units<'_> {
	type Item = (usize, u16);

	fn next(&mut self) -> Option<Self::Item> {
		let pos = self.pos;
		let unit = self.bytes.get(pos..pos + 2)?;
		self.pos += 2;
		Some((pos, self.endianness.decode_u16([unit[0], unit[1]])))
	}
}

/// Represents the endianness of UTF-16 text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Endianness {
	Big,
	Little,
}

impl Endianness {
	/// Detects endianness from a byte order mark, or else from the position of
	/// the zero byte in a leading ASCII code unit. Text that starts with
	/// neither is assumed to be big-endian.
	fn detect(prefix: &[u8]) -> Endianness {
		match prefix {
			[0xFE, 0xFF, ..] | [0, _, ..] => Endianness::Big,
			[0xFF, 0xFE, ..] | [_, 0, ..] => Endianness::Little,
			_ => Endianness::Big,
		}
	}

	fn decode_u16(self, buf: [u8; 2]) -> u16 {
		match self {
			Endianness::Big => u16::from_be_bytes(buf),
			Endianness::Little => u16::from_le_bytes(buf),
		}
	}
}

/// An error in a UTF-16 byte sequence.
#[derive(Debug)]
enum EncodingError {
	OddLength(usize),
	Unpaired { unit: u16, pos: usize },
}

impl StdError for EncodingError {}

impl Display for EncodingError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			EncodingError::OddLength(len) => write!(f, "UTF-16 text has odd length {len}"),
			EncodingError::Unpaired { unit, pos } => write!(
				f,
				"invalid or unexpected UTF-16 code unit 0x{unit:x} at byte {pos}"
			),
		}
	}
}
