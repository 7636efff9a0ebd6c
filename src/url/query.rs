//! The `name=value&...` text form of a list of query items.

use std::fmt::Write;

use super::QueryItem;
use crate::error::{Error, Result};
use crate::path::Path;

/// Returns whether `byte` may appear literally in an encoded name or value.
fn is_literal(byte: u8) -> bool {
	byte.is_ascii_alphanumeric() || b"-._~[]!$'()*,;:@/?".contains(&byte)
}

fn percent_encode(text: &str, out: &mut String) {
	for &byte in text.as_bytes() {
		if is_literal(byte) {
			out.push(char::from(byte));
		} else {
			// Writing to a String cannot fail.
			let _ = write!(out, "%{byte:02X}");
		}
	}
}

fn percent_decode(text: &str) -> Result<String> {
	let bytes = text.as_bytes();
	let mut decoded = Vec::with_capacity(bytes.len());
	let mut i = 0;
	while i < bytes.len() {
		if bytes[i] != b'%' {
			decoded.push(bytes[i]);
			i += 1;
			continue;
		}
		let escape = bytes
			.get(i + 1..i + 3)
			.filter(|hex| hex.iter().all(u8::is_ascii_hexdigit))
			.and_then(|hex| std::str::from_utf8(hex).ok())
			.and_then(|hex| u8::from_str_radix(hex, 16).ok());
		match escape {
			Some(byte) => decoded.push(byte),
			None => {
				return Err(Error::data_corrupted(
					Path::root(),
					format!("invalid percent escape at byte {i} of {text:?}"),
				))
			}
		}
		i += 3;
	}
	String::from_utf8(decoded)
		.map_err(|err| Error::data_corrupted_by(Path::root(), "percent-decoded query is not UTF-8", err))
}

/// Joins items into a query string, percent-encoding names and values.
///
/// An item without a value is written as its bare name.
pub fn to_query_string(items: &[QueryItem]) -> String {
	let mut out = String::new();
	for (i, item) in items.iter().enumerate() {
		if i > 0 {
			out.push('&');
		}
		percent_encode(&item.name, &mut out);
		if let Some(value) = &item.value {
			out.push('=');
			percent_encode(value, &mut out);
		}
	}
	out
}

/// Splits a query string into items.
///
/// Empty segments between `&` separators are ignored, and a segment without
/// `=` becomes an item without a value. `+` is not treated as a space.
pub fn parse_query_string(text: &str) -> Result<Vec<QueryItem>> {
	let text = text.strip_prefix('?').unwrap_or(text);
	text.split('&')
		.filter(|segment| !segment.is_empty())
		.map(|segment| {
			Ok(match segment.split_once('=') {
				Some((name, value)) => QueryItem::new(percent_decode(name)?, Some(percent_decode(value)?)),
				None => QueryItem::new(percent_decode(segment)?, None::<String>),
			})
		})
		.collect()
}
