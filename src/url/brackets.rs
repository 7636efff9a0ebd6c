//! Bracket notation: the flat `name[key][]=value` form of a value tree.
//!
//! Serializing walks a top-level mapping depth first, extending each item's
//! name with `[key]` for mapping entries and `[]` (or `[index]`) for sequence
//! elements. Deserializing parses those names back into segments and regroups
//! items that share a prefix.

use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, trace};

use super::QueryItem;
use crate::error::{Error, Result};
use crate::path::Path;
use crate::policy::ArrayEncoding;
use crate::value::{Map, Value};

/// Characters that can never appear in a mapping key.
const RESERVED_KEY_CHARS: &[char] = &['[', ']', '#', '&', '='];

const BRACKETS: &[char] = &['[', ']'];

/// Characters that can never appear in a value.
const RESERVED_VALUE_CHARS: &[char] = &['#', '&'];

/// Flattens a mapping into query items.
///
/// Every key and value is checked before any item is returned, so a failure
/// never yields a partial list.
pub fn serialize(value: &Value, arrays: ArrayEncoding) -> Result<Vec<QueryItem>> {
	let Value::Mapping(entries) = value else {
		return Err(Error::InvalidTopLevelObject { found: value.kind() });
	};
	let mut serializer = Serializer {
		arrays,
		items: Vec::new(),
	};
	for (key, child) in entries {
		let path = Path::root().key(key);
		check_key(key, &path)?;
		serializer.walk(key.clone(), &path, child)?;
	}
	Ok(serializer.items)
}

fn check_key(key: &str, path: &Path) -> Result<()> {
	let reason = if key.is_empty() {
		"keys cannot be empty"
	} else if key.contains(RESERVED_KEY_CHARS) {
		"keys cannot contain '[', ']', '#', '&', or '='"
	} else {
		return Ok(());
	};
	debug!(%path, key, reason, "rejected query key");
	Err(Error::InvalidKey {
		path: path.clone(),
		key: key.to_owned(),
		reason,
	})
}

struct Serializer {
	arrays: ArrayEncoding,
	items: Vec<QueryItem>,
}

impl Serializer {
	fn walk(&mut self, name: String, path: &Path, node: &Value) -> Result<()> {
		let text = match node {
			Value::Null => None,
			Value::Bool(b) => Some(b.to_string()),
			Value::Integer(n) => Some(n.to_string()),
			Value::Float(f) if !f.is_finite() => {
				return Err(Error::invalid_value(
					path.clone(),
					format!("{f} has no query form; encode it through a non-finite float strategy"),
				));
			}
			Value::Float(f) => Some(f.to_string()),
			Value::String(s) if s.contains(RESERVED_VALUE_CHARS) => {
				return Err(Error::invalid_value(
					path.clone(),
					"query values cannot contain '#' or '&'",
				));
			}
			Value::String(s) => Some(s.clone()),
			Value::Sequence(_) | Value::Mapping(_) if name.ends_with("[]") => {
				return Err(Error::NestedContainerInArray { path: path.clone() });
			}
			Value::Sequence(elements) => {
				for (index, element) in elements.iter().enumerate() {
					let name = match self.arrays {
						ArrayEncoding::Brackets => format!("{name}[]"),
						ArrayEncoding::Indexed => format!("{name}[{index}]"),
					};
					self.walk(name, &path.index(index), element)?;
				}
				return Ok(());
			}
			Value::Mapping(entries) => {
				for (key, child) in entries {
					let path = path.key(key);
					check_key(key, &path)?;
					self.walk(format!("{name}[{key}]"), &path, child)?;
				}
				return Ok(());
			}
		};
		self.items.push(QueryItem { name, value: text });
		Ok(())
	}
}

/// The ways a query item's name can be malformed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum NameError {
	#[error("name is empty")]
	EmptyName,
	#[error("name has an opening bracket inside another bracket")]
	UnbalancedBrackets,
	#[error("name has a closing bracket with no opening bracket")]
	LeadingClosingBracket,
	#[error("name closes a bracket more than once")]
	MultipleClosingBrackets,
	#[error("name leaves a bracket unclosed")]
	MissingClosingBracket,
	#[error("name has text after a closing bracket")]
	TextAfterClosingBracket,
}

/// One bracketed part of a name after its leading segment.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment<'a> {
	Key(&'a str),
	Array,
}

/// Splits `name` into its leading segment and its bracketed segments.
fn parse_name(name: &str) -> std::result::Result<(&str, Vec<Segment<'_>>), NameError> {
	let split = name.find(BRACKETS).unwrap_or(name.len());
	let (head, mut rest) = name.split_at(split);
	if rest.starts_with(']') {
		return Err(NameError::LeadingClosingBracket);
	}
	if head.is_empty() {
		return Err(NameError::EmptyName);
	}

	let mut segments = Vec::new();
	while let Some(inner) = rest.strip_prefix('[') {
		let close = match inner.find(BRACKETS) {
			Some(i) if inner.as_bytes()[i] == b']' => i,
			Some(_) => return Err(NameError::UnbalancedBrackets),
			None => return Err(NameError::MissingClosingBracket),
		};
		segments.push(match &inner[..close] {
			"" => Segment::Array,
			key => Segment::Key(key),
		});
		rest = &inner[close + 1..];
		if rest.starts_with(']') {
			return Err(NameError::MultipleClosingBrackets);
		}
		if !rest.is_empty() && !rest.starts_with('[') {
			return Err(NameError::TextAfterClosingBracket);
		}
	}
	Ok((head, segments))
}

/// An item whose name has been parsed, with the segments not yet consumed by
/// grouping.
struct Pending<'a> {
	segments: &'a [Segment<'a>],
	value: Option<&'a str>,
}

/// Rebuilds a mapping from query items.
///
/// Items without a value become null, and every other value becomes a
/// string; converting those strings to other scalars is left to decoding.
pub fn deserialize(items: &[QueryItem]) -> Result<Value> {
	let mut parsed = Vec::with_capacity(items.len());
	for item in items {
		let (head, segments) = parse_name(&item.name).map_err(|err| {
			debug!(name = %item.name, %err, "rejected query name");
			Error::data_corrupted_by(
				Path::root(),
				format!("malformed query name {:?}", item.name),
				err,
			)
		})?;
		parsed.push((head, segments, item.value.as_deref()));
	}

	let mut groups: IndexMap<&str, Vec<Pending<'_>>> = IndexMap::new();
	for (head, segments, value) in &parsed {
		groups.entry(*head).or_default().push(Pending {
			segments: segments.as_slice(),
			value: *value,
		});
	}
	groups
		.into_iter()
		.map(|(head, pending)| {
			let value = combine(&Path::root().key(head), pending)?;
			Ok((head.to_owned(), value))
		})
		.collect::<Result<Map>>()
		.map(Value::Mapping)
}

/// Combines every item that shares the name prefix at `path` into one value.
fn combine(path: &Path, pending: Vec<Pending<'_>>) -> Result<Value> {
	#[derive(Clone, Copy, Debug, PartialEq, Eq)]
	enum Kind {
		Scalar,
		Array,
		Mapping,
	}

	let kind_of = |p: &Pending<'_>| match p.segments.first() {
		None => Kind::Scalar,
		Some(Segment::Array) => Kind::Array,
		Some(Segment::Key(_)) => Kind::Mapping,
	};
	let kind = pending.first().map_or(Kind::Scalar, kind_of);
	if pending.iter().any(|p| kind_of(p) != kind) {
		return Err(Error::DuplicateValueForName {
			path: path.clone(),
			reason: "name is used for more than one kind of value",
		});
	}
	trace!(%path, ?kind, items = pending.len(), "combining query items");

	match kind {
		Kind::Scalar => match pending.as_slice() {
			[single] => Ok(single.value.map_or(Value::Null, |v| Value::String(v.to_owned()))),
			_ => Err(Error::DuplicateValueForName {
				path: path.clone(),
				reason: "name has more than one value",
			}),
		},
		Kind::Array => pending
			.into_iter()
			.enumerate()
			.map(|(index, p)| match &p.segments[1..] {
				[] => Ok(p.value.map_or(Value::Null, |v| Value::String(v.to_owned()))),
				_ => Err(Error::NestedContainerInArray {
					path: path.index(index),
				}),
			})
			.collect::<Result<Vec<_>>>()
			.map(Value::Sequence),
		Kind::Mapping => {
			let mut groups: IndexMap<&str, Vec<Pending<'_>>> = IndexMap::new();
			for p in pending {
				if let [Segment::Key(key), rest @ ..] = p.segments {
					groups.entry(*key).or_default().push(Pending {
						segments: rest,
						value: p.value,
					});
				}
			}
			groups
				.into_iter()
				.map(|(key, pending)| {
					let value = combine(&path.key(key), pending)?;
					Ok((key.to_owned(), value))
				})
				.collect::<Result<Map>>()
				.map(Value::Mapping)
		}
	}
}
