use std::error;
use std::result;

use thiserror::Error;

use crate::path::Path;
use crate::value::Value;

/// The result of an encoding or decoding operation.
pub type Result<T> = result::Result<T, Error>;

/// The boxed source of a [`Error::DataCorrupted`], typically an error from
/// a lower-level parser.
pub type Source = Box<dyn error::Error + Send + Sync + 'static>;

/// An error produced while encoding or decoding.
///
/// Every variant besides [`Error::InvalidTopLevelObject`] carries the [`Path`]
/// of the failure. The last component of that path identifies the key or index
/// being processed when the failure occurred, including the missing key of a
/// [`Error::KeyNotFound`] and the exhausted index of an
/// [`Error::UnkeyedOutOfRange`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
	/// A node did not have the kind required to decode the requested type.
	#[error("type mismatch at {path}: expected {expected}, found {found}")]
	TypeMismatch {
		path: Path,
		expected: &'static str,
		found: String,
	},

	/// A null node was found where a value of some type was required.
	#[error("value not found at {path}: expected {expected}, found null")]
	ValueNotFound { path: Path, expected: &'static str },

	/// A keyed container did not contain the requested key.
	#[error("no value for key {key:?} at {path}")]
	KeyNotFound { path: Path, key: String },

	/// An unkeyed container was read past its end.
	#[error("unkeyed container exhausted at {path} (count {count})")]
	UnkeyedOutOfRange { path: Path, count: usize },

	/// Wire text or a scalar's textual form could not be interpreted.
	#[error("data corrupted at {path}: {reason}")]
	DataCorrupted {
		path: Path,
		reason: String,
		#[source]
		source: Option<Source>,
	},

	/// A value cannot be represented in the target format.
	#[error("invalid value at {path}: {reason}")]
	InvalidValue { path: Path, reason: String },

	/// A mapping key cannot be represented in bracket notation.
	#[error("invalid key {key:?} at {path}: {reason}")]
	InvalidKey {
		path: Path,
		key: String,
		reason: &'static str,
	},

	/// The top-level value of a URL query was not a mapping.
	#[error("top-level query value must be a mapping, found {found}")]
	InvalidTopLevelObject { found: &'static str },

	/// A container appeared directly inside an anonymous `[]` array, where
	/// bracket notation cannot tell elements apart.
	#[error("cannot nest a container inside an anonymous array at {path}")]
	NestedContainerInArray { path: Path },

	/// Query items sharing a name could not be combined into one value.
	#[error("conflicting values for name at {path}: {reason}")]
	DuplicateValueForName { path: Path, reason: &'static str },
}

impl Error {
	/// Returns a [`Error::DataCorrupted`] with no underlying source.
	pub fn data_corrupted<R: Into<String>>(path: Path, reason: R) -> Error {
		Error::DataCorrupted {
			path,
			reason: reason.into(),
			source: None,
		}
	}

	/// Returns a [`Error::DataCorrupted`] caused by `source`.
	pub fn data_corrupted_by<R, E>(path: Path, reason: R, source: E) -> Error
	where
		R: Into<String>,
		E: Into<Source>,
	{
		Error::DataCorrupted {
			path,
			reason: reason.into(),
			source: Some(source.into()),
		}
	}

	/// Returns a [`Error::TypeMismatch`] describing `found`, or a
	/// [`Error::ValueNotFound`] if `found` is null.
	pub fn type_mismatch(path: Path, expected: &'static str, found: &Value) -> Error {
		match found {
			Value::Null => Error::ValueNotFound { path, expected },
			found => Error::TypeMismatch {
				path,
				expected,
				found: found.describe(),
			},
		}
	}

	pub fn invalid_value<R: Into<String>>(path: Path, reason: R) -> Error {
		Error::InvalidValue {
			path,
			reason: reason.into(),
		}
	}

	/// Returns the path at which the error occurred.
	pub fn path(&self) -> &Path {
		static ROOT: Path = Path::EMPTY;
		match self {
			Error::TypeMismatch { path, .. }
			| Error::ValueNotFound { path, .. }
			| Error::KeyNotFound { path, .. }
			| Error::UnkeyedOutOfRange { path, .. }
			| Error::DataCorrupted { path, .. }
			| Error::InvalidValue { path, .. }
			| Error::InvalidKey { path, .. }
			| Error::NestedContainerInArray { path }
			| Error::DuplicateValueForName { path, .. } => path,
			Error::InvalidTopLevelObject { .. } => &ROOT,
		}
	}
}
