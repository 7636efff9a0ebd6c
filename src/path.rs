//! Diagnostic positions within a value tree.

use std::fmt::{self, Display};

/// A single step from a container to one of its children.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathComponent {
	/// Descent into a mapping under the given key.
	Key(String),
	/// Descent into a sequence at the given index.
	Index(usize),
	/// Descent into the slot reserved by a default super encoder or decoder.
	Super,
}

impl PathComponent {
	/// The mapping key that a `Super` component stands for.
	pub const SUPER_KEY: &'static str = "super";
}

impl From<&str> for PathComponent {
	fn from(key: &str) -> Self {
		PathComponent::Key(key.to_owned())
	}
}

impl From<String> for PathComponent {
	fn from(key: String) -> Self {
		PathComponent::Key(key)
	}
}

impl From<usize> for PathComponent {
	fn from(index: usize) -> Self {
		PathComponent::Index(index)
	}
}

/// The ordered list of keys and indices leading to the current position of an
/// encoder or decoder.
///
/// A `Path` exists only for error reporting, and never affects the result of
/// encoding or decoding. Every engine instance owns its own copy, so pushing a
/// component for a child never disturbs the parent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<PathComponent>);

impl Path {
	pub(crate) const EMPTY: Path = Path(Vec::new());

	/// Returns the empty path of a top-level value.
	pub fn root() -> Path {
		Path::EMPTY
	}

	/// Returns a new path with `component` appended to this one.
	pub fn join(&self, component: PathComponent) -> Path {
		let mut components = Vec::with_capacity(self.0.len() + 1);
		components.extend_from_slice(&self.0);
		components.push(component);
		Path(components)
	}

	pub fn key(&self, key: &str) -> Path {
		self.join(PathComponent::Key(key.to_owned()))
	}

	pub fn index(&self, index: usize) -> Path {
		self.join(PathComponent::Index(index))
	}

	pub fn components(&self) -> &[PathComponent] {
		&self.0
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn last(&self) -> Option<&PathComponent> {
		self.0.last()
	}
}

impl FromIterator<PathComponent> for Path {
	fn from_iter<I: IntoIterator<Item = PathComponent>>(iter: I) -> Self {
		Path(iter.into_iter().collect())
	}
}

impl Display for Path {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.0.is_empty() {
			return f.write_str("<root>");
		}
		for (i, component) in self.0.iter().enumerate() {
			match component {
				PathComponent::Index(index) => write!(f, "[{index}]")?,
				PathComponent::Key(key) if i == 0 => f.write_str(key)?,
				PathComponent::Key(key) => write!(f, ".{key}")?,
				PathComponent::Super if i == 0 => f.write_str(PathComponent::SUPER_KEY)?,
				PathComponent::Super => write!(f, ".{}", PathComponent::SUPER_KEY)?,
			}
		}
		Ok(())
	}
}
