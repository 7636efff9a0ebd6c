//! Index-addressed storage for nodes under construction.
//!
//! Containers handed out by an [`Encoder`](super::Encoder) never own the node
//! they write to. Instead, every node lives in a single [`Arena`] for the
//! duration of a top-level encode, and containers refer to their node by
//! index. This keeps upserts in place and lets a super encoder reserve a slot
//! that is filled later, without aliasing mutable references.

use indexmap::IndexMap;

use crate::value::Value;

pub(crate) type NodeId = usize;

pub(crate) enum Node {
	/// A leaf. Never holds a [`Value::Sequence`] or [`Value::Mapping`] that is
	/// still being built; those use the variants below.
	Scalar(Value),
	Sequence(Vec<NodeId>),
	Mapping(IndexMap<String, NodeId>),
}

/// The shape of a node, as requested through the container protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Shape {
	Single,
	Unkeyed,
	Keyed,
}

/// The location of a placeholder reserved by a super encoder.
#[derive(Clone, Debug)]
pub(crate) enum Slot {
	Key { owner: NodeId, key: String },
	Index { owner: NodeId, index: usize },
}

#[derive(Default)]
pub(crate) struct Arena {
	nodes: Vec<Option<Node>>,
}

impl Arena {
	pub(crate) fn new() -> Arena {
		Arena::default()
	}

	pub(crate) fn insert(&mut self, node: Node) -> NodeId {
		self.nodes.push(Some(node));
		self.nodes.len() - 1
	}

	fn node(&self, id: NodeId) -> &Node {
		match self.nodes.get(id) {
			Some(Some(node)) => node,
			_ => unreachable!("node {id} is not live in this arena"),
		}
	}

	fn node_mut(&mut self, id: NodeId) -> &mut Node {
		match self.nodes.get_mut(id) {
			Some(Some(node)) => node,
			_ => unreachable!("node {id} is not live in this arena"),
		}
	}

	pub(crate) fn shape(&self, id: NodeId) -> Shape {
		match self.node(id) {
			Node::Scalar(_) => Shape::Single,
			Node::Sequence(_) => Shape::Unkeyed,
			Node::Mapping(_) => Shape::Keyed,
		}
	}

	/// Appends `child` to the sequence `seq`, returning its index.
	pub(crate) fn push_element(&mut self, seq: NodeId, child: NodeId) -> usize {
		match self.node_mut(seq) {
			Node::Sequence(elements) => {
				elements.push(child);
				elements.len() - 1
			}
			_ => unreachable!("node {seq} is not a sequence"),
		}
	}

	pub(crate) fn sequence_len(&self, seq: NodeId) -> usize {
		match self.node(seq) {
			Node::Sequence(elements) => elements.len(),
			_ => unreachable!("node {seq} is not a sequence"),
		}
	}

	/// Associates `child` with `key` in the mapping `map`, keeping the
	/// original position of an existing key.
	pub(crate) fn upsert(&mut self, map: NodeId, key: String, child: NodeId) {
		match self.node_mut(map) {
			Node::Mapping(entries) => {
				entries.insert(key, child);
			}
			_ => unreachable!("node {map} is not a mapping"),
		}
	}

	/// Points a reserved slot at `child`, replacing its placeholder.
	pub(crate) fn fill(&mut self, slot: &Slot, child: NodeId) {
		match slot {
			Slot::Key { owner, key } => self.upsert(*owner, key.clone(), child),
			Slot::Index { owner, index } => match self.node_mut(*owner) {
				Node::Sequence(elements) => elements[*index] = child,
				_ => unreachable!("node {owner} is not a sequence"),
			},
		}
	}

	/// Consumes the arena, assembling the tree reachable from `root`.
	///
	/// Nodes that are no longer reachable, such as the partial output of a
	/// super encoder that failed before committing, are dropped.
	pub(crate) fn into_value(mut self, root: NodeId) -> Value {
		self.take(root)
	}

	fn take(&mut self, id: NodeId) -> Value {
		let node = match self.nodes.get_mut(id).and_then(Option::take) {
			Some(node) => node,
			None => unreachable!("node {id} is referenced more than once"),
		};
		match node {
			Node::Scalar(value) => value,
			Node::Sequence(elements) => {
				Value::Sequence(elements.into_iter().map(|id| self.take(id)).collect())
			}
			Node::Mapping(entries) => Value::Mapping(
				entries
					.into_iter()
					.map(|(key, id)| (key, self.take(id)))
					.collect(),
			),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn filled_slot_replaces_placeholder_in_place() {
		let mut arena = Arena::new();
		let root = arena.insert(Node::Mapping(IndexMap::new()));
		let first = arena.insert(Node::Scalar(Value::from("first")));
		arena.upsert(root, "a".into(), first);
		let placeholder = arena.insert(Node::Scalar(Value::Null));
		arena.upsert(root, "super".into(), placeholder);
		let last = arena.insert(Node::Scalar(Value::from("last")));
		arena.upsert(root, "z".into(), last);

		let base = arena.insert(Node::Scalar(Value::from(7_i64)));
		arena.fill(
			&Slot::Key {
				owner: root,
				key: "super".into(),
			},
			base,
		);

		let value = arena.into_value(root);
		let entries: Vec<_> = value.as_mapping().unwrap().iter().collect();
		assert_eq!(entries.len(), 3);
		assert_eq!(entries[1], (&"super".to_owned(), &Value::Integer(7)));
	}

	#[test]
	fn filled_index_slot() {
		let mut arena = Arena::new();
		let root = arena.insert(Node::Sequence(Vec::new()));
		let placeholder = arena.insert(Node::Scalar(Value::Null));
		let index = arena.push_element(root, placeholder);
		let nested = arena.insert(Node::Sequence(Vec::new()));
		arena.fill(&Slot::Index { owner: root, index }, nested);
		assert_eq!(
			arena.into_value(root),
			Value::Sequence(vec![Value::Sequence(vec![])])
		);
	}
}
