// Copyright 2026 The Matrix.org Foundation C.I.C.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The mutable document tree.
//!
//! A [`DocumentTree`] is the hierarchical mirror of a canonical edit-script:
//! a root holding lines (optionally grouped into blocks), each line holding
//! text and embed leaves and terminating in one implicit line-break unit.
//! The tree and the flat script describe the same document, and after every
//! mutation [`DocumentTree::to_edit_script`] must reproduce the canonical
//! form exactly.
//!
//! Offsets are measured in units: one per text character (scalar value, not
//! byte), one per embed, one per line-break. A non-empty tree always holds at
//! least one line, so its length is always at least 1.

mod edits;
mod node;

pub use node::{Node, NodeId, NodeKind};

use edit_script::{AttrValue, EditScript, Operation};

use crate::error::DocumentError;
use crate::style::{AttributeKey, AttributeScope, Style};

/// Replaces embed units when projecting the document to plain text.
pub const OBJECT_REPLACEMENT_CHARACTER: char = '\u{FFFC}';

/// An arena-backed tree of document nodes.
///
/// Nodes live in a slab indexed by [`NodeId`]; removed slots are recycled.
/// Structural invariants (every line terminated, blocks homogeneous and
/// non-empty, adjacent equal-styled text leaves merged) are re-established
/// after every mutation, and verified wholesale when the `assert-invariants`
/// feature is enabled.
pub struct DocumentTree {
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    root: NodeId,
}

impl DocumentTree {
    /// Creates the smallest valid tree: a root holding one empty, unstyled
    /// line. Its edit-script form is a single `insert("\n")`.
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: NodeId(0),
        };
        let root = tree.alloc(Node::new(NodeKind::Root));
        tree.root = root;
        let line = tree.alloc(Node::new(NodeKind::Line));
        tree.node_mut(line).parent = Some(root);
        tree.node_mut(root).children.push(line);
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Borrows a node by id.
    ///
    /// Panics if the id does not refer to a live node of this tree; handing
    /// one in is an internal-consistency failure, not recoverable input.
    pub fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.0]
            .as_ref()
            .expect("node ids always refer to live nodes")
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.0]
            .as_mut()
            .expect("node ids always refer to live nodes")
    }

    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    pub(crate) fn release(&mut self, id: NodeId) {
        self.nodes[id.0] = None;
        self.free.push(id.0);
    }

    /// Total length of the document in units, line-breaks included. At least
    /// 1, since a tree always holds one line.
    pub fn len(&self) -> usize {
        self.node_len(self.root)
    }

    /// `true` when the document is the single empty line.
    pub fn is_empty(&self) -> bool {
        self.len() == 1
    }

    /// Length of the given node's subtree in units.
    pub fn node_len(&self, id: NodeId) -> usize {
        let node = self.node(id);
        match &node.kind {
            NodeKind::Text(text) => text.chars().count(),
            NodeKind::Embed(_) => 1,
            NodeKind::Line => {
                1 + node
                    .children
                    .iter()
                    .map(|child| self.node_len(*child))
                    .sum::<usize>()
            }
            NodeKind::Root | NodeKind::Block => node
                .children
                .iter()
                .map(|child| self.node_len(*child))
                .sum(),
        }
    }

    /// All lines in document order, blocks flattened away.
    pub(crate) fn lines(&self) -> Vec<NodeId> {
        let mut lines = Vec::new();
        for child in &self.node(self.root).children {
            match &self.node(*child).kind {
                NodeKind::Line => lines.push(*child),
                NodeKind::Block => lines.extend(self.node(*child).children.iter().copied()),
                _ => panic!("only lines and blocks may sit under the root"),
            }
        }
        lines
    }

    /// Finds the line containing `offset` and the offset local to that line.
    ///
    /// The local offset satisfies `local < line_len` for every in-document
    /// offset; `offset == len` resolves to the final line at its full
    /// length, the only position with `local == line_len`.
    pub(crate) fn locate_line(&self, offset: usize) -> Result<(NodeId, usize), DocumentError> {
        let length = self.len();
        if offset > length {
            return Err(DocumentError::OutOfRange {
                index: offset,
                length: 0,
                document_length: length,
            });
        }
        let lines = self.lines();
        let last = *lines.last().expect("a tree always holds at least one line");
        let mut start = 0;
        for line in lines {
            let line_len = self.node_len(line);
            if offset < start + line_len {
                return Ok((line, offset - start));
            }
            start += line_len;
        }
        Ok((last, self.node_len(last)))
    }

    /// The leaf containing the line-local offset, with the offset local to
    /// that leaf. `None` when the line has no leaf at that offset (it points
    /// at the line-break).
    pub(crate) fn leaf_at(&self, line: NodeId, local: usize) -> Option<(NodeId, usize)> {
        let mut start = 0;
        for leaf in &self.node(line).children {
            let leaf_len = self.node_len(*leaf);
            if local < start + leaf_len {
                return Some((*leaf, local - start));
            }
            start += leaf_len;
        }
        None
    }

    /// Resolves a document offset to the node holding that unit.
    ///
    /// Content offsets resolve to the leaf and a leaf-local offset; a
    /// line-break offset resolves to its line, with the local offset equal to
    /// the line's content length. `offset == len` resolves to the final line
    /// at its full length. Offsets beyond that are an error.
    pub fn lookup(&self, offset: usize) -> Result<(NodeId, usize), DocumentError> {
        let (line, local) = self.locate_line(offset)?;
        let content_len = self.node_len(line) - 1;
        if local >= content_len {
            return Ok((line, local));
        }
        let (leaf, leaf_local) = self
            .leaf_at(line, local)
            .expect("content offsets always fall inside a leaf");
        Ok((leaf, leaf_local))
    }

    /// The formatting shared by every unit of the range.
    ///
    /// Inline and embed attributes are intersected across the covered leaves
    /// (line-breaks do not participate); line attributes are intersected
    /// across every line the range touches, partial coverage included. A
    /// zero-length range reports the line attributes of the caret's line.
    pub fn collect_style(&self, offset: usize, length: usize) -> Result<Style, DocumentError> {
        let document_length = self.len();
        if offset + length > document_length {
            return Err(DocumentError::OutOfRange {
                index: offset,
                length,
                document_length,
            });
        }
        if length == 0 {
            let (line, _) = self.locate_line(offset)?;
            return Ok(self.node(line).style.scoped(AttributeScope::Line));
        }
        let end = offset + length;
        let mut line_common: Option<Style> = None;
        let mut leaf_common: Option<Style> = None;
        let mut start = 0;
        for line in self.lines() {
            let line_end = start + self.node_len(line);
            if line_end <= offset {
                start = line_end;
                continue;
            }
            if start >= end {
                break;
            }
            line_common = Some(match line_common {
                None => self.node(line).style.clone(),
                Some(common) => common.intersect(&self.node(line).style),
            });
            let mut leaf_start = start;
            for leaf in &self.node(line).children {
                let leaf_end = leaf_start + self.node_len(*leaf);
                if leaf_end > offset && leaf_start < end {
                    leaf_common = Some(match leaf_common {
                        None => self.node(*leaf).style.clone(),
                        Some(common) => common.intersect(&self.node(*leaf).style),
                    });
                }
                leaf_start = leaf_end;
            }
            start = line_end;
        }
        let line_part = line_common.unwrap_or_default().scoped(AttributeScope::Line);
        let leaf_full = leaf_common.unwrap_or_default();
        let leaf_part = leaf_full
            .scoped(AttributeScope::Inline)
            .merge(&leaf_full.scoped(AttributeScope::Embed));
        Ok(leaf_part.merge(&line_part))
    }

    /// Serializes the tree back to its canonical edit-script.
    pub fn to_edit_script(&self) -> EditScript {
        let mut script = EditScript::new();
        for line in self.lines() {
            let line_node = self.node(line);
            for leaf in &line_node.children {
                let leaf_node = self.node(*leaf);
                let attributes = leaf_node.style.to_attributes();
                match &leaf_node.kind {
                    NodeKind::Text(text) => {
                        script.push(Operation::insert_styled(text.as_str(), attributes));
                    }
                    NodeKind::Embed(token) => {
                        script.push(Operation::insert_styled(token.clone(), attributes));
                    }
                    _ => panic!("lines may only hold text and embed leaves"),
                }
            }
            script.push(Operation::insert_styled("\n", line_node.style.to_attributes()));
        }
        script
    }

    /// Projects the document to plain text, one `\n` per line and
    /// [`OBJECT_REPLACEMENT_CHARACTER`] per embed.
    pub fn to_plain_text(&self) -> String {
        let mut text = String::new();
        for line in self.lines() {
            for leaf in &self.node(line).children {
                match &self.node(*leaf).kind {
                    NodeKind::Text(run) => text.push_str(run),
                    NodeKind::Embed(_) => text.push(OBJECT_REPLACEMENT_CHARACTER),
                    _ => panic!("lines may only hold text and embed leaves"),
                }
            }
            text.push('\n');
        }
        text
    }

    /// Renders the structure as an indented tree, one node per row. Used by
    /// tests and debugging sessions to pin the exact shape of a document.
    pub fn to_tree(&self) -> String {
        let mut out = String::new();
        out.push_str("└>root\n");
        self.render_children(self.root, "  ", &mut out);
        out
    }

    fn render_children(&self, id: NodeId, prefix: &str, out: &mut String) {
        let children = &self.node(id).children;
        for (index, child) in children.iter().enumerate() {
            let last = index + 1 == children.len();
            out.push_str(prefix);
            out.push_str(if last { "└>" } else { "├>" });
            out.push_str(&self.describe(*child));
            out.push('\n');
            let child_prefix = format!("{prefix}{}", if last { "  " } else { "│ " });
            self.render_children(*child, &child_prefix, out);
        }
    }

    fn describe(&self, id: NodeId) -> String {
        let node = self.node(id);
        let style = if node.style.is_empty() {
            String::new()
        } else {
            format!(" [{}]", node.style)
        };
        match &node.kind {
            NodeKind::Root => "root".to_owned(),
            NodeKind::Block => match node.style.get(AttributeKey::Block) {
                Some(AttrValue::Str(kind)) => format!("block {kind:?}"),
                _ => "block".to_owned(),
            },
            NodeKind::Line => format!("line{style}"),
            NodeKind::Text(text) => format!("{text:?}{style}"),
            NodeKind::Embed(token) => format!("embed {:?}{style}", token.kind),
        }
    }

    /// Verifies the full set of structural invariants, panicking on the
    /// first violation. Compiled in only with the `assert-invariants`
    /// feature and run after every mutation.
    #[cfg(feature = "assert-invariants")]
    pub(crate) fn check_invariants(&self) {
        assert!(
            !self.lines().is_empty(),
            "a document always holds at least one line"
        );
        for (slot, entry) in self.nodes.iter().enumerate() {
            let Some(node) = entry else { continue };
            let id = NodeId(slot);
            for child in &node.children {
                assert_eq!(
                    self.node(*child).parent,
                    Some(id),
                    "child/parent back-references out of sync"
                );
            }
            if let Some(parent) = node.parent {
                assert!(
                    self.node(parent).children.contains(&id),
                    "node is missing from its parent's children"
                );
            }
            match &node.kind {
                NodeKind::Root => {
                    assert_eq!(node.parent, None, "the root has no parent");
                    for child in &node.children {
                        let kind = &self.node(*child).kind;
                        assert!(
                            matches!(kind, NodeKind::Line | NodeKind::Block),
                            "only lines and blocks may sit under the root"
                        );
                    }
                }
                NodeKind::Block => {
                    assert!(!node.children.is_empty(), "blocks are never empty");
                    let block_value = node.style.get(AttributeKey::Block);
                    assert!(block_value.is_some(), "blocks always carry a block attribute");
                    for child in &node.children {
                        let line = self.node(*child);
                        assert!(line.is_line(), "blocks may only hold lines");
                        assert_eq!(
                            line.style.get(AttributeKey::Block),
                            block_value,
                            "every line of a block shares its block attribute"
                        );
                    }
                }
                NodeKind::Line => {
                    for child in &node.children {
                        assert!(
                            self.node(*child).is_leaf(),
                            "lines may only hold text and embed leaves"
                        );
                    }
                }
                NodeKind::Text(text) => {
                    assert!(!text.is_empty(), "text leaves are never empty");
                    assert!(
                        !text.contains('\n'),
                        "text leaves never contain a line-break"
                    );
                    assert!(node.children.is_empty(), "leaves have no children");
                }
                NodeKind::Embed(_) => {
                    assert!(node.children.is_empty(), "leaves have no children");
                }
            }
        }
    }
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}
