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

//! Mutations of the document tree.
//!
//! The three operations here are the tree-side counterparts of edit-script
//! composition: applying a script's operations through them must leave the
//! tree serializing back to exactly the composed script. Styles are applied
//! verbatim, with no filtering by attribute scope; scope only matters to the
//! heuristics that build scripts, never to the tree that plays them.

use edit_script::{AttrValue, EmbedToken, InsertContent};

use crate::error::DocumentError;
use crate::style::{Attribute, AttributeKey, Style};
use crate::tree::node::{Node, NodeId, NodeKind};
use crate::tree::DocumentTree;

impl DocumentTree {
    /// Inserts content at `offset`, splitting leaves and lines as needed.
    ///
    /// Text containing line-breaks splits the target line once per break;
    /// each new break takes the insert style as its line style, and the
    /// remainder of the split line keeps the style it had. Inserting at
    /// `offset == len` appends whole trailing lines instead; only raw
    /// composition can address that position.
    pub fn insert(
        &mut self,
        offset: usize,
        content: &InsertContent,
        style: &Style,
    ) -> Result<(), DocumentError> {
        let length = self.len();
        if offset > length {
            return Err(DocumentError::OutOfRange {
                index: offset,
                length: 0,
                document_length: length,
            });
        }
        if offset == length {
            self.append_lines(content, style);
        } else {
            let (line, local) = self.locate_line(offset)?;
            match content {
                InsertContent::Text(text) => self.insert_text(line, local, text, style),
                InsertContent::Embed(token) => self.insert_embed(line, local, token, style),
            }
        }
        self.normalize();
        #[cfg(feature = "assert-invariants")]
        self.check_invariants();
        Ok(())
    }

    /// Deletes `length` units starting at `offset`.
    ///
    /// Deleting a line-break merges its line into the following one, and the
    /// following line's style survives the merge. The final line-break can
    /// never be deleted; asking to is an internal-consistency failure and
    /// panics.
    pub fn delete(&mut self, offset: usize, length: usize) -> Result<(), DocumentError> {
        let document_length = self.len();
        if offset + length > document_length {
            return Err(DocumentError::OutOfRange {
                index: offset,
                length,
                document_length,
            });
        }
        let mut remaining = length;
        while remaining > 0 {
            let (line, local) = self.locate_line(offset)?;
            let content_len = self.node_len(line) - 1;
            if local < content_len {
                remaining -= self.delete_in_leaf(line, local, remaining);
            } else {
                self.merge_line_into_next(line);
                remaining -= 1;
            }
        }
        self.normalize();
        #[cfg(feature = "assert-invariants")]
        self.check_invariants();
        Ok(())
    }

    /// Merges `style` onto every unit of the range: covered leaves take it
    /// onto their leaf style, covered line-breaks onto their line style. A
    /// null value removes the key.
    pub fn retain(
        &mut self,
        offset: usize,
        length: usize,
        style: &Style,
    ) -> Result<(), DocumentError> {
        let document_length = self.len();
        if offset + length > document_length {
            return Err(DocumentError::OutOfRange {
                index: offset,
                length,
                document_length,
            });
        }
        if style.is_empty() {
            return Ok(());
        }
        let mut cursor = offset;
        let end = offset + length;
        while cursor < end {
            let (line, local) = self.locate_line(cursor)?;
            let content_len = self.node_len(line) - 1;
            if local < content_len {
                let span = (end - cursor).min(content_len - local);
                let first = self.split_leaves_at(line, local);
                let after = self.split_leaves_at(line, local + span);
                let covered = self.node(line).children[first..after].to_vec();
                for leaf in covered {
                    let merged = self.node(leaf).style.merge(style);
                    self.node_mut(leaf).style = merged;
                }
                cursor += span;
            } else {
                let merged = self.node(line).style.merge(style);
                self.node_mut(line).style = merged;
                cursor += 1;
            }
        }
        self.normalize();
        #[cfg(feature = "assert-invariants")]
        self.check_invariants();
        Ok(())
    }

    /// Drops the final line when it is empty and unstyled and not the only
    /// line. Loading a document plays its script into a tree that already
    /// holds one empty line, which ends up as this artifact at the end.
    pub(crate) fn remove_trailing_empty_line(&mut self) -> bool {
        let lines = self.lines();
        if lines.len() < 2 {
            return false;
        }
        let last = *lines.last().expect("just checked there are two");
        let node = self.node(last);
        if !node.children.is_empty() || !node.style.is_empty() {
            return false;
        }
        self.remove_line(last);
        self.normalize();
        #[cfg(feature = "assert-invariants")]
        self.check_invariants();
        true
    }

    fn insert_text(&mut self, line: NodeId, local: usize, text: &str, style: &Style) {
        match text.find('\n') {
            None => {
                if !text.is_empty() {
                    let leaf = self.alloc(Node::with_style(
                        NodeKind::Text(text.to_owned()),
                        style.clone(),
                    ));
                    self.insert_leaf(line, local, leaf);
                }
            }
            Some(break_index) => {
                let head = &text[..break_index];
                let rest = &text[break_index + 1..];
                let head_len = head.chars().count();
                if !head.is_empty() {
                    let leaf = self.alloc(Node::with_style(
                        NodeKind::Text(head.to_owned()),
                        style.clone(),
                    ));
                    self.insert_leaf(line, local, leaf);
                }
                // The inserted break terminates the first half, so the first
                // half takes the insert style; the second half keeps the
                // line's own style, still terminated by the line's own break.
                let next = self.split_line(line, local + head_len);
                self.node_mut(line).style = style.clone();
                self.insert_text(next, 0, rest, style);
            }
        }
    }

    fn insert_embed(&mut self, line: NodeId, local: usize, token: &EmbedToken, style: &Style) {
        let leaf = self.alloc(Node::with_style(NodeKind::Embed(token.clone()), style.clone()));
        self.insert_leaf(line, local, leaf);
    }

    fn insert_leaf(&mut self, line: NodeId, local: usize, leaf: NodeId) {
        let index = self.split_leaves_at(line, local);
        self.node_mut(line).children.insert(index, leaf);
        self.node_mut(leaf).parent = Some(line);
    }

    /// Guarantees a child boundary at the line-local offset, splitting a
    /// text leaf when the offset falls inside one, and returns the child
    /// index of that boundary. `local` must be within the line's content.
    fn split_leaves_at(&mut self, line: NodeId, local: usize) -> usize {
        let mut start = 0;
        let children = self.node(line).children.clone();
        for (index, child) in children.iter().enumerate() {
            if local == start {
                return index;
            }
            let child_len = self.node_len(*child);
            if local < start + child_len {
                let right = self.split_text_leaf(*child, local - start);
                self.node_mut(line).children.insert(index + 1, right);
                return index + 1;
            }
            start += child_len;
        }
        children.len()
    }

    /// Splits a text leaf at a character offset strictly inside it, leaving
    /// the head in place and returning the allocated tail.
    fn split_text_leaf(&mut self, leaf: NodeId, at: usize) -> NodeId {
        let NodeKind::Text(text) = &self.node(leaf).kind else {
            panic!("only text leaves can be split");
        };
        let head: String = text.chars().take(at).collect();
        let tail: String = text.chars().skip(at).collect();
        let style = self.node(leaf).style.clone();
        let parent = self.node(leaf).parent;
        self.node_mut(leaf).kind = NodeKind::Text(head);
        let right = self.alloc(Node::with_style(NodeKind::Text(tail), style));
        self.node_mut(right).parent = parent;
        right
    }

    /// Splits a line at a content-local offset: a new line is created right
    /// after it under the same parent, taking the leaves from the boundary
    /// on and inheriting the split line's style.
    fn split_line(&mut self, line: NodeId, at: usize) -> NodeId {
        let index = self.split_leaves_at(line, at);
        let moved = self.node_mut(line).children.split_off(index);
        let style = self.node(line).style.clone();
        let parent = self.node(line).parent.expect("lines always have a parent");
        let next = self.alloc(Node::with_style(NodeKind::Line, style));
        self.node_mut(next).parent = Some(parent);
        for child in &moved {
            self.node_mut(*child).parent = Some(next);
        }
        self.node_mut(next).children = moved;
        let position = self
            .node(parent)
            .children
            .iter()
            .position(|child| *child == line)
            .expect("a line is always among its parent's children");
        self.node_mut(parent).children.insert(position + 1, next);
        next
    }

    /// Appends whole lines at the document end. An unterminated trailing
    /// segment (or an embed, which has no break of its own) still becomes a
    /// line here; composition's consistency check rejects such scripts.
    fn append_lines(&mut self, content: &InsertContent, style: &Style) {
        match content {
            InsertContent::Text(text) => {
                let mut segments = text.split('\n').peekable();
                while let Some(segment) = segments.next() {
                    let terminated = segments.peek().is_some();
                    if !terminated && segment.is_empty() {
                        break;
                    }
                    self.append_line(segment, style);
                }
            }
            InsertContent::Embed(token) => {
                let line = self.alloc(Node::with_style(NodeKind::Line, style.clone()));
                let leaf = self.alloc(Node::with_style(
                    NodeKind::Embed(token.clone()),
                    style.clone(),
                ));
                self.node_mut(leaf).parent = Some(line);
                self.node_mut(line).children.push(leaf);
                self.attach_to_root(line);
            }
        }
    }

    fn append_line(&mut self, text: &str, style: &Style) {
        let line = self.alloc(Node::with_style(NodeKind::Line, style.clone()));
        if !text.is_empty() {
            let leaf = self.alloc(Node::with_style(
                NodeKind::Text(text.to_owned()),
                style.clone(),
            ));
            self.node_mut(leaf).parent = Some(line);
            self.node_mut(line).children.push(leaf);
        }
        self.attach_to_root(line);
    }

    fn attach_to_root(&mut self, line: NodeId) {
        let root = self.root;
        self.node_mut(line).parent = Some(root);
        self.node_mut(root).children.push(line);
    }

    /// Deletes up to `remaining` units inside the leaf at the line-local
    /// offset and reports how many were consumed.
    fn delete_in_leaf(&mut self, line: NodeId, local: usize, remaining: usize) -> usize {
        let (leaf, leaf_local) = self
            .leaf_at(line, local)
            .expect("content offsets always fall inside a leaf");
        match &self.node(leaf).kind {
            NodeKind::Embed(_) => {
                self.remove_leaf(leaf);
                1
            }
            NodeKind::Text(text) => {
                let leaf_len = text.chars().count();
                let taken = remaining.min(leaf_len - leaf_local);
                let kept: String = text
                    .chars()
                    .take(leaf_local)
                    .chain(text.chars().skip(leaf_local + taken))
                    .collect();
                if kept.is_empty() {
                    self.remove_leaf(leaf);
                } else {
                    self.node_mut(leaf).kind = NodeKind::Text(kept);
                }
                taken
            }
            _ => panic!("lines may only hold text and embed leaves"),
        }
    }

    /// Removes a line's terminating break by merging its leaves into the
    /// front of the following line. The following line's style wins: the
    /// deleted break styled the first line, and that style goes with it.
    fn merge_line_into_next(&mut self, line: NodeId) {
        let lines = self.lines();
        let position = lines
            .iter()
            .position(|candidate| *candidate == line)
            .expect("a line is always among the document's lines");
        let Some(next) = lines.get(position + 1).copied() else {
            panic!("cannot remove the document's final line break");
        };
        let moved = std::mem::take(&mut self.node_mut(line).children);
        for child in &moved {
            self.node_mut(*child).parent = Some(next);
        }
        let mut combined = moved;
        combined.extend(self.node(next).children.iter().copied());
        self.node_mut(next).children = combined;
        self.remove_line(line);
    }

    fn remove_leaf(&mut self, leaf: NodeId) {
        let parent = self.node(leaf).parent.expect("leaves always have a parent");
        self.node_mut(parent).children.retain(|child| *child != leaf);
        self.release(leaf);
    }

    fn remove_line(&mut self, line: NodeId) {
        let parent = self.node(line).parent.expect("lines always have a parent");
        self.node_mut(parent).children.retain(|child| *child != line);
        self.release(line);
    }

    /// Re-establishes the structural invariants the edit-script form cannot
    /// express: adjacent equal-styled text runs are one leaf, and
    /// consecutive lines sharing a `block` value sit under one block.
    fn normalize(&mut self) {
        self.merge_adjacent_leaves();
        self.regroup_blocks();
    }

    fn merge_adjacent_leaves(&mut self) {
        for line in self.lines() {
            let mut index = 1;
            while index < self.node(line).children.len() {
                let prev = self.node(line).children[index - 1];
                let curr = self.node(line).children[index];
                let tail = match (&self.node(prev).kind, &self.node(curr).kind) {
                    (NodeKind::Text(_), NodeKind::Text(tail))
                        if self.node(prev).style == self.node(curr).style =>
                    {
                        Some(tail.clone())
                    }
                    _ => None,
                };
                match tail {
                    Some(tail) => {
                        if let NodeKind::Text(head) = &mut self.node_mut(prev).kind {
                            head.push_str(&tail);
                        }
                        self.node_mut(line).children.remove(index);
                        self.release(curr);
                    }
                    None => index += 1,
                }
            }
        }
    }

    /// Rebuilds the block layer from the lines' `block` attributes: maximal
    /// runs of lines sharing a value go under one block node, everything
    /// else sits directly under the root.
    fn regroup_blocks(&mut self) {
        let lines = self.lines();
        let former = self.node(self.root).children.clone();
        for child in former {
            if self.node(child).is_block() {
                self.release(child);
            }
        }
        let mut rebuilt: Vec<NodeId> = Vec::new();
        let mut open_block: Option<(AttrValue, NodeId)> = None;
        for line in lines {
            let block_value = self.node(line).style.get(AttributeKey::Block).cloned();
            match block_value {
                None => {
                    self.node_mut(line).parent = Some(self.root);
                    rebuilt.push(line);
                    open_block = None;
                }
                Some(value) => {
                    let continues = open_block
                        .as_ref()
                        .is_some_and(|(open_value, _)| *open_value == value);
                    if !continues {
                        let style: Style = [Attribute {
                            key: AttributeKey::Block,
                            value: value.clone(),
                        }]
                        .into_iter()
                        .collect();
                        let block = self.alloc(Node::with_style(NodeKind::Block, style));
                        self.node_mut(block).parent = Some(self.root);
                        rebuilt.push(block);
                        open_block = Some((value, block));
                    }
                    let block = open_block.as_ref().expect("a block is open here").1;
                    self.node_mut(line).parent = Some(block);
                    self.node_mut(block).children.push(line);
                }
            }
        }
        self.node_mut(self.root).children = rebuilt;
    }
}
