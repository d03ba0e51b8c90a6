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

//! The edit-script itself: an ordered list of operations describing either a
//! whole document (insert-only) or a change to one.
//!
//! Scripts are kept in a canonical form by [`EditScript::push`]: zero-length
//! operations are dropped, adjacent inserts and retains with equal attributes
//! merge, consecutive deletes merge, and an insert pushed after a delete is
//! ordered before it. Canonical form is what makes structural equality of two
//! scripts mean "same effect", which the document engine leans on after every
//! mutation.

use serde::{Deserialize, Deserializer, Serialize};

use crate::attr::{compose_attributes, transform_attributes, Attributes};
use crate::iter::OpIterator;
use crate::op::{EmbedToken, InsertContent, Operation};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EditScript {
    ops: Vec<Operation>,
}

impl EditScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a script from raw operations, normalizing as it goes.
    pub fn from_ops(ops: impl IntoIterator<Item = Operation>) -> Self {
        let mut script = Self::new();
        for op in ops {
            script.push(op);
        }
        script
    }

    pub fn ops(&self) -> &[Operation] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Sum of all operation lengths. For an insert-only document script this
    /// is the document length.
    pub fn len(&self) -> usize {
        self.ops.iter().map(Operation::len).sum()
    }

    /// Length of the document this script applies to (retains + deletes).
    pub fn base_len(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| !op.is_insert())
            .map(Operation::len)
            .sum()
    }

    /// Length of the document this script produces (retains + inserts).
    pub fn target_len(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| !op.is_delete())
            .map(Operation::len)
            .sum()
    }

    /// True when every operation is an insert, i.e. the script describes a
    /// whole document rather than a change.
    pub fn is_document(&self) -> bool {
        self.ops.iter().all(Operation::is_insert)
    }

    /// Appends an operation, keeping the script canonical.
    pub fn push(&mut self, operation: Operation) {
        if operation.is_empty() {
            return;
        }
        let mut index = self.ops.len();
        if let Some(Operation::Delete { delete: tail }) = self.ops.last_mut() {
            match &operation {
                Operation::Delete { delete } => {
                    *tail += delete;
                    return;
                }
                // An insert and a delete at the same position have the same
                // effect in either order; keep the insert first.
                Operation::Insert { .. } => index -= 1,
                Operation::Retain { .. } => {}
            }
        }
        if index > 0 {
            match (&mut self.ops[index - 1], &operation) {
                (
                    Operation::Insert {
                        insert: InsertContent::Text(tail),
                        attributes: tail_attrs,
                    },
                    Operation::Insert {
                        insert: InsertContent::Text(text),
                        attributes,
                    },
                ) if tail_attrs == attributes => {
                    tail.push_str(text);
                    return;
                }
                (
                    Operation::Retain {
                        retain: tail,
                        attributes: tail_attrs,
                    },
                    Operation::Retain { retain, attributes },
                ) if tail_attrs == attributes => {
                    *tail += retain;
                    return;
                }
                _ => {}
            }
        }
        self.ops.insert(index, operation);
    }

    pub fn insert(mut self, content: impl Into<InsertContent>) -> Self {
        self.push(Operation::insert(content));
        self
    }

    pub fn insert_styled(
        mut self,
        content: impl Into<InsertContent>,
        attributes: Attributes,
    ) -> Self {
        self.push(Operation::insert_styled(content, attributes));
        self
    }

    pub fn insert_embed(self, token: EmbedToken) -> Self {
        self.insert(InsertContent::Embed(token))
    }

    pub fn retain(mut self, count: usize) -> Self {
        self.push(Operation::retain(count));
        self
    }

    pub fn retain_styled(mut self, count: usize, attributes: Attributes) -> Self {
        self.push(Operation::retain_styled(count, attributes));
        self
    }

    pub fn delete(mut self, count: usize) -> Self {
        self.push(Operation::delete(count));
        self
    }

    /// Drops a trailing plain retain, which never changes a script's effect.
    pub fn trim(mut self) -> Self {
        if let Some(Operation::Retain { attributes, .. }) = self.ops.last() {
            if attributes.is_empty() {
                self.ops.pop();
            }
        }
        self
    }

    /// Appends all of `other`'s operations.
    pub fn concat(mut self, other: EditScript) -> Self {
        for op in other.ops {
            self.push(op);
        }
        self
    }

    /// Returns the script equivalent to applying `self` and then `other`.
    pub fn compose(&self, other: &EditScript) -> EditScript {
        let mut this_iter = OpIterator::new(self);
        let mut other_iter = OpIterator::new(other);
        let mut result = EditScript::new();
        while this_iter.has_next() || other_iter.has_next() {
            if other_iter.peek().is_some_and(Operation::is_insert) {
                result.push(other_iter.next_op());
                continue;
            }
            if this_iter.peek().is_some_and(Operation::is_delete) {
                result.push(this_iter.next_op());
                continue;
            }
            // Here this_op is an insert or retain, other_op a retain or
            // delete, possibly the implicit retain past either script's end.
            let length = this_iter.peek_len().min(other_iter.peek_len());
            let this_op = this_iter.next_len(length);
            let other_op = other_iter.next_len(length);
            if other_op.is_delete() {
                if this_op.is_retain() {
                    result.push(Operation::delete(length));
                }
                // Deleting freshly inserted content cancels out entirely.
                continue;
            }
            let attributes = compose_attributes(
                this_op.attributes(),
                other_op.attributes(),
                this_op.is_retain(),
            );
            if let Operation::Insert { insert, .. } = this_op {
                result.push(Operation::Insert { insert, attributes });
            } else {
                result.push(Operation::Retain {
                    retain: length,
                    attributes,
                });
            }
        }
        result.trim()
    }

    /// Transforms `other` against `self` so it can apply after `self` did.
    /// With `priority`, `self`'s operations win position ties and conflicting
    /// attribute keys.
    pub fn transform(&self, other: &EditScript, priority: bool) -> EditScript {
        let mut this_iter = OpIterator::new(self);
        let mut other_iter = OpIterator::new(other);
        let mut result = EditScript::new();
        while this_iter.has_next() || other_iter.has_next() {
            let this_inserts = this_iter.peek().is_some_and(Operation::is_insert);
            let other_inserts = other_iter.peek().is_some_and(Operation::is_insert);
            if this_inserts && (priority || !other_inserts) {
                result.push(Operation::retain(this_iter.next_op().len()));
                continue;
            }
            if other_inserts {
                result.push(other_iter.next_op());
                continue;
            }
            let length = this_iter.peek_len().min(other_iter.peek_len());
            let this_op = this_iter.next_len(length);
            let other_op = other_iter.next_len(length);
            if this_op.is_delete() {
                // other's changes to content self already deleted vanish.
                continue;
            }
            if other_op.is_delete() {
                result.push(Operation::delete(length));
                continue;
            }
            result.push(Operation::Retain {
                retain: length,
                attributes: transform_attributes(
                    this_op.attributes(),
                    other_op.attributes(),
                    priority,
                ),
            });
        }
        result.trim()
    }

    /// Maps a document position through this script. With `priority`, an
    /// insert landing exactly at `index` does not push the position along.
    pub fn transform_position(&self, index: usize, priority: bool) -> usize {
        let mut index = index;
        let mut offset = 0;
        for op in &self.ops {
            if offset > index {
                break;
            }
            match op {
                Operation::Delete { delete } => {
                    index -= (*delete).min(index - offset);
                }
                Operation::Insert { .. } => {
                    let length = op.len();
                    if offset < index || !priority {
                        index += length;
                    }
                    offset += length;
                }
                Operation::Retain { retain, .. } => offset += retain,
            }
        }
        index
    }
}

impl FromIterator<Operation> for EditScript {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        Self::from_ops(iter)
    }
}

impl<'a> IntoIterator for &'a EditScript {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

// Deserializing goes through `from_ops` so wire input is normalized on
// ingest: zero-length and mergeable operations never reach the engine.
impl<'de> Deserialize<'de> for EditScript {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ops = Vec::<Operation>::deserialize(deserializer)?;
        Ok(EditScript::from_ops(ops))
    }
}
