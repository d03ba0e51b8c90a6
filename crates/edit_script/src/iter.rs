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

//! A cursor over an edit-script that can split operations at any character
//! boundary. Past the end of the script it yields plain retains, which is
//! what lets [`compose`](crate::EditScript::compose) and
//! [`transform`](crate::EditScript::transform) walk two scripts of different
//! lengths in lockstep.

use crate::op::{InsertContent, Operation};
use crate::script::EditScript;

pub struct OpIterator<'a> {
    ops: &'a [Operation],
    index: usize,
    offset: usize,
}

impl<'a> OpIterator<'a> {
    pub fn new(script: &'a EditScript) -> Self {
        Self {
            ops: script.ops(),
            index: 0,
            offset: 0,
        }
    }

    pub fn has_next(&self) -> bool {
        self.index < self.ops.len()
    }

    /// The operation the cursor currently sits in, whole.
    pub fn peek(&self) -> Option<&'a Operation> {
        self.ops.get(self.index)
    }

    /// Units left in the current operation, or `usize::MAX` when exhausted.
    pub fn peek_len(&self) -> usize {
        match self.ops.get(self.index) {
            Some(op) => op.len() - self.offset,
            None => usize::MAX,
        }
    }

    /// Consumes and returns the rest of the current operation.
    pub fn next_op(&mut self) -> Operation {
        self.next_len(usize::MAX)
    }

    /// Consumes up to `length` units of the current operation.
    pub fn next_len(&mut self, length: usize) -> Operation {
        let Some(op) = self.ops.get(self.index) else {
            return Operation::retain(length);
        };
        let remaining = op.len() - self.offset;
        let take = length.min(remaining);
        let result = match op {
            Operation::Insert {
                insert: InsertContent::Text(text),
                attributes,
            } => Operation::Insert {
                insert: InsertContent::Text(char_slice(text, self.offset, take)),
                attributes: attributes.clone(),
            },
            // An embed is a single unit; it is consumed whole.
            Operation::Insert { .. } => op.clone(),
            Operation::Retain { attributes, .. } => Operation::Retain {
                retain: take,
                attributes: attributes.clone(),
            },
            Operation::Delete { .. } => Operation::delete(take),
        };
        self.offset += take;
        if self.offset == op.len() {
            self.index += 1;
            self.offset = 0;
        }
        result
    }

    /// Consumes `length` units and returns the last, possibly partial,
    /// operation consumed. This is the probe for what sits immediately
    /// before a document position; `None` means the position is 0.
    pub fn skip(&mut self, length: usize) -> Option<Operation> {
        let mut remaining = length;
        let mut last = None;
        while remaining > 0 && self.has_next() {
            let take = remaining.min(self.peek_len());
            last = Some(self.next_len(take));
            remaining -= take;
        }
        last
    }
}

fn char_slice(text: &str, start: usize, len: usize) -> String {
    text.chars().skip(start).take(len).collect()
}
