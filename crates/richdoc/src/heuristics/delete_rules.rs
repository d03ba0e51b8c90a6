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

use edit_script::EditScript;

use crate::heuristics::{op_at, unit_is_line_break, DeleteRule};
use crate::style::AttributeKey;

/// Deleting exactly the break between two lines whose `block` entries differ
/// is vetoed: the merge would strand block formatting on half the result.
/// The caller clears the block format first, then merges.
pub struct RefuseBlockMergeRule;

impl DeleteRule for RefuseBlockMergeRule {
    fn apply(&self, document: &EditScript, index: usize, length: usize) -> Option<EditScript> {
        if length != 1 {
            return None;
        }
        if unit_is_line_break(document, index) != Some(true) {
            return None;
        }
        let (deleted, _) = op_at(document, index)?;
        let mut position = index + 1;
        let next = loop {
            match unit_is_line_break(document, position) {
                // The final break merges with nothing; the catch-all's clamp
                // deals with it.
                None => return None,
                Some(true) => break op_at(document, position)?.0,
                Some(false) => position += 1,
            }
        };
        let block_key = AttributeKey::Block.as_ref();
        if deleted.attributes().get(block_key) == next.attributes().get(block_key) {
            return None;
        }
        Some(EditScript::new())
    }
}

/// The fallback: delete the range, shortened so the document's final break
/// survives. A delete clamped down to nothing is a veto.
pub struct CatchAllDeleteRule;

impl DeleteRule for CatchAllDeleteRule {
    fn apply(&self, document: &EditScript, index: usize, length: usize) -> Option<EditScript> {
        let available = document.target_len().saturating_sub(1).saturating_sub(index);
        let effective = length.min(available);
        if effective == 0 {
            return Some(EditScript::new());
        }
        Some(EditScript::new().retain(index).delete(effective))
    }
}
