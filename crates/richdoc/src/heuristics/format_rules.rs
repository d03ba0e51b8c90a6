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

use crate::heuristics::{op_at, unit_is_line_break, FormatRule};
use crate::style::{Attribute, AttributeKey, AttributeScope};

/// Formatting the link attribute at a caret re-styles the linked span the
/// caret sits in or touches, on both sides. With no linked neighbour there is
/// nothing to extend, and the rule leaves the intent to the inline rule,
/// where a zero-length range normalizes to a veto.
pub struct LinkAtCaretRule;

impl FormatRule for LinkAtCaretRule {
    fn apply(
        &self,
        document: &EditScript,
        index: usize,
        length: usize,
        attribute: &Attribute,
    ) -> Option<EditScript> {
        if attribute.key != AttributeKey::Link || length != 0 {
            return None;
        }
        let link_key = AttributeKey::Link.as_ref();
        let before_len = if index > 0 {
            op_at(document, index - 1)
                .filter(|(op, _)| op.has_attribute(link_key))
                .map_or(0, |(_, local)| local + 1)
        } else {
            0
        };
        let after_len = op_at(document, index)
            .filter(|(op, _)| op.has_attribute(link_key))
            .map_or(0, |(op, local)| op.len() - local);
        if before_len == 0 && after_len == 0 {
            return None;
        }
        Some(
            EditScript::new()
                .retain(index - before_len)
                .retain_styled(before_len + after_len, attribute.to_attributes()),
        )
    }
}

/// Applies a line-scope attribute: every break in the range takes it, the
/// text between them is left untouched. The first break beyond the range is
/// stamped as well, so a selection ending mid-line still re-styles that whole
/// line.
pub struct ApplyLineFormatRule;

impl FormatRule for ApplyLineFormatRule {
    fn apply(
        &self,
        document: &EditScript,
        index: usize,
        length: usize,
        attribute: &Attribute,
    ) -> Option<EditScript> {
        if attribute.scope() != AttributeScope::Line {
            return None;
        }
        let mut script = EditScript::new().retain(index);
        for position in index..index + length {
            script = if unit_is_line_break(document, position) == Some(true) {
                script.retain_styled(1, attribute.to_attributes())
            } else {
                script.retain(1)
            };
        }
        let mut beyond = 0;
        loop {
            match unit_is_line_break(document, index + length + beyond) {
                None => break,
                Some(true) => {
                    script = script
                        .retain(beyond)
                        .retain_styled(1, attribute.to_attributes());
                    break;
                }
                Some(false) => beyond += 1,
            }
        }
        Some(script)
    }
}

/// Applies an inline-scope attribute: every non-break unit in the range takes
/// it, breaks are left untouched.
pub struct ApplyInlineFormatRule;

impl FormatRule for ApplyInlineFormatRule {
    fn apply(
        &self,
        document: &EditScript,
        index: usize,
        length: usize,
        attribute: &Attribute,
    ) -> Option<EditScript> {
        if attribute.scope() != AttributeScope::Inline {
            return None;
        }
        let mut script = EditScript::new().retain(index);
        for position in index..index + length {
            script = if unit_is_line_break(document, position) == Some(false) {
                script.retain_styled(1, attribute.to_attributes())
            } else {
                script.retain(1)
            };
        }
        Some(script)
    }
}

/// The fallback: retain the range with the attribute as given. Embed-scope
/// attributes land here.
pub struct PassThroughFormatRule;

impl FormatRule for PassThroughFormatRule {
    fn apply(
        &self,
        _document: &EditScript,
        index: usize,
        length: usize,
        attribute: &Attribute,
    ) -> Option<EditScript> {
        Some(
            EditScript::new()
                .retain(index)
                .retain_styled(length, attribute.to_attributes()),
        )
    }
}
