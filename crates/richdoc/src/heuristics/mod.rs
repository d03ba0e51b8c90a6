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

//! Heuristic rules turning raw editing intents into normalized edit-scripts.
//!
//! A rule is a pure function over the current document snapshot and the
//! intent's arguments. Returning `None` means "not mine, ask the next rule";
//! returning a script decides the edit for good, and returning an *empty*
//! script vetoes it. Each intent has a fixed rule chain ending in a
//! catch-all, and the first non-`None` answer wins.
//!
//! Rules only ever read the flat edit-script form. They never see the tree,
//! so anything they decide must be expressible as retains, inserts and
//! deletes over document units.

mod delete_rules;
mod format_rules;
mod insert_rules;

pub use delete_rules::{CatchAllDeleteRule, RefuseBlockMergeRule};
pub use format_rules::{
    ApplyInlineFormatRule, ApplyLineFormatRule, LinkAtCaretRule, PassThroughFormatRule,
};
pub use insert_rules::{
    AutoExitBlockRule, AutoFormatLinksRule, CatchAllInsertRule, PreserveInlineStylesRule,
    PreserveLineStyleOnSplitRule, ResetLineFormatOnNewLineRule,
};

use edit_script::{EditScript, InsertContent, Operation};

use crate::style::Attribute;

/// Decides how inserting `content` at `index` turns into an edit-script.
pub trait InsertRule {
    fn apply(
        &self,
        document: &EditScript,
        index: usize,
        content: &InsertContent,
    ) -> Option<EditScript>;
}

/// Decides how deleting `length` units at `index` turns into an edit-script.
pub trait DeleteRule {
    fn apply(&self, document: &EditScript, index: usize, length: usize) -> Option<EditScript>;
}

/// Decides how applying `attribute` over a range turns into an edit-script.
pub trait FormatRule {
    fn apply(
        &self,
        document: &EditScript,
        index: usize,
        length: usize,
        attribute: &Attribute,
    ) -> Option<EditScript>;
}

/// The rule chains for the three editing intents.
///
/// [`Heuristics::new`] wires the default chains; tests exercising a single
/// rule start from [`Heuristics::empty`] and add just what they need. A
/// chain with no matching rule produces the empty script, which the
/// controller treats as a veto.
pub struct Heuristics {
    insert_rules: Vec<Box<dyn InsertRule>>,
    delete_rules: Vec<Box<dyn DeleteRule>>,
    format_rules: Vec<Box<dyn FormatRule>>,
}

impl Heuristics {
    pub fn new() -> Self {
        Self {
            insert_rules: vec![
                Box::new(AutoExitBlockRule),
                Box::new(ResetLineFormatOnNewLineRule),
                Box::new(PreserveLineStyleOnSplitRule),
                Box::new(AutoFormatLinksRule),
                Box::new(PreserveInlineStylesRule),
                Box::new(CatchAllInsertRule),
            ],
            delete_rules: vec![Box::new(RefuseBlockMergeRule), Box::new(CatchAllDeleteRule)],
            format_rules: vec![
                Box::new(LinkAtCaretRule),
                Box::new(ApplyLineFormatRule),
                Box::new(ApplyInlineFormatRule),
                Box::new(PassThroughFormatRule),
            ],
        }
    }

    pub fn empty() -> Self {
        Self {
            insert_rules: Vec::new(),
            delete_rules: Vec::new(),
            format_rules: Vec::new(),
        }
    }

    pub fn with_insert_rule(mut self, rule: impl InsertRule + 'static) -> Self {
        self.insert_rules.push(Box::new(rule));
        self
    }

    pub fn with_delete_rule(mut self, rule: impl DeleteRule + 'static) -> Self {
        self.delete_rules.push(Box::new(rule));
        self
    }

    pub fn with_format_rule(mut self, rule: impl FormatRule + 'static) -> Self {
        self.format_rules.push(Box::new(rule));
        self
    }

    pub fn apply_insert(
        &self,
        document: &EditScript,
        index: usize,
        content: &InsertContent,
    ) -> EditScript {
        for rule in &self.insert_rules {
            if let Some(script) = rule.apply(document, index, content) {
                return script.trim();
            }
        }
        EditScript::new()
    }

    pub fn apply_delete(&self, document: &EditScript, index: usize, length: usize) -> EditScript {
        for rule in &self.delete_rules {
            if let Some(script) = rule.apply(document, index, length) {
                return script.trim();
            }
        }
        EditScript::new()
    }

    pub fn apply_format(
        &self,
        document: &EditScript,
        index: usize,
        length: usize,
        attribute: &Attribute,
    ) -> EditScript {
        for rule in &self.format_rules {
            if let Some(script) = rule.apply(document, index, length, attribute) {
                return script.trim();
            }
        }
        EditScript::new()
    }
}

impl Default for Heuristics {
    fn default() -> Self {
        Self::new()
    }
}

/// The operation holding the unit at `position`, with the unit's offset
/// local to that operation. `None` past the end of the document.
pub(crate) fn op_at(document: &EditScript, position: usize) -> Option<(&Operation, usize)> {
    let mut start = 0;
    for op in document {
        let len = op.len();
        if position < start + len {
            return Some((op, position - start));
        }
        start += len;
    }
    None
}

/// Whether the unit at `position` is a line-break. Embeds are single
/// non-break units. `None` past the end of the document.
pub(crate) fn unit_is_line_break(document: &EditScript, position: usize) -> Option<bool> {
    let (op, local) = op_at(document, position)?;
    match op.as_text() {
        Some(text) => text.chars().nth(local).map(|character| character == '\n'),
        None => Some(false),
    }
}

#[cfg(test)]
mod tests {
    use edit_script::EmbedToken;

    use super::*;
    use crate::style::{AttributeKey, Style};

    fn document() -> EditScript {
        EditScript::new()
            .insert("ab")
            .insert_styled("\n", Style::from_iter([Attribute::heading(1)]).to_attributes())
            .insert_embed(EmbedToken::new("divider"))
            .insert("\n")
    }

    // ====== Chain plumbing ======

    #[test]
    fn an_empty_chain_vetoes_everything() {
        let heuristics = Heuristics::empty();
        let script = heuristics.apply_insert(&document(), 0, &"x".into());
        assert!(script.is_empty());
        let script = heuristics.apply_delete(&document(), 0, 1);
        assert!(script.is_empty());
        let script = heuristics.apply_format(&document(), 0, 1, &Attribute::bold());
        assert!(script.is_empty());
    }

    #[test]
    fn the_first_matching_rule_wins() {
        struct Veto;
        impl InsertRule for Veto {
            fn apply(&self, _: &EditScript, _: usize, _: &InsertContent) -> Option<EditScript> {
                Some(EditScript::new())
            }
        }
        let heuristics = Heuristics::empty()
            .with_insert_rule(Veto)
            .with_insert_rule(CatchAllInsertRule);
        let script = heuristics.apply_insert(&document(), 0, &"x".into());
        assert!(script.is_empty());
    }

    #[test]
    fn results_are_trimmed() {
        struct TrailingRetain;
        impl InsertRule for TrailingRetain {
            fn apply(&self, _: &EditScript, _: usize, _: &InsertContent) -> Option<EditScript> {
                Some(EditScript::new().insert("x").retain(3))
            }
        }
        let heuristics = Heuristics::empty().with_insert_rule(TrailingRetain);
        let script = heuristics.apply_insert(&document(), 0, &"x".into());
        assert_eq!(script, EditScript::new().insert("x"));
    }

    // ====== Unit probing ======

    #[test]
    fn op_at_resolves_positions_to_operations() {
        let document = document();
        let (op, local) = op_at(&document, 1).unwrap();
        assert_eq!(op.as_text(), Some("ab"));
        assert_eq!(local, 1);
        let (op, local) = op_at(&document, 3).unwrap();
        assert!(op.as_text().is_none());
        assert_eq!(local, 0);
        assert!(op_at(&document, 5).is_none());
    }

    #[test]
    fn unit_probing_distinguishes_breaks_text_and_embeds() {
        let document = document();
        assert_eq!(unit_is_line_break(&document, 0), Some(false));
        assert_eq!(unit_is_line_break(&document, 2), Some(true));
        assert_eq!(unit_is_line_break(&document, 3), Some(false));
        assert_eq!(unit_is_line_break(&document, 4), Some(true));
        assert_eq!(unit_is_line_break(&document, 5), None);
    }

    #[test]
    fn attribute_keys_match_their_wire_names() {
        let document = EditScript::new()
            .insert_styled("a", Style::from_iter([Attribute::bold()]).to_attributes())
            .insert("\n");
        let (op, _) = op_at(&document, 0).unwrap();
        assert!(op.has_attribute(AttributeKey::Bold.as_ref()));
    }
}
