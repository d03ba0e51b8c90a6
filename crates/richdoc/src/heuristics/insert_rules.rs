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

use std::str::FromStr;

use edit_script::{AttrValue, Attributes, EditScript, InsertContent};
use email_address::EmailAddress;
use url::Url;

use crate::heuristics::{op_at, unit_is_line_break, InsertRule};
use crate::style::{Attribute, AttributeKey};

/// Pressing Enter on an empty line of a block leaves the block instead of
/// growing it: the line's break loses its `block` entry and nothing is
/// inserted.
pub struct AutoExitBlockRule;

impl InsertRule for AutoExitBlockRule {
    fn apply(
        &self,
        document: &EditScript,
        index: usize,
        content: &InsertContent,
    ) -> Option<EditScript> {
        if content.as_text() != Some("\n") {
            return None;
        }
        if unit_is_line_break(document, index) != Some(true) {
            return None;
        }
        let (target, _) = op_at(document, index)?;
        if !target.has_attribute(AttributeKey::Block.as_ref()) {
            return None;
        }
        let on_empty_line = index == 0 || unit_is_line_break(document, index - 1) == Some(true);
        if !on_empty_line {
            return None;
        }
        Some(
            EditScript::new()
                .retain(index)
                .retain_styled(1, Attribute::unset(AttributeKey::Block).to_attributes()),
        )
    }
}

/// Pressing Enter at the end of a line keeps that line's format and opens a
/// plain continuation: the new break takes the old break's attributes, and a
/// heading does not carry over to the pushed-down line.
pub struct ResetLineFormatOnNewLineRule;

impl InsertRule for ResetLineFormatOnNewLineRule {
    fn apply(
        &self,
        document: &EditScript,
        index: usize,
        content: &InsertContent,
    ) -> Option<EditScript> {
        if content.as_text() != Some("\n") {
            return None;
        }
        if unit_is_line_break(document, index) != Some(true) {
            return None;
        }
        let (target, _) = op_at(document, index)?;
        let mut script = EditScript::new()
            .retain(index)
            .insert_styled("\n", target.attributes().clone());
        if target.has_attribute(AttributeKey::Heading.as_ref()) {
            script = script.retain_styled(1, Attribute::unset(AttributeKey::Heading).to_attributes());
        }
        Some(script)
    }
}

/// Pressing Enter in the middle of a line gives both halves the line's
/// format: the new break copies the attributes of the line's own break.
pub struct PreserveLineStyleOnSplitRule;

impl InsertRule for PreserveLineStyleOnSplitRule {
    fn apply(
        &self,
        document: &EditScript,
        index: usize,
        content: &InsertContent,
    ) -> Option<EditScript> {
        if content.as_text() != Some("\n") {
            return None;
        }
        let mut position = index;
        let attributes = loop {
            match unit_is_line_break(document, position) {
                None => break Attributes::new(),
                Some(true) => {
                    let (op, _) = op_at(document, position)?;
                    break op.attributes().clone();
                }
                Some(false) => position += 1,
            }
        };
        Some(EditScript::new().retain(index).insert_styled("\n", attributes))
    }
}

/// Typing a space right after a word that reads as an http(s) URL or an
/// email address links the word. Already-linked words are left alone.
pub struct AutoFormatLinksRule;

impl InsertRule for AutoFormatLinksRule {
    fn apply(
        &self,
        document: &EditScript,
        index: usize,
        content: &InsertContent,
    ) -> Option<EditScript> {
        if content.as_text() != Some(" ") {
            return None;
        }
        if index == 0 {
            return None;
        }
        let (previous, local) = op_at(document, index - 1)?;
        let text = previous.as_text()?;
        if previous.has_attribute(AttributeKey::Link.as_ref()) {
            return None;
        }
        let head: String = text.chars().take(local + 1).collect();
        let candidate = head
            .split('\n')
            .next_back()
            .and_then(|line| line.split(' ').next_back())
            .filter(|word| !word.is_empty())?;
        let link = match Url::parse(candidate) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url.to_string(),
            _ => {
                EmailAddress::from_str(candidate).ok()?;
                format!("mailto:{candidate}")
            }
        };
        let word_len = candidate.chars().count();
        let mut linked = previous.attributes().clone();
        linked.insert(AttributeKey::Link.as_ref().to_owned(), AttrValue::Str(link));
        Some(
            EditScript::new()
                .retain(index - word_len)
                .retain_styled(word_len, linked)
                .insert_styled(" ", previous.attributes().clone()),
        )
    }
}

/// Typed text inherits the inline attributes of the character before the
/// caret. A link is inherited only while typing strictly inside one, when
/// the characters on both sides carry the same target.
pub struct PreserveInlineStylesRule;

impl InsertRule for PreserveInlineStylesRule {
    fn apply(
        &self,
        document: &EditScript,
        index: usize,
        content: &InsertContent,
    ) -> Option<EditScript> {
        let text = content.as_text()?;
        if text.contains('\n') || index == 0 {
            return None;
        }
        let (previous, _) = op_at(document, index - 1)?;
        let previous_text = previous.as_text()?;
        if previous_text.contains('\n') {
            return None;
        }
        let attributes = previous.attributes();
        if attributes.is_empty() {
            return None;
        }
        let link_key = AttributeKey::Link.as_ref();
        if !attributes.contains_key(link_key) {
            return Some(
                EditScript::new()
                    .retain(index)
                    .insert_styled(text, attributes.clone()),
            );
        }
        let same_link_after = op_at(document, index)
            .is_some_and(|(after, _)| after.attributes().get(link_key) == attributes.get(link_key));
        let kept = if same_link_after {
            attributes.clone()
        } else {
            let mut without_link = attributes.clone();
            without_link.remove(link_key);
            without_link
        };
        Some(EditScript::new().retain(index).insert_styled(text, kept))
    }
}

/// The fallback: insert the content verbatim, unstyled.
pub struct CatchAllInsertRule;

impl InsertRule for CatchAllInsertRule {
    fn apply(
        &self,
        _document: &EditScript,
        index: usize,
        content: &InsertContent,
    ) -> Option<EditScript> {
        Some(EditScript::new().retain(index).insert(content.clone()))
    }
}

#[cfg(test)]
mod tests {
    use edit_script::EmbedToken;

    use super::*;
    use crate::style::{BlockFormat, Style};

    fn attrs_of(attributes: &[Attribute]) -> edit_script::Attributes {
        Style::from_iter(attributes.iter().cloned()).to_attributes()
    }

    fn quote() -> edit_script::Attributes {
        attrs_of(&[Attribute::block(BlockFormat::Quote)])
    }

    fn heading() -> edit_script::Attributes {
        attrs_of(&[Attribute::heading(1)])
    }

    // ====== Auto-exit block ======

    #[test]
    fn enter_on_an_empty_block_line_unsets_the_block() {
        let document = EditScript::new().insert("ab\n").insert_styled("\n", quote());
        let script = AutoExitBlockRule.apply(&document, 3, &"\n".into()).unwrap();
        assert_eq!(
            script,
            EditScript::new()
                .retain(3)
                .retain_styled(1, attrs_of(&[Attribute::unset(AttributeKey::Block)]))
        );
    }

    #[test]
    fn enter_on_a_non_empty_block_line_is_not_an_exit() {
        let document = EditScript::new().insert("ab").insert_styled("\n", quote());
        assert!(AutoExitBlockRule.apply(&document, 2, &"\n".into()).is_none());
        assert!(AutoExitBlockRule.apply(&document, 1, &"\n".into()).is_none());
    }

    #[test]
    fn enter_outside_a_block_is_not_an_exit() {
        let document = EditScript::new().insert("\n");
        assert!(AutoExitBlockRule.apply(&document, 0, &"\n".into()).is_none());
    }

    // ====== Reset line format on new line ======

    #[test]
    fn enter_at_the_end_of_a_heading_keeps_it_and_opens_a_plain_line() {
        let document = EditScript::new().insert("ab").insert_styled("\n", heading());
        let script = ResetLineFormatOnNewLineRule
            .apply(&document, 2, &"\n".into())
            .unwrap();
        assert_eq!(
            script,
            EditScript::new()
                .retain(2)
                .insert_styled("\n", heading())
                .retain_styled(1, attrs_of(&[Attribute::unset(AttributeKey::Heading)]))
        );
    }

    #[test]
    fn enter_at_the_end_of_a_block_line_stays_in_the_block() {
        let document = EditScript::new().insert("ab").insert_styled("\n", quote());
        let script = ResetLineFormatOnNewLineRule
            .apply(&document, 2, &"\n".into())
            .unwrap();
        assert_eq!(
            script,
            EditScript::new().retain(2).insert_styled("\n", quote())
        );
    }

    #[test]
    fn enter_mid_line_is_not_an_end_of_line_enter() {
        let document = EditScript::new().insert("ab\n");
        assert!(ResetLineFormatOnNewLineRule
            .apply(&document, 1, &"\n".into())
            .is_none());
    }

    // ====== Preserve line style on split ======

    #[test]
    fn splitting_a_heading_line_formats_both_halves() {
        let document = EditScript::new().insert("ab").insert_styled("\n", heading());
        let script = PreserveLineStyleOnSplitRule
            .apply(&document, 1, &"\n".into())
            .unwrap();
        assert_eq!(
            script,
            EditScript::new().retain(1).insert_styled("\n", heading())
        );
    }

    #[test]
    fn splitting_only_handles_lone_line_breaks() {
        let document = EditScript::new().insert("ab\n");
        assert!(PreserveLineStyleOnSplitRule
            .apply(&document, 1, &"x".into())
            .is_none());
    }

    // ====== Auto-format links ======

    #[test]
    fn a_space_after_a_url_links_the_word() {
        let document = EditScript::new().insert("see https://matrix.org/hello\n");
        let script = AutoFormatLinksRule.apply(&document, 28, &" ".into()).unwrap();
        assert_eq!(
            script,
            EditScript::new()
                .retain(4)
                .retain_styled(24, attrs_of(&[Attribute::link("https://matrix.org/hello")]))
                .insert(" ")
        );
    }

    #[test]
    fn a_space_after_an_email_links_it_as_mailto() {
        let document = EditScript::new().insert("mail bob@matrix.org\n");
        let script = AutoFormatLinksRule.apply(&document, 19, &" ".into()).unwrap();
        assert_eq!(
            script,
            EditScript::new()
                .retain(5)
                .retain_styled(14, attrs_of(&[Attribute::link("mailto:bob@matrix.org")]))
                .insert(" ")
        );
    }

    #[test]
    fn the_inserted_space_keeps_the_words_other_attributes() {
        let document = EditScript::new()
            .insert_styled("https://matrix.org/hello", attrs_of(&[Attribute::bold()]))
            .insert("\n");
        let script = AutoFormatLinksRule.apply(&document, 24, &" ".into()).unwrap();
        assert_eq!(
            script,
            EditScript::new()
                .retain_styled(
                    24,
                    attrs_of(&[
                        Attribute::bold(),
                        Attribute::link("https://matrix.org/hello"),
                    ]),
                )
                .insert_styled(" ", attrs_of(&[Attribute::bold()]))
        );
    }

    #[test]
    fn ordinary_words_and_linked_words_are_left_alone() {
        let document = EditScript::new().insert("hello world\n");
        assert!(AutoFormatLinksRule.apply(&document, 11, &" ".into()).is_none());

        let linked = EditScript::new()
            .insert_styled(
                "https://matrix.org/hello",
                attrs_of(&[Attribute::link("https://matrix.org/hello")]),
            )
            .insert("\n");
        assert!(AutoFormatLinksRule.apply(&linked, 24, &" ".into()).is_none());
    }

    #[test]
    fn only_a_space_triggers_link_formatting() {
        let document = EditScript::new().insert("https://matrix.org/hello\n");
        assert!(AutoFormatLinksRule.apply(&document, 24, &"!".into()).is_none());
    }

    // ====== Preserve inline styles ======

    #[test]
    fn typing_after_a_bold_character_stays_bold() {
        let document = EditScript::new()
            .insert_styled("a", attrs_of(&[Attribute::bold()]))
            .insert("\n");
        let script = PreserveInlineStylesRule
            .apply(&document, 1, &"b".into())
            .unwrap();
        assert_eq!(
            script,
            EditScript::new()
                .retain(1)
                .insert_styled("b", attrs_of(&[Attribute::bold()]))
        );
    }

    #[test]
    fn typing_inside_a_link_extends_it() {
        let document = EditScript::new()
            .insert_styled("ab", attrs_of(&[Attribute::link("https://m.org/a")]))
            .insert("\n");
        let script = PreserveInlineStylesRule
            .apply(&document, 1, &"x".into())
            .unwrap();
        assert_eq!(
            script,
            EditScript::new()
                .retain(1)
                .insert_styled("x", attrs_of(&[Attribute::link("https://m.org/a")]))
        );
    }

    #[test]
    fn typing_at_the_edge_of_a_link_does_not_extend_it() {
        let document = EditScript::new()
            .insert_styled("a", attrs_of(&[Attribute::bold(), Attribute::link("https://m.org/a")]))
            .insert("b\n");
        let script = PreserveInlineStylesRule
            .apply(&document, 1, &"x".into())
            .unwrap();
        assert_eq!(
            script,
            EditScript::new()
                .retain(1)
                .insert_styled("x", attrs_of(&[Attribute::bold()]))
        );
    }

    #[test]
    fn typing_after_plain_text_matches_no_inline_rule() {
        let document = EditScript::new().insert("ab\n");
        assert!(PreserveInlineStylesRule
            .apply(&document, 2, &"c".into())
            .is_none());
    }

    #[test]
    fn typing_at_the_start_of_a_line_inherits_nothing() {
        let document = EditScript::new()
            .insert_styled("a", attrs_of(&[Attribute::bold()]))
            .insert("\nb\n");
        assert!(PreserveInlineStylesRule
            .apply(&document, 2, &"c".into())
            .is_none());
    }

    // ====== Catch-all ======

    #[test]
    fn the_catch_all_inserts_verbatim() {
        let document = EditScript::new().insert("ab\n");
        let script = CatchAllInsertRule.apply(&document, 1, &"x\ny".into()).unwrap();
        assert_eq!(script, EditScript::new().retain(1).insert("x\ny"));

        let embed = InsertContent::from(EmbedToken::new("image"));
        let script = CatchAllInsertRule.apply(&document, 2, &embed).unwrap();
        assert_eq!(
            script,
            EditScript::new().retain(2).insert_embed(EmbedToken::new("image"))
        );
    }
}
