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

use edit_script::{EditScript, InsertContent, Operation};

use crate::changes::{ChangeListeners, ChangeOrigin, DocumentChange, SubscriptionId};
use crate::error::DocumentError;
use crate::heuristics::Heuristics;
use crate::style::{Attribute, Style};
use crate::tree::DocumentTree;

/// A rich-text document.
///
/// The document holds two synchronized representations: the canonical
/// edit-script (the flat, persistable form) and the tree (the hierarchical
/// form queries run against). Every mutation goes through the heuristic
/// rules, composes the resulting script into both forms, asserts they still
/// agree, and broadcasts a [`DocumentChange`] to subscribers.
///
/// The document is single-writer and not `Sync`; it lives on whatever thread
/// the embedding editor drives it from. Once [`Document::close`] has been
/// called the document is read-only, and further mutation is a programming
/// error that panics.
pub struct Document {
    script: EditScript,
    tree: DocumentTree,
    heuristics: Heuristics,
    listeners: ChangeListeners,
    closed: bool,
}

impl Document {
    /// An empty document: one empty line, canonical script `insert("\n")`.
    pub fn new() -> Self {
        Self::with_heuristics(Heuristics::new())
    }

    /// An empty document with custom rule chains.
    pub fn with_heuristics(heuristics: Heuristics) -> Self {
        Self {
            script: EditScript::new().insert("\n"),
            tree: DocumentTree::new(),
            heuristics,
            listeners: ChangeListeners::new(),
            closed: false,
        }
    }

    /// Loads a persisted document script.
    ///
    /// The script must be insert-only and its content must end with a
    /// line-break. It is played directly into the tree with no heuristics
    /// involved; the empty line the tree starts with ends up as a spurious
    /// blank line past the content and is dropped again.
    pub fn from_edit_script(script: EditScript) -> Result<Self, DocumentError> {
        if !script.is_document() {
            return Err(DocumentError::InvalidDocument(
                "a document script may only contain inserts".to_owned(),
            ));
        }
        let terminated = script
            .ops()
            .last()
            .and_then(Operation::as_text)
            .is_some_and(|text| text.ends_with('\n'));
        if !terminated {
            return Err(DocumentError::InvalidDocument(
                "a document script must end with a line-break".to_owned(),
            ));
        }
        let styles = convert_styles(&script)?;
        let mut tree = DocumentTree::new();
        let mut cursor = 0;
        for (op, style) in script.ops().iter().zip(&styles) {
            if let Operation::Insert { insert, .. } = op {
                tree.insert(cursor, insert, style)
                    .expect("sequential inserts stay within the document");
                cursor += op.len();
            }
        }
        tree.remove_trailing_empty_line();
        let document = Self {
            script,
            tree,
            heuristics: Heuristics::new(),
            listeners: ChangeListeners::new(),
            closed: false,
        };
        document.assert_consistent();
        Ok(document)
    }

    /// Inserts text or an embed at `index`, normalized by the insert rules.
    ///
    /// Returns the applied edit-script. An empty script means a rule vetoed
    /// the edit: the document is untouched and no event is published.
    pub fn insert(
        &mut self,
        index: usize,
        content: impl Into<InsertContent>,
    ) -> Result<EditScript, DocumentError> {
        self.assert_open();
        let content = content.into();
        if content.len() == 0 {
            return Err(DocumentError::EmptyEdit);
        }
        let length = self.len();
        if index >= length {
            return Err(DocumentError::OutOfRange {
                index,
                length: 0,
                document_length: length,
            });
        }
        let change = self.heuristics.apply_insert(&self.script, index, &content);
        self.apply_local(change)
    }

    /// Deletes `length` units at `index`, normalized by the delete rules.
    pub fn delete(&mut self, index: usize, length: usize) -> Result<EditScript, DocumentError> {
        self.assert_open();
        if length == 0 {
            return Err(DocumentError::EmptyEdit);
        }
        let document_length = self.len();
        if index + length > document_length {
            return Err(DocumentError::OutOfRange {
                index,
                length,
                document_length,
            });
        }
        let change = self.heuristics.apply_delete(&self.script, index, length);
        self.apply_local(change)
    }

    /// Replaces `length` units at `index` with `content`: an insert followed
    /// by a delete whose position is transformed through the insert. Either
    /// half may be empty (but not both), and each publishes its own event.
    pub fn replace(
        &mut self,
        index: usize,
        length: usize,
        content: impl Into<InsertContent>,
    ) -> Result<EditScript, DocumentError> {
        self.assert_open();
        let content = content.into();
        if length == 0 && content.len() == 0 {
            return Err(DocumentError::EmptyEdit);
        }
        let document_length = self.len();
        if index + length > document_length {
            return Err(DocumentError::OutOfRange {
                index,
                length,
                document_length,
            });
        }
        let insert_change = if content.len() > 0 {
            self.insert(index, content)?
        } else {
            EditScript::new()
        };
        let delete_change = if length > 0 {
            let delete_index = insert_change.transform_position(index, false);
            self.delete(delete_index, length)?
        } else {
            EditScript::new()
        };
        Ok(insert_change.compose(&delete_change))
    }

    /// Applies `attribute` over the range, normalized by the format rules.
    /// A zero-length range is meaningful for the link attribute.
    pub fn format(
        &mut self,
        index: usize,
        length: usize,
        attribute: Attribute,
    ) -> Result<EditScript, DocumentError> {
        self.assert_open();
        let document_length = self.len();
        if index + length > document_length {
            return Err(DocumentError::OutOfRange {
                index,
                length,
                document_length,
            });
        }
        let change = self
            .heuristics
            .apply_format(&self.script, index, length, &attribute);
        self.apply_local(change)
    }

    /// Applies an externally produced, already normalized edit-script,
    /// skipping the heuristics. Used for remote edits and replays.
    ///
    /// Only the script's base length is validated; a script that is
    /// well-typed but ill-formed (leaving the document without its final
    /// line-break, say) is an internal-consistency failure.
    pub fn compose(
        &mut self,
        change: &EditScript,
        origin: ChangeOrigin,
    ) -> Result<(), DocumentError> {
        self.assert_open();
        if change.is_empty() {
            return Ok(());
        }
        let document_length = self.len();
        let base = change.base_len();
        if base > document_length {
            return Err(DocumentError::OutOfRange {
                index: 0,
                length: base,
                document_length,
            });
        }
        self.apply_change(change, origin)
    }

    /// Registers a change listener; events arrive synchronously, in
    /// subscription order, until unsubscribed or the document is closed.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&DocumentChange) + 'static,
    ) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }

    /// Removes a listener. `false` if the id was already gone.
    pub fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
        self.listeners.unsubscribe(subscription)
    }

    /// Closes the document: reads keep working, mutation panics from now on,
    /// and all listeners are dropped. Closing twice is fine.
    pub fn close(&mut self) {
        self.closed = true;
        self.listeners = ChangeListeners::new();
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Document length in units, including the final line-break. At least 1.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// `true` for the single empty line.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// A clone of the canonical edit-script.
    pub fn to_edit_script(&self) -> EditScript {
        self.script.clone()
    }

    pub fn to_plain_text(&self) -> String {
        self.tree.to_plain_text()
    }

    /// Indented structural dump, for tests and debugging.
    pub fn to_tree(&self) -> String {
        self.tree.to_tree()
    }

    /// The formatting shared by every unit of the range.
    pub fn collect_style(&self, index: usize, length: usize) -> Result<Style, DocumentError> {
        self.tree.collect_style(index, length)
    }

    fn apply_local(&mut self, change: EditScript) -> Result<EditScript, DocumentError> {
        if change.is_empty() {
            return Ok(change);
        }
        self.apply_change(&change, ChangeOrigin::Local)?;
        Ok(change)
    }

    fn apply_change(
        &mut self,
        change: &EditScript,
        origin: ChangeOrigin,
    ) -> Result<(), DocumentError> {
        // Convert every attribute map up front so an unknown key cannot
        // leave the document half-mutated.
        let styles = convert_styles(change)?;
        let before = self.script.clone();
        self.script = self.script.compose(change);
        let mut cursor = 0;
        for (op, style) in change.ops().iter().zip(&styles) {
            match op {
                Operation::Insert { insert, .. } => {
                    self.tree
                        .insert(cursor, insert, style)
                        .expect("composed operations stay within the document");
                    cursor += op.len();
                }
                Operation::Retain { retain, .. } => {
                    self.tree
                        .retain(cursor, *retain, style)
                        .expect("composed operations stay within the document");
                    cursor += retain;
                }
                Operation::Delete { delete } => {
                    self.tree
                        .delete(cursor, *delete)
                        .expect("composed operations stay within the document");
                }
            }
        }
        self.assert_consistent();
        self.listeners.publish(&DocumentChange {
            before,
            change: change.clone(),
            origin,
        });
        Ok(())
    }

    fn assert_consistent(&self) {
        if self.script != self.tree.to_edit_script() {
            panic!("the document tree diverged from the canonical edit-script");
        }
    }

    fn assert_open(&self) {
        if self.closed {
            panic!("the document is closed");
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn convert_styles(script: &EditScript) -> Result<Vec<Style>, DocumentError> {
    let mut styles = Vec::with_capacity(script.ops().len());
    for op in script {
        styles.push(Style::try_from_attributes(op.attributes())?);
    }
    Ok(styles)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use edit_script::EmbedToken;

    use super::*;
    use crate::style::BlockFormat;

    fn attrs_of(attributes: &[Attribute]) -> edit_script::Attributes {
        attributes.iter().cloned().collect::<Style>().to_attributes()
    }

    fn document_of(text: &str) -> Document {
        let mut document = Document::new();
        if !text.is_empty() {
            document.insert(0, text).expect("fixture text inserts cleanly");
        }
        document
    }

    // ====== Construction ======

    #[test]
    fn a_new_document_is_a_single_empty_line() {
        let document = Document::new();
        assert_eq!(document.len(), 1);
        assert!(document.is_empty());
        assert_eq!(document.to_plain_text(), "\n");
        assert_eq!(document.to_edit_script(), EditScript::new().insert("\n"));
    }

    #[test]
    fn typing_builds_up_the_canonical_script() {
        let mut document = Document::new();
        let change = document.insert(0, "hello").unwrap();
        assert_eq!(change, EditScript::new().insert("hello"));
        assert_eq!(
            document.to_edit_script(),
            EditScript::new().insert("hello\n")
        );
        assert_eq!(document.len(), 6);
        assert!(!document.is_empty());
    }

    // ====== Validation ======

    #[test]
    fn inserting_at_or_past_the_document_length_is_rejected() {
        let mut document = document_of("ab");
        assert_eq!(
            document.insert(3, "x"),
            Err(DocumentError::OutOfRange {
                index: 3,
                length: 0,
                document_length: 3,
            })
        );
        assert!(document.insert(2, "x").is_ok());
    }

    #[test]
    fn empty_edits_are_rejected() {
        let mut document = document_of("ab");
        assert_eq!(document.insert(0, ""), Err(DocumentError::EmptyEdit));
        assert_eq!(document.delete(0, 0), Err(DocumentError::EmptyEdit));
        assert_eq!(document.replace(0, 0, ""), Err(DocumentError::EmptyEdit));
    }

    #[test]
    fn ranges_past_the_end_are_rejected() {
        let mut document = document_of("ab");
        assert!(document.delete(1, 3).is_err());
        assert!(document.format(1, 3, Attribute::bold()).is_err());
        assert!(document.replace(1, 3, "x").is_err());
        assert!(document.collect_style(1, 3).is_err());
    }

    // ====== Editing through the rules ======

    #[test]
    fn deleting_a_line_break_merges_into_the_later_lines_style() {
        let mut document = document_of("A\nB");
        document.format(2, 0, Attribute::heading(1)).unwrap();
        document.delete(1, 1).unwrap();
        assert_eq!(
            document.to_edit_script(),
            EditScript::new()
                .insert("AB")
                .insert_styled("\n", attrs_of(&[Attribute::heading(1)]))
        );
    }

    #[test]
    fn a_space_after_a_url_links_it_end_to_end() {
        let mut document = document_of("see https://matrix.org/hello");
        document.insert(28, " ").unwrap();
        assert_eq!(
            document.collect_style(4, 24).unwrap(),
            Style::from_iter([Attribute::link("https://matrix.org/hello")])
        );
        assert_eq!(document.to_plain_text(), "see https://matrix.org/hello \n");
    }

    #[test]
    fn replacing_runs_the_insert_and_the_delete_through_the_rules() {
        let mut document = document_of("hello world");
        let change = document.replace(0, 5, "goodbye").unwrap();
        assert_eq!(document.to_plain_text(), "goodbye world\n");
        assert_eq!(
            change,
            EditScript::new().insert("goodbye").delete(5)
        );
    }

    #[test]
    fn replacing_with_empty_content_is_a_plain_delete() {
        let mut document = document_of("hello world");
        document.replace(5, 6, "").unwrap();
        assert_eq!(document.to_plain_text(), "hello\n");
    }

    #[test]
    fn a_vetoed_delete_changes_nothing_and_publishes_nothing() {
        let mut document = document_of("ab");
        let events = Rc::new(RefCell::new(0));
        let seen = Rc::clone(&events);
        document.subscribe(move |_| *seen.borrow_mut() += 1);
        // Deleting only the final break clamps to nothing.
        let change = document.delete(2, 1).unwrap();
        assert!(change.is_empty());
        assert_eq!(document.to_plain_text(), "ab\n");
        assert_eq!(*events.borrow(), 0);
    }

    #[test]
    fn a_blocked_merge_is_a_silent_no_op() {
        let mut document = document_of("ab\ncd");
        document
            .format(3, 2, Attribute::block(BlockFormat::Quote))
            .unwrap();
        let change = document.delete(2, 1).unwrap();
        assert!(change.is_empty());
        assert_eq!(document.to_plain_text(), "ab\ncd\n");
    }

    #[test]
    fn formatting_a_caret_link_in_plain_text_is_a_silent_no_op() {
        let mut document = document_of("ab");
        let change = document
            .format(1, 0, Attribute::link("https://m.org/a"))
            .unwrap();
        assert!(change.is_empty());
        assert_eq!(document.to_edit_script(), EditScript::new().insert("ab\n"));
    }

    // ====== Events ======

    #[test]
    fn every_change_publishes_before_and_change() {
        let mut document = Document::new();
        let seen: Rc<RefCell<Vec<DocumentChange>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        document.subscribe(move |change| sink.borrow_mut().push(change.clone()));

        document.insert(0, "ab").unwrap();
        document.format(0, 2, Attribute::bold()).unwrap();

        let events = seen.borrow();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].before, EditScript::new().insert("\n"));
        assert_eq!(events[0].change, EditScript::new().insert("ab"));
        assert_eq!(events[0].origin, ChangeOrigin::Local);
        assert_eq!(events[1].before, EditScript::new().insert("ab\n"));
        assert_eq!(
            events[1].change,
            EditScript::new().retain_styled(2, attrs_of(&[Attribute::bold()]))
        );
    }

    #[test]
    fn a_replace_publishes_its_two_halves() {
        let mut document = document_of("abcd");
        let seen: Rc<RefCell<Vec<EditScript>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        document.subscribe(move |change| sink.borrow_mut().push(change.change.clone()));
        document.replace(1, 2, "x").unwrap();
        let events = seen.borrow();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], EditScript::new().retain(1).insert("x"));
        assert_eq!(events[1], EditScript::new().retain(2).delete(2));
    }

    #[test]
    fn unsubscribing_through_the_document_stops_delivery() {
        let mut document = Document::new();
        let events = Rc::new(RefCell::new(0));
        let seen = Rc::clone(&events);
        let subscription = document.subscribe(move |_| *seen.borrow_mut() += 1);
        document.insert(0, "a").unwrap();
        assert!(document.unsubscribe(subscription));
        assert!(!document.unsubscribe(subscription));
        document.insert(0, "b").unwrap();
        assert_eq!(*events.borrow(), 1);
    }

    // ====== Raw composition ======

    #[test]
    fn composing_a_remote_script_skips_the_rules_and_tags_the_origin() {
        let mut document = document_of("ab");
        let seen: Rc<RefCell<Vec<ChangeOrigin>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        document.subscribe(move |change| sink.borrow_mut().push(change.origin));

        let change = EditScript::new().retain(2).insert("\ncd");
        document.compose(&change, ChangeOrigin::Remote).unwrap();
        assert_eq!(document.to_plain_text(), "ab\ncd\n");
        assert_eq!(seen.borrow().as_slice(), &[ChangeOrigin::Remote]);
    }

    #[test]
    fn composing_an_empty_script_is_a_no_op() {
        let mut document = document_of("ab");
        document
            .compose(&EditScript::new(), ChangeOrigin::Remote)
            .unwrap();
        assert_eq!(document.to_plain_text(), "ab\n");
    }

    #[test]
    fn composing_a_script_too_long_for_the_document_is_rejected() {
        let mut document = document_of("ab");
        let change = EditScript::new().retain(7).insert("x");
        assert_eq!(
            document.compose(&change, ChangeOrigin::Remote),
            Err(DocumentError::OutOfRange {
                index: 0,
                length: 7,
                document_length: 3,
            })
        );
        assert_eq!(document.to_plain_text(), "ab\n");
    }

    #[test]
    fn composing_a_script_with_unknown_attributes_is_rejected_atomically() {
        let mut document = document_of("ab");
        let change = EditScript::new()
            .retain(1)
            .retain_styled(1, [("blink".to_owned(), true.into())].into_iter().collect());
        assert_eq!(
            document.compose(&change, ChangeOrigin::Remote),
            Err(DocumentError::UnknownAttribute("blink".to_owned()))
        );
        assert_eq!(document.to_edit_script(), EditScript::new().insert("ab\n"));
    }

    // ====== Loading ======

    #[test]
    fn loading_replays_a_persisted_script() {
        let script = EditScript::new()
            .insert("ab")
            .insert_styled("\n", attrs_of(&[Attribute::heading(1)]))
            .insert_styled("cd", attrs_of(&[Attribute::bold()]))
            .insert("\n");
        let document = Document::from_edit_script(script.clone()).unwrap();
        assert_eq!(document.to_edit_script(), script);
        assert_eq!(document.len(), 6);
        assert_eq!(
            document.collect_style(0, 3).unwrap(),
            Style::from_iter([Attribute::heading(1)])
        );
    }

    #[test]
    fn loading_an_embed_document() {
        let script = EditScript::new()
            .insert_embed(EmbedToken::new("divider"))
            .insert("\n");
        let document = Document::from_edit_script(script.clone()).unwrap();
        assert_eq!(document.to_edit_script(), script);
        assert_eq!(document.to_plain_text(), "\u{FFFC}\n");
    }

    #[test]
    fn loading_rejects_scripts_with_retains_or_deletes() {
        let script = EditScript::new().retain(1).insert("\n");
        assert_eq!(
            Document::from_edit_script(script).err(),
            Some(DocumentError::InvalidDocument(
                "a document script may only contain inserts".to_owned()
            ))
        );
    }

    #[test]
    fn loading_rejects_unterminated_scripts() {
        let script = EditScript::new().insert("ab");
        assert!(matches!(
            Document::from_edit_script(script),
            Err(DocumentError::InvalidDocument(_))
        ));
        let embed_last = EditScript::new()
            .insert("ab\n")
            .insert_embed(EmbedToken::new("divider"));
        assert!(matches!(
            Document::from_edit_script(embed_last),
            Err(DocumentError::InvalidDocument(_))
        ));
    }

    #[test]
    fn loading_rejects_unknown_attributes() {
        let script = EditScript::new()
            .insert_styled("a", [("blink".to_owned(), true.into())].into_iter().collect())
            .insert("\n");
        assert_eq!(
            Document::from_edit_script(script).err(),
            Some(DocumentError::UnknownAttribute("blink".to_owned()))
        );
    }

    #[test]
    fn a_loaded_trailing_empty_line_survives_when_styled() {
        let script = EditScript::new()
            .insert("ab\n")
            .insert_styled("\n", attrs_of(&[Attribute::heading(1)]));
        let document = Document::from_edit_script(script.clone()).unwrap();
        assert_eq!(document.to_edit_script(), script);
        assert_eq!(document.len(), 4);
    }

    // ====== Lifecycle ======

    #[test]
    fn closing_is_idempotent_and_observable() {
        let mut document = document_of("ab");
        assert!(!document.is_closed());
        document.close();
        document.close();
        assert!(document.is_closed());
        assert_eq!(document.to_plain_text(), "ab\n");
    }

    #[test]
    #[should_panic(expected = "the document is closed")]
    fn mutating_a_closed_document_panics() {
        let mut document = document_of("ab");
        document.close();
        let _ = document.insert(0, "x");
    }

    #[test]
    #[should_panic(expected = "the document is closed")]
    fn composing_into_a_closed_document_panics() {
        let mut document = document_of("ab");
        document.close();
        let _ = document.compose(&EditScript::new().retain(1), ChangeOrigin::Remote);
    }
}
