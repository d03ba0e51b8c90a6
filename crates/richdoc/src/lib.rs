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

//! A document engine for rich text editors.
//!
//! A [`Document`] keeps a styled document in two synchronized forms: the
//! canonical [`EditScript`](edit_script::EditScript) and a mutable node tree
//! queries run against. Raw caller intent goes through a chain of
//! [`Heuristics`] first, which turn it into a well-formed script (or veto
//! it); the script is then composed into both forms and broadcast to
//! subscribers as a [`DocumentChange`].
//!
//! Positions and lengths count document units: one per Unicode scalar value,
//! one per embedded object, one per line-break. Every document ends with a
//! line-break, so the shortest document has length 1.

mod changes;
mod document;
mod error;
mod heuristics;
mod style;
mod tree;

pub use edit_script::{AttrValue, Attributes, EditScript, EmbedToken, InsertContent, Operation};

pub use changes::{ChangeOrigin, DocumentChange, SubscriptionId};
pub use document::Document;
pub use error::DocumentError;
pub use heuristics::{
    ApplyInlineFormatRule, ApplyLineFormatRule, AutoExitBlockRule, AutoFormatLinksRule,
    CatchAllDeleteRule, CatchAllInsertRule, DeleteRule, FormatRule, Heuristics, InsertRule,
    LinkAtCaretRule, PassThroughFormatRule, PreserveInlineStylesRule, PreserveLineStyleOnSplitRule,
    RefuseBlockMergeRule, ResetLineFormatOnNewLineRule,
};
pub use style::{Attribute, AttributeKey, AttributeScope, BlockFormat, Style};
pub use tree::{DocumentTree, Node, NodeId, NodeKind, OBJECT_REPLACEMENT_CHARACTER};
