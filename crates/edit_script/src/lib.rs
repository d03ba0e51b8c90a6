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

//! A flat, composable description of rich text documents and edits.
//!
//! An [`EditScript`] is an ordered list of [`Operation`]s, each inserting
//! content, retaining existing content (optionally changing its formatting
//! [`Attributes`]), or deleting it. A script made only of inserts describes
//! a whole document; any other script describes a change to one. Scripts
//! compose, transform against concurrent scripts, and map caret positions
//! through themselves, which is everything a document engine needs to keep
//! a tree model and a canonical flat model in lockstep.
//!
//! All lengths and positions count Unicode scalar values, with embedded
//! objects counting as one.

mod attr;
mod iter;
mod op;
mod script;

pub use attr::{compose_attributes, transform_attributes, AttrValue, Attributes};
pub use iter::OpIterator;
pub use op::{EmbedToken, InsertContent, Operation};
pub use script::EditScript;
