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

use std::fmt;

/// A caller-input failure. Every variant is raised before the document is
/// touched, so an `Err` always leaves the document exactly as it was.
///
/// Internal-consistency defects (the canonical script diverging from the
/// tree, mutation of a closed document) are not errors of this type; they
/// panic, because continuing would propagate a corrupted document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// An index or range falls outside the document.
    OutOfRange {
        index: usize,
        length: usize,
        document_length: usize,
    },
    /// The requested edit has nothing to do (empty insert text, zero-length
    /// delete, empty replace).
    EmptyEdit,
    /// A persisted script cannot be loaded as a document.
    InvalidDocument(String),
    /// A script carries an attribute key outside the registered set.
    UnknownAttribute(String),
}

impl fmt::Display for DocumentError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange {
                index,
                length,
                document_length,
            } => {
                write!(
                    formatter,
                    "Range {index}..{} is outside the document (length \
                     {document_length})",
                    index + length
                )
            }
            Self::EmptyEdit => {
                write!(formatter, "The requested edit is empty")
            }
            Self::InvalidDocument(reason) => {
                write!(formatter, "Not a valid document script: {reason}")
            }
            Self::UnknownAttribute(key) => {
                write!(formatter, "Attribute `{key}` is not recognised")
            }
        }
    }
}

impl std::error::Error for DocumentError {}
