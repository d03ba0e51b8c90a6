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

//! Operation value types.
//!
//! On the wire an operation is one of `{"insert": content, "attributes"?}`,
//! `{"retain": count, "attributes"?}` or `{"delete": count}`, where insert
//! content is either a JSON string or an embed object. All lengths are
//! measured in Unicode scalar values; an embed always measures 1.

use serde::{Deserialize, Serialize};

use crate::attr::Attributes;

static NO_ATTRIBUTES: Attributes = Attributes::new();

/// An opaque embedded object occupying exactly one document position.
///
/// The engine never interprets the payload: `kind` names the embed for the
/// host application ("image", "divider", ...) and `data` carries whatever
/// the host needs to materialize it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedToken {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub data: Attributes,
}

impl EmbedToken {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data: Attributes::new(),
        }
    }

    pub fn with_data(kind: impl Into<String>, data: Attributes) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }
}

/// Payload of an insert operation: a text run or a single embed unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InsertContent {
    Text(String),
    Embed(EmbedToken),
}

impl InsertContent {
    pub fn text(text: impl Into<String>) -> Self {
        InsertContent::Text(text.into())
    }

    pub fn embed(token: EmbedToken) -> Self {
        InsertContent::Embed(token)
    }

    /// Length in document units.
    pub fn len(&self) -> usize {
        match self {
            InsertContent::Text(text) => text.chars().count(),
            InsertContent::Embed(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            InsertContent::Text(text) => Some(text),
            InsertContent::Embed(_) => None,
        }
    }
}

impl From<&str> for InsertContent {
    fn from(text: &str) -> Self {
        InsertContent::Text(text.to_owned())
    }
}

impl From<String> for InsertContent {
    fn from(text: String) -> Self {
        InsertContent::Text(text)
    }
}

impl From<EmbedToken> for InsertContent {
    fn from(token: EmbedToken) -> Self {
        InsertContent::Embed(token)
    }
}

/// One step of an edit-script.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operation {
    Insert {
        insert: InsertContent,
        #[serde(default, skip_serializing_if = "Attributes::is_empty")]
        attributes: Attributes,
    },
    Retain {
        retain: usize,
        #[serde(default, skip_serializing_if = "Attributes::is_empty")]
        attributes: Attributes,
    },
    Delete {
        delete: usize,
    },
}

impl Operation {
    pub fn insert(content: impl Into<InsertContent>) -> Self {
        Operation::Insert {
            insert: content.into(),
            attributes: Attributes::new(),
        }
    }

    pub fn insert_styled(content: impl Into<InsertContent>, attributes: Attributes) -> Self {
        Operation::Insert {
            insert: content.into(),
            attributes,
        }
    }

    pub fn retain(count: usize) -> Self {
        Operation::Retain {
            retain: count,
            attributes: Attributes::new(),
        }
    }

    pub fn retain_styled(count: usize, attributes: Attributes) -> Self {
        Operation::Retain {
            retain: count,
            attributes,
        }
    }

    pub fn delete(count: usize) -> Self {
        Operation::Delete { delete: count }
    }

    /// Length in document units.
    pub fn len(&self) -> usize {
        match self {
            Operation::Insert { insert, .. } => insert.len(),
            Operation::Retain { retain, .. } => *retain,
            Operation::Delete { delete } => *delete,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Operation::Insert { .. })
    }

    pub fn is_retain(&self) -> bool {
        matches!(self, Operation::Retain { .. })
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Operation::Delete { .. })
    }

    /// The attribute map; empty for deletes.
    pub fn attributes(&self) -> &Attributes {
        match self {
            Operation::Insert { attributes, .. } | Operation::Retain { attributes, .. } => {
                attributes
            }
            Operation::Delete { .. } => &NO_ATTRIBUTES,
        }
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes().contains_key(key)
    }

    /// Text content of a text insert.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Operation::Insert { insert, .. } => insert.as_text(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::AttrValue;

    fn bold() -> Attributes {
        [("bold".to_owned(), AttrValue::Bool(true))].into()
    }

    #[test]
    fn operations_take_the_classic_wire_shape() {
        assert_eq!(
            serde_json::to_string(&Operation::insert_styled("ab", bold())).unwrap(),
            r#"{"insert":"ab","attributes":{"bold":true}}"#
        );
        assert_eq!(
            serde_json::to_string(&Operation::retain(3)).unwrap(),
            r#"{"retain":3}"#
        );
        assert_eq!(
            serde_json::to_string(&Operation::delete(2)).unwrap(),
            r#"{"delete":2}"#
        );
    }

    #[test]
    fn plain_operations_omit_the_attribute_map() {
        assert_eq!(
            serde_json::to_string(&Operation::insert("hi")).unwrap(),
            r#"{"insert":"hi"}"#
        );
    }

    #[test]
    fn parsing_distinguishes_records_by_field_name() {
        let op: Operation = serde_json::from_str(r#"{"retain":1,"attributes":{"heading":2}}"#)
            .unwrap();
        assert_eq!(
            op,
            Operation::retain_styled(1, [("heading".to_owned(), AttrValue::Int(2))].into())
        );
        let op: Operation = serde_json::from_str(r#"{"delete":4}"#).unwrap();
        assert_eq!(op, Operation::delete(4));
    }

    #[test]
    fn embeds_round_trip_and_measure_one_unit() {
        let token = EmbedToken::with_data(
            "image",
            [("src".to_owned(), AttrValue::from("mxc://a/b"))].into(),
        );
        let op = Operation::insert(token.clone());
        assert_eq!(op.len(), 1);
        let json = serde_json::to_string(&op).unwrap();
        assert_eq!(json, r#"{"insert":{"kind":"image","data":{"src":"mxc://a/b"}}}"#);
        let parsed: Operation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, op);
    }

    #[test]
    fn text_lengths_count_characters_not_bytes() {
        assert_eq!(Operation::insert("héllo🙂").len(), 6);
        assert_eq!(Operation::insert("").len(), 0);
    }
}
