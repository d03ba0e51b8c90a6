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

//! Attribute maps carried by insert and retain operations.
//!
//! Attributes are untyped at this level: an ordered map from key to a small
//! scalar value. [`AttrValue::Null`] is the explicit "clear this key"
//! sentinel and is distinct from the key being absent. A retain carrying a
//! `Null` entry removes formatting that an earlier insert applied, while a
//! retain that simply omits the key leaves it alone.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single attribute value on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// Explicitly clears the key this value is paired with.
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
}

impl AttrValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Null => f.write_str("null"),
            AttrValue::Bool(value) => write!(f, "{}", value),
            AttrValue::Int(value) => write!(f, "{}", value),
            AttrValue::Str(value) => f.write_str(value),
        }
    }
}

/// The attribute map of a single operation.
pub type Attributes = BTreeMap<String, AttrValue>;

/// Combines the attributes of two operations applied in sequence. Entries in
/// `b` win. `keep_null` is true when `a` belongs to a retain: the `Null`
/// markers still have existing document formatting to clear and must survive
/// into the result. Over an insert they have already done their job and are
/// dropped.
pub fn compose_attributes(a: &Attributes, b: &Attributes, keep_null: bool) -> Attributes {
    let mut merged = a.clone();
    for (key, value) in b {
        merged.insert(key.clone(), value.clone());
    }
    if !keep_null {
        merged.retain(|_, value| !value.is_null());
    }
    merged
}

/// Transforms `b`'s attributes against `a`'s for concurrent edits. Without
/// priority `b` simply wins; with priority `a` keeps every key both sides
/// touched and `b` contributes only the rest.
pub fn transform_attributes(a: &Attributes, b: &Attributes, priority: bool) -> Attributes {
    if a.is_empty() || !priority {
        return b.clone();
    }
    b.iter()
        .filter(|(key, _)| !a.contains_key(*key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, AttrValue)]) -> Attributes {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), value.clone()))
            .collect()
    }

    #[test]
    fn composing_favors_the_newer_map() {
        let a = attrs(&[("bold", true.into()), ("heading", 1.into())]);
        let b = attrs(&[("heading", 2.into())]);
        let composed = compose_attributes(&a, &b, false);
        assert_eq!(
            composed,
            attrs(&[("bold", true.into()), ("heading", 2.into())])
        );
    }

    #[test]
    fn null_markers_survive_composition_over_a_retain() {
        let a = attrs(&[("bold", true.into())]);
        let b = attrs(&[("bold", AttrValue::Null)]);
        let composed = compose_attributes(&a, &b, true);
        assert_eq!(composed, attrs(&[("bold", AttrValue::Null)]));
    }

    #[test]
    fn null_markers_are_dropped_when_composed_over_an_insert() {
        let a = attrs(&[("bold", true.into()), ("italic", true.into())]);
        let b = attrs(&[("bold", AttrValue::Null)]);
        let composed = compose_attributes(&a, &b, false);
        assert_eq!(composed, attrs(&[("italic", true.into())]));
    }

    #[test]
    fn transform_without_priority_takes_the_other_side_verbatim() {
        let a = attrs(&[("bold", true.into())]);
        let b = attrs(&[("bold", AttrValue::Null), ("italic", true.into())]);
        assert_eq!(transform_attributes(&a, &b, false), b);
    }

    #[test]
    fn transform_with_priority_drops_keys_both_sides_touched() {
        let a = attrs(&[("bold", true.into())]);
        let b = attrs(&[("bold", AttrValue::Null), ("italic", true.into())]);
        assert_eq!(
            transform_attributes(&a, &b, true),
            attrs(&[("italic", true.into())])
        );
    }

    #[test]
    fn values_serialize_as_bare_json_scalars() {
        assert_eq!(serde_json::to_string(&AttrValue::Null).unwrap(), "null");
        assert_eq!(
            serde_json::to_string(&AttrValue::Bool(true)).unwrap(),
            "true"
        );
        assert_eq!(serde_json::to_string(&AttrValue::Int(3)).unwrap(), "3");
        assert_eq!(
            serde_json::to_string(&AttrValue::Str("quote".into())).unwrap(),
            "\"quote\""
        );
        let parsed: AttrValue = serde_json::from_str("null").unwrap();
        assert!(parsed.is_null());
    }
}
