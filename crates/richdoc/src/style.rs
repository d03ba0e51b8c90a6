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

//! Typed styling attributes and the [`Style`] value type.
//!
//! Every attribute key has a fixed [`AttributeScope`] deciding which
//! structural unit it styles: inline keys live on leaf content, line keys on
//! the line-break unit, embed keys on an embedded object. The wire format is
//! untyped ([`Attributes`]); conversion in either direction happens at the
//! document boundary, rejecting keys outside the registered set.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use edit_script::{AttrValue, Attributes};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::DocumentError;

/// Which structural unit an attribute applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum AttributeScope {
    /// Characters and embedded objects within a line.
    Inline,
    /// The line-break unit terminating a line.
    Line,
    /// An embedded object's own payload.
    Embed,
}

/// The registered attribute keys.
///
/// | Key             | Scope  | Value                                    |
/// |-----------------|--------|------------------------------------------|
/// | `bold`          | inline | `true`                                   |
/// | `italic`        | inline | `true`                                   |
/// | `underline`     | inline | `true`                                   |
/// | `strikethrough` | inline | `true`                                   |
/// | `code`          | inline | `true`                                   |
/// | `link`          | inline | URL string                               |
/// | `heading`       | line   | level (integer)                          |
/// | `block`         | line   | [`BlockFormat`] string                   |
/// | `caption`       | embed  | caption text                             |
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum AttributeKey {
    Bold,
    Italic,
    Underline,
    StrikeThrough,
    Code,
    Link,
    Heading,
    Block,
    Caption,
}

impl AttributeKey {
    pub fn scope(&self) -> AttributeScope {
        match self {
            Self::Bold
            | Self::Italic
            | Self::Underline
            | Self::StrikeThrough
            | Self::Code
            | Self::Link => AttributeScope::Inline,
            Self::Heading | Self::Block => AttributeScope::Line,
            Self::Caption => AttributeScope::Embed,
        }
    }
}

/// The block kinds the `block` attribute can take. Consecutive lines sharing
/// one of these are grouped under a single BlockNode.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, AsRefStr, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "kebab-case")]
pub enum BlockFormat {
    Quote,
    CodeBlock,
    OrderedList,
    UnorderedList,
}

/// A single key/value styling pair, as passed to `Document::format`.
///
/// An explicit unset pair (value [`AttrValue::Null`]) clears the key; it is
/// distinct from the key simply being absent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub key: AttributeKey,
    pub value: AttrValue,
}

impl Attribute {
    pub fn bold() -> Self {
        Self {
            key: AttributeKey::Bold,
            value: AttrValue::Bool(true),
        }
    }

    pub fn italic() -> Self {
        Self {
            key: AttributeKey::Italic,
            value: AttrValue::Bool(true),
        }
    }

    pub fn underline() -> Self {
        Self {
            key: AttributeKey::Underline,
            value: AttrValue::Bool(true),
        }
    }

    pub fn strike_through() -> Self {
        Self {
            key: AttributeKey::StrikeThrough,
            value: AttrValue::Bool(true),
        }
    }

    pub fn code() -> Self {
        Self {
            key: AttributeKey::Code,
            value: AttrValue::Bool(true),
        }
    }

    pub fn link(url: &str) -> Self {
        Self {
            key: AttributeKey::Link,
            value: AttrValue::Str(url.to_owned()),
        }
    }

    pub fn heading(level: i64) -> Self {
        Self {
            key: AttributeKey::Heading,
            value: AttrValue::Int(level),
        }
    }

    pub fn block(format: BlockFormat) -> Self {
        Self {
            key: AttributeKey::Block,
            value: AttrValue::Str(format.to_string()),
        }
    }

    pub fn caption(text: &str) -> Self {
        Self {
            key: AttributeKey::Caption,
            value: AttrValue::Str(text.to_owned()),
        }
    }

    /// The explicit-clear pair for `key`.
    pub fn unset(key: AttributeKey) -> Self {
        Self {
            key,
            value: AttrValue::Null,
        }
    }

    pub fn scope(&self) -> AttributeScope {
        self.key.scope()
    }

    /// The wire representation: a one-entry attribute map.
    pub fn to_attributes(&self) -> Attributes {
        [(self.key.to_string(), self.value.clone())].into()
    }
}

/// A set of typed attributes carried by one node of the document tree.
///
/// A style may hold explicit-unset entries ([`AttrValue::Null`]) while it
/// describes a *change*; styles stored on nodes never do, because
/// [`Style::merge`] resolves them into removals.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Style {
    entries: BTreeMap<AttributeKey, AttrValue>,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: AttributeKey) -> Option<&AttrValue> {
        self.entries.get(&key)
    }

    pub fn contains(&self, key: AttributeKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn insert(&mut self, attribute: Attribute) {
        self.entries.insert(attribute.key, attribute.value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AttributeKey, &AttrValue)> {
        self.entries.iter()
    }

    /// Combines two styles favoring `other`'s keys. An explicit-unset entry
    /// in `other` removes the key, so the result carries no unset markers
    /// from `other`.
    pub fn merge(&self, other: &Style) -> Style {
        let mut entries = self.entries.clone();
        for (key, value) in &other.entries {
            if value.is_null() {
                entries.remove(key);
            } else {
                entries.insert(*key, value.clone());
            }
        }
        Style { entries }
    }

    /// Keeps only the keys carrying an equal value in both styles. This is
    /// how "the style common to a whole range" is computed.
    pub fn intersect(&self, other: &Style) -> Style {
        let entries = self
            .entries
            .iter()
            .filter(|(key, value)| other.entries.get(key) == Some(value))
            .map(|(key, value)| (*key, value.clone()))
            .collect();
        Style { entries }
    }

    /// The subset of entries whose key belongs to `scope`.
    pub fn scoped(&self, scope: AttributeScope) -> Style {
        let entries = self
            .entries
            .iter()
            .filter(|(key, _)| key.scope() == scope)
            .map(|(key, value)| (*key, value.clone()))
            .collect();
        Style { entries }
    }

    /// Converts to the untyped wire map.
    pub fn to_attributes(&self) -> Attributes {
        self.entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    /// Converts from the untyped wire map, rejecting unregistered keys.
    pub fn try_from_attributes(
        attributes: &Attributes,
    ) -> Result<Style, DocumentError> {
        let mut style = Style::new();
        for (key, value) in attributes {
            let key = AttributeKey::from_str(key)
                .map_err(|_| DocumentError::UnknownAttribute(key.clone()))?;
            style.entries.insert(key, value.clone());
        }
        Ok(style)
    }
}

impl FromIterator<Attribute> for Style {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        let mut style = Style::new();
        for attribute in iter {
            style.insert(attribute);
        }
        style
    }
}

impl fmt::Display for Style {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.entries {
            if !first {
                formatter.write_str(", ")?;
            }
            first = false;
            match value {
                AttrValue::Bool(true) => write!(formatter, "{key}")?,
                AttrValue::Str(text) => write!(formatter, "{key}={text:?}")?,
                other => write!(formatter, "{key}={other}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    fn style(attributes: &[Attribute]) -> Style {
        attributes.iter().cloned().collect()
    }

    #[test]
    fn every_key_serializes_to_its_wire_name_and_back() {
        for key in AttributeKey::iter() {
            let parsed = AttributeKey::from_str(&key.to_string());
            assert_eq!(parsed, Ok(key));
        }
        assert_eq!(AttributeKey::StrikeThrough.as_ref(), "strikethrough");
        assert_eq!(AttributeKey::Heading.as_ref(), "heading");
    }

    #[test]
    fn block_formats_use_kebab_case_wire_names() {
        assert_eq!(BlockFormat::Quote.to_string(), "quote");
        assert_eq!(BlockFormat::CodeBlock.to_string(), "code-block");
        assert_eq!(BlockFormat::OrderedList.to_string(), "ordered-list");
        assert_eq!(BlockFormat::UnorderedList.to_string(), "unordered-list");
    }

    #[test]
    fn keys_are_partitioned_into_scopes() {
        assert_eq!(AttributeKey::Link.scope(), AttributeScope::Inline);
        assert_eq!(AttributeKey::Heading.scope(), AttributeScope::Line);
        assert_eq!(AttributeKey::Block.scope(), AttributeScope::Line);
        assert_eq!(AttributeKey::Caption.scope(), AttributeScope::Embed);
    }

    #[test]
    fn merging_favors_the_other_style() {
        let base = style(&[Attribute::bold(), Attribute::heading(1)]);
        let merged = base.merge(&style(&[Attribute::heading(2)]));
        assert_eq!(merged.get(AttributeKey::Heading), Some(&AttrValue::Int(2)));
        assert_eq!(
            merged.get(AttributeKey::Bold),
            Some(&AttrValue::Bool(true))
        );
    }

    #[test]
    fn merging_an_unset_entry_removes_the_key() {
        let base = style(&[Attribute::bold(), Attribute::italic()]);
        let merged = base.merge(&style(&[Attribute::unset(AttributeKey::Bold)]));
        assert!(!merged.contains(AttributeKey::Bold));
        assert!(merged.contains(AttributeKey::Italic));
    }

    #[test]
    fn intersection_keeps_only_keys_equal_in_both() {
        let first = style(&[Attribute::bold(), Attribute::heading(1)]);
        let second = style(&[Attribute::bold(), Attribute::heading(2)]);
        let common = first.intersect(&second);
        assert!(common.contains(AttributeKey::Bold));
        assert!(!common.contains(AttributeKey::Heading));
    }

    #[test]
    fn scoped_filters_by_attribute_scope() {
        let mixed = style(&[
            Attribute::bold(),
            Attribute::heading(1),
            Attribute::block(BlockFormat::Quote),
        ]);
        let line = mixed.scoped(AttributeScope::Line);
        assert_eq!(line.len(), 2);
        assert!(!line.contains(AttributeKey::Bold));
        assert!(mixed.scoped(AttributeScope::Embed).is_empty());
    }

    #[test]
    fn wire_conversion_round_trips() {
        let original = style(&[
            Attribute::link("https://matrix.org/"),
            Attribute::heading(2),
        ]);
        let converted =
            Style::try_from_attributes(&original.to_attributes()).unwrap();
        assert_eq!(converted, original);
    }

    #[test]
    fn unknown_wire_keys_are_rejected() {
        let attributes: Attributes =
            [("wobble".to_owned(), AttrValue::Bool(true))].into();
        assert_eq!(
            Style::try_from_attributes(&attributes),
            Err(DocumentError::UnknownAttribute("wobble".to_owned()))
        );
    }

    #[test]
    fn unset_markers_survive_wire_conversion() {
        let unset = style(&[Attribute::unset(AttributeKey::Link)]);
        let attributes = unset.to_attributes();
        assert_eq!(attributes.get("link"), Some(&AttrValue::Null));
        let back = Style::try_from_attributes(&attributes).unwrap();
        assert_eq!(back, unset);
    }

    #[test]
    fn display_renders_a_compact_attribute_list() {
        let mixed = style(&[
            Attribute::bold(),
            Attribute::heading(1),
            Attribute::link("https://a.b/c"),
        ]);
        assert_eq!(mixed.to_string(), "bold, link=\"https://a.b/c\", heading=1");
    }
}
