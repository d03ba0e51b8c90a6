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

use edit_script::EmbedToken;

use crate::style::Style;

/// Stable handle to a node in the tree's arena. Ids stay valid across
/// unrelated mutations and are only invalidated when their node is removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// The closed set of node variants. The tree is
/// Root → {Block, Line} → (Block → Line) → Line → {Text, Embed}.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    /// Groups consecutive lines sharing one `block` attribute value.
    Block,
    /// A run of leaves terminated by exactly one line-break unit. The
    /// line-break is implicit: it is the unit after the last leaf, and the
    /// line's style is its style.
    Line,
    /// A non-empty run of styled text containing no line-break.
    Text(String),
    /// An opaque embedded object of length 1.
    Embed(EmbedToken),
}

/// One arena entry. The parent link is a non-owning back-reference; children
/// are owned by their parent's entry.
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) style: Style,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            style: Style::new(),
            kind,
        }
    }

    pub(crate) fn with_style(kind: NodeKind, style: Style) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            style,
            kind,
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_) | NodeKind::Embed(_))
    }

    pub fn is_line(&self) -> bool {
        matches!(self.kind, NodeKind::Line)
    }

    pub fn is_block(&self) -> bool {
        matches!(self.kind, NodeKind::Block)
    }
}
