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

use std::collections::BTreeMap;
use std::fmt;

use edit_script::EditScript;
use strum_macros::{AsRefStr, Display};

/// Whether a change was produced by this document's own edit methods or
/// composed in from an external peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, AsRefStr, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ChangeOrigin {
    Local,
    Remote,
}

/// One published document change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentChange {
    /// The canonical script before the change applied.
    pub before: EditScript,
    /// The change itself.
    pub change: EditScript,
    pub origin: ChangeOrigin,
}

/// Handle returned by `Document::subscribe`, used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&DocumentChange)>;

/// The broadcast registry behind the change-notification stream.
///
/// Events are delivered synchronously to every current subscriber in
/// subscription order; nothing is buffered. Listeners are plain `FnMut`
/// callbacks with no thread bounds, matching the document's single-writer
/// model.
#[derive(Default)]
pub(crate) struct ChangeListeners {
    next_id: u64,
    listeners: BTreeMap<SubscriptionId, Listener>,
}

impl ChangeListeners {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&DocumentChange) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.listeners.insert(id, Box::new(listener));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub(crate) fn publish(&mut self, change: &DocumentChange) {
        // Key order is subscription order, since ids only grow.
        for listener in self.listeners.values_mut() {
            listener(change);
        }
    }
}

impl fmt::Debug for ChangeListeners {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ChangeListeners")
            .field("subscribers", &self.listeners.len())
            .finish()
    }
}
