/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Word identity: canonical node keys and the seed-input shape check.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical node key (trimmed, lowercased word).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resolve a surface form to its canonical key. Total; never fails.
pub fn resolve(word: &str) -> NodeId {
    NodeId(word.trim().to_lowercase())
}

/// True when `word` (after trimming) is non-empty and only ASCII letters or hyphens.
pub fn is_plausible_word(word: &str) -> bool {
    let trimmed = word.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_alphabetic() || c == '-')
}
