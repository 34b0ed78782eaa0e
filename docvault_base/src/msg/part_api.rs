// Copyright 2025 ReductSoftware UG
// This Source Code Form is subject to the terms of the Mozilla Public
//    License, v. 2.0. If a copy of the MPL was not distributed with this
//    file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};

/// Minimal view of a part revision
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartMinimal {
    /// Part number, unique in a workspace
    pub number: String,
    /// Version label, e.g. "A"
    pub version: String,
    /// Latest iteration with stored files
    pub iteration: u32,
}

/// List of parts
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PartMinimalList {
    pub parts: Vec<PartMinimal>,
}

impl PartMinimalList {
    pub fn add_part(&mut self, part: PartMinimal) {
        self.parts.push(part);
    }
}
