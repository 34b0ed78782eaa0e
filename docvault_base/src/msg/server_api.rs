// Copyright 2023-2025 ReductSoftware UG
// This Source Code Form is subject to the terms of the Mozilla Public
//    License, v. 2.0. If a copy of the MPL was not distributed with this
//    file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};

/// Information about a DocVault instance
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    /// Version of the instance
    pub version: String,
    /// Uptime in seconds
    pub uptime: u64,
    /// Server sessions are issued on login
    pub session_enabled: bool,
    /// Signed tokens are issued on login
    pub jwt_enabled: bool,
}
