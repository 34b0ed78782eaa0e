// Copyright 2025 ReductSoftware UG
// This Source Code Form is subject to the terms of the Mozilla Public
//    License, v. 2.0. If a copy of the MPL was not distributed with this
//    file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};

/// Form posted by the login page
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct ConnectionForm {
    pub login: String,
    pub password: String,
    /// Page the login was started from, the browser is sent back there
    #[serde(default, rename = "originURL")]
    pub origin_url: Option<String>,
}

/// State of the browser session shown by the login page
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    /// The last login attempt failed
    pub has_fail: bool,
    /// The user has just logged out
    pub has_logout: bool,
    /// Logged in user
    pub login: Option<String>,
}
