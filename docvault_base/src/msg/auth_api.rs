// Copyright 2025 ReductSoftware UG
// This Source Code Form is subject to the terms of the Mozilla Public
//    License, v. 2.0. If a copy of the MPL was not distributed with this
//    file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};

/// Credentials posted to the login endpoint
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// Account as exposed to clients, without credentials
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Unique login
    pub login: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Contact email, recovery links are sent there
    #[serde(default)]
    pub email: String,
    /// Preferred language (ISO 639-1)
    #[serde(default)]
    pub language: String,
    /// Time zone identifier, e.g. "Europe/Paris"
    #[serde(default)]
    pub time_zone: String,
    /// Administrator of the platform
    #[serde(default)]
    pub admin: bool,
    /// Disabled accounts can't log in
    #[serde(default)]
    pub enabled: bool,
}

/// Group of a login, used for sessions and token claims
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserGroupMapping {
    pub login: String,
    pub group_name: String,
}

/// Request to send a password recovery link
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct PasswordRecoveryRequest {
    pub login: String,
}

/// A new password for a pending recovery request
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PasswordRecover {
    pub uuid: String,
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_account_camel_case() {
        let account = Account {
            login: "john".to_string(),
            time_zone: "UTC".to_string(),
            enabled: true,
            ..Default::default()
        };

        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["timeZone"], "UTC");
        assert_eq!(json["enabled"], true);
        assert!(json.get("password").is_none());
    }

    #[rstest]
    fn test_password_recover_from_json() {
        let recover: PasswordRecover =
            serde_json::from_str(r#"{"uuid": "abc", "newPassword": "secret"}"#).unwrap();
        assert_eq!(recover.uuid, "abc");
        assert_eq!(recover.new_password, "secret");
    }
}
