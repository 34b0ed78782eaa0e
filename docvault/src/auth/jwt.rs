// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use chrono::Utc;
use docvault_base::error::VaultError;
use docvault_base::msg::auth_api::UserGroupMapping;
use docvault_base::{internal_server_error, unauthorized};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Claims carried by a login token.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Claims {
    /// Login
    pub sub: String,
    pub groups: Vec<String>,
    pub iat: u64,
    pub exp: u64,
}

/// Signs and checks HS256 tokens issued on login.
pub struct JwtFactory {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl JwtFactory {
    pub fn new(key: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(key.as_bytes()),
            decoding_key: DecodingKey::from_secret(key.as_bytes()),
            ttl,
        }
    }

    /// Create a token for the login and its group.
    pub fn create_token(&self, mapping: &UserGroupMapping) -> Result<String, VaultError> {
        let now = Utc::now().timestamp().max(0) as u64;
        let claims = Claims {
            sub: mapping.login.clone(),
            groups: if mapping.group_name.is_empty() {
                vec![]
            } else {
                vec![mapping.group_name.clone()]
            },
            iat: now,
            exp: now + self.ttl.as_secs(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| internal_server_error!("Failed to sign token: {}", err))
    }

    /// Check signature and expiration of a token.
    pub fn validate(&self, token: &str) -> Result<Claims, VaultError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| unauthorized!("Invalid token"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn factory() -> JwtFactory {
        JwtFactory::new("secret-key", Duration::from_secs(3600))
    }

    #[fixture]
    fn mapping() -> UserGroupMapping {
        UserGroupMapping {
            login: "john".to_string(),
            group_name: "designers".to_string(),
        }
    }

    #[rstest]
    fn test_create_and_validate(factory: JwtFactory, mapping: UserGroupMapping) {
        let token = factory.create_token(&mapping).unwrap();
        let claims = factory.validate(&token).unwrap();

        assert_eq!(claims.sub, "john");
        assert_eq!(claims.groups, vec!["designers".to_string()]);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[rstest]
    fn test_wrong_key(factory: JwtFactory, mapping: UserGroupMapping) {
        let token = JwtFactory::new("other-key", Duration::from_secs(3600))
            .create_token(&mapping)
            .unwrap();
        assert_eq!(factory.validate(&token), Err(unauthorized!("Invalid token")));
    }

    #[rstest]
    fn test_expired(factory: JwtFactory) {
        let claims = Claims {
            sub: "john".to_string(),
            groups: vec![],
            iat: 1000,
            exp: 2000,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret-key"),
        )
        .unwrap();

        assert_eq!(factory.validate(&token), Err(unauthorized!("Invalid token")));
    }

    #[rstest]
    fn test_no_group(factory: JwtFactory) {
        let token = factory
            .create_token(&UserGroupMapping {
                login: "john".to_string(),
                group_name: String::new(),
            })
            .unwrap();
        assert!(factory.validate(&token).unwrap().groups.is_empty());
    }
}
