// Copyright 2023-2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::auth::caller_auth::Caller;
use docvault_base::error::VaultError;

/// Policy is a trait that defines the interface for a policy.
/// A policy is a set of rules that are applied to the caller of a request to determine
/// if the caller is allowed to perform an action.
pub trait Policy {
    /// Validate the resolved caller against the policy.
    ///
    /// # Arguments
    /// * `caller` - The caller or the reason why it couldn't be resolved.
    ///
    /// # Returns
    /// * `Result<Caller, VaultError>` - The caller allowed to proceed.
    fn validate(&self, caller: Result<Caller, VaultError>) -> Result<Caller, VaultError>;
}

/// AnonymousPolicy lets any request through, unknown callers become anonymous.
pub struct AnonymousPolicy {}

impl Policy for AnonymousPolicy {
    fn validate(&self, caller: Result<Caller, VaultError>) -> Result<Caller, VaultError> {
        Ok(caller.unwrap_or_else(|_| Caller::anonymous()))
    }
}

/// AuthenticatedPolicy requires a resolved caller.
pub struct AuthenticatedPolicy {}

impl Policy for AuthenticatedPolicy {
    fn validate(&self, caller: Result<Caller, VaultError>) -> Result<Caller, VaultError> {
        caller
    }
}
