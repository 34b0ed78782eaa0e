// Copyright 2023-2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

pub mod account_repository;
pub mod caller_auth;
pub mod jwt;
mod password;
pub mod policy;
pub mod session;
pub mod user_manager;
