// Copyright 2023-2025 ReductSoftware UG
// Licensed under the Business Source License 1.1
pub mod api;
pub mod auth;
pub mod cfg;
pub mod core;
pub mod launcher;
pub mod vault;
