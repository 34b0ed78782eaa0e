// Copyright 2023-2025 ReductSoftware UG
// This Source Code Form is subject to the terms of the Mozilla Public
//    License, v. 2.0. If a copy of the MPL was not distributed with this
//    file, You can obtain one at https://mozilla.org/MPL/2.0/.
pub mod auth_api;
pub mod connection_api;
pub mod part_api;
pub mod server_api;
