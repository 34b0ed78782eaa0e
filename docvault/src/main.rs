// Copyright 2023-2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use docvault::launcher::launch_server;

#[tokio::main]
async fn main() {
    launch_server().await;
}
