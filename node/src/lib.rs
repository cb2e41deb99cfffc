// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod api;
pub mod config;
pub mod errors;
pub mod events;
pub mod ingest;
pub mod server;
pub mod store;
pub mod telemetry;
