// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared types for the dispatch workspace
//!
//! This crate provides the network identifiers and endpoint values that are shared
//! across the core client abstractions and the dispatch engines, avoiding circular
//! dependencies.

pub mod endpoint;
pub mod network;

pub use endpoint::{Endpoint, EndpointError};
pub use network::{Network, NetworkParseError};
