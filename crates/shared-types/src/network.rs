// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Ledger network identifiers
//!
//! This module provides type-safe identifiers for the deployments of the ledger network
//! whose services are reached through the dispatch layer.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Supported ledger network deployments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Network {
    /// Production network
    MainNet,
    /// Public test network
    TestNet,
    /// Development network, reset periodically
    #[default]
    DevNet,
}

impl Network {
    /// Returns the canonical lowercase identifier used in configuration and catalogs
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MainNet => "mainnet",
            Self::TestNet => "testnet",
            Self::DevNet => "devnet",
        }
    }

    /// Returns the human-readable name of the network
    pub const fn name(self) -> &'static str {
        match self {
            Self::MainNet => "MainNet",
            Self::TestNet => "TestNet",
            Self::DevNet => "DevNet",
        }
    }

    /// Returns all supported networks
    pub const fn all() -> &'static [Self] {
        &[Self::MainNet, Self::TestNet, Self::DevNet]
    }

    /// Whether the network carries production value
    pub const fn is_production(self) -> bool {
        matches!(self, Self::MainNet)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Network {
    type Err = NetworkParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" | "main" | "prod" | "production" => Ok(Self::MainNet),
            "testnet" | "test" => Ok(Self::TestNet),
            "devnet" | "dev" => Ok(Self::DevNet),
            _ => Err(NetworkParseError(s.to_string())),
        }
    }
}

impl Serialize for Network {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct NetworkVisitor;

        impl serde::de::Visitor<'_> for NetworkVisitor {
            type Value = Network;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "a network name (mainnet, testnet, devnet)")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Network::from_str(value).map_err(|_| {
                    E::invalid_value(
                        serde::de::Unexpected::Str(value),
                        &"a supported network (mainnet, testnet, devnet)",
                    )
                })
            }
        }

        deserializer.deserialize_str(NetworkVisitor)
    }
}

/// Error returned when a network name cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported network: {0}. Supported networks are: mainnet, testnet, devnet")]
pub struct NetworkParseError(pub String);
