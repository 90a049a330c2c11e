//! Address taxonomy registry.
//!
//! Maps on-chain addresses to behavioral categories. The registry is built
//! once from an externally supplied mapping and is immutable afterwards;
//! multiple taxonomies can coexist for different analyses (and test
//! fixtures) without shared global state.

use std::collections::{HashMap, HashSet};

use alloy::primitives::Address;
use eyre::{eyre, Result};

/// Behavioral category of an on-chain address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressClass {
    /// Known router or aggregator entry point; treated as legitimate flow.
    Router,
    /// Known MEV bot of any flavor (sandwich, atomic arb, liquidation).
    ArbBot,
    /// Pool-internal address, e.g. a sibling pool in a multi-hop route.
    Internal,
    /// Not present in the registry.
    Unknown,
}

impl AddressClass {
    /// Parses an external label. Accepted: `router`, `arb_bot`, `internal`,
    /// `unknown` (case-insensitive).
    pub fn parse_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "router" => Some(AddressClass::Router),
            "arb_bot" => Some(AddressClass::ArbBot),
            "internal" => Some(AddressClass::Internal),
            "unknown" => Some(AddressClass::Unknown),
            _ => None,
        }
    }
}

/// Immutable address-to-category registry with O(1) lookup.
#[derive(Clone, Debug, Default)]
pub struct AddressTaxonomy {
    routers: HashSet<Address>,
    arb_bots: HashSet<Address>,
    internal: HashSet<Address>,
}

impl AddressTaxonomy {
    /// Builds a taxonomy from typed `(address, class)` pairs.
    ///
    /// `Unknown` entries are accepted and ignored; they add nothing beyond
    /// the default lookup result.
    pub fn new(entries: impl IntoIterator<Item = (Address, AddressClass)>) -> Self {
        let mut taxonomy = Self::default();
        for (address, class) in entries {
            match class {
                AddressClass::Router => {
                    taxonomy.routers.insert(address);
                }
                AddressClass::ArbBot => {
                    taxonomy.arb_bots.insert(address);
                }
                AddressClass::Internal => {
                    taxonomy.internal.insert(address);
                }
                AddressClass::Unknown => {}
            }
        }
        taxonomy
    }

    /// Builds a taxonomy from an external `{address: label}` mapping.
    ///
    /// Addresses must be 0x-prefixed 40-hex-character strings.
    ///
    /// # Errors
    /// Fails fast on an unparseable address or an unrecognized label; a bad
    /// mapping is a configuration error, not a data condition.
    pub fn from_labels(labels: &HashMap<String, String>) -> Result<Self> {
        let mut entries = Vec::with_capacity(labels.len());
        for (raw_address, label) in labels {
            let address = raw_address
                .parse::<Address>()
                .map_err(|error| eyre!("invalid taxonomy address `{raw_address}`: {error}"))?;
            let class = AddressClass::parse_label(label)
                .ok_or_else(|| eyre!("unrecognized taxonomy label `{label}` for {raw_address}"))?;
            entries.push((address, class));
        }
        Ok(Self::new(entries))
    }

    /// Category of `address`; `Unknown` when not registered.
    pub fn classify(&self, address: Address) -> AddressClass {
        if self.routers.contains(&address) {
            AddressClass::Router
        } else if self.arb_bots.contains(&address) {
            AddressClass::ArbBot
        } else if self.internal.contains(&address) {
            AddressClass::Internal
        } else {
            AddressClass::Unknown
        }
    }

    /// True when `address` is a registered router/aggregator.
    pub fn is_router(&self, address: Address) -> bool {
        self.routers.contains(&address)
    }

    /// True when `address` is a registered MEV bot.
    pub fn is_arb_bot(&self, address: Address) -> bool {
        self.arb_bots.contains(&address)
    }

    /// Number of registered (non-Unknown) addresses.
    pub fn len(&self) -> usize {
        self.routers.len() + self.arb_bots.len() + self.internal.len()
    }

    /// True when no addresses are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
