//! Product and tier selection.

use std::collections::BTreeSet;

use super::descriptor::{ChannelDescriptor, Product, Tier};

/// Which products and tiers a run covers.
///
/// A channel is selected when both its product and its tier are selected,
/// so choosing products without any tier (or the reverse) selects nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    products: BTreeSet<Product>,
    tiers: BTreeSet<Tier>,
}

impl Selection {
    /// An empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every product and every tier.
    pub fn all() -> Self {
        Self {
            products: Product::ALL.into_iter().collect(),
            tiers: Tier::ALL.into_iter().collect(),
        }
    }

    pub fn with_product(mut self, product: Product) -> Self {
        self.products.insert(product);
        self
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tiers.insert(tier);
        self
    }

    /// Whether no product and no tier were chosen.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.tiers.is_empty()
    }

    /// Whether the selection covers a channel.
    pub fn includes(&self, channel: &ChannelDescriptor) -> bool {
        self.products.contains(&channel.product) && self.tiers.contains(&channel.tier)
    }
}
