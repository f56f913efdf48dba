//! Permissions module
//!
//! Capability checks against the host server's permission system.

use std::collections::{HashMap, HashSet};

use crate::domain::PlayerId;

/// Group node for the Mythical donor rank
pub const GROUP_MYTHICAL: &str = "group.mythical";
/// Group node for the Supreme donor rank
pub const GROUP_SUPREME: &str = "group.supreme";
/// Group node for the VIP+ donor rank
pub const GROUP_VIPPLUS: &str = "group.vipplus";
/// Players holding this node may neither send nor receive payments
pub const BLOCK_PAYMENTS: &str = "economylite.blockpayments";
/// Wildcard node that overrides the payment block
pub const WILDCARD: &str = "*";

/// Answers "does this player hold capability `name`?"
pub trait PermissionSource: Send + Sync {
    fn has_capability(&self, player: &PlayerId, name: &str) -> bool;
}

impl<T: PermissionSource + ?Sized> PermissionSource for std::sync::Arc<T> {
    fn has_capability(&self, player: &PlayerId, name: &str) -> bool {
        (**self).has_capability(player, name)
    }
}

/// Fixed permission table
///
/// Node matching is exact; the wildcard node is an ordinary node here and
/// is only given meaning by the transfer policy's override check.
#[derive(Debug, Clone, Default)]
pub struct StaticPermissions {
    grants: HashMap<PlayerId, HashSet<String>>,
}

impl StaticPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant a node to a player
    pub fn grant(&mut self, player: PlayerId, node: impl Into<String>) {
        self.grants.entry(player).or_default().insert(node.into());
    }

    /// Builder form of [`StaticPermissions::grant`]
    pub fn with_grant(mut self, player: PlayerId, node: impl Into<String>) -> Self {
        self.grant(player, node);
        self
    }

    /// Remove a node from a player; returns whether it was held
    pub fn revoke(&mut self, player: &PlayerId, node: &str) -> bool {
        self.grants
            .get_mut(player)
            .map(|nodes| nodes.remove(node))
            .unwrap_or(false)
    }
}

impl PermissionSource for StaticPermissions {
    fn has_capability(&self, player: &PlayerId, name: &str) -> bool {
        self.grants
            .get(player)
            .is_some_and(|nodes| nodes.contains(name))
    }
}
