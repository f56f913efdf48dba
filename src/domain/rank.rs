//! Donor ranks
//!
//! Donor ranks are granted through permission groups and reduce the tax
//! charged on a payment.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::{DomainError, PlayerId};
use crate::permissions::{self, PermissionSource};

/// Donor rank tiers, ordered from no rank to the highest tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum DonorRank {
    #[default]
    None,
    VipPlus,
    Supreme,
    Mythical,
}

impl DonorRank {
    /// All ranks in ascending order
    pub const ALL: [DonorRank; 4] = [
        DonorRank::None,
        DonorRank::VipPlus,
        DonorRank::Supreme,
        DonorRank::Mythical,
    ];

    /// Resolve the highest rank a player holds.
    ///
    /// Groups are not mutually exclusive, so the check runs from the top
    /// tier down and the first match wins.
    pub fn resolve<P>(permissions: &P, player: &PlayerId) -> DonorRank
    where
        P: PermissionSource + ?Sized,
    {
        [DonorRank::Mythical, DonorRank::Supreme, DonorRank::VipPlus]
            .into_iter()
            .find(|rank| {
                rank.permission()
                    .is_some_and(|node| permissions.has_capability(player, node))
            })
            .unwrap_or(DonorRank::None)
    }

    /// Fraction of the tax waived for this rank
    pub fn discount_fraction(&self) -> Decimal {
        match self {
            DonorRank::None => Decimal::ZERO,
            DonorRank::VipPlus => Decimal::new(5, 2),
            DonorRank::Supreme => Decimal::new(10, 2),
            DonorRank::Mythical => Decimal::new(25, 2),
        }
    }

    /// Discount as a whole percentage (0, 5, 10, 25)
    pub fn percent_off(&self) -> u32 {
        match self {
            DonorRank::None => 0,
            DonorRank::VipPlus => 5,
            DonorRank::Supreme => 10,
            DonorRank::Mythical => 25,
        }
    }

    /// How much of `undiscounted_tax` this rank saves
    pub fn amount_saved(&self, undiscounted_tax: Decimal) -> Decimal {
        undiscounted_tax * self.discount_fraction()
    }

    /// Display name; empty for players without a rank
    pub fn name(&self) -> &'static str {
        match self {
            DonorRank::None => "",
            DonorRank::VipPlus => "VIP+",
            DonorRank::Supreme => "Supreme",
            DonorRank::Mythical => "Mythical",
        }
    }

    /// Permission group node granting this rank
    pub fn permission(&self) -> Option<&'static str> {
        match self {
            DonorRank::None => None,
            DonorRank::VipPlus => Some(permissions::GROUP_VIPPLUS),
            DonorRank::Supreme => Some(permissions::GROUP_SUPREME),
            DonorRank::Mythical => Some(permissions::GROUP_MYTHICAL),
        }
    }

    /// Parse a rank from its display name.
    ///
    /// # Errors
    /// `DomainError::InvalidRank` for anything outside the known tiers.
    pub fn from_name(name: &str) -> Result<DonorRank, DomainError> {
        match name.trim() {
            "" | "None" => Ok(DonorRank::None),
            "VIP+" | "VipPlus" => Ok(DonorRank::VipPlus),
            "Supreme" => Ok(DonorRank::Supreme),
            "Mythical" => Ok(DonorRank::Mythical),
            other => Err(DomainError::InvalidRank(other.to_string())),
        }
    }
}

impl FromStr for DonorRank {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DonorRank::from_name(s)
    }
}

impl fmt::Display for DonorRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DonorRank::None => write!(f, "None"),
            other => write!(f, "{}", other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::StaticPermissions;
    use rust_decimal_macros::dec;

    #[test]
    fn test_discount_table() {
        assert_eq!(DonorRank::None.discount_fraction(), dec!(0));
        assert_eq!(DonorRank::VipPlus.discount_fraction(), dec!(0.05));
        assert_eq!(DonorRank::Supreme.discount_fraction(), dec!(0.10));
        assert_eq!(DonorRank::Mythical.discount_fraction(), dec!(0.25));
    }

    #[test]
    fn test_discount_increases_with_rank() {
        for pair in DonorRank::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].discount_fraction() < pair[1].discount_fraction());
            assert!(pair[0].percent_off() < pair[1].percent_off());
        }
    }

    #[test]
    fn test_resolve_no_groups() {
        let permissions = StaticPermissions::new();
        let player = PlayerId::random();
        assert_eq!(DonorRank::resolve(&permissions, &player), DonorRank::None);
    }

    #[test]
    fn test_resolve_highest_group_wins() {
        let player = PlayerId::random();
        let mut permissions = StaticPermissions::new();
        permissions.grant(player, permissions::GROUP_VIPPLUS);
        assert_eq!(DonorRank::resolve(&permissions, &player), DonorRank::VipPlus);

        permissions.grant(player, permissions::GROUP_MYTHICAL);
        assert_eq!(DonorRank::resolve(&permissions, &player), DonorRank::Mythical);

        // Supreme alongside Mythical still resolves to Mythical
        permissions.grant(player, permissions::GROUP_SUPREME);
        assert_eq!(DonorRank::resolve(&permissions, &player), DonorRank::Mythical);
    }

    #[test]
    fn test_resolve_is_per_player() {
        let donor = PlayerId::random();
        let other = PlayerId::random();
        let mut permissions = StaticPermissions::new();
        permissions.grant(donor, permissions::GROUP_SUPREME);

        assert_eq!(DonorRank::resolve(&permissions, &donor), DonorRank::Supreme);
        assert_eq!(DonorRank::resolve(&permissions, &other), DonorRank::None);
    }

    #[test]
    fn test_amount_saved() {
        assert_eq!(DonorRank::Mythical.amount_saved(dec!(150)), dec!(37.5));
        assert_eq!(DonorRank::None.amount_saved(dec!(150)), dec!(0));
    }

    #[test]
    fn test_from_name() {
        assert_eq!(DonorRank::from_name("VIP+").unwrap(), DonorRank::VipPlus);
        assert_eq!("Mythical".parse::<DonorRank>().unwrap(), DonorRank::Mythical);
        assert_eq!(DonorRank::from_name("").unwrap(), DonorRank::None);

        let err = DonorRank::from_name("Legendary").unwrap_err();
        assert_eq!(err, DomainError::InvalidRank("Legendary".to_string()));
    }
}
