use std::collections::BTreeSet;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Money;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Multiplier applied to a vehicle's reference price when no explicit one is
/// configured.
pub const DEFAULT_GUARANTEE_MULTIPLIER: Decimal = dec!(1.3);

fn default_multiplier() -> Decimal {
    DEFAULT_GUARANTEE_MULTIPLIER
}

/// Which of a lot's two appraisals counts toward the guarantee pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationCriterion {
    #[default]
    Market,
    ForcedSale,
}

/// A land lot with both appraisals on record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lot {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub market_value: Money,
    pub forced_sale_value: Money,
}

impl Lot {
    pub fn valuation(&self, criterion: ValuationCriterion) -> Money {
        match criterion {
            ValuationCriterion::Market => self.market_value,
            ValuationCriterion::ForcedSale => self.forced_sale_value,
        }
    }
}

/// A vehicle (or the vehicle underlying an auto consortium quota) whose
/// guarantee value derives from a reference price chain: the latest FIPE
/// table price, falling back to the price recorded at registration, falling
/// back to a manually entered value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleCollateral {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Latest FIPE price, when the lookup collaborator has resolved one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<Money>,
    /// FIPE price recorded when the asset was registered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_price: Option<Money>,
    /// Manual fallback when no table price is available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_value: Option<Money>,
    #[serde(default = "default_multiplier")]
    pub multiplier: Decimal,
}

impl VehicleCollateral {
    pub fn reference_price(&self) -> Money {
        self.current_price
            .or(self.base_price)
            .or(self.manual_value)
            .unwrap_or(Decimal::ZERO)
    }

    /// Always derived from the reference price; never stored independently,
    /// so it cannot drift from its multiplier.
    pub fn guarantee_value(&self) -> Money {
        self.reference_price() * self.multiplier
    }
}

/// The three kinds of asset a guarantee pool can hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollateralAsset {
    Lot(Lot),
    Vehicle(VehicleCollateral),
    AutoQuota(VehicleCollateral),
}

impl CollateralAsset {
    pub fn id(&self) -> &str {
        match self {
            CollateralAsset::Lot(lot) => &lot.id,
            CollateralAsset::Vehicle(v) | CollateralAsset::AutoQuota(v) => &v.id,
        }
    }

    /// Value this asset contributes to the pool under the given criterion.
    /// The criterion only distinguishes lot appraisals; vehicles always use
    /// their derived guarantee value.
    pub fn valuation(&self, criterion: ValuationCriterion) -> Money {
        match self {
            CollateralAsset::Lot(lot) => lot.valuation(criterion),
            CollateralAsset::Vehicle(v) | CollateralAsset::AutoQuota(v) => v.guarantee_value(),
        }
    }
}

/// Which assets are currently pledged, and under what terms. The engine only
/// ever reads asset records; membership is a set of opaque ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateralSelection {
    pub selected_ids: BTreeSet<String>,
    #[serde(default)]
    pub criterion: ValuationCriterion,
    /// Maximum loan-to-value as a percentage in (0, 100].
    pub ltv_max_percent: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralValuation {
    /// Aggregate value of the selected assets.
    pub guarantee_value: Money,
    /// Maximum debt this pool may secure, in currency.
    pub ceiling: Money,
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

pub fn valuate(assets: &[CollateralAsset], selection: &CollateralSelection) -> CollateralValuation {
    let guarantee_value: Money = assets
        .iter()
        .filter(|asset| selection.selected_ids.contains(asset.id()))
        .map(|asset| asset.valuation(selection.criterion))
        .sum();

    CollateralValuation {
        guarantee_value,
        ceiling: guarantee_value * selection.ltv_max_percent / dec!(100),
    }
}

pub fn within_limit(peak_balance: Money, ceiling: Money) -> bool {
    peak_balance <= ceiling
}

/// Peak balance as a percentage of the ceiling; 0 when there is no ceiling.
pub fn coverage_ratio(peak_balance: Money, ceiling: Money) -> Decimal {
    if ceiling <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        peak_balance / ceiling * dec!(100)
    }
}
