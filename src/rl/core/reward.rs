//! Reward Model
//!
//! Physical and financial consequences of one dispatch decision. Pure
//! functions of (stored energy, action, price); the environment owns state.

use serde::{Deserialize, Serialize};

use super::action::Action;
use crate::rl::config::{BatteryConfig, SettlementPolicy};

/// Outcome of applying one action at one price
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Settlement {
    /// Stored energy after the step
    pub stored_energy: f64,
    /// Grid energy paid for (CHARGE)
    pub energy_bought: f64,
    /// Energy that actually entered storage (CHARGE)
    pub energy_stored: f64,
    /// Energy released from storage and sold (DISCHARGE)
    pub energy_sold: f64,
    /// Money spent
    pub cost: f64,
    /// Money earned
    pub revenue: f64,
}

impl Settlement {
    /// Step reward: revenue minus cost
    pub fn reward(&self) -> f64 {
        self.revenue - self.cost
    }
}

/// Settle `action` against `price` starting from `stored_energy`.
///
/// CHARGE stores `charge_rate × efficiency`, clipped at capacity. DISCHARGE
/// releases `discharge_rate`, clipped at the energy available. HOLD is a no-op.
pub fn settle(
    battery: &BatteryConfig,
    policy: SettlementPolicy,
    stored_energy: f64,
    action: Action,
    price: f64,
) -> Settlement {
    let stored_energy = stored_energy.clamp(0.0, battery.capacity);

    match action {
        Action::Hold => Settlement {
            stored_energy,
            ..Default::default()
        },

        Action::Charge => {
            let headroom = battery.capacity - stored_energy;
            let energy_stored = (battery.charge_rate * battery.efficiency).min(headroom);
            let energy_bought = match policy {
                SettlementPolicy::Realized => energy_stored / battery.efficiency,
                SettlementPolicy::Nominal => battery.charge_rate,
            };

            Settlement {
                stored_energy: (stored_energy + energy_stored).min(battery.capacity),
                energy_bought,
                energy_stored,
                cost: energy_bought * price,
                ..Default::default()
            }
        }

        Action::Discharge => {
            let energy_sold = battery.discharge_rate.min(stored_energy);

            Settlement {
                stored_energy: (stored_energy - energy_sold).max(0.0),
                energy_sold,
                revenue: energy_sold * price,
                ..Default::default()
            }
        }
    }
}

/// Volume-weighted unit cost of inventory after a settlement.
///
/// Charging blends the purchase cost into the basis; discharging leaves it
/// unchanged; an empty battery falls back to `reference`.
pub fn updated_cost_basis(
    current_basis: f64,
    stored_before: f64,
    settlement: &Settlement,
    reference: f64,
) -> f64 {
    if settlement.stored_energy <= f64::EPSILON {
        return reference;
    }
    if settlement.energy_stored > 0.0 {
        (current_basis * stored_before + settlement.cost) / settlement.stored_energy
    } else {
        current_basis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn battery(efficiency: f64) -> BatteryConfig {
        BatteryConfig {
            capacity: 10.0,
            charge_rate: 2.0,
            discharge_rate: 2.0,
            efficiency,
            initial_energy: 0.0,
            cost_basis: 0.0,
        }
    }

    #[test]
    fn test_charge_applies_efficiency() {
        let s = settle(&battery(0.5), SettlementPolicy::Realized, 0.0, Action::Charge, 10.0);
        assert_eq!(s.energy_stored, 1.0);
        assert_eq!(s.energy_bought, 2.0);
        assert_eq!(s.cost, 20.0);
        assert_eq!(s.reward(), -20.0);
    }

    #[test]
    fn test_charge_partial_headroom_realized() {
        let s = settle(&battery(1.0), SettlementPolicy::Realized, 9.0, Action::Charge, 5.0);
        assert_eq!(s.stored_energy, 10.0);
        assert_eq!(s.energy_stored, 1.0);
        assert_eq!(s.cost, 5.0);
    }

    #[test]
    fn test_charge_at_capacity_by_policy() {
        let realized = settle(&battery(1.0), SettlementPolicy::Realized, 10.0, Action::Charge, 5.0);
        assert_eq!(realized.stored_energy, 10.0);
        assert_eq!(realized.cost, 0.0);

        let nominal = settle(&battery(1.0), SettlementPolicy::Nominal, 10.0, Action::Charge, 5.0);
        assert_eq!(nominal.stored_energy, 10.0);
        assert_eq!(nominal.cost, 10.0);
    }

    #[test]
    fn test_discharge_clipped_to_available() {
        let s = settle(&battery(1.0), SettlementPolicy::Realized, 1.5, Action::Discharge, 4.0);
        assert_eq!(s.energy_sold, 1.5);
        assert_eq!(s.revenue, 6.0);
        assert_eq!(s.stored_energy, 0.0);

        let empty = settle(&battery(1.0), SettlementPolicy::Nominal, 0.0, Action::Discharge, 4.0);
        assert_eq!(empty.revenue, 0.0);
        assert_eq!(empty.stored_energy, 0.0);
    }

    #[test]
    fn test_hold_is_noop() {
        let s = settle(&battery(0.9), SettlementPolicy::Realized, 3.0, Action::Hold, 100.0);
        assert_eq!(s.stored_energy, 3.0);
        assert_eq!(s.reward(), 0.0);
    }

    #[test]
    fn test_negative_price_charge_earns() {
        let s = settle(&battery(1.0), SettlementPolicy::Realized, 0.0, Action::Charge, -5.0);
        assert_eq!(s.reward(), 10.0);
    }

    #[test]
    fn test_cost_basis_blending() {
        let b = battery(1.0);
        let first = settle(&b, SettlementPolicy::Realized, 0.0, Action::Charge, 10.0);
        let basis = updated_cost_basis(40.0, 0.0, &first, 40.0);
        assert_eq!(basis, 10.0);

        let second = settle(&b, SettlementPolicy::Realized, 2.0, Action::Charge, 20.0);
        let basis = updated_cost_basis(basis, 2.0, &second, 40.0);
        assert_eq!(basis, 15.0);

        let drained = settle(&b, SettlementPolicy::Realized, 2.0, Action::Discharge, 30.0);
        assert_eq!(updated_cost_basis(basis, 2.0, &drained, 40.0), 40.0);
    }
}
