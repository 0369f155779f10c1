//! Rule-based baseline agents
//!
//! Signals are computed from the observation only; none of these agents keep
//! state between steps.

use super::traits::Agent;
use crate::rl::config::HeuristicConfig;
use crate::rl::core::{Action, Observation};

/// Never trades. Baseline with zero cash flow.
#[derive(Debug, Clone, Copy, Default)]
pub struct HoldAgent;

impl Agent for HoldAgent {
    fn name(&self) -> &'static str {
        "hold"
    }

    fn act(&mut self, _observation: &Observation) -> Action {
        Action::Hold
    }
}

/// Trades around the cost basis of stored energy.
///
/// Discharges when the price exceeds the cost basis by `margin` and charges
/// when it is `margin` below it.
#[derive(Debug, Clone)]
pub struct PriceVsCostAgent {
    margin: f64,
}

impl PriceVsCostAgent {
    pub fn new(margin: f64) -> Self {
        Self {
            margin: margin.max(0.0),
        }
    }

    pub fn from_config(config: &HeuristicConfig) -> Self {
        Self::new(config.cost_margin)
    }
}

impl Agent for PriceVsCostAgent {
    fn name(&self) -> &'static str {
        "cost"
    }

    fn act(&mut self, obs: &Observation) -> Action {
        let basis = obs.cost_basis;

        if !obs.is_empty() && obs.price > basis * (1.0 + self.margin) {
            Action::Discharge
        } else if !obs.is_full() && obs.price < basis * (1.0 - self.margin) {
            Action::Charge
        } else {
            Action::Hold
        }
    }
}

/// Mean-reversion against the moving average of the observation window
#[derive(Debug, Clone)]
pub struct MovingAverageAgent {
    band: f64,
}

impl MovingAverageAgent {
    pub fn new(band: f64) -> Self {
        Self {
            band: band.max(0.0),
        }
    }

    pub fn from_config(config: &HeuristicConfig) -> Self {
        Self::new(config.moving_average_band)
    }
}

impl Agent for MovingAverageAgent {
    fn name(&self) -> &'static str {
        "moving-average"
    }

    fn act(&mut self, obs: &Observation) -> Action {
        // Not enough history for a meaningful average
        if obs.price_history.len() < 2 {
            return Action::Hold;
        }

        let mean = obs.history_mean();
        let spread = mean.abs() * self.band;

        if obs.price < mean - spread && !obs.is_full() {
            Action::Charge
        } else if obs.price > mean + spread && !obs.is_empty() {
            Action::Discharge
        } else {
            Action::Hold
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn obs(price: f64, stored: f64, cost_basis: f64, history: Vec<f64>) -> Observation {
        Observation {
            step_index: 0,
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            price,
            stored_energy: stored,
            state_of_charge: stored / 10.0,
            cost_basis,
            price_history: history,
        }
    }

    #[test]
    fn test_hold_agent() {
        let mut agent = HoldAgent;
        assert_eq!(agent.act(&obs(10.0, 5.0, 5.0, vec![])), Action::Hold);
    }

    #[test]
    fn test_price_vs_cost_signals() {
        let mut agent = PriceVsCostAgent::new(0.1);

        assert_eq!(agent.act(&obs(30.0, 0.0, 40.0, vec![])), Action::Charge);
        assert_eq!(agent.act(&obs(50.0, 4.0, 40.0, vec![])), Action::Discharge);
        assert_eq!(agent.act(&obs(41.0, 4.0, 40.0, vec![])), Action::Hold);
    }

    #[test]
    fn test_price_vs_cost_respects_limits() {
        let mut agent = PriceVsCostAgent::new(0.1);

        // Expensive but nothing to sell
        assert_eq!(agent.act(&obs(80.0, 0.0, 40.0, vec![])), Action::Hold);
        // Cheap but already full
        assert_eq!(agent.act(&obs(10.0, 10.0, 40.0, vec![])), Action::Hold);
    }

    #[test]
    fn test_moving_average_signals() {
        let mut agent = MovingAverageAgent::new(0.05);
        let history = vec![50.0, 50.0, 50.0];

        let mut cheap = history.clone();
        cheap.push(40.0);
        assert_eq!(agent.act(&obs(40.0, 0.0, 0.0, cheap)), Action::Charge);

        let mut rich = history.clone();
        rich.push(70.0);
        assert_eq!(agent.act(&obs(70.0, 5.0, 0.0, rich)), Action::Discharge);

        assert_eq!(agent.act(&obs(50.0, 5.0, 0.0, vec![50.0])), Action::Hold);
    }
}
