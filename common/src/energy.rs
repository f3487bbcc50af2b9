use crate::{
    config::EnergyConfig,
    types::{EnergyReading, LedState},
};

/// `rated_power_kw * seconds` divided by this yields kWh for the fixture rating units.
pub const KWH_DIVISOR: f64 = 3_600_000.0;

/// Energy bookkeeping for the current "on" session.
///
/// Nothing is integrated over time: every reading is recomputed from the full elapsed
/// window at the *current* brightness, so a brightness change mid-session re-prices the
/// whole session retroactively.
#[derive(Debug, Clone)]
pub struct EnergyAccount {
    config: EnergyConfig,
    session_start_ms: Option<u64>,
}

impl EnergyAccount {
    pub fn new(config: EnergyConfig) -> Self {
        Self {
            config,
            session_start_ms: None,
        }
    }

    pub fn config(&self) -> &EnergyConfig {
        &self.config
    }

    pub fn session_start_ms(&self) -> Option<u64> {
        self.session_start_ms
    }

    pub fn start_session(&mut self, now_ms: u64) {
        self.session_start_ms = Some(now_ms);
    }

    pub fn end_session(&mut self) {
        self.session_start_ms = None;
    }

    pub fn recompute(&self, state: &LedState, now_ms: u64) -> EnergyReading {
        if !state.on {
            return EnergyReading::ZERO;
        }
        let Some(start) = self.session_start_ms else {
            return EnergyReading::ZERO;
        };

        let elapsed_s = now_ms.saturating_sub(start) as f64 / 1000.0;
        let power = f64::from(state.brightness) / 100.0 * self.config.rated_power_kw * elapsed_s;
        let energy_kwh = power / KWH_DIVISOR;

        EnergyReading {
            energy_kwh,
            cost: energy_kwh * self.config.tariff_per_kwh,
        }
    }
}
