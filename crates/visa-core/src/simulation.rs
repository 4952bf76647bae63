//! What-if simulation: baseline retention and score deltas.
//!
//! The first successful assessment in a session becomes the baseline and is
//! never replaced until the session is reset. Every later result only
//! replaces the current result.

use serde::Serialize;

use crate::result::{BaselineSummary, EligibilityResult};

/// Baseline and current results of one session.
#[derive(Debug, Clone, Default)]
pub struct ResultSlots {
    baseline: Option<EligibilityResult>,
    current: Option<EligibilityResult>,
}

impl ResultSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new result. Returns `true` if it also became the baseline.
    pub fn record(&mut self, result: EligibilityResult) -> bool {
        let first = self.baseline.is_none();
        if first {
            self.baseline = Some(result.clone());
        }
        self.current = Some(result);
        first
    }

    pub fn baseline(&self) -> Option<&EligibilityResult> {
        self.baseline.as_ref()
    }

    pub fn current(&self) -> Option<&EligibilityResult> {
        self.current.as_ref()
    }

    /// Baseline to send with the next request: only in simulation mode and
    /// only once a baseline exists.
    pub fn request_baseline(&self, simulation_mode: bool) -> Option<BaselineSummary> {
        if !simulation_mode {
            return None;
        }
        self.baseline.as_ref().map(EligibilityResult::baseline_summary)
    }

    /// Score change of the current result against the baseline, shown only
    /// in simulation mode.
    pub fn delta(&self, simulation_mode: bool) -> Option<ScoreDelta> {
        if !simulation_mode {
            return None;
        }
        match (&self.baseline, &self.current) {
            (Some(baseline), Some(current)) => Some(ScoreDelta::between(baseline, current)),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.baseline = None;
        self.current = None;
    }
}

/// Direction of a score change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeltaDirection {
    Up,
    Down,
    Unchanged,
}

impl DeltaDirection {
    pub fn arrow(&self) -> &'static str {
        match self {
            DeltaDirection::Up => "▲",
            DeltaDirection::Down => "▼",
            DeltaDirection::Unchanged => "=",
        }
    }
}

/// Score change computed locally from the two results, independent of any
/// explanation text the service returns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreDelta {
    pub baseline_score: f64,
    pub current_score: f64,
}

impl ScoreDelta {
    pub fn between(baseline: &EligibilityResult, current: &EligibilityResult) -> Self {
        Self {
            baseline_score: baseline.score,
            current_score: current.score,
        }
    }

    /// `current - baseline`
    pub fn amount(&self) -> f64 {
        self.current_score - self.baseline_score
    }

    pub fn magnitude(&self) -> f64 {
        self.amount().abs()
    }

    pub fn direction(&self) -> DeltaDirection {
        let amount = self.amount();
        if amount > 0.0 {
            DeltaDirection::Up
        } else if amount < 0.0 {
            DeltaDirection::Down
        } else {
            DeltaDirection::Unchanged
        }
    }
}
