//! Participant funding allocations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Section, SectionRecord};

/// A budget line from a funding source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingRecord {
    /// Funding source (e.g., "NDIS Core Supports")
    pub funding_source: String,
    pub allocated: f64,
    #[serde(default)]
    pub used: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl FundingRecord {
    pub fn new(funding_source: impl Into<String>, allocated: f64) -> Self {
        Self {
            funding_source: funding_source.into(),
            allocated,
            used: 0.0,
            start_date: None,
            end_date: None,
        }
    }

    /// Unspent amount, never negative.
    pub fn remaining(&self) -> f64 {
        (self.allocated - self.used).max(0.0)
    }

    /// Share of the allocation used, as a percentage rounded to one decimal.
    pub fn utilisation_percent(&self) -> f64 {
        if self.allocated <= 0.0 {
            return 0.0;
        }
        (self.used / self.allocated * 1000.0).round() / 10.0
    }
}

impl SectionRecord for FundingRecord {
    const SECTION: Section = Section::Funding;
    const LABEL_FIELD: &'static str = "funding_source";

    fn label(&self) -> String {
        self.funding_source.clone()
    }
}
