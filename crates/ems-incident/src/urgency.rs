//! Call urgency levels.
//!
//! | Level               | Symbol | Survival coefficient | Hand-over (s) |
//! |---------------------|--------|----------------------|---------------|
//! | `Acute`             | `A`    | 0.26                 | 1008          |
//! | `Urgent`            | `H`    | 4.0                  | 827           |
//! | `Regular`           | `V`    | 8.0                  | 751           |
//! | `RegularUnplanned`  | `V1`   | 8.0                  | 751           |
//! | `RegularPlanned`    | `V2`   | 8.0                  | 751           |

use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum UrgencyLevel {
    Acute,
    Urgent,
    Regular,
    RegularUnplanned,
    RegularPlanned,
}

impl UrgencyLevel {
    pub const ALL: [UrgencyLevel; 5] = [
        UrgencyLevel::Acute,
        UrgencyLevel::Urgent,
        UrgencyLevel::Regular,
        UrgencyLevel::RegularUnplanned,
        UrgencyLevel::RegularPlanned,
    ];

    /// Symbol used by the dispatch centre's records.
    pub fn symbol(self) -> &'static str {
        match self {
            UrgencyLevel::Acute            => "A",
            UrgencyLevel::Urgent           => "H",
            UrgencyLevel::Regular          => "V",
            UrgencyLevel::RegularUnplanned => "V1",
            UrgencyLevel::RegularPlanned   => "V2",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<UrgencyLevel> {
        let symbol = symbol.trim();
        UrgencyLevel::ALL.into_iter().find(|u| u.symbol() == symbol)
    }

    /// Intercept of the logistic survival curve.
    pub fn survival_coefficient(self) -> f64 {
        match self {
            UrgencyLevel::Acute  => 0.26,
            UrgencyLevel::Urgent => 4.0,
            _                    => 8.0,
        }
    }

    #[inline]
    pub fn is_regular(self) -> bool {
        matches!(
            self,
            UrgencyLevel::Regular | UrgencyLevel::RegularUnplanned | UrgencyLevel::RegularPlanned
        )
    }

    /// Median seconds spent handing a patient over at the hospital.
    pub fn hospital_handover_secs(self) -> i64 {
        match self {
            UrgencyLevel::Acute  => 1_008,
            UrgencyLevel::Urgent => 827,
            _                    => 751,
        }
    }

    /// Estimated survival probability for a response of `response_secs`:
    /// `1 / (1 + exp(-coefficient + 0.1 × minutes))`.
    pub fn survival_probability(self, response_secs: i64) -> f64 {
        let minutes = response_secs as f64 / 60.0;
        1.0 / (1.0 + (-self.survival_coefficient() + 0.1 * minutes).exp())
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
