use std::fmt;

use thiserror::Error;

/// One of the three constitutional axes, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dosha {
    Vata,
    Pitta,
    Kapha,
}

impl Dosha {
    /// Canonical order, also the tie-break order for [`dominant`].
    pub const ALL: [Dosha; 3] = [Dosha::Vata, Dosha::Pitta, Dosha::Kapha];

    pub fn name(&self) -> &'static str {
        match self {
            Dosha::Vata => "Vata",
            Dosha::Pitta => "Pitta",
            Dosha::Kapha => "Kapha",
        }
    }
}

impl fmt::Display for Dosha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DoshaScores {
    pub vata: i32,
    pub pitta: i32,
    pub kapha: i32,
}

impl DoshaScores {
    pub const fn new(vata: i32, pitta: i32, kapha: i32) -> Self {
        Self { vata, pitta, kapha }
    }

    pub fn get(&self, dosha: Dosha) -> i32 {
        match dosha {
            Dosha::Vata => self.vata,
            Dosha::Pitta => self.pitta,
            Dosha::Kapha => self.kapha,
        }
    }

    pub fn total(&self) -> i64 {
        i64::from(self.vata) + i64::from(self.pitta) + i64::from(self.kapha)
    }
}

/// Per-axis share of a total, each rounded on its own.
///
/// The three values are not forced to add up to 100: `(1, 1, 1)` gives
/// `33 / 33 / 33`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ResultPercentages {
    pub vata: i32,
    pub pitta: i32,
    pub kapha: i32,
}

impl ResultPercentages {
    pub fn get(&self, dosha: Dosha) -> i32 {
        match dosha {
            Dosha::Vata => self.vata,
            Dosha::Pitta => self.pitta,
            Dosha::Kapha => self.kapha,
        }
    }

    pub fn dominant(&self) -> Dosha {
        dominant(&DoshaScores::new(self.vata, self.pitta, self.kapha))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("cannot normalize scores that sum to zero")]
    ZeroTotal,
    #[error("{0} score left the supported range")]
    Overflow(Dosha),
}

/// Component-wise sum. An axis that would leave the `i32` range is reported
/// instead of wrapping.
pub fn add(current: &DoshaScores, delta: &DoshaScores) -> Result<DoshaScores, ScoreError> {
    let axis = |dosha: Dosha| {
        current
            .get(dosha)
            .checked_add(delta.get(dosha))
            .ok_or(ScoreError::Overflow(dosha))
    };

    Ok(DoshaScores {
        vata: axis(Dosha::Vata)?,
        pitta: axis(Dosha::Pitta)?,
        kapha: axis(Dosha::Kapha)?,
    })
}

/// Computes `round(part / total * 100)` for every axis.
///
/// Rounding is half away from zero on the quotient (`f64::round`), so
/// `12.5` becomes `13` and `-12.5` becomes `-13`.
pub fn normalize(scores: &DoshaScores) -> Result<ResultPercentages, ScoreError> {
    let total = scores.total();
    if total == 0 {
        return Err(ScoreError::ZeroTotal);
    }

    let share = |part: i32| -> i32 { (f64::from(part) / total as f64 * 100.0).round() as i32 };

    Ok(ResultPercentages {
        vata: share(scores.vata),
        pitta: share(scores.pitta),
        kapha: share(scores.kapha),
    })
}

/// Returns the axis with the highest value. Ties go to the axis that comes
/// first in [`Dosha::ALL`].
pub fn dominant(scores: &DoshaScores) -> Dosha {
    let mut best = Dosha::Vata;
    for dosha in Dosha::ALL {
        if scores.get(dosha) > scores.get(best) {
            best = dosha;
        }
    }
    best
}
