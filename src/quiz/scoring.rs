//! AMC scoring directives and Moodle answer fractions.
//!
//! AMC grades with points (`\scoring{b=1,m=-0.5}`); Moodle grades each
//! answer with a percentage taken from a fixed list. This module reads the
//! directive and produces the closest Moodle fractions.

use tracing::{debug, warn};

use super::QuestionKind;
use crate::error::{ConvertError, ConvertResult};

/// Grades Moodle accepts for an answer, in percent (sign aside).
pub const MOODLE_GRADES: [f64; 21] = [
    100.0, 90.0, 83.33333, 80.0, 75.0, 70.0, 66.66667, 60.0, 50.0, 40.0, 33.33333, 30.0, 25.0,
    20.0, 16.66667, 14.28571, 12.5, 11.11111, 10.0, 5.0, 0.0,
];

// =============================================================================
// Scoring
// =============================================================================

/// Parsed `\scoring` directive. Unset keys take AMC defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scoring {
    /// `b`: points for a correct answer
    pub correct: Option<f64>,
    /// `m`: points for a wrong answer
    pub wrong: Option<f64>,
    /// `MAX`: question weight
    pub max: Option<f64>,
    /// `mz`: all-or-nothing score for multiple questions
    pub all_or_nothing: Option<f64>,
}

/// Per-answer grades for one question, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fractions {
    pub correct: f64,
    pub wrong: f64,
}

impl Fractions {
    /// Whether `n_correct` answers at `correct` add up to 100%, give or
    /// take 1%. Moodle refuses multiple answer questions that do not.
    pub fn is_complete(&self, n_correct: usize) -> bool {
        (self.correct * n_correct as f64 - 100.0).abs() <= 1.0
    }
}

impl Scoring {
    /// Parse a comma separated `key=value` list.
    pub fn parse(directive: &str) -> ConvertResult<Self> {
        let mut scoring = Scoring::default();
        for item in directive.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let Some((key, value)) = item.split_once('=') else {
                return Err(ConvertError::scoring(directive, format!("`{item}` is not key=value")));
            };
            let key = key.trim();
            let slot = match key {
                "b" => &mut scoring.correct,
                "m" => &mut scoring.wrong,
                "MAX" => &mut scoring.max,
                "mz" => &mut scoring.all_or_nothing,
                // Incoherent or empty sheets, bonus, floor and ceiling have
                // no Moodle counterpart
                "e" | "v" | "d" | "p" | "haut" | "bp" | "mp" => {
                    debug!(key, "scoring key ignored");
                    continue;
                }
                _ => {
                    warn!(key, directive, "unknown scoring key ignored");
                    continue;
                }
            };
            *slot = Some(parse_number(value.trim()).ok_or_else(|| {
                ConvertError::scoring(directive, format!("`{}` is not a number", value.trim()))
            })?);
        }
        if matches!(scoring.correct, Some(b) if b <= 0.0) {
            return Err(ConvertError::scoring(directive, "b must be positive"));
        }
        Ok(scoring)
    }

    /// Overlay `other`, its set keys win.
    pub fn merge(&mut self, other: Scoring) {
        self.correct = other.correct.or(self.correct);
        self.wrong = other.wrong.or(self.wrong);
        self.max = other.max.or(self.max);
        self.all_or_nothing = other.all_or_nothing.or(self.all_or_nothing);
    }

    /// Moodle `defaultgrade`.
    pub fn default_grade(&self, kind: QuestionKind) -> f64 {
        match (self.max, kind) {
            (Some(max), _) => max,
            (None, QuestionKind::Single) => self.correct.unwrap_or(1.0),
            (None, QuestionKind::Multiple) => 1.0,
        }
    }

    /// Grades for correct and wrong answers.
    ///
    /// Single: correct 100, wrong `m/b` clamped to `[-100, 0]`.
    /// Multiple: each correct answer gets an equal share of 100; wrong
    /// answers lose `m/b` of a share, or `100 / n_wrong` by default, or
    /// everything under `mz`.
    pub fn fractions(&self, kind: QuestionKind, n_correct: usize, n_wrong: usize) -> Fractions {
        let penalty = self.wrong.map(|m| (m / self.correct.unwrap_or(1.0)).clamp(-1.0, 0.0));
        let (correct, wrong) = match kind {
            QuestionKind::Single => (100.0, penalty.unwrap_or(0.0) * 100.0),
            QuestionKind::Multiple => {
                let share = 100.0 / n_correct.max(1) as f64;
                let wrong = if self.all_or_nothing.is_some() {
                    -100.0
                } else if let Some(penalty) = penalty {
                    penalty * share
                } else if n_wrong > 0 {
                    -100.0 / n_wrong as f64
                } else {
                    0.0
                };
                (share, wrong)
            }
        };
        Fractions {
            correct: snap_fraction(correct),
            wrong: snap_fraction(wrong),
        }
    }
}

/// Number or simple ratio (`-1/3`).
fn parse_number(value: &str) -> Option<f64> {
    match value.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            (den != 0.0).then(|| num / den)
        }
        None => value.parse().ok(),
    }
}

// =============================================================================
// Fractions
// =============================================================================

/// Closest grade Moodle accepts, sign kept.
pub fn snap_fraction(percent: f64) -> f64 {
    let magnitude = percent.abs().min(100.0);
    let snapped = MOODLE_GRADES
        .iter()
        .copied()
        .min_by(|a, b| (a - magnitude).abs().total_cmp(&(b - magnitude).abs()))
        .unwrap_or(0.0);
    if snapped == 0.0 {
        0.0
    } else {
        snapped.copysign(percent)
    }
}

/// Render a fraction the way Moodle exports it: `100`, `-33.33333`.
pub fn format_fraction(percent: f64) -> String {
    if (percent - percent.round()).abs() < 1e-9 {
        let rounded = percent.round();
        if rounded == 0.0 {
            return "0".to_string();
        }
        return format!("{rounded}");
    }
    let text = format!("{percent:.5}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
