//! Key-rate, error-rate and Bell-test statistics.
//!
//! Everything here is a pure function of completed sifted keys and
//! correlation sets; nothing is mutated and nothing is random.

pub mod chsh;
pub mod report;

use crate::noise::CLASSICAL_CHSH_BOUND;
use crate::protocols::qkd::sifting::SiftedKeyPair;
use serde::Serialize;
use std::fmt;

pub use chsh::{BellTestPair, CorrelationSet};

/// BB84 and E91 tolerate up to 11% QBER before the key is considered compromised.
pub const QBER_SECURITY_THRESHOLD: f64 = 0.11;
/// B92 critical QBER.
pub const B92_CRITICAL_QBER: f64 = 0.15;
/// B92 QBER above which the channel is treated with caution.
pub const B92_CAUTION_QBER: f64 = 0.05;

/// `part / whole`, or zero when `whole` is zero.
pub fn ratio(part: usize, whole: usize) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64
    } else {
        0.0
    }
}

/// Fraction of mismatched bits; zero for an empty key.
pub fn qber(errors: usize, sifted_length: usize) -> f64 {
    ratio(errors, sifted_length)
}

/// Fraction of signals that made it into the sifted key; zero for an empty run.
pub fn key_rate(sifted_length: usize, total: usize) -> f64 {
    ratio(sifted_length, total)
}

/// Whether a CHSH value exceeds the classical bound.
pub fn bell_violated(s_value: f64) -> bool {
    s_value.abs() > CLASSICAL_CHSH_BOUND
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct KeyStatistics {
    pub total: usize,
    pub sifted_length: usize,
    pub errors: usize,
    pub qber: f64,
    pub qber_percentage: f64,
    pub key_rate: f64,
    pub key_rate_percentage: f64,
}

impl KeyStatistics {
    pub fn from_key(key: &SiftedKeyPair, total: usize) -> Self {
        let sifted_length = key.len();
        let errors = key.errors();
        let qber = qber(errors, sifted_length);
        let key_rate = key_rate(sifted_length, total);

        Self {
            total,
            sifted_length,
            errors,
            qber,
            qber_percentage: qber * 100.0,
            key_rate,
            key_rate_percentage: key_rate * 100.0,
        }
    }
}

/// Security assessment of a finished run, mildest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Secure,
    Caution,
    Warning,
    Critical,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Secure => "secure",
            Verdict::Caution => "caution",
            Verdict::Warning => "warning",
            Verdict::Critical => "critical",
        })
    }
}

pub fn bb84_verdict(qber: f64) -> Verdict {
    if qber > QBER_SECURITY_THRESHOLD {
        Verdict::Warning
    } else {
        Verdict::Secure
    }
}

pub fn e91_verdict(bell_violated: bool, qber: f64) -> Verdict {
    if !bell_violated {
        Verdict::Critical
    } else if qber > QBER_SECURITY_THRESHOLD {
        Verdict::Warning
    } else {
        Verdict::Secure
    }
}

pub fn b92_verdict(qber: f64) -> Verdict {
    if qber > B92_CRITICAL_QBER {
        Verdict::Critical
    } else if qber > B92_CAUTION_QBER {
        Verdict::Caution
    } else {
        Verdict::Secure
    }
}
