//! Human-readable run summaries.

use crate::noise::B92_IDEAL_KEY_RATE;
use crate::protocols::qkd::b92::B92Result;
use crate::protocols::qkd::bb84::Bb84Result;
use crate::protocols::qkd::e91::E91Result;
use crate::statistics::{B92_CRITICAL_QBER, QBER_SECURITY_THRESHOLD, Verdict};

const RULE_WIDTH: usize = 50;

fn header(lines: &mut Vec<String>, title: &str) {
    let rule = "=".repeat(RULE_WIDTH);
    lines.push(rule.clone());
    lines.push(title.to_string());
    lines.push(rule);
}

fn percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

pub fn bb84_analysis(result: &Bb84Result) -> String {
    let stats = &result.statistics;
    let mut lines = Vec::new();
    header(&mut lines, "BB84 Protocol Analysis");
    lines.push(format!("Job: {}", result.job_id));
    lines.push(format!("Number of bits sent: {}", stats.total));
    lines.push(format!("Detected signals: {}", result.detected_count));
    lines.push(format!(
        "Photon loss probability: {}",
        percent(result.photon_loss_probability)
    ));
    lines.push(String::new());
    lines.push("Sifting (Matching Bases Only):".to_string());
    lines.push(format!("  Sifted key length: {}", stats.sifted_length));
    lines.push(format!("  Key rate: {:.2}%", stats.key_rate_percentage));
    lines.push(format!("  Expected key rate: {}", percent(result.expected_key_rate)));
    lines.push(String::new());
    lines.push("QBER Calculation:".to_string());
    lines.push(format!("  QBER = {} / {}", stats.errors, stats.sifted_length));
    lines.push(format!("  QBER: {:.2}%", stats.qber_percentage));
    lines.push(format!("  Expected QBER: {}", percent(result.expected_qber)));
    lines.push(format!("  Eve intercepted: {}", result.eve_intercepted_count));
    lines.push(String::new());
    lines.push("Security Assessment:".to_string());
    match result.verdict {
        Verdict::Warning => {
            lines.push(format!(
                "  WARNING: QBER > {:.0}% (security threshold)",
                QBER_SECURITY_THRESHOLD * 100.0
            ));
            lines.push("     Key may be compromised".to_string());
        }
        _ => lines.push(format!(
            "  OK: QBER ({:.2}%) below threshold ({:.0}%)",
            stats.qber_percentage,
            QBER_SECURITY_THRESHOLD * 100.0
        )),
    }
    lines.push(format!(
        "  Keys match: {}",
        if result.keys_match { "yes" } else { "no" }
    ));

    lines.join("\n")
}

pub fn e91_analysis(result: &E91Result) -> String {
    let stats = &result.statistics;
    let mut lines = Vec::new();
    header(&mut lines, "E91 Protocol Analysis");
    lines.push(format!("Bell State: {}", result.params.bell_state.ket()));
    lines.push(format!("Number of entangled pairs: {}", result.params.n_pairs));
    lines.push(format!("Bell test measurements: {}", result.bell_test_count));
    lines.push(format!("Key generation measurements: {}", result.key_gen_count));
    lines.push(String::new());
    lines.push("CHSH Bell Test:".to_string());
    lines.push(format!("  S-value: {:.4}", result.chsh_s_value));
    lines.push(format!("  Expected S: {:.4}", result.expected_s_value));
    lines.push("  Classical limit: |S| <= 2".to_string());
    lines.push("  Quantum maximum: |S| = 2√2 ≈ 2.828".to_string());
    lines.push(format!(
        "  Bell violated: {}",
        if result.bell_violated { "YES" } else { "NO" }
    ));
    lines.push(String::new());
    lines.push("QBER Calculation (Matching Bases Only):".to_string());
    lines.push(format!("  QBER = {} / {}", stats.errors, stats.sifted_length));
    lines.push(format!("  QBER: {:.2}%", stats.qber_percentage));
    lines.push(format!("  Expected QBER: {}", percent(result.expected_qber)));
    lines.push(String::new());
    lines.push("Security Assessment:".to_string());
    match result.verdict {
        Verdict::Critical => {
            lines.push("  WARNING: Bell inequality NOT violated!".to_string());
            lines.push("     Possible eavesdropping or excessive noise".to_string());
        }
        Verdict::Warning => {
            lines.push(format!(
                "  WARNING: QBER > {:.0}% (security threshold)",
                QBER_SECURITY_THRESHOLD * 100.0
            ));
            lines.push("     Key may be compromised".to_string());
        }
        _ => {
            lines.push("  OK: Protocol secure - Bell inequality violated".to_string());
            lines.push(format!(
                "  OK: QBER ({:.2}%) below threshold ({:.0}%)",
                stats.qber_percentage,
                QBER_SECURITY_THRESHOLD * 100.0
            ));
        }
    }
    lines.push(String::new());
    lines.push("Correlation Terms (CHSH):".to_string());
    for (pair, value) in result.correlations.iter() {
        lines.push(format!(
            "  {}: {:.4} (n = {})",
            pair.label(),
            value,
            result.correlations.count(pair)
        ));
    }

    lines.join("\n")
}

pub fn b92_analysis(result: &B92Result) -> String {
    let stats = &result.statistics;
    let params = &result.params;
    let mut lines = Vec::new();
    header(&mut lines, "B92 Protocol Analysis");
    lines.push(format!("Number of signals sent: {}", params.n_signals));
    lines.push(format!("Conclusive detections: {}", result.conclusive_count));
    lines.push(format!("Inconclusive results: {}", result.inconclusive_count));
    lines.push(format!("Lost in channel: {}", result.lost_count));
    lines.push(String::new());
    lines.push("Key Rate (USD Efficiency):".to_string());
    lines.push(format!(
        "  Key Rate = {} / {}",
        result.conclusive_count, params.n_signals
    ));
    lines.push(format!("  Key Rate: {:.2}%", stats.key_rate_percentage));
    lines.push(format!("  Expected (ideal): {:.0}%", B92_IDEAL_KEY_RATE * 100.0));
    lines.push(format!(
        "  Expected (with noise): {}",
        percent(result.expected_key_rate)
    ));
    lines.push(String::new());
    lines.push("QBER Calculation (Conclusive Measurements Only):".to_string());
    lines.push(format!("  QBER = {} / {}", stats.errors, stats.sifted_length));
    lines.push(format!("  QBER: {:.2}%", stats.qber_percentage));
    lines.push(format!("  Expected QBER: {}", percent(result.expected_qber)));
    lines.push(String::new());
    lines.push("Error Sources:".to_string());
    lines.push(format!("  Channel loss: {:.1}%", params.channel_loss * 100.0));
    lines.push(format!("  Depolarization: {:.1}%", params.depolarization * 100.0));
    lines.push(format!("  Eavesdropping: {:.1}%", params.eavesdropping_rate * 100.0));
    lines.push(format!("  Dark count rate: {}", percent(params.dark_count_rate)));
    lines.push(String::new());
    lines.push("Security Assessment:".to_string());
    match result.verdict {
        Verdict::Critical => {
            lines.push(format!(
                "  WARNING: QBER > {:.0}% (B92 security threshold)",
                B92_CRITICAL_QBER * 100.0
            ));
            lines.push("     High error rate - key may be compromised".to_string());
        }
        Verdict::Caution => {
            lines.push("  CAUTION: Elevated QBER detected".to_string());
            lines.push("     Possible eavesdropping or channel noise".to_string());
        }
        _ => {
            lines.push("  OK: QBER within acceptable range".to_string());
            lines.push(format!("  OK: Sifted key: {} bits", stats.sifted_length));
        }
    }

    lines.join("\n")
}
