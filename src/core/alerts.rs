//! Threat alert log and the global severity projection.
//!
//! The log is newest-first. Current severity is the level of the most recent
//! alert, or SAFE when the log is empty. It is not a maximum over the window:
//! a CRITICAL status is replaced by the very next alert, whatever its level,
//! and nothing decays with time.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::core::bounded::BoundedSeq;

/// Alert urgency, ordered `Safe < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Safe,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Safe => "SAFE",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

/// Display emphasis for the global status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusTier {
    /// SAFE or MEDIUM.
    Normal,
    /// HIGH.
    Elevated,
    /// CRITICAL.
    Critical,
}

impl From<Severity> for StatusTier {
    fn from(level: Severity) -> Self {
        match level {
            Severity::Critical => StatusTier::Critical,
            Severity::High => StatusTier::Elevated,
            Severity::Medium | Severity::Safe => StatusTier::Normal,
        }
    }
}

/// A security alert as retained in the log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreatAlert {
    pub level: Severity,
    /// Detector label, e.g. `PORT_SCAN` or `ML_ANOMALY`.
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    /// Feed or detector that raised it, when the backend says.
    pub source: Option<String>,
    /// Assigned locally at ingestion.
    pub observed_at: DateTime<Local>,
}

/// `threat` event payload exactly as the backend emits it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ThreatWire {
    pub level: Severity,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(default)]
    pub source: Option<String>,
}

impl ThreatWire {
    pub fn observed(self, at: DateTime<Local>) -> ThreatAlert {
        ThreatAlert {
            level: self.level,
            kind: self.kind,
            message: self.message,
            source: self.source,
            observed_at: at,
        }
    }
}

/// Bounded, newest-first alert log.
#[derive(Debug, Clone)]
pub struct AlertLog {
    alerts: BoundedSeq<ThreatAlert>,
}

impl AlertLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            alerts: BoundedSeq::new(capacity),
        }
    }

    /// Insert at the head. Every alert is kept regardless of level.
    pub fn record(&mut self, alert: ThreatAlert) {
        self.alerts.prepend(alert);
    }

    pub fn current_severity(&self) -> Severity {
        self.alerts
            .front()
            .map(|alert| alert.level)
            .unwrap_or(Severity::Safe)
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Newest-first copy of the log.
    pub fn snapshot(&self) -> Vec<ThreatAlert> {
        self.alerts.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_alert(level: Severity, kind: &str) -> ThreatAlert {
        ThreatAlert {
            level,
            kind: kind.to_string(),
            message: format!("{kind} detected"),
            source: None,
            observed_at: Local::now(),
        }
    }

    #[test]
    fn test_severity_total_order() {
        assert!(Severity::Safe < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_empty_log_is_safe() {
        let log = AlertLog::new(50);
        assert!(log.is_empty());
        assert_eq!(log.current_severity(), Severity::Safe);
    }

    #[test]
    fn test_most_recent_alert_wins_even_when_lower() {
        let mut log = AlertLog::new(50);
        log.record(make_alert(Severity::Critical, "SENSITIVE_DATA"));
        assert_eq!(log.current_severity(), Severity::Critical);
        log.record(make_alert(Severity::Medium, "HIGH_VOLUME"));
        assert_eq!(log.current_severity(), Severity::Medium);
    }

    #[test]
    fn test_log_is_newest_first_and_capped() {
        let mut log = AlertLog::new(50);
        for i in 0..60 {
            log.record(make_alert(Severity::High, &format!("A{i}")));
            assert!(log.len() <= 50);
        }
        let snapshot = log.snapshot();
        assert_eq!(snapshot.len(), 50);
        assert_eq!(snapshot[0].kind, "A59");
        assert_eq!(snapshot[49].kind, "A10");
    }

    #[test]
    fn test_low_levels_are_retained() {
        let mut log = AlertLog::new(3);
        log.record(make_alert(Severity::Critical, "A"));
        log.record(make_alert(Severity::Safe, "B"));
        log.record(make_alert(Severity::Medium, "C"));
        let kinds: Vec<String> = log.snapshot().into_iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec!["C", "B", "A"]);
    }

    #[test]
    fn test_status_tier_mapping() {
        assert_eq!(StatusTier::from(Severity::Critical), StatusTier::Critical);
        assert_eq!(StatusTier::from(Severity::High), StatusTier::Elevated);
        assert_eq!(StatusTier::from(Severity::Medium), StatusTier::Normal);
        assert_eq!(StatusTier::from(Severity::Safe), StatusTier::Normal);
    }

    #[test]
    fn test_wire_threat_decodes_and_rejects_unknown_level() {
        let wire: ThreatWire = serde_json::from_value(serde_json::json!({
            "type": "KNOWN_MALICIOUS_IP", "level": "CRITICAL",
            "message": "Destination on blocklist", "source": "ThreatIntel Feed"
        }))
        .unwrap();
        let alert = wire.observed(Local::now());
        assert_eq!(alert.level, Severity::Critical);
        assert_eq!(alert.source.as_deref(), Some("ThreatIntel Feed"));

        let bad = serde_json::from_value::<ThreatWire>(serde_json::json!({
            "type": "X", "level": "LOW", "message": "m"
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_alert_serializes_type_field() {
        let json = serde_json::to_value(make_alert(Severity::High, "ML_ANOMALY")).unwrap();
        assert_eq!(json["type"], "ML_ANOMALY");
        assert_eq!(json["level"], "HIGH");
    }
}
