use tracing::{error, info, warn};

/// Structured audit events for token issuance. Never receives secrets or tokens.
#[derive(Debug, Clone, Default)]
pub struct AuditLogger;

impl AuditLogger {
    pub fn new() -> Self {
        Self
    }

    pub fn token_issued(&self, kid: &str, expires_at: i64) {
        info!(target: "audit", event = "token_issued", kid, expires_at);
    }

    pub fn issuance_rejected(&self, reason: &str) {
        warn!(target: "audit", event = "issuance_rejected", reason);
    }

    pub fn issuance_failed(&self, kid: Option<&str>, error_msg: &str) {
        error!(target: "audit", event = "issuance_failed", kid = kid.unwrap_or(""), error = error_msg);
    }

    pub fn method_not_allowed(&self, method: &str) {
        warn!(target: "audit", event = "method_not_allowed", method);
    }
}
