//! Domain primitives shared by the services and the HTTP layer.

pub mod access;
pub mod timestamp;

use serde::Serialize;
use std::fmt;

pub use access::{AccessDecision, Permission, Role, UnknownVariant};
pub use timestamp::parse_timestamp;

/// The distinguished administrator seeded at first start. Never deletable.
pub const PRIMARY_ADMIN_ID: i32 = 1;

pub const PRIMARY_ADMIN_USERNAME: &str = "admin";

/// Actions the core records in the audit log on its own behalf.
///
/// Entries created through the log endpoint may carry any action string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    GenerateKey,
    Activate,
    Reset,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GenerateKey => "generate_key",
            Self::Activate => "activate",
            Self::Reset => "reset",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_actions_use_wire_names() {
        assert_eq!(AuditAction::GenerateKey.to_string(), "generate_key");
        assert_eq!(AuditAction::Activate.as_str(), "activate");
        assert_eq!(
            serde_json::to_string(&AuditAction::Reset).unwrap(),
            "\"reset\""
        );
    }
}
