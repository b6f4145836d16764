use crate::ids::OwnerId;

/// Locally cached session record.
///
/// Written through on every balance change and read back on startup to seed
/// the balance before the first refresh returns. Never authoritative.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionRecord {
    pub owner_id: OwnerId,
    pub display_name: String,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub email: Option<String>,
    pub wallet_balance: f64,
    #[cfg(feature = "chrono")]
    pub stored_at: chrono::DateTime<chrono::Utc>,
}

impl SessionRecord {
    pub fn new(owner_id: OwnerId, display_name: impl Into<String>) -> Self {
        Self {
            owner_id,
            display_name: display_name.into(),
            email: None,
            wallet_balance: 0.0,
            #[cfg(feature = "chrono")]
            stored_at: chrono::Utc::now(),
        }
    }

    pub fn with_balance(mut self, wallet_balance: f64) -> Self {
        self.wallet_balance = wallet_balance;
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn record_uses_backend_field_names() {
        let record = SessionRecord::new(OwnerId::new("7").unwrap(), "Ana")
            .with_balance(120.5);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["owner_id"], "7");
        assert_eq!(json["wallet_balance"], 120.5);
        assert!(json.get("email").is_none());
    }

    #[test]
    fn rejects_record_with_bad_owner() {
        let raw = r#"{"owner_id":"","display_name":"x","wallet_balance":1.0,
            "stored_at":"2024-01-01T00:00:00Z"}"#;
        assert!(serde_json::from_str::<SessionRecord>(raw).is_err());
    }
}
