// file: src/models/credentials.rs
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// OAuth tokens stored for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Credentials {
    pub user_id: i64,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credentials {
    pub fn new(user_id: i64, access_token: String, refresh_token: Option<String>) -> Self {
        Self {
            user_id,
            access_token,
            refresh_token,
            expires_at: None,
        }
    }

    pub fn expiring_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// A token with no known expiry is assumed usable; the remote will
    /// reject it if not.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= now + Duration::minutes(1),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_needs_refresh() {
        let now = Utc.with_ymd_and_hms(2021, 10, 15, 10, 0, 0).unwrap();
        let creds = Credentials::new(1, "token".to_string(), Some("refresh".to_string()));
        assert!(!creds.needs_refresh(now));

        let expired = creds.clone().expiring_at(now - Duration::minutes(5));
        assert!(expired.needs_refresh(now));

        let almost = creds.clone().expiring_at(now + Duration::seconds(30));
        assert!(almost.needs_refresh(now));

        let fresh = creds.expiring_at(now + Duration::hours(1));
        assert!(!fresh.needs_refresh(now));
    }
}
