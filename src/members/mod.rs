use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default member list endpoint
pub const DEFAULT_SOURCE_URL: &str =
    "https://geektrust.s3-ap-southeast-1.amazonaws.com/adminui-problem/members.json";

/// Timeout for the one-time member fetch
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One member record. The endpoint carries ids as JSON strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        source: reqwest::Error,
    },
    #[error("{url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("invalid member payload: {0}")]
    Payload(reqwest::Error),
}

/// Fetch the full member list from the given endpoint.
///
/// This runs exactly once at startup; there is no retry and no refetch.
/// Callers fall back to an empty roster on failure.
pub async fn fetch_members(url: &str) -> Result<Vec<Member>, FetchError> {
    let client = reqwest::Client::builder()
        .user_agent(format!("kanri/{}", env!("CARGO_PKG_VERSION")))
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(FetchError::Client)?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::Request {
            url: url.to_string(),
            source: e,
        })?;

    if !response.status().is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }

    let members: Vec<Member> = response.json().await.map_err(FetchError::Payload)?;
    tracing::info!("Loaded {} members from {}", members.len(), url);
    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_deserialization() {
        let payload = r#"[
            {"id": "1", "name": "Aaron Miles", "email": "aaron@mailinator.com", "role": "member"},
            {"id": "2", "name": "Aishwarya Naik", "email": "aishwarya@mailinator.com", "role": "admin"}
        ]"#;

        let members: Vec<Member> = serde_json::from_str(payload).unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].id, "1");
        assert_eq!(members[0].name, "Aaron Miles");
        assert_eq!(members[1].role, "admin");
    }

    #[test]
    fn test_member_missing_role_defaults_empty() {
        let payload = r#"[{"id": "7", "name": "No Role", "email": "norole@mailinator.com"}]"#;
        let members: Vec<Member> = serde_json::from_str(payload).unwrap();
        assert_eq!(members[0].role, "");
    }

    #[test]
    fn test_member_round_trip() {
        let member = Member {
            id: "42".to_string(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            role: "member".to_string(),
        };
        let json = serde_json::to_string(&member).unwrap();
        let back: Member = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, member.id);
        assert_eq!(back.email, member.email);
    }
}
