use serde_json::{json, Value};

use super::outbound::post_json;
use super::{FederatedProfile, IdentityProvider};

const LOOKUP_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:lookup";

/// Verifies federated ID tokens with the Identity Toolkit `accounts:lookup`
/// endpoint.
#[derive(Clone, Debug)]
pub struct FirebaseIdentity {
    api_key: String,
}

impl FirebaseIdentity {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into() }
    }

    fn lookup_url(&self) -> String {
        format!("{}?key={}", LOOKUP_URL, urlencoding::encode(&self.api_key))
    }
}

impl IdentityProvider for FirebaseIdentity {
    async fn verify(&self, token: &str) -> anyhow::Result<FederatedProfile> {
        if self.api_key.is_empty() {
            anyhow::bail!("identity provider is not configured");
        }
        let (status, body) = post_json(&self.lookup_url(), &json!({ "idToken": token })).await?;
        if status != 200 {
            anyhow::bail!("token lookup failed with status {}", status);
        }
        parse_lookup(&body)
    }
}

fn parse_lookup(body: &Value) -> anyhow::Result<FederatedProfile> {
    let user = &body["users"][0];
    let email = user["email"]
        .as_str()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| anyhow::anyhow!("verified token carries no email"))?;
    let name = user["displayName"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    Ok(FederatedProfile {
        email: email.to_string(),
        name,
        picture: user["photoUrl"].as_str().map(str::to_string),
    })
}
