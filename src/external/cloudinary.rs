use serde_json::json;

use super::outbound::post_json;
use super::MediaHost;

/// Unsigned uploads to a Cloudinary cloud.
#[derive(Clone, Debug)]
pub struct CloudinaryHost {
    cloud_name: String,
    upload_preset: String,
}

impl CloudinaryHost {
    pub fn new(cloud_name: impl Into<String>, upload_preset: impl Into<String>) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            upload_preset: upload_preset.into(),
        }
    }

    fn upload_url(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            urlencoding::encode(&self.cloud_name)
        )
    }
}

impl MediaHost for CloudinaryHost {
    async fn upload(&self, data_uri: &str) -> anyhow::Result<String> {
        if self.cloud_name.is_empty() || self.upload_preset.is_empty() {
            anyhow::bail!("media host is not configured");
        }
        let body = json!({ "file": data_uri, "upload_preset": self.upload_preset });
        let (status, resp) = post_json(&self.upload_url(), &body).await?;
        if status != 200 {
            let reason = resp["error"]["message"].as_str().unwrap_or("unknown error");
            anyhow::bail!("upload rejected with status {}: {}", status, reason);
        }
        resp["secure_url"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("upload response carries no secure_url"))
    }
}
