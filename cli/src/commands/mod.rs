//! CLI Commands

pub mod campaign;
pub mod config;
pub mod gateway;
pub mod phone;
pub mod price;
pub mod reminder;
pub mod sender;
pub mod template;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Backend RPC client
pub struct ApiClient {
    pub base_url: String,
    pub api_key: Option<String>,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, api_key: Option<&str>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(String::from),
            client: reqwest::Client::new(),
        }
    }

    /// Call a whitelisted backend method and decode its `message` payload
    pub async fn call<T: DeserializeOwned, B: Serialize>(&self, method: &str, body: &B) -> Result<T, String> {
        let url = format!("{}/api/method/{}", self.base_url, method);
        let mut req = self.client.post(&url).json(body);

        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("token {}", key));
        }

        tracing::debug!(%method, "Calling backend");
        let resp = req.send().await.map_err(|e| e.to_string())?;
        let status = resp.status();
        let json: Value = resp.json().await.map_err(|e| e.to_string())?;

        let payload = unwrap_envelope(json).map_err(|e| format!("{} ({})", e, status))?;
        serde_json::from_value(payload).map_err(|e| e.to_string())
    }
}

/// Extract `message` from a backend reply, or the error it reports
fn unwrap_envelope(mut json: Value) -> Result<Value, String> {
    if let Some(message) = json.get_mut("message") {
        return Ok(message.take());
    }
    let reason = ["exception", "exc_type", "_error_message"]
        .iter()
        .find_map(|key| json.get(*key).and_then(Value::as_str))
        .unwrap_or("No message in response");
    Err(reason.to_string())
}

/// Read a JSON, YAML or TOML file, chosen by extension
pub fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let content = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let parsed = match extension(path).as_str() {
        "json" => serde_json::from_str(&content).map_err(|e| e.to_string()),
        "toml" => toml::from_str(&content).map_err(|e| e.to_string()),
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
        other => Err(format!("unsupported file type '{}'", other)),
    };
    parsed.map_err(|e| format!("{}: {}", path.display(), e))
}

pub fn write_file<T: Serialize>(path: &Path, data: &T) -> Result<(), String> {
    let content = match extension(path).as_str() {
        "json" => serde_json::to_string_pretty(data).map_err(|e| e.to_string())?,
        "toml" => toml::to_string_pretty(data).map_err(|e| e.to_string())?,
        "yaml" | "yml" => serde_yaml::to_string(data).map_err(|e| e.to_string())?,
        other => return Err(format!("unsupported file type '{}'", other)),
    };
    fs::write(path, content).map_err(|e| format!("{}: {}", path.display(), e))
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sms_core::CampaignDocument;

    #[test]
    fn test_envelope_message() {
        let payload = unwrap_envelope(json!({"message": {"success": true}})).unwrap();
        assert_eq!(payload, json!({"success": true}));
    }

    #[test]
    fn test_envelope_error() {
        let err = unwrap_envelope(json!({"exc_type": "PermissionError"})).unwrap_err();
        assert_eq!(err, "PermissionError");
        assert!(unwrap_envelope(json!({})).is_err());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        assert_eq!(ApiClient::new("http://erp.local/", None).base_url, "http://erp.local");
    }

    #[test]
    fn test_file_round_trip_by_extension() {
        let dir = std::env::temp_dir().join(format!("smsctl-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let doc = CampaignDocument { title: "Spring".into(), ..Default::default() };

        for name in ["c.json", "c.yaml", "c.toml"] {
            let path = dir.join(name);
            write_file(&path, &doc).unwrap();
            let back: CampaignDocument = load_file(&path).unwrap();
            assert_eq!(back.title, "Spring");
        }
        assert!(load_file::<CampaignDocument>(&dir.join("c.txt")).is_err());
        fs::remove_dir_all(&dir).unwrap();
    }
}
