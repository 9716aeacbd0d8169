use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Stored credentials for the CLI
#[derive(Debug, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub api_url: String,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

pub fn client() -> reqwest::Client {
    reqwest::Client::new()
}

pub fn exit_error(message: &str, docs_hint: Option<&str>) -> ! {
    let mut err = json!({
        "error": "cli_error",
        "message": message
    });
    if let Some(hint) = docs_hint {
        err["docs_hint"] = json!(hint);
    }
    eprintln!("{}", serde_json::to_string_pretty(&err).unwrap_or_default());
    std::process::exit(4);
}

pub fn config_path() -> std::path::PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("giftwise")
        .join("config.json")
}

pub fn load_credentials() -> Option<StoredCredentials> {
    let data = std::fs::read_to_string(config_path()).ok()?;
    serde_json::from_str(&data).ok()
}

pub fn save_credentials(creds: &StoredCredentials) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let data = serde_json::to_string_pretty(creds)?;

    // Owner read/write only
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(&path)?;
    file.write_all(data.as_bytes())?;

    Ok(())
}

/// Resolve a Bearer token for API requests (priority order):
/// 1. GIFTWISE_TOKEN env var
/// 2. Unexpired token in ~/.config/giftwise/config.json
pub fn resolve_token() -> Result<String, String> {
    if let Ok(token) = std::env::var("GIFTWISE_TOKEN") {
        return Ok(token);
    }

    match load_credentials() {
        Some(creds) if creds.expires_at > Utc::now() => Ok(creds.access_token),
        Some(_) => Err("Stored token has expired. Run `giftwise login` again.".to_string()),
        None => Err("No credentials found. Run `giftwise login` or set GIFTWISE_TOKEN.".to_string()),
    }
}

/// Join base URL, path and query pairs.
pub fn build_url(
    api_url: &str,
    path: &str,
    query: &[(String, String)],
) -> Result<reqwest::Url, String> {
    let mut url = reqwest::Url::parse(&format!("{}{path}", api_url.trim_end_matches('/')))
        .map_err(|e| format!("Invalid URL: {api_url}{path}: {e}"))?;
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in query {
            pairs.append_pair(k, v);
        }
    }
    Ok(url)
}

/// Map an HTTP status to the CLI exit code.
///
/// Exit codes: 0=success (2xx), 1=client error (4xx), 2=server error (5xx),
///             3=connection error, 4=usage error
pub fn exit_code_for(status: u16) -> i32 {
    match status {
        200..=299 => 0,
        400..=499 => 1,
        _ => 2,
    }
}

/// Send a request and return status plus JSON body (no printing).
pub async fn send(
    api_url: &str,
    method: reqwest::Method,
    path: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
    query: &[(String, String)],
) -> Result<(u16, serde_json::Value), (i32, serde_json::Value)> {
    let url = build_url(api_url, path, query)
        .map_err(|message| (4, json!({"error": "cli_error", "message": message})))?;

    let mut req = client().request(method, url);
    if let Some(t) = token {
        req = req.header("Authorization", format!("Bearer {t}"));
    }
    if let Some(b) = body {
        req = req.json(&b);
    }

    let resp = req.send().await.map_err(|e| {
        (
            3,
            json!({
                "error": "connection_error",
                "message": format!("{e}"),
                "docs_hint": "Is the API server running? Check GIFTWISE_API_URL."
            }),
        )
    })?;

    let status = resp.status().as_u16();
    let body = match resp.json().await {
        Ok(v) => v,
        Err(e) => json!({"raw_error": format!("Failed to parse response as JSON: {e}")}),
    };
    Ok((status, body))
}

/// Execute an API request, print the response, and return the exit code.
pub async fn api_request(
    api_url: &str,
    method: reqwest::Method,
    path: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
    query: &[(String, String)],
    raw: bool,
) -> i32 {
    match send(api_url, method, path, token, body, query).await {
        Ok((status, body)) => {
            let exit_code = exit_code_for(status);
            print_json(&body, raw, exit_code != 0);
            exit_code
        }
        Err((exit_code, err)) => {
            print_json(&err, raw, true);
            exit_code
        }
    }
}

pub fn print_json(value: &serde_json::Value, raw: bool, to_stderr: bool) {
    let formatted = if raw {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
    .unwrap_or_default();

    if to_stderr {
        eprintln!("{formatted}");
    } else {
        println!("{formatted}");
    }
}

// Unix-specific imports for file permissions
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

// No-op on non-unix
#[cfg(not(unix))]
trait OpenOptionsExt {
    fn mode(&mut self, _mode: u32) -> &mut Self;
}

#[cfg(not(unix))]
impl OpenOptionsExt for std::fs::OpenOptions {
    fn mode(&mut self, _mode: u32) -> &mut Self {
        self
    }
}
