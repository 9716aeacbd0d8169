use chrono::{Duration, Utc};
use serde_json::json;

use crate::util::{
    StoredCredentials, api_request, config_path, exit_code_for, print_json, resolve_token,
    save_credentials, send,
};

/// Server-side token lifetime.
const TOKEN_TTL_DAYS: i64 = 7;

pub async fn signup(
    api_url: &str,
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
    raw: bool,
) -> i32 {
    api_request(
        api_url,
        reqwest::Method::POST,
        "/api/users",
        None,
        Some(json!({
            "firstName": first_name,
            "lastName": last_name,
            "email": email,
            "password": password,
        })),
        &[],
        raw,
    )
    .await
}

/// Log in and store the returned token in the config file.
pub async fn login(api_url: &str, email: &str, password: &str, raw: bool) -> i32 {
    let (status, body) = match send(
        api_url,
        reqwest::Method::POST,
        "/api/auth",
        None,
        Some(json!({"email": email, "password": password})),
        &[],
    )
    .await
    {
        Ok(result) => result,
        Err((exit_code, err)) => {
            print_json(&err, raw, true);
            return exit_code;
        }
    };

    let exit_code = exit_code_for(status);
    let token = match body["token"].as_str() {
        Some(token) if exit_code == 0 => token.to_string(),
        _ => {
            print_json(&body, raw, true);
            return if exit_code == 0 { 2 } else { exit_code };
        }
    };

    let creds = StoredCredentials {
        api_url: api_url.to_string(),
        access_token: token,
        expires_at: Utc::now() + Duration::days(TOKEN_TTL_DAYS),
    };
    if let Err(e) = save_credentials(&creds) {
        print_json(
            &json!({"error": "cli_error", "message": format!("Failed to save credentials: {e}")}),
            raw,
            true,
        );
        return 4;
    }

    print_json(
        &json!({
            "status": "authenticated",
            "expires_at": creds.expires_at,
            "config_path": config_path().to_string_lossy()
        }),
        raw,
        false,
    );
    0
}

pub fn logout(raw: bool) -> i32 {
    let path = config_path();
    if path.exists() {
        if let Err(e) = std::fs::remove_file(&path) {
            print_json(
                &json!({"error": "cli_error", "message": format!("Failed to remove {}: {e}", path.display())}),
                raw,
                true,
            );
            return 4;
        }
    }
    print_json(
        &json!({
            "status": "logged_out",
            "config_path": path.to_string_lossy()
        }),
        raw,
        false,
    );
    0
}

pub async fn whoami(api_url: &str, raw: bool) -> i32 {
    let token = match resolve_token() {
        Ok(token) => token,
        Err(message) => {
            print_json(&json!({"error": "cli_error", "message": message}), raw, true);
            return 4;
        }
    };
    api_request(
        api_url,
        reqwest::Method::GET,
        "/api/users/me",
        Some(&token),
        None,
        &[],
        raw,
    )
    .await
}
