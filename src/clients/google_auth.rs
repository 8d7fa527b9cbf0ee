use std::fs;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use inquire::Text;
use serde::{Deserialize, Serialize};

const CREDENTIALS_FILE: &str = "credentials.json";
const TOKEN_FILE: &str = "token.json";
const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";
const REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";
const HTTP_TIMEOUT: StdDuration = StdDuration::from_secs(30);

type AuthResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: InstalledCredentials,
}

#[derive(Debug, Clone, Deserialize)]
struct InstalledCredentials {
    client_id: String,
    client_secret: String,
    auth_uri: String,
    token_uri: String,
}

/// Token persisted to token.json between runs, so the browser dance only
/// happens once.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredToken {
    access_token: String,
    refresh_token: Option<String>,
    expiry: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Returns a valid Google Calendar access token: the cached one when still
/// fresh, a refreshed one when it expired, or a brand-new one via the
/// paste-the-code authorization flow.
pub async fn access_token() -> AuthResult<String> {
    let credentials = load_credentials()?;

    if let Some(token) = load_token() {
        if token.expiry > Utc::now() + Duration::seconds(60) {
            return Ok(token.access_token);
        }
        if let Some(refresh_token) = token.refresh_token.clone() {
            let refreshed = refresh(&credentials, &refresh_token).await?;
            save_token(&refreshed)?;
            return Ok(refreshed.access_token);
        }
    }

    let token = authorize(&credentials).await?;
    save_token(&token)?;
    Ok(token.access_token)
}

fn load_credentials() -> AuthResult<InstalledCredentials> {
    let content = fs::read_to_string(CREDENTIALS_FILE).map_err(|e| {
        format!("unable to read {CREDENTIALS_FILE}: {e} (download it from the Google Cloud console)")
    })?;
    let parsed: CredentialsFile = serde_json::from_str(&content)
        .map_err(|e| format!("unable to parse {CREDENTIALS_FILE}: {e}"))?;
    Ok(parsed.installed)
}

fn load_token() -> Option<StoredToken> {
    let content = fs::read_to_string(TOKEN_FILE).ok()?;
    serde_json::from_str(&content).ok()
}

fn save_token(token: &StoredToken) -> AuthResult<()> {
    let content = serde_json::to_string_pretty(token)?;
    fs::write(TOKEN_FILE, content).map_err(|e| format!("unable to write {TOKEN_FILE}: {e}"))?;
    Ok(())
}

async fn authorize(credentials: &InstalledCredentials) -> AuthResult<StoredToken> {
    let auth_url = format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline",
        credentials.auth_uri, credentials.client_id, REDIRECT_URI, CALENDAR_SCOPE
    );

    println!("Go to the following link in your browser:\n{auth_url}");
    let code = Text::new("Enter authorization code:").prompt()?;

    request_token(
        credentials,
        &[
            ("grant_type", "authorization_code"),
            ("client_id", &credentials.client_id),
            ("client_secret", &credentials.client_secret),
            ("redirect_uri", REDIRECT_URI),
            ("code", code.trim()),
        ],
        None,
    )
    .await
}

async fn refresh(credentials: &InstalledCredentials, refresh_token: &str) -> AuthResult<StoredToken> {
    request_token(
        credentials,
        &[
            ("grant_type", "refresh_token"),
            ("client_id", &credentials.client_id),
            ("client_secret", &credentials.client_secret),
            ("refresh_token", refresh_token),
        ],
        // Google omits the refresh token on renewal; keep the one we have.
        Some(refresh_token.to_string()),
    )
    .await
}

async fn request_token(
    credentials: &InstalledCredentials,
    params: &[(&str, &str)],
    fallback_refresh_token: Option<String>,
) -> AuthResult<StoredToken> {
    let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
    let response = client
        .post(&credentials.token_uri)
        .form(params)
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;

    let parsed: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| format!("invalid token response: {e}; body={body}"))?;

    if !status.is_success() || parsed.error.is_some() {
        let code = parsed.error.unwrap_or_else(|| format!("http_{}", status.as_u16()));
        let detail = parsed.error_description.unwrap_or(body);
        return Err(format!("token endpoint error: {code}; {detail}").into());
    }

    let access_token = parsed
        .access_token
        .ok_or("token response did not include an access token")?;
    let expires_in = parsed.expires_in.unwrap_or(0).max(0);

    Ok(StoredToken {
        access_token,
        refresh_token: parsed.refresh_token.or(fallback_refresh_token),
        expiry: Utc::now() + Duration::seconds(expires_in),
    })
}
