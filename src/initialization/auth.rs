//! Bearer token resolution.
//!
//! The pipeline only needs an opaque token string. It is taken from the
//! configuration, then from `WARCRAFTLOGS_TOKEN`, and finally requested from the
//! OAuth token endpoint with the client-credentials grant. A token obtained from
//! the endpoint is written back to the env file so the next run can reuse it.

use std::io::ErrorKind;
use std::path::Path;

use log::{debug, info};
use serde::Deserialize;

use crate::config::{Config, CLIENT_ID_ENV_VAR, CLIENT_SECRET_ENV_VAR, TOKEN_ENV_VAR};
use crate::error_handling::InitializationError;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Resolves the bearer token used for every API call.
///
/// # Errors
///
/// Returns `MissingCredentialsError` when no token is available and no client
/// credentials are configured, or a token request/store error.
pub async fn resolve_token(
    config: &Config,
    client: &reqwest::Client,
) -> Result<String, InitializationError> {
    if let Some(token) = config.access_token.as_deref().filter(|t| !t.is_empty()) {
        return Ok(token.to_string());
    }

    if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
        if !token.is_empty() {
            debug!("Using token from {}", TOKEN_ENV_VAR);
            return Ok(token);
        }
    }

    let (Some(client_id), Some(client_secret)) =
        (config.client_id.as_deref(), config.client_secret.as_deref())
    else {
        return Err(InitializationError::MissingCredentialsError(format!(
            "set {} or both {} and {}",
            TOKEN_ENV_VAR, CLIENT_ID_ENV_VAR, CLIENT_SECRET_ENV_VAR
        )));
    };

    info!("No token found, requesting a new one");
    let token = request_token(client, &config.token_url, client_id, client_secret).await?;
    store_token(&config.env_file, TOKEN_ENV_VAR, &token)?;
    info!(
        "Stored new token in {} under {}",
        config.env_file.display(),
        TOKEN_ENV_VAR
    );
    Ok(token)
}

/// Requests an access token with the OAuth client-credentials grant.
pub async fn request_token(
    client: &reqwest::Client,
    token_url: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<String, InitializationError> {
    let response = client
        .post(token_url)
        .basic_auth(client_id, Some(client_secret))
        .form(&[("grant_type", "client_credentials")])
        .send()
        .await
        .map_err(|e| InitializationError::TokenRequestError(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(InitializationError::TokenRequestError(format!(
            "token endpoint returned HTTP {}",
            status.as_u16()
        )));
    }

    let body: TokenResponse = response
        .json()
        .await
        .map_err(|e| InitializationError::TokenRequestError(e.to_string()))?;

    body.access_token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            InitializationError::TokenRequestError(
                "access token not found in the response".to_string(),
            )
        })
}

/// Sets `key=token` in a dotenv file, replacing an existing assignment or appending one.
pub fn store_token(path: &Path, key: &str, token: &str) -> Result<(), InitializationError> {
    let store_err = |source| InitializationError::TokenStoreError {
        path: path.to_path_buf(),
        source,
    };

    let existing = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => return Err(store_err(e)),
    };

    let prefix = format!("{}=", key);
    let assignment = format!("{}{}", prefix, token);
    let mut replaced = false;
    let mut lines: Vec<String> = existing
        .lines()
        .map(|line| {
            if line.trim_start().starts_with(&prefix) {
                replaced = true;
                assignment.clone()
            } else {
                line.to_string()
            }
        })
        .collect();
    if !replaced {
        lines.push(assignment);
    }

    let mut content = lines.join("\n");
    content.push('\n');
    std::fs::write(path, content).map_err(store_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_store_token_appends_to_new_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        store_token(&path, "WARCRAFTLOGS_TOKEN", "abc").unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "WARCRAFTLOGS_TOKEN=abc\n"
        );
    }

    #[test]
    fn test_store_token_replaces_existing_assignment() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "CLIENT_ID=id\nWARCRAFTLOGS_TOKEN=old\nOTHER=1\n").unwrap();

        store_token(&path, "WARCRAFTLOGS_TOKEN", "new").unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "CLIENT_ID=id\nWARCRAFTLOGS_TOKEN=new\nOTHER=1\n"
        );
    }

    #[tokio::test]
    async fn test_configured_token_wins() {
        let config = Config {
            access_token: Some("configured".to_string()),
            ..Default::default()
        };
        let client = reqwest::Client::new();
        assert_eq!(resolve_token(&config, &client).await.unwrap(), "configured");
    }
}
