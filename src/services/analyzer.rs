// src/services/analyzer.rs

//! HTTP client for the analysis service.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, CODE_NOT_FOUND, Result};
use crate::models::{Analysis, ServiceConfig};
use crate::services::{AnalyzeOptions, Analyzer};
use crate::utils::http;

/// Request body for `POST /analyze`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest<'a> {
    name: &'a str,
    revision: Option<&'a str>,
    github_tokens: &'a [String],
    #[serde(rename = "ref")]
    git_ref: Option<&'a str>,
    wait_rate_limit: bool,
}

/// Error body returned by the analysis service.
#[derive(Debug, Default, Deserialize)]
struct FailureBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    unrecoverable: bool,
    #[serde(default)]
    message: Option<String>,
}

/// Analysis service reachable over HTTP.
#[derive(Clone)]
pub struct HttpAnalyzer {
    client: Client,
    base: Url,
}

impl HttpAnalyzer {
    pub fn new(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    /// Build an analyzer client from configuration.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let client = http::create_async_client(config.timeout_secs)?;
        let base = Url::parse(&config.url)?;
        Ok(Self::new(client, base))
    }

    /// Turn a failed response into a tagged analysis error.
    fn interpret_failure(name: &str, status: StatusCode, body: &str) -> AppError {
        let failure: FailureBody = serde_json::from_str(body).unwrap_or_default();

        let code = failure.code.or_else(|| {
            (status == StatusCode::NOT_FOUND).then(|| CODE_NOT_FOUND.to_string())
        });
        let message = failure
            .message
            .unwrap_or_else(|| http::describe_failure(status, body));

        AppError::Analysis {
            name: name.to_string(),
            code,
            unrecoverable: failure.unrecoverable,
            message,
        }
    }
}

#[async_trait]
impl Analyzer for HttpAnalyzer {
    async fn analyze(&self, name: &str, options: &AnalyzeOptions) -> Result<Analysis> {
        let request = AnalyzeRequest {
            name,
            revision: options.revision.as_deref(),
            github_tokens: &options.credentials,
            git_ref: options.git_ref.as_deref(),
            wait_rate_limit: options.wait_rate_limit,
        };

        let response = self
            .client
            .post(http::endpoint(&self.base, &["analyze"])?)
            .json(&request)
            .send()
            .await?;
        let status = response.status();

        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(Self::interpret_failure(name, status, &body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let tokens = vec!["t1".to_string()];
        let request = AnalyzeRequest {
            name: "left-pad",
            revision: None,
            github_tokens: &tokens,
            git_ref: Some("develop"),
            wait_rate_limit: true,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["name"], "left-pad");
        assert!(json["revision"].is_null());
        assert_eq!(json["githubTokens"][0], "t1");
        assert_eq!(json["ref"], "develop");
        assert_eq!(json["waitRateLimit"], true);
    }

    #[test]
    fn test_failure_with_code() {
        let body = r#"{"code":"NOT_FOUND","message":"Module does not exist"}"#;
        let err = HttpAnalyzer::interpret_failure("ghost-pkg", StatusCode::BAD_REQUEST, body);

        match err {
            AppError::Analysis {
                code,
                unrecoverable,
                message,
                ..
            } => {
                assert_eq!(code.as_deref(), Some(CODE_NOT_FOUND));
                assert!(!unrecoverable);
                assert_eq!(message, "Module does not exist");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_plain_404_means_not_found() {
        let err = HttpAnalyzer::interpret_failure("ghost-pkg", StatusCode::NOT_FOUND, "");
        assert!(matches!(
            err,
            AppError::Analysis { code: Some(ref c), .. } if c == CODE_NOT_FOUND
        ));
    }

    #[test]
    fn test_unrecoverable_flag() {
        let body = r#"{"unrecoverable":true,"message":"Tarball too large"}"#;
        let err = HttpAnalyzer::interpret_failure("huge-pkg", StatusCode::UNPROCESSABLE_ENTITY, body);
        assert!(matches!(
            err,
            AppError::Analysis {
                code: None,
                unrecoverable: true,
                ..
            }
        ));
    }

    #[test]
    fn test_unparseable_body_is_untagged() {
        let err = HttpAnalyzer::interpret_failure("left-pad", StatusCode::BAD_GATEWAY, "<html>");
        match err {
            AppError::Analysis {
                code,
                unrecoverable,
                message,
                ..
            } => {
                assert!(code.is_none());
                assert!(!unrecoverable);
                assert_eq!(message, "502 Bad Gateway: <html>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
