use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::response::{interpret_attachment_response, interpret_upload_response};
use crate::config::{AccessCodes, DatabaseConfig};
use crate::error::{AuthError, CollaboratorError};
use crate::fetch::auth::Bearer;
use crate::fetch::{BasicClient, fetch_text};
use crate::record::TestRecord;
use crate::services::test_database::{SubmitOutcome, TestDatabase};

const ATTACHMENT_DESCRIPTION: &str = "Automatic Attachment of Original Data File";

#[derive(Serialize)]
struct GrantRequest<'a> {
    grant_type: &'a str,
    #[serde(rename = "accessCode1")]
    access_code1: &'a str,
    #[serde(rename = "accessCode2")]
    access_code2: &'a str,
    scope: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    id_token: Option<String>,
}

pub struct ItkDbClient {
    api_url: String,
    http: Bearer<BasicClient>,
}

impl ItkDbClient {
    /// Exchanges the access codes for a token and returns an authenticated
    /// client.
    #[tracing::instrument(skip_all, fields(auth_url = %config.auth_url))]
    pub async fn connect(config: &DatabaseConfig, codes: &AccessCodes) -> Result<Self, AuthError> {
        let basic = BasicClient::new(config.timeout, config.connect_timeout)?;
        let token = Self::exchange_codes(&basic, config, codes).await?;
        let http = Bearer::new(basic, &token).map_err(|_| AuthError::MalformedToken)?;

        info!("Authenticated with test database");

        Ok(Self {
            api_url: config.api_url.clone(),
            http,
        })
    }

    async fn exchange_codes(
        client: &BasicClient,
        config: &DatabaseConfig,
        codes: &AccessCodes,
    ) -> Result<String, AuthError> {
        let grant = GrantRequest {
            grant_type: "password",
            access_code1: &codes.code1,
            access_code2: &codes.code2,
            scope: &config.scope,
        };

        let req = client.inner().post(&config.auth_url).json(&grant).build()?;
        let (status, body) = fetch_text(client, req).await?;

        if !status.is_success() {
            return Err(AuthError::Rejected { status, body });
        }

        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|_| AuthError::MalformedToken)?;

        token
            .id_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MalformedToken)
    }

    fn endpoint(&self, command: &str) -> String {
        format!("{}/{}", self.api_url, command)
    }

    fn requests(&self) -> &reqwest::Client {
        self.http.inner.inner()
    }
}

#[async_trait]
impl TestDatabase for ItkDbClient {
    #[tracing::instrument(skip_all, fields(component = %record.component, run = %record.run_number))]
    async fn submit_record(&self, record: &TestRecord) -> Result<SubmitOutcome, CollaboratorError> {
        let req = self
            .requests()
            .post(self.endpoint("uploadTestRunResults"))
            .json(record)
            .build()?;

        let (status, body) = fetch_text(&self.http, req).await?;
        debug!(%status, "uploadTestRunResults responded");

        interpret_upload_response(status, &body)
    }

    #[tracing::instrument(skip(self, path), fields(path = %path.display()))]
    async fn attach_file(&self, test_run_id: &str, path: &Path) -> Result<(), CollaboratorError> {
        let contents = tokio::fs::read(path)
            .await
            .map_err(|source| CollaboratorError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "pull_test.csv".to_string());

        let data = Part::bytes(contents)
            .file_name(file_name.clone())
            .mime_str("text/csv")?;

        let form = Form::new()
            .text("testRun", test_run_id.to_string())
            .text("type", "file")
            .text("title", file_name)
            .text("description", ATTACHMENT_DESCRIPTION)
            .part("data", data);

        let req = self
            .requests()
            .post(self.endpoint("createTestRunAttachment"))
            .multipart(form)
            .build()?;

        let (status, body) = fetch_text(&self.http, req).await?;
        debug!(%status, "createTestRunAttachment responded");

        interpret_attachment_response(status, &body)
    }
}
