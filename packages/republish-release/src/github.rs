use async_trait::async_trait;
use hyper::{Method, Uri};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;

use republish_config::ReleaseConfig;
use republish_utils::http::{
    empty_body, file_body, full_body, request, HttpBody, ResponseData,
};

use crate::client::ReleaseClient;
use crate::data::{Asset, Release};
use crate::error::ClientError;
use crate::probe::{probe_url, ProbeReport};

const ACCEPT: &str = "application/vnd.github.v3+json";
const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const ARCHIVE_CONTENT_TYPE: &str = "application/x-7z-compressed";

/// GitHub REST v3 implementation of [`ReleaseClient`].
pub struct GitHubReleaseClient {
    repository: String,
    token: String,
    user_agent: String,
    api_url: String,
    upload_url: String,
    server_url: String,
}

impl GitHubReleaseClient {
    pub fn new(config: &ReleaseConfig) -> Self {
        GitHubReleaseClient {
            repository: config.repository.clone(),
            token: config.token.clone(),
            user_agent: config.user_agent(),
            api_url: config.api_url.clone(),
            upload_url: config.upload_url.clone(),
            server_url: config.server_url.clone(),
        }
    }

    fn get_header_map(&self) -> HashMap<String, String> {
        HashMap::from([
            ("User-Agent".to_string(), self.user_agent.clone()),
            ("Authorization".to_string(), format!("Bearer {}", self.token)),
            ("Accept".to_string(), ACCEPT.to_string()),
        ])
    }

    fn get_json_header_map(&self) -> HashMap<String, String> {
        let mut map = self.get_header_map();
        map.insert("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string());
        map
    }

    fn repo_url(&self, base: &str, suffix: &str) -> String {
        format!("{}/repos/{}/{}", base, self.repository, suffix)
    }

    pub fn download_url(&self, tag: &str, asset_name: &str) -> String {
        format!(
            "{}/{}/releases/download/{}/{}",
            self.server_url,
            self.repository,
            urlencoding::encode(tag),
            urlencoding::encode(asset_name)
        )
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        header_map: &HashMap<String, String>,
        body: HttpBody,
        expected_status: u16,
    ) -> Result<ResponseData, ClientError> {
        let uri = url.parse::<Uri>().map_err(|e| ClientError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        tracing::debug!(%method, url, "sending request");
        let rsp = request(method, uri, header_map, body, false)
            .await
            .map_err(ClientError::Transport)?;
        if rsp.status != expected_status {
            return Err(ClientError::Status {
                status: rsp.status,
                reason: rsp.reason().to_string(),
                body: rsp.body_text(),
            });
        }
        Ok(rsp)
    }
}

fn decode<T: DeserializeOwned>(rsp: &ResponseData) -> Result<T, ClientError> {
    Ok(serde_json::from_slice(
        rsp.body.as_deref().unwrap_or_default(),
    )?)
}

#[async_trait]
impl ReleaseClient for GitHubReleaseClient {
    async fn get_release_by_tag(&self, tag: &str) -> Result<Release, ClientError> {
        let url = self.repo_url(
            &self.api_url,
            &format!("releases/tags/{}", urlencoding::encode(tag)),
        );
        let rsp = self
            .send(Method::GET, &url, &self.get_header_map(), empty_body(), 200)
            .await?;
        decode(&rsp)
    }

    async fn upload_asset(
        &self,
        release_id: u64,
        name: &str,
        archive: &Path,
    ) -> Result<Asset, ClientError> {
        let (body, len) = file_body(archive)
            .await
            .map_err(|source| ClientError::LocalIo {
                path: archive.to_path_buf(),
                source,
            })?;
        let url = self.repo_url(
            &self.upload_url,
            &format!(
                "releases/{}/assets?name={}",
                release_id,
                urlencoding::encode(name)
            ),
        );
        let mut header_map = self.get_header_map();
        header_map.insert("Content-Type".to_string(), ARCHIVE_CONTENT_TYPE.to_string());
        header_map.insert("Content-Length".to_string(), len.to_string());

        let rsp = self
            .send(Method::POST, &url, &header_map, body, 201)
            .await?;
        decode(&rsp)
    }

    async fn rename_asset(&self, asset_id: u64, name: &str) -> Result<Asset, ClientError> {
        let url = self.repo_url(&self.api_url, &format!("releases/assets/{}", asset_id));
        let payload = json!({ "name": name }).to_string();
        let rsp = self
            .send(
                Method::PATCH,
                &url,
                &self.get_json_header_map(),
                full_body(payload),
                200,
            )
            .await?;
        decode(&rsp)
    }

    async fn delete_asset(&self, asset_id: u64) -> Result<(), ClientError> {
        let url = self.repo_url(&self.api_url, &format!("releases/assets/{}", asset_id));
        self.send(
            Method::DELETE,
            &url,
            &self.get_header_map(),
            empty_body(),
            204,
        )
        .await?;
        Ok(())
    }

    async fn update_release_body(
        &self,
        release_id: u64,
        body: &str,
    ) -> Result<Release, ClientError> {
        let url = self.repo_url(&self.api_url, &format!("releases/{}", release_id));
        let payload = json!({ "body": body }).to_string();
        let rsp = self
            .send(
                Method::PATCH,
                &url,
                &self.get_json_header_map(),
                full_body(payload),
                200,
            )
            .await?;
        decode(&rsp)
    }

    async fn probe_download(&self, tag: &str, asset_name: &str) -> ProbeReport {
        probe_url(&self.download_url(tag, asset_name)).await
    }
}
