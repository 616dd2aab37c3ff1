//! Client for the archive server's JSON API (LANraragi-compatible).

use std::collections::HashSet;
use std::time::Duration;

use arclink_core::{ArchiveRecord, ArchiveSelection, PluginResult};
use arclink_logging::{arclink_info, arclink_request};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::fetch::{map_reqwest_error, read_body};
use crate::{FailureKind, TransportError};

const API_KEY_PARAM: &str = "key";

#[derive(Debug, Clone)]
pub struct ArchiveServerSettings {
    /// Server root, without a trailing `/`.
    pub base_url: String,
    pub api_key: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl ArchiveServerSettings {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            connect_timeout: Duration::from_secs(10),
            // Plugins may scrape remote sites before answering.
            request_timeout: Duration::from_secs(120),
            max_bytes: 64 * 1024 * 1024,
        }
    }
}

/// A metadata plugin installed on the archive server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub oneshot_arg: Option<String>,
    #[serde(default)]
    pub login_from: Option<String>,
    #[serde(default)]
    pub parameters: Vec<PluginParameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PluginParameter {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub default_value: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ArchiveDto {
    arcid: String,
    #[serde(default)]
    extension: String,
    #[serde(default)]
    isnew: serde_json::Value,
    #[serde(default)]
    pagecount: u32,
    #[serde(default)]
    progress: u32,
    #[serde(default)]
    tags: Option<String>,
    #[serde(default)]
    title: String,
}

impl From<ArchiveDto> for ArchiveRecord {
    fn from(dto: ArchiveDto) -> Self {
        let is_new = match &dto.isnew {
            serde_json::Value::Bool(flag) => *flag,
            serde_json::Value::String(text) => text.eq_ignore_ascii_case("true"),
            _ => false,
        };
        ArchiveRecord {
            id: dto.arcid,
            extension: dto.extension,
            is_new,
            page_count: dto.pagecount,
            progress: dto.progress,
            tags: dto.tags.unwrap_or_default(),
            title: dto.title,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PluginResponseDto {
    #[serde(default)]
    data: Option<PluginDataDto>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    success: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct PluginDataDto {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    new_tags: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl From<PluginResponseDto> for PluginResult {
    fn from(dto: PluginResponseDto) -> Self {
        let data = dto.data.unwrap_or_default();
        let error = dto.error.or(data.error).or_else(|| {
            (dto.success == Some(0)).then(|| "plugin reported failure".to_string())
        });
        PluginResult {
            error,
            new_tags: data.new_tags,
            title: data.title,
        }
    }
}

/// Archive server API client. Requests carry `Bearer base64(api key)`.
#[derive(Debug, Clone)]
pub struct ArchiveServerClient {
    client: reqwest::Client,
    settings: ArchiveServerSettings,
    authorization: String,
}

impl ArchiveServerClient {
    pub fn new(settings: ArchiveServerSettings) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| TransportError::new(FailureKind::Network, err.to_string()))?;
        let authorization = format!("Bearer {}", STANDARD.encode(&settings.api_key));
        Ok(Self {
            client,
            settings,
            authorization,
        })
    }

    pub fn settings(&self) -> &ArchiveServerSettings {
        &self.settings
    }

    pub async fn metadata_plugins(&self) -> Result<Vec<PluginInfo>, TransportError> {
        self.get_json(&["plugins", "metadata"]).await
    }

    pub async fn archives(&self) -> Result<Vec<ArchiveRecord>, TransportError> {
        let archives: Vec<ArchiveDto> = self.get_json(&["archives"]).await?;
        Ok(archives.into_iter().map(ArchiveRecord::from).collect())
    }

    pub async fn untagged_ids(&self) -> Result<HashSet<String>, TransportError> {
        let ids: Vec<String> = self.get_json(&["archives", "untagged"]).await?;
        Ok(ids.into_iter().collect())
    }

    /// Lists, orders and slices the archives a run works on.
    pub async fn load_archives(
        &self,
        selection: &ArchiveSelection,
    ) -> Result<Vec<ArchiveRecord>, TransportError> {
        arclink_info!("Getting all archives");
        let archives = self.archives().await?;
        let untagged = if selection.only_untagged {
            arclink_info!("Getting untagged archive ids");
            Some(self.untagged_ids().await?)
        } else {
            None
        };
        Ok(selection.apply(archives, untagged.as_ref()))
    }

    /// Runs `plugin` against one archive.
    ///
    /// Errors reported by the plugin come back inside the [`PluginResult`],
    /// including on a non-2xx status whose body still carries one.
    pub async fn invoke_plugin(
        &self,
        plugin: &PluginInfo,
        archive_id: &str,
        arg: Option<&str>,
    ) -> Result<PluginResult, TransportError> {
        let mut url = self.endpoint(&["plugins", "use"])?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair(API_KEY_PARAM, &self.settings.api_key)
                .append_pair("plugin", &plugin.namespace)
                .append_pair("id", archive_id);
            if let Some(arg) = arg {
                query.append_pair("arg", arg);
            }
        }

        let response = self
            .client
            .post(url.clone())
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        arclink_request!("POST", without_api_key(&url), status);
        let bytes = read_body(response, self.settings.max_bytes).await?;

        if !status.is_success() {
            return match serde_json::from_slice::<PluginResponseDto>(&bytes) {
                Ok(dto) if dto.error.is_some() => Ok(PluginResult::from(dto)),
                _ => Err(TransportError::new(
                    FailureKind::HttpStatus(status.as_u16()),
                    format!("plugin {} failed with {status}", plugin.namespace),
                )),
            };
        }
        let dto: PluginResponseDto = serde_json::from_slice(&bytes)
            .map_err(|err| TransportError::new(FailureKind::Decode, err.to_string()))?;
        Ok(dto.into())
    }

    /// Replaces an archive's tags, and its title when given.
    pub async fn update_metadata(
        &self,
        archive_id: &str,
        tags: &str,
        title: Option<&str>,
    ) -> Result<(), TransportError> {
        let mut url = self.endpoint(&["archives", archive_id, "metadata"])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("tags", tags);
            if let Some(title) = title {
                query.append_pair("title", title);
            }
        }

        let response = self
            .client
            .put(url.clone())
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        arclink_request!("PUT", url, status);
        if !status.is_success() {
            return Err(TransportError::new(
                FailureKind::HttpStatus(status.as_u16()),
                format!("metadata update for {archive_id} failed with {status}"),
            ));
        }
        Ok(())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = Url::parse(&format!("{}/api", self.settings.base_url))
            .map_err(|err| TransportError::new(FailureKind::InvalidUrl, err.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| {
                TransportError::new(FailureKind::InvalidUrl, "archive server url cannot be a base")
            })?
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, TransportError> {
        let url = self.endpoint(segments)?;
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        arclink_request!("GET", url, status);
        if !status.is_success() {
            return Err(TransportError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        let bytes = read_body(response, self.settings.max_bytes).await?;
        serde_json::from_slice(&bytes)
            .map_err(|err| TransportError::new(FailureKind::Decode, err.to_string()))
    }
}

/// `url` without the API key query pair, for request logs.
fn without_api_key(url: &Url) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| name != API_KEY_PARAM)
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();
    let mut clean = url.clone();
    if kept.is_empty() {
        clean.set_query(None);
    } else {
        clean.query_pairs_mut().clear().extend_pairs(kept);
    }
    clean
}
