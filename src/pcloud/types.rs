use super::PcloudError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// The fixed set of remote operations this crate is allowed to issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcMethod {
    /// Folder metadata and contents behind a share code.
    ShowPublink,
    /// Folder contents by numeric folder id (non-public).
    ListFolder,
    /// Batch preview links for files inside a share code.
    GetPubThumbsLinks,
    /// A single sized link for one file inside a share code.
    GetPubThumbLink,
    /// Batch preview links by file id (non-public).
    GetThumbsLinks,
}

impl RpcMethod {
    pub const ALL: [RpcMethod; 5] = [
        RpcMethod::ShowPublink,
        RpcMethod::ListFolder,
        RpcMethod::GetPubThumbsLinks,
        RpcMethod::GetPubThumbLink,
        RpcMethod::GetThumbsLinks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RpcMethod::ShowPublink => "showpublink",
            RpcMethod::ListFolder => "listfolder",
            RpcMethod::GetPubThumbsLinks => "getpubthumbslinks",
            RpcMethod::GetPubThumbLink => "getpubthumblink",
            RpcMethod::GetThumbsLinks => "getthumbslinks",
        }
    }

    /// Share-code scoped calls that are issued without any client session.
    pub fn is_public(&self) -> bool {
        matches!(
            self,
            RpcMethod::ShowPublink | RpcMethod::GetPubThumbsLinks | RpcMethod::GetPubThumbLink
        )
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RpcMethod {
    type Err = PcloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RpcMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| PcloudError::UnsupportedMethod(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Text(String),
    Number(u64),
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Text(text) => f.write_str(text),
            Param::Number(number) => write!(f, "{}", number),
        }
    }
}

/// Ordered scalar parameters for one remote call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(&'static str, Param)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.0.push((key, Param::Text(value.into())));
        self
    }

    pub fn number(mut self, key: &'static str, value: u64) -> Self {
        self.0.push((key, Param::Number(value)));
        self
    }

    pub fn get(&self, key: &str) -> Option<&Param> {
        self.0.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        self.0.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }
}

/// Preview rendition requested from the batch thumbnail calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailSpec {
    pub size: String,
    pub crop: bool,
    pub kind: String,
}

impl ThumbnailSpec {
    fn apply(&self, params: Params) -> Params {
        params
            .text("size", self.size.clone())
            .number("crop", u64::from(self.crop))
            .text("type", self.kind.clone())
    }

    pub(crate) fn batch_params(&self, params: Params, file_ids: &[u64]) -> Params {
        let ids = file_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.apply(params.text("fileids", ids))
    }
}

// Wire shapes. Everything optional is defaulted so that partial payloads are
// judged by the album layer instead of failing deserialization outright.

#[derive(Debug, Clone, Deserialize)]
pub struct ListingResult {
    pub metadata: Option<FolderMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FolderMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub contents: Option<Vec<ListingEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingEntry {
    #[serde(default)]
    pub fileid: Option<u64>,
    #[serde(default)]
    pub isfolder: bool,
    #[serde(default)]
    pub contenttype: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl ListingEntry {
    pub fn is_image(&self) -> bool {
        !self.isfolder
            && self
                .contenttype
                .as_deref()
                .is_some_and(|content_type| content_type.starts_with("image"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchThumbResult {
    #[serde(default, deserialize_with = "skip_malformed")]
    pub thumbs: Vec<ThumbEntry>,
}

/// Parses each element on its own and drops the ones that do not fit `T`, so
/// one broken thumb entry costs that photo only.
fn skip_malformed<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!("Skipping malformed batch entry: {}", e);
                None
            }
        })
        .collect())
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThumbEntry {
    pub fileid: u64,
    #[serde(default)]
    pub result: u32,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub hosts: Vec<String>,
}

impl ThumbEntry {
    /// `None` when the entry is marked failed or carries no usable link.
    pub fn url(&self) -> Option<String> {
        if self.result != 0 {
            return None;
        }
        link_url(&self.hosts, self.path.as_deref()?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SingleLinkResult {
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default)]
    pub path: Option<String>,
}

impl SingleLinkResult {
    pub fn url(&self) -> Option<String> {
        link_url(&self.hosts, self.path.as_deref()?)
    }
}

/// Resolved links are always `https://{hosts[0]}{path}`.
pub fn link_url(hosts: &[String], path: &str) -> Option<String> {
    let host = hosts.first()?;
    if host.is_empty() || path.is_empty() {
        return None;
    }
    Some(format!("https://{}{}", host, path))
}
