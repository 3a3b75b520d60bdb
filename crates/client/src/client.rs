//! B2 API client implementation
//!
//! [`B2Client`] owns the authorized session and the two upload-target
//! caches, and funnels every operation through one authenticated caller.
//! The large-file upload path lives in [`crate::multipart`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sha1::{Digest, Sha1};
use tokio::sync::Mutex;

use b2_core::{
    AuthSession, Bucket, Credentials, Error, FileInfo, FileVersionList, Result, UploadTarget,
};

/// Host serving the authorization handshake
pub const B2_API_HOST: &str = "https://api.backblazeb2.com";

/// API version suffix appended to the authorize host and to the `apiUrl`
/// returned by the handshake
pub const B2_API_VERSION: &str = "/b2api/v1";

/// Content type sent when the caller does not specify one; tells B2 to
/// sniff the type from the file name
pub const DEFAULT_CONTENT_TYPE: &str = "b2/x-auto";

const AUTHORIZE_ACCOUNT: &str = "/b2_authorize_account";
const CREATE_BUCKET: &str = "/b2_create_bucket";
const DELETE_BUCKET: &str = "/b2_delete_bucket";
const LIST_BUCKETS: &str = "/b2_list_buckets";
const GET_UPLOAD_URL: &str = "/b2_get_upload_url";
const LIST_FILE_VERSIONS: &str = "/b2_list_file_versions";
const GET_FILE_INFO: &str = "/b2_get_file_info";
const DELETE_FILE_VERSION: &str = "/b2_delete_file_version";
const DOWNLOAD_FILE_BY_ID: &str = "/b2api/v1/b2_download_file_by_id";

/// Session state from the authorization handshake
///
/// Populated exactly once per client and immutable afterwards.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub(crate) authorization_token: String,
    /// API base with the version suffix already appended
    pub(crate) api_url: String,
    pub(crate) download_url: String,
    pub(crate) minimum_part_size: u64,
}

/// Request body for one API call
pub(crate) enum CallBody {
    None,
    Json(serde_json::Value),
    Bytes(Vec<u8>),
}

/// One API call's parameters
///
/// A fresh value is built at every call site; nothing is shared between
/// calls, so headers or query parameters can never leak from one request
/// into the next.
pub(crate) struct ApiCall {
    method: Method,
    headers: Vec<(&'static str, String)>,
    query: Vec<(&'static str, String)>,
    body: CallBody,
    requires_auth: bool,
    basic_auth: Option<(String, String)>,
}

impl ApiCall {
    pub(crate) fn get() -> Self {
        Self::new(Method::GET)
    }

    pub(crate) fn post() -> Self {
        Self::new(Method::POST)
    }

    fn new(method: Method) -> Self {
        Self {
            method,
            headers: Vec::new(),
            query: Vec::new(),
            body: CallBody::None,
            requires_auth: true,
            basic_auth: None,
        }
    }

    pub(crate) fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub(crate) fn query(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.query.push((name, value.into()));
        self
    }

    pub(crate) fn json(mut self, body: serde_json::Value) -> Self {
        self.body = CallBody::Json(body);
        self
    }

    pub(crate) fn bytes(mut self, body: Vec<u8>) -> Self {
        self.body = CallBody::Bytes(body);
        self
    }

    /// Skip the session `Authorization` header; upload POSTs carry the
    /// target's own token instead
    pub(crate) fn public(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    /// Authenticate with HTTP basic auth instead of the session token
    pub(crate) fn basic_auth(
        mut self,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.basic_auth = Some((user.into(), password.into()));
        self.requires_auth = false;
        self
    }
}

/// Client for a single B2 account
///
/// Holds the immutable session from the authorization handshake plus two
/// lazy caches of upload targets (per bucket id for simple uploads, per
/// large file id for part uploads). Safe to share across tasks; cache
/// population is serialized so concurrent uploads cannot race duplicate
/// "get upload URL" requests.
pub struct B2Client {
    http: reqwest::Client,
    credentials: Credentials,
    authorize_host: String,
    session: OnceLock<Session>,
    upload_targets: Mutex<HashMap<String, UploadTarget>>,
    pub(crate) part_targets: Mutex<HashMap<String, UploadTarget>>,
}

impl B2Client {
    /// Create an unauthorized client; call [`authorize`](Self::authorize)
    /// before any other operation
    pub fn new(credentials: Credentials) -> Self {
        Self::with_api_host(credentials, B2_API_HOST)
    }

    /// Create a client that authorizes against a non-default host
    pub fn with_api_host(credentials: Credentials, host: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials,
            authorize_host: host.into(),
            session: OnceLock::new(),
            upload_targets: Mutex::new(HashMap::new()),
            part_targets: Mutex::new(HashMap::new()),
        }
    }

    /// Create a client and run the authorization handshake
    pub async fn connect(credentials: Credentials) -> Result<Self> {
        let client = Self::new(credentials);
        client.authorize().await?;
        Ok(client)
    }

    /// Run the `b2_authorize_account` handshake and populate the session
    ///
    /// The session is set once; a second call leaves the original session
    /// in place.
    pub async fn authorize(&self) -> Result<()> {
        let host = format!("{}{}", self.authorize_host, B2_API_VERSION);
        let call = ApiCall::get().basic_auth(
            self.credentials.account_id.clone(),
            self.credentials.application_key.clone(),
        );
        let response = self.call(&host, AUTHORIZE_ACCOUNT, call).await?;
        let auth: AuthSession = read_json(response).await?;
        if auth.absolute_minimum_part_size == 0 {
            return Err(Error::Config(
                "authorization reported a minimum part size of 0".into(),
            ));
        }

        tracing::debug!(api_url = %auth.api_url, "authorized B2 session");
        let _ = self.session.set(Session {
            authorization_token: auth.authorization_token,
            api_url: format!("{}{}", auth.api_url, B2_API_VERSION),
            download_url: auth.download_url,
            minimum_part_size: auth.absolute_minimum_part_size,
        });
        Ok(())
    }

    /// Whether the authorization handshake has completed
    pub fn is_authorized(&self) -> bool {
        self.session.get().is_some()
    }

    /// The minimum part size reported by the handshake, when authorized
    pub fn minimum_part_size(&self) -> Option<u64> {
        self.session.get().map(|s| s.minimum_part_size)
    }

    pub(crate) fn session_or(&self, endpoint: &str) -> Result<&Session> {
        self.session.get().ok_or_else(|| Error::Unauthenticated {
            endpoint: endpoint.to_string(),
        })
    }

    /// Issue one HTTP request against `host` + `endpoint`
    ///
    /// The URL is the verbatim concatenation of the two; call sites own the
    /// slashes. When the call requires auth, the session token is attached
    /// (failing with `Unauthenticated` before any network I/O if the
    /// session is unset). Any status of 400 or above becomes an `Api`
    /// error carrying the status, URL and best-effort-decoded body.
    pub(crate) async fn call(
        &self,
        host: &str,
        endpoint: &str,
        call: ApiCall,
    ) -> Result<reqwest::Response> {
        let url = format!("{host}{endpoint}");
        let mut request = self.http.request(call.method, &url);

        if call.requires_auth {
            let session = self.session_or(endpoint)?;
            request = request.header("Authorization", &session.authorization_token);
        }
        if let Some((user, password)) = &call.basic_auth {
            request = request.basic_auth(user, Some(password));
        }
        for (name, value) in &call.headers {
            request = request.header(*name, value);
        }
        if !call.query.is_empty() {
            request = request.query(&call.query);
        }
        request = match call.body {
            CallBody::None => request,
            CallBody::Json(body) => request.json(&body),
            CallBody::Bytes(body) => request.body(body),
        };

        tracing::debug!(%url, "B2 API request");
        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let body = response
                .bytes()
                .await
                .map_err(|e| Error::Network(e.to_string()))?;
            let body = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
            return Err(Error::Api { status, url, body });
        }
        Ok(response)
    }

    /// Issue an authenticated call against the session's API base URL
    pub(crate) async fn api_call(
        &self,
        endpoint: &str,
        call: ApiCall,
    ) -> Result<reqwest::Response> {
        let api_url = self.session_or(endpoint)?.api_url.clone();
        self.call(&api_url, endpoint, call).await
    }

    /// Create a bucket
    pub async fn create_bucket(&self, bucket_name: &str, private: bool) -> Result<Bucket> {
        let bucket_type = if private { "allPrivate" } else { "allPublic" };
        let call = ApiCall::get()
            .query("accountId", self.credentials.account_id.clone())
            .query("bucketName", bucket_name)
            .query("bucketType", bucket_type);
        let response = self.api_call(CREATE_BUCKET, call).await?;
        read_json(response).await
    }

    /// Delete a bucket by id
    pub async fn delete_bucket(&self, bucket_id: &str) -> Result<()> {
        let call = ApiCall::get()
            .query("accountId", self.credentials.account_id.clone())
            .query("bucketId", bucket_id);
        self.api_call(DELETE_BUCKET, call).await?;
        Ok(())
    }

    /// List all buckets in the account
    pub async fn list_buckets(&self) -> Result<Vec<Bucket>> {
        #[derive(Deserialize)]
        struct BucketList {
            buckets: Vec<Bucket>,
        }

        let call = ApiCall::get().query("accountId", self.credentials.account_id.clone());
        let response = self.api_call(LIST_BUCKETS, call).await?;
        let list: BucketList = read_json(response).await?;
        Ok(list.buckets)
    }

    /// List file versions in a bucket
    ///
    /// `start_file_id` resumes a previous truncated listing; `limit` caps
    /// the number of returned versions.
    pub async fn list_files(
        &self,
        bucket_id: &str,
        start_file_id: Option<&str>,
        limit: Option<u32>,
    ) -> Result<FileVersionList> {
        let mut call = ApiCall::get().query("bucketId", bucket_id);
        if let Some(start) = start_file_id {
            call = call.query("startFileId", start);
        }
        if let Some(limit) = limit {
            call = call.query("maxFileCount", limit.to_string());
        }
        let response = self.api_call(LIST_FILE_VERSIONS, call).await?;
        read_json(response).await
    }

    /// Fetch metadata for one file version
    pub async fn get_file_info(&self, file_id: &str) -> Result<FileInfo> {
        let call = ApiCall::get().query("fileId", file_id);
        let response = self.api_call(GET_FILE_INFO, call).await?;
        read_json(response).await
    }

    /// Delete one file version
    pub async fn delete_file(&self, file_id: &str, file_name: &str) -> Result<()> {
        let call = ApiCall::get()
            .query("fileId", file_id)
            .query("fileName", file_name);
        self.api_call(DELETE_FILE_VERSION, call).await?;
        Ok(())
    }

    /// Download a file's content by id
    ///
    /// `range` is an inclusive byte range sent as `Range: bytes=<start>-<end>`.
    pub async fn download_file(
        &self,
        file_id: &str,
        range: Option<(u64, u64)>,
    ) -> Result<Vec<u8>> {
        let download_url = self.session_or(DOWNLOAD_FILE_BY_ID)?.download_url.clone();
        let mut call = ApiCall::get().query("fileId", file_id);
        if let Some((start, end)) = range {
            call = call.header("Range", format!("bytes={start}-{end}"));
        }
        let response = self.call(&download_url, DOWNLOAD_FILE_BY_ID, call).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// Download a file and write it to `path`
    pub async fn download_file_to_path(&self, file_id: &str, path: impl AsRef<Path>) -> Result<()> {
        let contents = self.download_file(file_id, None).await?;
        tokio::fs::write(path, contents).await?;
        Ok(())
    }

    /// Upload a file to a bucket
    ///
    /// Payloads at or below the session's minimum part size go up in one
    /// POST; anything larger takes the chunked large-file path. Returns
    /// the descriptor of the created file.
    pub async fn upload_file(
        &self,
        bucket_id: &str,
        file_name: &str,
        contents: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<FileInfo> {
        let minimum_part_size = self.session_or(GET_UPLOAD_URL)?.minimum_part_size;
        if contents.len() as u64 <= minimum_part_size {
            self.upload_small(bucket_id, file_name, contents, content_type)
                .await
        } else {
            self.upload_large_file(bucket_id, file_name, contents, content_type)
                .await
        }
    }

    /// Read a local file and upload it under its file-name component
    pub async fn upload_file_from_path(
        &self,
        bucket_id: &str,
        path: impl AsRef<Path>,
        content_type: Option<&str>,
    ) -> Result<FileInfo> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("path has no file name: {}", path.display()),
                ))
            })?
            .to_string();
        let contents = tokio::fs::read(path).await?;
        self.upload_file(bucket_id, &file_name, contents, content_type)
            .await
    }

    async fn upload_small(
        &self,
        bucket_id: &str,
        file_name: &str,
        contents: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<FileInfo> {
        let target = self.upload_target(bucket_id).await?;
        let digest = sha1_hex(&contents);
        let call = ApiCall::post()
            .public()
            .header("Authorization", target.authorization_token.clone())
            .header("X-Bz-File-Name", file_name)
            .header("Content-Type", content_type.unwrap_or(DEFAULT_CONTENT_TYPE))
            .header("Content-Length", contents.len().to_string())
            .header("X-Bz-Content-Sha1", digest)
            .bytes(contents);
        let response = self.call(&target.upload_url, "", call).await?;
        read_json(response).await
    }

    /// Get-or-fetch the upload target for a bucket
    ///
    /// The lock is held across the fetch so a cache miss is resolved by
    /// exactly one request even under concurrent uploads.
    async fn upload_target(&self, bucket_id: &str) -> Result<UploadTarget> {
        let mut targets = self.upload_targets.lock().await;
        if let Some(target) = targets.get(bucket_id) {
            return Ok(target.clone());
        }

        tracing::debug!(bucket_id, "fetching upload target");
        let call = ApiCall::get().query("bucketId", bucket_id);
        let response = self.api_call(GET_UPLOAD_URL, call).await?;
        let target: UploadTarget = read_json(response).await?;
        targets.insert(bucket_id.to_string(), target.clone());
        Ok(target)
    }
}

/// Parse a successful response body as JSON
pub(crate) async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::Network(e.to_string()))?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Hex-encoded SHA-1 digest, as sent in `X-Bz-Content-Sha1`
pub(crate) fn sha1_hex(contents: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(contents);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha1_hex_known_vector() {
        assert_eq!(sha1_hex(b"hello"), "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");
    }

    #[test]
    fn test_sha1_hex_empty() {
        assert_eq!(sha1_hex(b""), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    }

    #[test]
    fn test_api_call_defaults() {
        let call = ApiCall::get();
        assert!(call.requires_auth);
        assert!(call.headers.is_empty());
        assert!(call.query.is_empty());
        assert!(matches!(call.body, CallBody::None));
        assert!(call.basic_auth.is_none());
    }

    #[test]
    fn test_basic_auth_disables_session_token() {
        let call = ApiCall::get().basic_auth("account", "key");
        assert!(!call.requires_auth);
        assert!(call.basic_auth.is_some());
    }

    #[test]
    fn test_unauthorized_client_has_no_session() {
        let client = B2Client::new(Credentials::new("account", "key").unwrap());
        assert!(!client.is_authorized());
        assert!(client.minimum_part_size().is_none());
        let err = client.session_or("/b2_list_buckets").unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
    }
}
