//! Wire data model for the B2 API
//!
//! The B2 API speaks camelCase JSON; every type here derives serde with a
//! `rename_all` attribute so the Rust side stays snake_case. Fields the API
//! only returns on some calls are `Option`s.

use serde::{Deserialize, Serialize};

/// Session state returned by `b2_authorize_account`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    /// The account the token belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    /// Session token sent as the `Authorization` header on API calls
    pub authorization_token: String,

    /// Base URL for API calls (version suffix not yet appended)
    pub api_url: String,

    /// Base URL for downloads
    pub download_url: String,

    /// Smallest allowed part size for large-file uploads, in bytes
    pub absolute_minimum_part_size: u64,
}

/// A bucket descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    /// Owning account
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    /// Unique bucket id, used by every file operation
    pub bucket_id: String,

    /// Human-readable bucket name
    pub bucket_name: String,

    /// `allPrivate` or `allPublic`
    pub bucket_type: String,
}

/// A file descriptor, as returned by uploads, `b2_get_file_info` and
/// `b2_list_file_versions`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    /// Unique file version id
    pub file_id: String,

    /// File name within the bucket
    pub file_name: String,

    /// Containing bucket
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_id: Option<String>,

    /// Owning account
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    /// Size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,

    /// SHA-1 hex digest of the content (`none` for large files)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_sha1: Option<String>,

    /// Declared content type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Version action, e.g. `upload` or `hide`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// Upload time in milliseconds since the epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_timestamp: Option<u64>,
}

/// One page of `b2_list_file_versions` results
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileVersionList {
    /// Listed file versions
    pub files: Vec<FileInfo>,

    /// Name to resume listing from, when truncated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_file_name: Option<String>,

    /// Id to resume listing from, when truncated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_file_id: Option<String>,
}

/// An upload destination returned by `b2_get_upload_url` or
/// `b2_get_upload_part_url`
///
/// Uploads POST to this URL with the target's own authorization token, not
/// the session token. Targets are cached per bucket id (simple uploads) or
/// per large file id (part uploads) and reused for the session's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTarget {
    /// Where to POST the bytes
    pub upload_url: String,

    /// Token for the upload POST's `Authorization` header
    pub authorization_token: String,
}

/// Response to one part upload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedPart {
    /// The large file this part belongs to
    pub file_id: String,

    /// 1-based part number
    pub part_number: u32,

    /// Part size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,

    /// SHA-1 hex digest the server computed for this part; finalization
    /// submits these in part order
    pub content_sha1: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_session_deserializes_camel_case() {
        let json = r#"{
            "accountId": "abc123",
            "authorizationToken": "token_1",
            "apiUrl": "https://api001.backblazeb2.com",
            "downloadUrl": "https://f001.backblazeb2.com",
            "absoluteMinimumPartSize": 5000000
        }"#;
        let session: AuthSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.authorization_token, "token_1");
        assert_eq!(session.absolute_minimum_part_size, 5_000_000);
    }

    #[test]
    fn test_file_info_optional_fields() {
        let json = r#"{"fileId": "4_z27", "fileName": "hello.txt"}"#;
        let info: FileInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.file_id, "4_z27");
        assert!(info.content_length.is_none());
        assert!(info.upload_timestamp.is_none());
    }

    #[test]
    fn test_uploaded_part_echoes_sha1() {
        let json = r#"{
            "fileId": "4_z27",
            "partNumber": 2,
            "contentLength": 100,
            "contentSha1": "062e8a1f1e4bd6e0b721f05ac6ccd31304f0d902"
        }"#;
        let part: UploadedPart = serde_json::from_str(json).unwrap();
        assert_eq!(part.part_number, 2);
        assert_eq!(
            part.content_sha1,
            "062e8a1f1e4bd6e0b721f05ac6ccd31304f0d902"
        );
    }

    #[test]
    fn test_file_version_list() {
        let json = r#"{
            "files": [{"fileId": "a", "fileName": "one"}],
            "nextFileId": "b"
        }"#;
        let list: FileVersionList = serde_json::from_str(json).unwrap();
        assert_eq!(list.files.len(), 1);
        assert_eq!(list.next_file_id.as_deref(), Some("b"));
        assert!(list.next_file_name.is_none());
    }
}
