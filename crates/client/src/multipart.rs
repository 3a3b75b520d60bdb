//! Large-file chunked upload
//!
//! Payloads above the session's minimum part size are uploaded in parts:
//! start a large file to get a file id, POST each part sequentially with
//! its SHA-1 digest, then finish the file by submitting the digests the
//! server echoed back, in part order. The server reassembles the file
//! positionally, so ordering is the protocol's one hard invariant.
//!
//! There is no retry, no resume and no remote cleanup: a failure partway
//! leaves the unfinished large-file handle (and any uploaded parts) on the
//! server.

use b2_core::{Error, FileInfo, Result, UploadTarget, UploadedPart};

use crate::client::{ApiCall, B2Client, DEFAULT_CONTENT_TYPE, read_json, sha1_hex};

const START_LARGE_FILE: &str = "/b2_start_large_file";
const GET_UPLOAD_PART_URL: &str = "/b2_get_upload_part_url";
const FINISH_LARGE_FILE: &str = "/b2_finish_large_file";

/// Number of parts a payload of `len` bytes splits into
///
/// Always `len / minimum_part_size + 1`: every part except the last is
/// exactly `minimum_part_size` bytes, and the last takes the remainder.
/// When `len` is an exact multiple the trailing part is empty; that is the
/// protocol's literal behavior and is not special-cased here.
pub fn part_count(len: u64, minimum_part_size: u64) -> u64 {
    len / minimum_part_size + 1
}

/// Split a payload into `part_count` contiguous in-order slices
///
/// Concatenating the returned slices reproduces `contents` exactly.
pub fn split_parts(contents: &[u8], minimum_part_size: u64) -> Vec<&[u8]> {
    let size = minimum_part_size as usize;
    let count = part_count(contents.len() as u64, minimum_part_size) as usize;
    (0..count)
        .map(|i| {
            let start = i * size;
            let end = ((i + 1) * size).min(contents.len());
            &contents[start..end]
        })
        .collect()
}

impl B2Client {
    /// Upload a payload via the large-file protocol
    ///
    /// [`upload_file`](Self::upload_file) routes here automatically for
    /// payloads above the minimum part size; calling this directly with a
    /// payload that splits into fewer than 2 parts fails with
    /// [`Error::TooSmallForMultipart`] before any request is issued.
    pub async fn upload_large_file(
        &self,
        bucket_id: &str,
        file_name: &str,
        contents: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<FileInfo> {
        let minimum_part_size = self.session_or(START_LARGE_FILE)?.minimum_part_size;
        let num_parts = part_count(contents.len() as u64, minimum_part_size);
        if num_parts < 2 {
            return Err(Error::TooSmallForMultipart {
                size: contents.len() as u64,
                minimum_part_size,
            });
        }

        let started = self
            .start_large_file(bucket_id, file_name, content_type)
            .await?;
        let file_id = started.file_id;
        tracing::info!(file_id, num_parts, "starting large-file upload");

        let mut part_hashes = Vec::with_capacity(num_parts as usize);
        for (index, part) in split_parts(&contents, minimum_part_size).into_iter().enumerate() {
            let part_number = index as u32 + 1;
            let uploaded = self.upload_part(&file_id, part_number, part).await?;
            part_hashes.push(uploaded.content_sha1);
        }

        let finished = self.finish_large_file(&file_id, part_hashes).await?;
        tracing::info!(file_id, "finished large-file upload");
        Ok(finished)
    }

    async fn start_large_file(
        &self,
        bucket_id: &str,
        file_name: &str,
        content_type: Option<&str>,
    ) -> Result<FileInfo> {
        let call = ApiCall::get()
            .query("bucketId", bucket_id)
            .query("fileName", file_name)
            .query("contentType", content_type.unwrap_or(DEFAULT_CONTENT_TYPE));
        let response = self.api_call(START_LARGE_FILE, call).await?;
        read_json(response).await
    }

    /// Get-or-fetch the part-upload target for a large file
    ///
    /// Fetched once per file id and shared by all of its parts.
    async fn part_target(&self, file_id: &str) -> Result<UploadTarget> {
        let mut targets = self.part_targets.lock().await;
        if let Some(target) = targets.get(file_id) {
            return Ok(target.clone());
        }

        tracing::debug!(file_id, "fetching part-upload target");
        let call = ApiCall::get().query("fileId", file_id);
        let response = self.api_call(GET_UPLOAD_PART_URL, call).await?;
        let target: UploadTarget = read_json(response).await?;
        targets.insert(file_id.to_string(), target.clone());
        Ok(target)
    }

    async fn upload_part(
        &self,
        file_id: &str,
        part_number: u32,
        part: &[u8],
    ) -> Result<UploadedPart> {
        let target = self.part_target(file_id).await?;
        let digest = sha1_hex(part);
        tracing::debug!(file_id, part_number, len = part.len(), "uploading part");

        let call = ApiCall::post()
            .public()
            .header("Authorization", target.authorization_token.clone())
            .header("X-Bz-Part-Number", part_number.to_string())
            .header("Content-Length", part.len().to_string())
            .header("X-Bz-Content-Sha1", digest)
            .bytes(part.to_vec());
        let response = self.call(&target.upload_url, "", call).await?;
        read_json(response).await
    }

    /// Submit the ordered part hashes; the server verifies them against
    /// what it stored and assembles the file
    async fn finish_large_file(
        &self,
        file_id: &str,
        part_sha1_array: Vec<String>,
    ) -> Result<FileInfo> {
        let call = ApiCall::post().json(serde_json::json!({
            "fileId": file_id,
            "partSha1Array": part_sha1_array,
        }));
        let response = self.api_call(FINISH_LARGE_FILE, call).await?;
        read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_count() {
        assert_eq!(part_count(250, 100), 3);
        assert_eq!(part_count(101, 100), 2);
        assert_eq!(part_count(80, 100), 1);
        assert_eq!(part_count(0, 100), 1);
    }

    #[test]
    fn test_part_count_exact_multiple() {
        // The +1 yields a trailing empty part on exact multiples.
        assert_eq!(part_count(200, 100), 3);
        assert_eq!(part_count(100, 100), 2);
    }

    #[test]
    fn test_split_parts_sizes() {
        let contents = vec![7u8; 250];
        let parts = split_parts(&contents, 100);
        let sizes: Vec<usize> = parts.iter().map(|p| p.len()).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
    }

    #[test]
    fn test_split_parts_exact_multiple_has_empty_tail() {
        let contents = vec![7u8; 200];
        let parts = split_parts(&contents, 100);
        let sizes: Vec<usize> = parts.iter().map(|p| p.len()).collect();
        assert_eq!(sizes, vec![100, 100, 0]);
    }

    #[test]
    fn test_split_parts_round_trip() {
        let contents: Vec<u8> = (0..=255).cycle().take(1037).map(|b| b as u8).collect();
        let parts = split_parts(&contents, 256);
        let rejoined: Vec<u8> = parts.concat();
        assert_eq!(rejoined, contents);
    }

    #[test]
    fn test_split_parts_are_contiguous_and_in_order() {
        let contents: Vec<u8> = (0..250u32).map(|i| (i % 251) as u8).collect();
        let parts = split_parts(&contents, 100);
        assert_eq!(parts[0], &contents[0..100]);
        assert_eq!(parts[1], &contents[100..200]);
        assert_eq!(parts[2], &contents[200..250]);
    }
}
