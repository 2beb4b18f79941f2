use super::{Result, UploadError, Uploader};
use crate::config::UploadConfig;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use url::Url;

/// Extensions accepted as audio when the host does not send an audio MIME type.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "aac", "m4a", "wav", "ogg", "opus", "flac", "webm"];

/// Downloads smaller than this are error pages, not audio.
pub const MIN_DOWNLOAD_BYTES: u64 = 1024;

/// Longest slice of a rejection body kept in [`UploadError::HostRejected`].
const MAX_BODY_IN_ERROR: usize = 512;

/// Client for the catbox.moe user API.
///
/// Uploads are a multipart POST with `reqtype=fileupload`, an optional
/// `userhash`, and the file in `fileToUpload`. The response body is the bare
/// URL of the stored file.
pub struct CatboxClient {
    client: Client,
    endpoint: String,
    userhash: Option<String>,
    max_upload_bytes: u64,
}

impl CatboxClient {
    pub fn new(config: &UploadConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self {
            client,
            endpoint: config.endpoint.clone(),
            userhash: config.userhash.clone().filter(|h| !h.is_empty()),
            max_upload_bytes: config.max_upload_bytes(),
        }
    }

    /// Builder: override the host size limit.
    pub fn with_max_upload_bytes(mut self, limit: u64) -> Self {
        self.max_upload_bytes = limit;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    async fn post_once(&self, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        let mut form = Form::new().text("reqtype", "fileupload");
        if let Some(hash) = &self.userhash {
            form = form.text("userhash", hash.clone());
        }
        form = form.part(
            "fileToUpload",
            Part::bytes(bytes).file_name(file_name.to_string()),
        );

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(UploadError::HostRejected {
                status: status.as_u16(),
                body: truncate(&body),
            });
        }

        parse_upload_response(&body)
    }

    async fn get_once(&self, url: &Url, dest_dir: &Path) -> Result<PathBuf> {
        let mut response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::HostRejected {
                status: status.as_u16(),
                body: truncate(&body),
            });
        }

        if let Some(len) = response.content_length() {
            if len > self.max_upload_bytes {
                return Err(UploadError::FileTooLarge {
                    size: len,
                    limit: self.max_upload_bytes,
                });
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or_default().trim().to_ascii_lowercase());
        let ext = pick_extension(url.as_str(), content_type.as_deref())?;

        // Chunked responses carry no Content-Length; the cap applies to the bytes received.
        let dest = dest_dir.join(format!("downloaded.{ext}"));
        let mut file = tokio::fs::File::create(&dest).await?;
        let mut received: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            received += chunk.len() as u64;
            if received > self.max_upload_bytes {
                drop(file);
                discard(&dest).await;
                return Err(UploadError::FileTooLarge {
                    size: received,
                    limit: self.max_upload_bytes,
                });
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        drop(file);

        if received < MIN_DOWNLOAD_BYTES {
            discard(&dest).await;
            return Err(UploadError::malformed(format!(
                "download is only {} bytes, expected audio",
                received
            )));
        }

        tracing::debug!("Downloaded {} bytes to {:?}", received, dest);
        Ok(dest)
    }

    /// Run `op`, retrying once if the first attempt failed transiently.
    async fn with_retry<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match op().await {
            Err(e) if e.is_transient() => {
                tracing::warn!("{} failed ({}), retrying once", what, e);
                op().await
            }
            other => other,
        }
    }
}

#[async_trait]
impl Uploader for CatboxClient {
    async fn upload(&self, file: &Path) -> Result<String> {
        let size = tokio::fs::metadata(file).await?.len();
        if size > self.max_upload_bytes {
            return Err(UploadError::FileTooLarge {
                size,
                limit: self.max_upload_bytes,
            });
        }

        let bytes = tokio::fs::read(file).await?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.mp3".to_string());

        tracing::info!("Uploading {} ({} bytes) to {}", file_name, size, self.endpoint);
        let url = self
            .with_retry("upload", || self.post_once(&file_name, bytes.clone()))
            .await?;
        tracing::info!("Uploaded to {}", url);
        Ok(url)
    }

    async fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf> {
        let parsed = check_download_url(url)?;
        tracing::info!("Downloading {}", parsed);
        self.with_retry("download", || self.get_once(&parsed, dest_dir))
            .await
    }
}

/// Interpret an upload response body as the URL of the stored file.
pub fn parse_upload_response(body: &str) -> Result<String> {
    let url = body.trim();
    if soundpost_tag::is_http_url(url) {
        Ok(url.to_string())
    } else {
        Err(UploadError::malformed(format!(
            "expected a URL, got {:?}",
            truncate(url)
        )))
    }
}

/// Audio extension of the last path segment of `url`, if it has a known one.
pub fn audio_extension(url: &str) -> Option<&'static str> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.last()?;
    let (_, ext) = segment.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    AUDIO_EXTENSIONS.iter().copied().find(|known| *known == ext)
}

fn check_download_url(url: &str) -> Result<Url> {
    let parsed =
        Url::parse(url).map_err(|e| UploadError::malformed(format!("invalid URL {url:?}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(UploadError::malformed(format!(
            "unsupported URL scheme: {other}"
        ))),
    }
}

/// Decide the saved file's extension, rejecting non-audio responses.
fn pick_extension(url: &str, content_type: Option<&str>) -> Result<&'static str> {
    let from_url = audio_extension(url);
    match content_type {
        Some(mime) if mime.starts_with("audio/") => {
            Ok(from_url.or_else(|| extension_for_mime(mime)).unwrap_or("mp3"))
        }
        None | Some("application/octet-stream") => from_url.ok_or_else(|| {
            UploadError::malformed("response is not audio and the URL has no audio extension")
        }),
        Some(other) => Err(UploadError::malformed(format!(
            "expected audio, got content type {other}"
        ))),
    }
}

fn extension_for_mime(mime: &str) -> Option<&'static str> {
    match mime {
        "audio/mpeg" | "audio/mp3" => Some("mp3"),
        "audio/aac" => Some("aac"),
        "audio/mp4" | "audio/x-m4a" => Some("m4a"),
        "audio/wav" | "audio/x-wav" | "audio/wave" => Some("wav"),
        "audio/ogg" => Some("ogg"),
        "audio/opus" => Some("opus"),
        "audio/flac" | "audio/x-flac" => Some("flac"),
        "audio/webm" => Some("webm"),
        _ => None,
    }
}

/// Remove a rejected partial download.
async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::debug!("Failed to remove partial download {:?}: {}", path, e);
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_BODY_IN_ERROR).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_parse_upload_response() {
        assert_eq!(
            parse_upload_response("https://files.catbox.moe/abcd.mp3\n").unwrap(),
            "https://files.catbox.moe/abcd.mp3"
        );
        assert_matches!(
            parse_upload_response("<html>error</html>"),
            Err(UploadError::MalformedResponse(_))
        );
        assert_matches!(
            parse_upload_response(""),
            Err(UploadError::MalformedResponse(_))
        );
        assert_matches!(
            parse_upload_response("ftp://files.catbox.moe/abcd.mp3"),
            Err(UploadError::MalformedResponse(_))
        );
    }

    #[test]
    fn test_audio_extension() {
        assert_eq!(audio_extension("https://files.catbox.moe/abcd.mp3"), Some("mp3"));
        assert_eq!(audio_extension("https://files.catbox.moe/abcd.OGG?x=1"), Some("ogg"));
        assert_eq!(audio_extension("https://files.catbox.moe/abcd.png"), None);
        assert_eq!(audio_extension("https://files.catbox.moe/"), None);
        assert_eq!(audio_extension("not a url"), None);
    }

    #[test]
    fn test_pick_extension() {
        let mp3 = "https://files.catbox.moe/abcd.mp3";
        let bare = "https://example.com/track";

        assert_eq!(pick_extension(mp3, Some("audio/mpeg")).unwrap(), "mp3");
        assert_eq!(pick_extension(bare, Some("audio/ogg")).unwrap(), "ogg");
        assert_eq!(pick_extension(bare, Some("audio/x-unknown")).unwrap(), "mp3");
        assert_eq!(pick_extension(mp3, Some("application/octet-stream")).unwrap(), "mp3");
        assert_eq!(pick_extension(mp3, None).unwrap(), "mp3");

        assert_matches!(
            pick_extension(bare, Some("application/octet-stream")),
            Err(UploadError::MalformedResponse(_))
        );
        assert_matches!(
            pick_extension(mp3, Some("text/html")),
            Err(UploadError::MalformedResponse(_))
        );
    }

    #[test]
    fn test_check_download_url_scheme() {
        assert!(check_download_url("https://files.catbox.moe/abcd.mp3").is_ok());
        assert!(check_download_url("http://localhost:8080/a.mp3").is_ok());

        let err = check_download_url("ftp://example.com/a.mp3").unwrap_err();
        assert!(err.to_string().contains("unsupported URL scheme"));
        assert_matches!(
            check_download_url("::nonsense"),
            Err(UploadError::MalformedResponse(_))
        );
    }

    #[test]
    fn test_userhash_blank_is_anonymous() {
        let config = UploadConfig {
            userhash: Some(String::new()),
            ..UploadConfig::default()
        };
        let client = CatboxClient::new(&config);
        assert!(client.userhash.is_none());
        assert_eq!(client.max_upload_bytes(), 200 * 1024 * 1024);
    }
}
