/*
 * SPDX-FileCopyrightText: Copyright (c) 2026 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
 * SPDX-License-Identifier: LicenseRef-NvidiaProprietary
 *
 * NVIDIA CORPORATION, its affiliates and licensors retain all intellectual
 * property and proprietary rights in and to this material, related
 * documentation and any modifications thereto. Any use, reproduction,
 * disclosure or distribution of this material and related documentation
 * without an express license agreement from NVIDIA CORPORATION or
 * its affiliates is strictly prohibited.
 */

//! Fetching files from the PXE server. TFTP and FTP go through the `curl`
//! program, HTTP and HTTPS through `reqwest`.

use std::fmt;
use std::io::Write;
use std::process::Stdio;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Directory below the server root holding the PXELINUX configurations.
pub const PXELINUX_CFG: &str = "pxelinux.cfg";

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Tftp,
    Ftp,
    Http,
    Https,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = match self {
            Self::Tftp => "tftp",
            Self::Ftp => "ftp",
            Self::Http => "http",
            Self::Https => "https",
        };
        write!(f, "{scheme}")
    }
}

pub fn config_url(protocol: Protocol, host: &str, name: &str) -> String {
    format!("{protocol}://{host}/{PXELINUX_CFG}/{name}")
}

/// URL of a file referenced by the configuration, relative to the server root.
pub fn file_url(protocol: Protocol, host: &str, path: &str) -> String {
    format!("{protocol}://{host}/{}", path.trim_start_matches('/'))
}

#[derive(thiserror::Error, Debug)]
pub enum DownloadError {
    #[error("Connection to {0} failed")]
    ConnectionFailed(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Download of {url} failed: {reason}")]
    Failed { url: String, reason: String },
    #[error("Unable to store downloaded data: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    /// The server could not be reached at all, so other files on it will
    /// fail the same way.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_))
    }
}

pub type DownloadResult<T> = Result<T, DownloadError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadRequest<'a> {
    pub url: &'a str,
    pub timeout: Option<Duration>,
}

pub trait ProgressNotifier: Send + Sync {
    /// Called after every chunk. `total` is known for HTTP only.
    fn progressed(&self, total: Option<u64>, now: u64);
    fn finished(&self);
}

/// Prints a dot per chunk, at most one every 100ms.
#[derive(Debug, Default)]
pub struct DotProgress {
    last_dot: Mutex<Option<Instant>>,
}

impl DotProgress {
    const INTERVAL: Duration = Duration::from_millis(100);

    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressNotifier for DotProgress {
    fn progressed(&self, _total: Option<u64>, _now: u64) {
        let Ok(mut last_dot) = self.last_dot.lock() else {
            return;
        };
        let now = Instant::now();
        if last_dot.is_some_and(|last| now.duration_since(last) < Self::INTERVAL) {
            return;
        }
        *last_dot = Some(now);

        let mut stdout = std::io::stdout();
        if let Err(e) = write!(stdout, ".").and_then(|()| stdout.flush()) {
            tracing::trace!(error = %e, "Unable to print progress");
        }
    }

    fn finished(&self) {
        if let Ok(mut last_dot) = self.last_dot.lock() {
            *last_dot = None;
        }
        println!();
    }
}

#[async_trait]
pub trait Downloader: Send + Sync {
    /// Writes the file at `request.url` into `sink` and returns the number of
    /// bytes written.
    async fn download(
        &self,
        request: &DownloadRequest<'_>,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
        progress: Option<&dyn ProgressNotifier>,
    ) -> DownloadResult<u64>;
}

async fn copy_with_progress<R: AsyncRead + Unpin + Send>(
    reader: &mut R,
    sink: &mut (dyn AsyncWrite + Unpin + Send),
    progress: Option<&dyn ProgressNotifier>,
) -> std::io::Result<u64> {
    let mut buf = vec![0u8; 64 * 1024];
    let mut written = 0;
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        sink.write_all(&buf[..n]).await?;
        written += n as u64;
        if let Some(progress) = progress {
            progress.progressed(None, written);
        }
    }
    sink.flush().await?;
    Ok(written)
}

/// Runs `curl` for protocols `reqwest` does not speak.
#[derive(Debug, Clone)]
pub struct CurlDownloader {
    curl_binary: String,
}

impl CurlDownloader {
    pub fn new(curl_binary: impl Into<String>) -> Self {
        Self {
            curl_binary: curl_binary.into(),
        }
    }
}

/// Maps a failed curl exit status to a [`DownloadError`].
pub fn curl_exit_error(code: Option<i32>, url: &str, stderr: &str) -> DownloadError {
    match code {
        // CURLE_COULDNT_RESOLVE_HOST, CURLE_COULDNT_CONNECT
        Some(6) | Some(7) => DownloadError::ConnectionFailed(url.to_string()),
        // CURLE_HTTP_RETURNED_ERROR, CURLE_TFTP_NOTFOUND, CURLE_REMOTE_FILE_NOT_FOUND
        Some(22) | Some(68) | Some(78) => DownloadError::NotFound(url.to_string()),
        _ => DownloadError::Failed {
            url: url.to_string(),
            reason: match code {
                Some(code) if stderr.is_empty() => format!("curl exited with code {code}"),
                Some(code) => format!("curl exited with code {code}: {stderr}"),
                None => "curl was killed by a signal".to_string(),
            },
        },
    }
}

#[async_trait]
impl Downloader for CurlDownloader {
    async fn download(
        &self,
        request: &DownloadRequest<'_>,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
        progress: Option<&dyn ProgressNotifier>,
    ) -> DownloadResult<u64> {
        let url = request.url;
        let mut command = tokio::process::Command::new(&self.curl_binary);
        command.args(["--silent", "--show-error", "--fail"]);
        if let Some(timeout) = request.timeout {
            command
                .arg("--connect-timeout")
                .arg(timeout.as_secs().max(1).to_string());
        }
        command
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::trace!(curl = self.curl_binary.as_str(), url, "Starting curl");
        let mut child = command.spawn().map_err(|e| DownloadError::Failed {
            url: url.to_string(),
            reason: format!("unable to run {}: {e}", self.curl_binary),
        })?;
        let Some(mut stdout) = child.stdout.take() else {
            return Err(DownloadError::Failed {
                url: url.to_string(),
                reason: "curl output is not captured".to_string(),
            });
        };

        let copied = copy_with_progress(&mut stdout, sink, progress).await;
        if let Some(progress) = progress {
            progress.finished();
        }

        // curl blocks on a full pipe once nobody reads its output.
        let copied = match copied {
            Ok(copied) => copied,
            Err(e) => {
                drop(stdout);
                if let Err(kill_err) = child.kill().await {
                    tracing::trace!(error = %kill_err, url, "Unable to stop curl");
                }
                return Err(e.into());
            }
        };

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(curl_exit_error(output.status.code(), url, stderr.trim()));
        }
        Ok(copied)
    }
}

#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    pub fn new() -> DownloadResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| DownloadError::Failed {
                url: String::new(),
                reason: format!("unable to create HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(
        &self,
        request: &DownloadRequest<'_>,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
        progress: Option<&dyn ProgressNotifier>,
    ) -> DownloadResult<u64> {
        let url = request.url;
        let mut builder = self.client.get(url);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let res = builder.send().await.map_err(|e| {
            if e.is_connect() {
                DownloadError::ConnectionFailed(url.to_string())
            } else {
                DownloadError::Failed {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;
        if res.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(DownloadError::NotFound(url.to_string()));
        }
        if !res.status().is_success() {
            return Err(DownloadError::Failed {
                url: url.to_string(),
                reason: format!("server returned {}", res.status()),
            });
        }

        let total = res.content_length();
        let mut written = 0;
        let mut body = res.bytes_stream();
        while let Some(segment) = body.next().await {
            let segment = segment.map_err(|e| DownloadError::Failed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
            sink.write_all(&segment).await?;
            written += segment.len() as u64;
            if let Some(progress) = progress {
                progress.progressed(total, written);
            }
        }
        sink.flush().await?;
        if let Some(progress) = progress {
            progress.finished();
        }

        Ok(written)
    }
}

pub fn downloader_for(
    protocol: Protocol,
    curl_binary: &str,
) -> DownloadResult<Box<dyn Downloader>> {
    Ok(match protocol {
        Protocol::Tftp | Protocol::Ftp => Box::new(CurlDownloader::new(curl_binary)),
        Protocol::Http | Protocol::Https => Box::new(HttpDownloader::new()?),
    })
}

#[cfg(test)]
mod tests {
    use std::os::unix::fs::PermissionsExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::net::TcpListener;

    use super::*;

    #[test]
    fn test_urls() {
        assert_eq!(
            config_url(Protocol::Tftp, "10.0.0.1", "01-00-11-22-33-44-55"),
            "tftp://10.0.0.1/pxelinux.cfg/01-00-11-22-33-44-55"
        );
        assert_eq!(
            file_url(Protocol::Ftp, "server", "images/vmlinuz"),
            "ftp://server/images/vmlinuz"
        );
        assert_eq!(
            file_url(Protocol::Https, "server", "/images/vmlinuz"),
            "https://server/images/vmlinuz"
        );
    }

    #[test]
    fn test_curl_exit_error() {
        assert!(curl_exit_error(Some(7), "u", "").is_connection_failure());
        assert!(matches!(
            curl_exit_error(Some(68), "u", ""),
            DownloadError::NotFound(_)
        ));
        let err = curl_exit_error(Some(28), "tftp://h/f", "timed out");
        assert!(!err.is_connection_failure());
        assert_eq!(
            err.to_string(),
            "Download of tftp://h/f failed: curl exited with code 28: timed out"
        );
        assert!(matches!(
            curl_exit_error(None, "u", ""),
            DownloadError::Failed { .. }
        ));
    }

    #[test]
    fn test_protocol_names() {
        assert_eq!(Protocol::Tftp.to_string(), "tftp");
        assert_eq!(Protocol::Https.to_string(), "https");
        assert_eq!(Protocol::default(), Protocol::Tftp);
    }

    #[derive(Default)]
    struct CountingProgress {
        calls: AtomicUsize,
        finished: AtomicUsize,
    }

    impl ProgressNotifier for CountingProgress {
        fn progressed(&self, _total: Option<u64>, _now: u64) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
        fn finished(&self) {
            self.finished.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// A stand-in for curl answering according to the last path component.
    fn fake_curl(dir: &std::path::Path) -> String {
        let path = dir.join("curl");
        std::fs::write(
            &path,
            r#"#!/bin/sh
for url; do :; done
case "$url" in
  */missing) echo "curl: (68) TFTP: File Not Found" >&2; exit 68 ;;
  */down) exit 7 ;;
  */broken) echo "curl: (28) timeout" >&2; exit 28 ;;
  */huge) head -c 4000000 /dev/zero; exit 0 ;;
esac
printf 'contents of %s' "$url"
"#,
        )
        .unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }

    #[tokio::test]
    async fn test_curl_downloader() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = CurlDownloader::new(fake_curl(dir.path()));
        let progress = CountingProgress::default();

        let mut sink: Vec<u8> = Vec::new();
        let request = DownloadRequest {
            url: "tftp://server/pxelinux.cfg/default",
            timeout: Some(Duration::from_secs(10)),
        };
        let written = downloader
            .download(&request, &mut sink, Some(&progress))
            .await
            .unwrap();
        assert_eq!(sink, b"contents of tftp://server/pxelinux.cfg/default");
        assert_eq!(written, sink.len() as u64);
        assert!(progress.calls.load(Ordering::SeqCst) >= 1);
        assert_eq!(progress.finished.load(Ordering::SeqCst), 1);

        let downloader = &downloader;
        let fail = |url: &'static str| async move {
            let request = DownloadRequest { url, timeout: None };
            downloader
                .download(&request, &mut Vec::<u8>::new(), None)
                .await
                .unwrap_err()
        };
        assert!(matches!(
            fail("tftp://server/missing").await,
            DownloadError::NotFound(_)
        ));
        assert!(fail("tftp://server/down").await.is_connection_failure());
        assert!(matches!(
            fail("tftp://server/broken").await,
            DownloadError::Failed { reason, .. } if reason.contains("timeout")
        ));
    }

    #[test]
    fn test_dot_progress_is_throttled() {
        let progress = DotProgress::new();
        progress.progressed(None, 1);
        let first = *progress.last_dot.lock().unwrap();
        assert!(first.is_some());

        progress.progressed(None, 2);
        assert_eq!(*progress.last_dot.lock().unwrap(), first);

        progress.finished();
        assert!(progress.last_dot.lock().unwrap().is_none());
    }

    /// A sink on a full disk.
    struct FullSink;

    impl AsyncWrite for FullSink {
        fn poll_write(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &[u8],
        ) -> std::task::Poll<std::io::Result<usize>> {
            std::task::Poll::Ready(Err(std::io::Error::other("No space left on device")))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_curl_sink_error_stops_curl() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = CurlDownloader::new(fake_curl(dir.path()));
        let request = DownloadRequest {
            url: "tftp://server/huge",
            timeout: None,
        };

        let result = tokio::time::timeout(
            Duration::from_secs(10),
            downloader.download(&request, &mut FullSink, None),
        )
        .await
        .expect("download must not wait for curl forever");
        match result {
            Err(DownloadError::Io(e)) => assert!(e.to_string().contains("No space left")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_curl_binary() {
        let downloader = CurlDownloader::new("/nonexistent/curl");
        let request = DownloadRequest {
            url: "tftp://server/default",
            timeout: None,
        };
        let err = downloader
            .download(&request, &mut Vec::<u8>::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::Failed { .. }));
    }

    /// Serves one canned HTTP response per connection.
    async fn serve(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf).await;
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_http_downloader() {
        let base = serve(
            "HTTP/1.1 200 OK\r\nContent-Length: 11\r\nConnection: close\r\n\r\nlabel linux",
        )
        .await;
        let downloader = HttpDownloader::new().unwrap();
        let progress = CountingProgress::default();
        let url = format!("{base}/pxelinux.cfg/default");
        let request = DownloadRequest {
            url: &url,
            timeout: Some(Duration::from_secs(10)),
        };

        let mut sink: Vec<u8> = Vec::new();
        let written = downloader
            .download(&request, &mut sink, Some(&progress))
            .await
            .unwrap();
        assert_eq!(written, 11);
        assert_eq!(sink, b"label linux");
        assert_eq!(progress.finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_http_not_found() {
        let base =
            serve("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
        let downloader = HttpDownloader::new().unwrap();
        let url = format!("{base}/pxelinux.cfg/C0A80001");
        let request = DownloadRequest {
            url: &url,
            timeout: None,
        };
        let err = downloader
            .download(&request, &mut Vec::<u8>::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_http_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let downloader = HttpDownloader::new().unwrap();
        let url = format!("http://{addr}/pxelinux.cfg/default");
        let request = DownloadRequest {
            url: &url,
            timeout: Some(Duration::from_secs(5)),
        };
        let err = downloader
            .download(&request, &mut Vec::<u8>::new(), None)
            .await
            .unwrap_err();
        assert!(err.is_connection_failure(), "{err:?}");
    }
}
