use super::task::{TaskReporter, UploadTask, UploadTransport};
use crate::config::AppConfig;
use crate::error::{ImportError, Result, TransportFailure};
use crate::import::{
    Classifications, CreatedResponse, FileDescriptor, PayloadRef, PerScope, UploadRequest,
};
use futures::Stream;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Sends requests to the repository's vertex endpoints on a tokio runtime.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    runtime: Handle,
}

impl HttpTransport {
    pub fn new(config: &AppConfig, runtime: Handle) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let header_name =
                HeaderName::from_str(&name.to_lowercase()).map_err(|e| ImportError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| ImportError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            headers.insert(header_name, header_value);
        }

        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            runtime,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        endpoint(&self.base_url, path)
    }

    /// Runs `request` on the runtime; the returned task can abort it.
    fn spawn<F, Fut>(&self, kind: &'static str, request: F) -> UploadTask
    where
        F: FnOnce(TaskReporter) -> Fut,
        Fut: Future<Output = std::result::Result<CreatedResponse, TransportFailure>> + Send + 'static,
    {
        let (reporter, task) = UploadTask::channel();
        let fut = request(reporter.clone());
        let handle = self.runtime.spawn(async move {
            let result = fut.await;
            match &result {
                Ok(_) => debug!("{} request settled", kind),
                Err(e) => warn!("{} request failed: {}", kind, e),
            }
            reporter.settle(result);
        });

        task.with_cancel(move || {
            info!("Aborting {} request", kind);
            handle.abort();
        })
    }

    async fn import_files(
        client: Client,
        url: String,
        files: Vec<FileDescriptor>,
        classifications: Classifications,
        labels: PerScope<String>,
        reporter: TaskReporter,
    ) -> std::result::Result<CreatedResponse, TransportFailure> {
        let mut contents = Vec::with_capacity(files.len());
        for file in &files {
            contents.push(read_payload(file).await?);
        }

        let total = contents.iter().map(|c| c.len() as u64).sum::<u64>().max(1);
        let sent = Arc::new(AtomicU64::new(0));
        let mut form = Form::new();

        for (file, content) in files.iter().zip(contents) {
            let length = content.len() as u64;
            let body = Body::wrap_stream(progress_chunks(
                content,
                total,
                sent.clone(),
                reporter.clone(),
            ));
            form = form.part(
                "file",
                Part::stream_with_length(body, length).file_name(file.name.clone()),
            );
        }

        match classifications {
            Classifications::Shared(Some(id)) => form = form.text("conceptId", id),
            Classifications::Shared(None) => {}
            Classifications::PerFile(ids) => {
                for id in ids {
                    form = form.text("conceptId", id);
                }
            }
        }
        match labels {
            PerScope::Shared(label) => form = form.text("visibilitySource", label),
            PerScope::PerFile(labels) => {
                for label in labels {
                    form = form.text("visibilitySource", label);
                }
            }
        }

        let response = client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportFailure::new(format!("Failed to send request: {}", e)))?;
        read_created(response).await
    }

    async fn import_string(
        client: Client,
        url: String,
        content: String,
        mime_type: String,
        classification: Option<String>,
        label: String,
    ) -> std::result::Result<CreatedResponse, TransportFailure> {
        let part = Part::bytes(content.into_bytes())
            .file_name("import")
            .mime_str(&mime_type)
            .map_err(|e| TransportFailure::new(format!("Invalid mime type {}: {}", mime_type, e)))?;

        let mut form = Form::new().part("file", part);
        if let Some(id) = classification {
            form = form.text("conceptId", id);
        }
        form = form.text("visibilitySource", label);

        let response = client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportFailure::new(format!("Failed to send request: {}", e)))?;
        read_created(response).await
    }

    async fn post_form(
        client: Client,
        url: String,
        params: Vec<(&'static str, String)>,
    ) -> std::result::Result<CreatedResponse, TransportFailure> {
        let response = client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| TransportFailure::new(format!("Failed to send request: {}", e)))?;
        read_created(response).await
    }
}

impl UploadTransport for HttpTransport {
    fn submit(&self, request: UploadRequest) -> UploadTask {
        let client = self.client.clone();
        match request {
            UploadRequest::BulkFiles {
                files,
                classifications,
                labels,
            } => {
                let url = self.endpoint("vertex/upload");
                info!("Uploading {} file(s) to {}", files.len(), url);
                self.spawn("importFiles", move |reporter| {
                    Self::import_files(client, url, files, classifications, labels, reporter)
                })
            }
            UploadRequest::TextImport {
                content,
                mime_type,
                classification,
                label,
            } => {
                let url = self.endpoint("vertex/upload");
                info!("Importing {} bytes of {} to {}", content.len(), mime_type, url);
                self.spawn("importFileString", move |_| {
                    Self::import_string(client, url, content, mime_type, classification, label)
                })
            }
            UploadRequest::MetadataOnlyCreate {
                justification,
                classification,
                label,
            } => {
                let url = self.endpoint("vertex/new");
                info!("Creating item at {}", url);
                let params = vec![
                    ("conceptType", classification.unwrap_or_default()),
                    ("visibilitySource", label),
                    ("justificationText", justification.text),
                ];
                self.spawn("create", move |_| Self::post_form(client, url, params))
            }
        }
    }

    fn cloud_import(&self, identifier: &str, import_config: Value) -> UploadTask {
        let client = self.client.clone();
        let url = self.endpoint("vertex/cloudImport");
        info!("Starting cloud import from {} via {}", identifier, url);
        let params = vec![
            ("cloudResource", identifier.to_string()),
            ("cloudConfig", import_config.to_string()),
        ];
        self.spawn("cloudImport", move |_| Self::post_form(client, url, params))
    }
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

async fn read_payload(file: &FileDescriptor) -> std::result::Result<Vec<u8>, TransportFailure> {
    match &file.payload {
        PayloadRef::Path(path) => tokio::fs::read(path)
            .await
            .map_err(|e| TransportFailure::new(format!("Failed to read {}: {}", file.name, e))),
        PayloadRef::Bytes(bytes) => Ok(bytes.to_vec()),
    }
}

/// Yields `content` in chunks, reporting overall completion as each chunk goes out.
fn progress_chunks(
    content: Vec<u8>,
    total: u64,
    sent: Arc<AtomicU64>,
    reporter: TaskReporter,
) -> impl Stream<Item = std::io::Result<Vec<u8>>> + Send + Sync + 'static {
    let chunks: Vec<Vec<u8>> = content.chunks(CHUNK_SIZE).map(<[u8]>::to_vec).collect();
    futures::stream::iter(chunks.into_iter().map(move |chunk| {
        let done = sent.fetch_add(chunk.len() as u64, Ordering::SeqCst) + chunk.len() as u64;
        reporter.progress(done as f32 / total as f32);
        Ok::<_, std::io::Error>(chunk)
    }))
}

async fn read_created(response: Response) -> std::result::Result<CreatedResponse, TransportFailure> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<CreatedResponse>()
            .await
            .map_err(|e| TransportFailure::new(format!("Failed to parse upload response: {}", e)));
    }

    let body = response.text().await.unwrap_or_default();
    debug!("Upload rejected with status {}: {}", status, body);
    Err(failure_from_body(&body))
}

fn failure_from_body(body: &str) -> TransportFailure {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return match parsed.message.or(parsed.error) {
            Some(message) => TransportFailure::new(message),
            None => TransportFailure::unknown(),
        };
    }

    let text = body.trim();
    if text.is_empty() {
        TransportFailure::unknown()
    } else {
        TransportFailure::new(text)
    }
}
