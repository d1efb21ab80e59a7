//! Publishing snapshot files to a public location.
//!
//! A [`PublishPlan`] maps local snapshot files to object keys. A [`Publisher`]
//! moves one file to one key and returns the public URL. Missing local files are
//! skipped and failed uploads are reported; neither stops the other items.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use tokio::fs;
use tracing::{info, warn};

use crate::http_client::{HttpClient, HttpRequest};
use crate::persist::{dated_file_name, LATEST_FILE_NAME};
use crate::{ObservationDate, PublishError};

const KEY_PREFIX: &str = "data/risk-matrix";

/// Destination for snapshot files.
pub trait Publisher: Send + Sync {
    /// Publishes `local` under `key` and returns the public URL.
    fn publish<'a>(
        &'a self,
        local: &'a Path,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, PublishError>> + Send + 'a>>;
}

/// Uploads with HTTP PUT to `<endpoint>/<key>`.
#[derive(Clone)]
pub struct HttpPublisher {
    http_client: Arc<dyn HttpClient>,
    endpoint: String,
    public_base_url: String,
    acl_header: Option<(String, String)>,
}

impl HttpPublisher {
    pub fn new(http_client: Arc<dyn HttpClient>, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_owned();
        Self {
            http_client,
            public_base_url: endpoint.clone(),
            endpoint,
            acl_header: None,
        }
    }

    pub fn with_public_base_url(mut self, public_base_url: impl Into<String>) -> Self {
        self.public_base_url = public_base_url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Header sent with every upload, such as `x-amz-acl: public-read`.
    pub fn with_acl_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.acl_header = Some((name.into(), value.into()));
        self
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{key}", self.public_base_url)
    }
}

impl Publisher for HttpPublisher {
    fn publish<'a>(
        &'a self,
        local: &'a Path,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, PublishError>> + Send + 'a>> {
        Box::pin(async move {
            let body = fs::read_to_string(local)
                .await
                .map_err(|source| PublishError::Read {
                    path: local.to_path_buf(),
                    source,
                })?;

            let mut request = HttpRequest::put(format!("{}/{key}", self.endpoint))
                .with_header("content-type", "application/json; charset=utf-8")
                .with_body(body)
                .with_timeout_ms(30_000);
            if let Some((name, value)) = &self.acl_header {
                request = request.with_header(name.as_str(), value.as_str());
            }

            let response = self.http_client.execute(request).await.map_err(|error| {
                PublishError::Upload {
                    key: key.to_owned(),
                    message: error.message().to_owned(),
                }
            })?;
            if !response.is_success() {
                return Err(PublishError::Rejected {
                    key: key.to_owned(),
                    status: response.status,
                });
            }
            Ok(self.public_url(key))
        })
    }
}

/// Copies into a directory served as-is (a mounted bucket or static site root).
#[derive(Debug, Clone)]
pub struct DirectoryPublisher {
    target_dir: PathBuf,
    public_base_url: Option<String>,
}

impl DirectoryPublisher {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            public_base_url: None,
        }
    }

    pub fn with_public_base_url(mut self, public_base_url: impl Into<String>) -> Self {
        self.public_base_url = Some(public_base_url.into().trim_end_matches('/').to_owned());
        self
    }
}

impl Publisher for DirectoryPublisher {
    fn publish<'a>(
        &'a self,
        local: &'a Path,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, PublishError>> + Send + 'a>> {
        Box::pin(async move {
            let destination = self.target_dir.join(key);
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|source| PublishError::Copy {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
            fs::copy(local, &destination)
                .await
                .map_err(|source| PublishError::Copy {
                    path: destination.clone(),
                    source,
                })?;

            Ok(match &self.public_base_url {
                Some(base) => format!("{base}/{key}"),
                None => destination.display().to_string(),
            })
        })
    }
}

/// One local file and the key it is published under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishItem {
    pub local: PathBuf,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishPlan {
    pub items: Vec<PublishItem>,
}

impl PublishPlan {
    /// Dated snapshot to `data/risk-matrix/<date>.json`, latest to `data/risk-matrix/latest.json`.
    pub fn for_snapshot(output_dir: &Path, date: ObservationDate) -> Self {
        Self {
            items: vec![
                PublishItem {
                    local: output_dir.join(dated_file_name(date)),
                    key: format!("{KEY_PREFIX}/{date}.json"),
                },
                PublishItem {
                    local: output_dir.join(LATEST_FILE_NAME),
                    key: format!("{KEY_PREFIX}/latest.json"),
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PublishOutcome {
    Published { key: String, url: String },
    Skipped { key: String, local: PathBuf },
    Failed { key: String, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub outcomes: Vec<PublishOutcome>,
}

impl PublishReport {
    pub fn published(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            PublishOutcome::Published { key, url } => Some((key.as_str(), url.as_str())),
            _ => None,
        })
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes
            .iter()
            .any(|outcome| matches!(outcome, PublishOutcome::Failed { .. }))
    }
}

/// Publishes every plan item in order.
pub async fn publish_all(publisher: &dyn Publisher, plan: &PublishPlan) -> PublishReport {
    let mut report = PublishReport::default();
    for item in &plan.items {
        let is_file = fs::metadata(&item.local)
            .await
            .is_ok_and(|metadata| metadata.is_file());
        if !is_file {
            warn!(local = %item.local.display(), key = %item.key, "file not found, skipping");
            report.outcomes.push(PublishOutcome::Skipped {
                key: item.key.clone(),
                local: item.local.clone(),
            });
            continue;
        }

        match publisher.publish(&item.local, &item.key).await {
            Ok(url) => {
                info!(key = %item.key, %url, "published");
                report.outcomes.push(PublishOutcome::Published {
                    key: item.key.clone(),
                    url,
                });
            }
            Err(error) => {
                warn!(key = %item.key, error = %error, "publish failed");
                report.outcomes.push(PublishOutcome::Failed {
                    key: item.key.clone(),
                    message: error.to_string(),
                });
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Mutex;

    use super::*;
    use crate::http_client::{HttpError, HttpMethod, HttpResponse};

    struct RecordingHttpClient {
        status: u16,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl HttpClient for RecordingHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests.lock().expect("requests").push(request);
            let response = HttpResponse {
                status: self.status,
                body: String::new(),
            };
            Box::pin(async move { Ok(response) })
        }
    }

    fn date() -> ObservationDate {
        ObservationDate::from_ymd(2024, 6, 28).expect("date")
    }

    #[test]
    fn plan_maps_local_files_to_bucket_keys() {
        let plan = PublishPlan::for_snapshot(Path::new("data"), date());
        let keys: Vec<&str> = plan.items.iter().map(|item| item.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["data/risk-matrix/2024-06-28.json", "data/risk-matrix/latest.json"]
        );
        assert_eq!(
            plan.items[0].local,
            Path::new("data").join("risk-matrix-2024-06-28.json")
        );
    }

    #[tokio::test]
    async fn http_publisher_puts_body_with_acl_header() {
        let dir = tempfile::tempdir().expect("tempdir");
        let local = dir.path().join("risk-matrix-latest.json");
        fs::write(&local, "{}\n").expect("write local file");

        let client = Arc::new(RecordingHttpClient {
            status: 200,
            requests: Mutex::new(Vec::new()),
        });
        let publisher = HttpPublisher::new(client.clone(), "https://upload.example.test/bucket/")
            .with_public_base_url("https://cdn.example.test")
            .with_acl_header("X-Amz-Acl", "public-read");

        let url = publisher
            .publish(&local, "data/risk-matrix/latest.json")
            .await
            .expect("upload succeeds");
        assert_eq!(url, "https://cdn.example.test/data/risk-matrix/latest.json");

        let requests = client.requests.lock().expect("requests");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Put);
        assert_eq!(
            requests[0].url,
            "https://upload.example.test/bucket/data/risk-matrix/latest.json"
        );
        assert_eq!(requests[0].body.as_deref(), Some("{}\n"));
        assert_eq!(
            requests[0].headers.get("x-amz-acl").map(String::as_str),
            Some("public-read")
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn directory_publisher_creates_key_directories() {
        let source = tempfile::tempdir().expect("source");
        let target = tempfile::tempdir().expect("target");
        let local = source.path().join(LATEST_FILE_NAME);
        fs::write(&local, "{\"metadata\":{}}\n").expect("write local file");

        let location = DirectoryPublisher::new(target.path())
            .publish(&local, "data/risk-matrix/latest.json")
            .await
            .expect("copy succeeds");

        let destination = target.path().join("data/risk-matrix/latest.json");
        assert_eq!(location, destination.display().to_string());
        assert_eq!(
            fs::read_to_string(&destination).expect("copied file"),
            "{\"metadata\":{}}\n"
        );
    }

    #[tokio::test]
    async fn directory_publisher_reports_missing_source_as_copy_error() {
        let target = tempfile::tempdir().expect("target");
        let missing = target.path().join("absent.json");

        let error = DirectoryPublisher::new(target.path())
            .publish(&missing, "data/risk-matrix/latest.json")
            .await
            .expect_err("nothing to copy");

        assert!(matches!(error, PublishError::Copy { .. }));
    }

    #[tokio::test]
    async fn rejected_upload_is_reported_and_missing_file_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join(LATEST_FILE_NAME), "{}\n").expect("write latest");

        let client = Arc::new(RecordingHttpClient {
            status: 403,
            requests: Mutex::new(Vec::new()),
        });
        let publisher = HttpPublisher::new(client, "https://upload.example.test");
        let plan = PublishPlan::for_snapshot(dir.path(), date());

        let report = publish_all(&publisher, &plan).await;

        assert!(matches!(report.outcomes[0], PublishOutcome::Skipped { .. }));
        assert!(matches!(report.outcomes[1], PublishOutcome::Failed { .. }));
        assert!(report.has_failures());
        assert_eq!(report.published().count(), 0);
    }
}
