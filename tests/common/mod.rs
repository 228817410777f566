// Shared test doubles; not every test binary uses all of them.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use rust_food_agent::food::analysis::{AnalyzerSettings, FoodAnalyzer, FoodIdentity};
use rust_food_agent::food::api::usda::FoodItem;
use rust_food_agent::food::api::{LabelCandidate, LabelRecognizer, LookupError, NutritionLookup, RecognitionError};
use rust_food_agent::food::intake::{DiskImageStore, ImageHandle, ImageStore, IntakeError};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Smallest prefix `image::guess_format` recognizes as PNG.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";

pub const FAST_TIMEOUT: Duration = Duration::from_millis(200);

/// Disk-backed store that counts accepts and releases.
pub struct CountingStore {
    inner: DiskImageStore,
    pub accepted: AtomicUsize,
    pub released: AtomicUsize,
    pub fail_reads: AtomicBool,
    _dir: TempDir,
}

impl CountingStore {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        Self {
            inner: DiskImageStore::new(dir.path().to_path_buf()),
            accepted: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
            fail_reads: AtomicBool::new(false),
            _dir: dir,
        }
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn files_left(&self) -> usize {
        std::fs::read_dir(self.inner.dir()).map(|entries| entries.count()).unwrap_or(0)
    }
}

#[async_trait]
impl ImageStore for CountingStore {
    async fn accept(&self, bytes: &[u8]) -> Result<ImageHandle, IntakeError> {
        let handle = self.inner.accept(bytes).await?;
        self.accepted.fetch_add(1, Ordering::SeqCst);
        Ok(handle)
    }

    async fn read(&self, handle: &ImageHandle) -> Result<Vec<u8>, IntakeError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(IntakeError::Io(std::io::Error::other("read failed")));
        }
        self.inner.read(handle).await
    }

    // Counted after the file is gone so waiters can check the directory.
    async fn release(&self, handle: ImageHandle) {
        self.inner.release(handle).await;
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

pub enum Recognition {
    Labels(Vec<&'static str>),
    Fail,
    /// Fails the first `n` calls, then returns the labels.
    FailTimes(usize, Vec<&'static str>),
    Hang,
}

pub struct FakeRecognizer {
    behavior: Recognition,
    pub calls: AtomicUsize,
    pub received: Mutex<Vec<Vec<u8>>>,
}

impl FakeRecognizer {
    pub fn new(behavior: Recognition) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<Vec<u8>> {
        self.received.lock().unwrap().clone()
    }
}

fn candidates(labels: &[&'static str]) -> Vec<LabelCandidate> {
    labels.iter().map(|label| LabelCandidate::new(*label)).collect()
}

#[async_trait]
impl LabelRecognizer for FakeRecognizer {
    async fn detect_labels(&self, image: &[u8]) -> Result<Vec<LabelCandidate>, RecognitionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.received.lock().unwrap().push(image.to_vec());

        match &self.behavior {
            Recognition::Labels(labels) => Ok(candidates(labels)),
            Recognition::Fail => Err(RecognitionError::Malformed("upstream exploded".to_string())),
            Recognition::FailTimes(n, _) if call < *n => {
                Err(RecognitionError::Malformed("transient".to_string()))
            }
            Recognition::FailTimes(_, labels) => Ok(candidates(labels)),
            Recognition::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
        }
    }
}

pub enum Lookup {
    Found(FoodItem),
    NotFound,
    Fail,
    Hang,
}

pub struct FakeLookup {
    behavior: Lookup,
    pub calls: AtomicUsize,
    pub queries: Mutex<Vec<String>>,
}

impl FakeLookup {
    pub fn new(behavior: Lookup) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl NutritionLookup for FakeLookup {
    async fn lookup(&self, food: &FoodIdentity) -> Result<Option<FoodItem>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(food.to_string());

        match &self.behavior {
            Lookup::Found(item) => Ok(Some(item.clone())),
            Lookup::NotFound => Ok(None),
            Lookup::Fail => Err(LookupError::Status(reqwest::StatusCode::UNAUTHORIZED)),
            Lookup::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(None)
            }
        }
    }
}

pub fn banana() -> FoodItem {
    serde_json::from_value(serde_json::json!({
        "description": "Banana, raw",
        "foodNutrients": [{"nutrientName": "Energy", "value": 89, "unitName": "KCAL"}]
    }))
    .expect("Failed to build food item")
}

pub struct Harness {
    pub store: Arc<CountingStore>,
    pub recognizer: Arc<FakeRecognizer>,
    pub lookup: Arc<FakeLookup>,
    pub analyzer: Arc<FoodAnalyzer>,
}

impl Harness {
    pub fn new(recognition: Recognition, lookup: Lookup) -> Self {
        Self::with_settings(
            recognition,
            lookup,
            AnalyzerSettings {
                recognition_timeout: FAST_TIMEOUT,
                lookup_timeout: FAST_TIMEOUT,
                recognition_attempts: 1,
            },
        )
    }

    pub fn with_settings(recognition: Recognition, lookup: Lookup, settings: AnalyzerSettings) -> Self {
        let store = Arc::new(CountingStore::new());
        let recognizer = Arc::new(FakeRecognizer::new(recognition));
        let lookup = Arc::new(FakeLookup::new(lookup));
        let analyzer = Arc::new(FoodAnalyzer::new(
            store.clone(),
            recognizer.clone(),
            lookup.clone(),
            settings,
        ));

        Self {
            store,
            recognizer,
            lookup,
            analyzer,
        }
    }
}

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn spawn_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind test server");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server failed");
    });
    format!("http://{}", addr)
}
