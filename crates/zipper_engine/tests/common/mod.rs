#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use zipper_engine::{
    EngineEvent, FailureKind, FetchError, FetchMetadata, FetchResult, Fetcher, Locator, Payload,
    ProgressSink,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(zipper_logging::initialize_for_tests);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trace {
    Started(usize),
    Settled(usize),
}

/// In-memory fetcher for `https://img.test/{n}` locators.
///
/// Item `n` answers with `n` as its body after a delay that shuffles
/// completion order inside a batch. Items listed in `failing` return a 404.
pub struct FakeFetcher {
    failing: HashSet<usize>,
    content_type: Option<String>,
    trace: Mutex<Vec<Trace>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay_ms: fn(usize) -> u64,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self {
            failing: HashSet::new(),
            content_type: Some("image/png".to_string()),
            trace: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            delay_ms: |n| ((n * 7) % 5) as u64 + 1,
        }
    }

    pub fn failing(mut self, items: impl IntoIterator<Item = usize>) -> Self {
        self.failing = items.into_iter().collect();
        self
    }

    pub fn content_type(mut self, content_type: Option<&str>) -> Self {
        self.content_type = content_type.map(str::to_string);
        self
    }

    pub fn delay(mut self, delay_ms: fn(usize) -> u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn trace(&self) -> Vec<Trace> {
        self.trace.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

pub fn item_number(locator: &Locator) -> usize {
    locator
        .as_str()
        .rsplit('/')
        .next()
        .and_then(|n| n.parse().ok())
        .expect("test locator ends with a number")
}

pub fn locators(n: usize) -> Vec<Locator> {
    (1..=n)
        .map(|i| Locator::new(format!("https://img.test/{i}")))
        .collect()
}

#[async_trait::async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, locator: &Locator) -> FetchResult {
        let n = item_number(locator);
        self.trace.lock().unwrap().push(Trace::Started(n));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis((self.delay_ms)(n))).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.trace.lock().unwrap().push(Trace::Settled(n));

        if self.failing.contains(&n) {
            return Err(FetchError::new(
                locator.clone(),
                FailureKind::HttpStatus(404),
                "404 Not Found",
            ));
        }
        let bytes = n.to_string().into_bytes();
        Ok(Payload {
            metadata: FetchMetadata {
                original_url: locator.to_string(),
                final_url: locator.to_string(),
                redirect_count: 0,
                content_type: self.content_type.clone(),
                byte_len: bytes.len() as u64,
            },
            bytes,
        })
    }
}

#[derive(Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn read_entry_names(bytes: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).expect("valid zip");
    (0..archive.len())
        .map(|i| archive.by_index(i).expect("entry").name().to_string())
        .collect()
}

pub fn read_entry(bytes: &[u8], name: &str) -> Vec<u8> {
    use std::io::Read;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).expect("valid zip");
    let mut file = archive.by_name(name).expect("entry present");
    let mut out = Vec::new();
    file.read_to_end(&mut out).expect("read entry");
    out
}
