//! In-memory collaborators for the session dispatcher.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

use sheetbot::core::error::{AppError, AppResult};
use sheetbot::i18n::Localization;
use sheetbot::services::{MediaStore, Spreadsheet};
use sheetbot::session::{BotContext, Inbound, Links, MediaRef, Outbound, SessionDispatcher, Transport};
use sheetbot::storage::ProfileStore;

/// Records everything sent; media downloads return fixed bytes.
#[derive(Default)]
pub struct FakeTransport {
    pub sent: Mutex<Vec<(i64, Outbound)>>,
    pub fail_fetch: AtomicBool,
}

impl FakeTransport {
    pub fn take(&self) -> Vec<Outbound> {
        self.sent.lock().drain(..).map(|(_, outbound)| outbound).collect()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, chat_id: i64, outbound: Outbound) -> AppResult<()> {
        self.sent.lock().push((chat_id, outbound));
        Ok(())
    }

    async fn fetch_media(&self, media: &MediaRef) -> AppResult<Vec<u8>> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(AppError::Media(format!("cannot fetch {}", media.file_id)));
        }
        Ok(format!("bytes of {}", media.file_id).into_bytes())
    }
}

/// Cells keyed by `sheet!cell`.
#[derive(Default)]
pub struct FakeSheet {
    pub cells: Mutex<HashMap<String, String>>,
    pub writes: Mutex<Vec<(String, String)>>,
    pub fail: AtomicBool,
}

impl FakeSheet {
    pub fn with_cell(range: &str, value: &str) -> Self {
        let sheet = Self::default();
        sheet.cells.lock().insert(range.to_string(), value.to_string());
        sheet
    }

    fn check(&self) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Spreadsheet("quota exceeded".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Spreadsheet for FakeSheet {
    async fn read_cell(&self, sheet: &str, cell: &str) -> AppResult<String> {
        self.check()?;
        let range = format!("{}!{}", sheet, cell);
        Ok(self.cells.lock().get(&range).cloned().unwrap_or_default())
    }

    async fn write_cell(&self, sheet: &str, cell: &str, value: &str) -> AppResult<()> {
        self.check()?;
        let range = format!("{}!{}", sheet, cell);
        self.writes.lock().push((range.clone(), value.to_string()));
        self.cells.lock().insert(range, value.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeMediaStore {
    pub stored: Mutex<Vec<Vec<u8>>>,
}

#[async_trait]
impl MediaStore for FakeMediaStore {
    async fn store(&self, bytes: &[u8]) -> AppResult<PathBuf> {
        self.stored.lock().push(bytes.to_vec());
        Ok(PathBuf::from("received_photo.jpg"))
    }
}

/// Dispatcher wired to fakes, a temporary database and the bundled locales.
pub struct Harness {
    pub dispatcher: SessionDispatcher,
    pub store: ProfileStore,
    pub transport: Arc<FakeTransport>,
    pub sheet: Arc<FakeSheet>,
    pub media: Arc<FakeMediaStore>,
    pub db_path: PathBuf,
    _dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_sheet(FakeSheet::default())
    }

    pub fn with_sheet(sheet: FakeSheet) -> Self {
        Self::build(sheet, "https://pay.example.com/c/1")
    }

    pub fn build(sheet: FakeSheet, payment_url: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("users.sqlite");
        let store = ProfileStore::open(db_path.to_str().unwrap()).unwrap();
        let locales = Localization::load_dir(locales_dir(), "ru").unwrap();
        let links = Links {
            terms: "https://example.com/terms".into(),
            map: "https://maps.example.com".into(),
            payment: payment_url.into(),
        };
        let ctx = Arc::new(BotContext::new(locales, links, "Sheet1"));

        let transport = Arc::new(FakeTransport::default());
        let sheet = Arc::new(sheet);
        let media = Arc::new(FakeMediaStore::default());
        let dispatcher = SessionDispatcher::new(ctx, store.clone(), transport.clone(), sheet.clone(), media.clone());

        Self {
            dispatcher,
            store,
            transport,
            sheet,
            media,
            db_path,
            _dir: dir,
        }
    }

    pub async fn send(&self, inbound: Inbound) -> sheetbot::Screen {
        self.dispatcher.handle(inbound).await.unwrap()
    }

    pub async fn try_send(&self, inbound: Inbound) -> AppResult<sheetbot::Screen> {
        self.dispatcher.handle(inbound).await
    }
}

pub fn locales_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data").join("lang")
}
