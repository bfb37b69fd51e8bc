use crate::download::{available_path, resolve_download_filename};
use crate::error::{ErrorKind, FormError, Result};
use crate::form::FormState;
use crawlpilot_client::{CrawlRequest, CrawlResponse, DownloadRequest, ExportFormat, ScrapeClient};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// The request that was sent together with the result it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlSession {
    pub request: CrawlRequest,
    pub response: CrawlResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Crawl,
    Download,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionState {
    Idle,
    Busy,
    Succeeded,
    Failed { kind: ErrorKind, message: String },
}

impl ActionState {
    pub fn is_busy(&self) -> bool {
        matches!(self, ActionState::Busy)
    }
}

/// Published on every transition; crawl and download are tracked
/// independently.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerStatus {
    pub crawl: ActionState,
    pub download: ActionState,
}

impl Default for ControllerStatus {
    fn default() -> Self {
        Self {
            crawl: ActionState::Idle,
            download: ActionState::Idle,
        }
    }
}

impl ControllerStatus {
    pub fn get(&self, action: Action) -> &ActionState {
        match action {
            Action::Crawl => &self.crawl,
            Action::Download => &self.download,
        }
    }
}

// Holds an action's busy flag until dropped, including when the owning
// future is cancelled.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct FormController {
    client: ScrapeClient,
    download_dir: PathBuf,
    last_result: Mutex<Option<Arc<CrawlSession>>>,
    crawl_busy: AtomicBool,
    download_busy: AtomicBool,
    // Bumped by every reset; a crawl started under an older value is stale.
    generation: AtomicU64,
    status: watch::Sender<ControllerStatus>,
}

impl FormController {
    pub fn new(client: ScrapeClient, download_dir: impl Into<PathBuf>) -> Self {
        let (status, _) = watch::channel(ControllerStatus::default());
        Self {
            client,
            download_dir: download_dir.into(),
            last_result: Mutex::new(None),
            crawl_busy: AtomicBool::new(false),
            download_busy: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            status,
        }
    }

    pub fn client(&self) -> &ScrapeClient {
        &self.client
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    pub fn subscribe(&self) -> watch::Receiver<ControllerStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> ControllerStatus {
        self.status.borrow().clone()
    }

    pub fn is_busy(&self, action: Action) -> bool {
        match action {
            Action::Crawl => self.crawl_busy.load(Ordering::Acquire),
            Action::Download => self.download_busy.load(Ordering::Acquire),
        }
    }

    pub fn last_result(&self) -> Option<Arc<CrawlSession>> {
        self.slot().clone()
    }

    /// Seed the last-result slot, e.g. from a saved session file.
    pub fn restore_session(&self, session: CrawlSession) -> Arc<CrawlSession> {
        let session = Arc::new(session);
        *self.slot() = Some(session.clone());
        session
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Arc<CrawlSession>>> {
        self.last_result.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, action: Action, state: ActionState) {
        debug!("{:?} -> {:?}", action, state);
        self.status.send_modify(|status| match action {
            Action::Crawl => status.crawl = state,
            Action::Download => status.download = state,
        });
    }

    fn fail(&self, action: Action, error: FormError) -> FormError {
        self.publish(
            action,
            ActionState::Failed {
                kind: error.kind(),
                message: error.to_string(),
            },
        );
        error
    }

    /// Validate the form, submit the crawl and keep the result as the last
    /// session. A second call while one is in flight fails with
    /// [`FormError::Busy`] without touching the network.
    pub async fn submit_crawl(&self, form: &FormState) -> Result<Arc<CrawlSession>> {
        let request = match form.to_request() {
            Ok(request) => request,
            Err(e) if self.is_busy(Action::Crawl) => return Err(e),
            Err(e) => return Err(self.fail(Action::Crawl, e)),
        };

        let _guard = BusyGuard::acquire(&self.crawl_busy).ok_or(FormError::Busy)?;
        let generation = self.generation.load(Ordering::Acquire);
        self.publish(Action::Crawl, ActionState::Busy);

        let result = self.client.scrape(&request).await;

        // Held until the outcome is published so a reset cannot interleave.
        let mut slot = self.slot();
        if self.generation.load(Ordering::Acquire) != generation {
            info!("Discarding crawl of {} started before a form reset", request.url);
            return Err(FormError::Superseded);
        }

        match result {
            Ok(response) => {
                info!("Crawl of {} returned {} page(s)", request.url, response.data.len());
                let session = Arc::new(CrawlSession { request, response });
                *slot = Some(session.clone());
                self.publish(Action::Crawl, ActionState::Succeeded);
                Ok(session)
            }
            Err(e) => {
                warn!("Crawl of {} failed: {}", request.url, e);
                Err(self.fail(Action::Crawl, e.into()))
            }
        }
    }

    /// Ask the server to export the last session and stream it into the
    /// download directory. Returns the path written.
    pub async fn request_download(&self, format: ExportFormat) -> Result<PathBuf> {
        let Some(session) = self.last_result() else {
            return Err(self.fail(Action::Download, FormError::NoResults));
        };

        let _guard = BusyGuard::acquire(&self.download_busy).ok_or(FormError::Busy)?;
        self.publish(Action::Download, ActionState::Busy);

        match self.download_session(&session, format).await {
            Ok(path) => {
                self.publish(Action::Download, ActionState::Succeeded);
                Ok(path)
            }
            Err(e) => {
                warn!("Download failed: {}", e);
                Err(self.fail(Action::Download, e))
            }
        }
    }

    async fn download_session(&self, session: &CrawlSession, format: ExportFormat) -> Result<PathBuf> {
        let body = DownloadRequest::new(&session.request, session.response.data.clone(), format);
        let download = self.client.download(&body).await?;

        let filename = resolve_download_filename(download.suggested_filename.as_deref(), format);
        tokio::fs::create_dir_all(&self.download_dir).await?;
        let path = available_path(&self.download_dir, &filename);

        download.save_to(&path).await?;
        Ok(path)
    }

    /// Restore the form to its defaults and forget the last session. A crawl
    /// still in flight is discarded when it completes.
    pub fn reset_form(&self, form: &mut FormState) {
        form.reset();
        {
            let mut slot = self.slot();
            self.generation.fetch_add(1, Ordering::AcqRel);
            *slot = None;
        }
        self.status.send_replace(ControllerStatus::default());
        info!("Form reset");
    }
}
