//! # Publish Orchestrator Module
//!
//! Questo è il modulo principale che orchestra la pubblicazione ottimistica
//! di post e story.
//!
//! ## Flusso di esecuzione (post):
//! 1. **Entità ottimistica**: preview locali + campi autore dalla sessione,
//!    installata in modo sincrono alla submit (progress 0, Publishing)
//! 2. **Connecting phase**: attesa fissa (1500 ms) con progress fermo a 0
//! 3. **Counting phase**: ticker cosmetico (+5 ogni 100 ms, tetto 90) che
//!    corre in parallelo con la rete, puramente estetico
//! 4. **Lavoro reale, sequenziale**: upload media (se presenti) → sostituzione
//!    URL durevoli → creazione post → promozione best-effort
//! 5. **Successo**: stop ticker, snap a 100, 500 ms di pausa, Success,
//!    rimozione dopo 3000 ms
//! 6. **Fallimento**: stop ticker, Error(messaggio), card visibile 10000 ms
//!
//! ## Variante story:
//! Nessuna connecting phase, incrementi random (+0..=5 ogni 300 ms), pulizia
//! immediata alla terminazione e `refresh_key` incrementata esattamente una
//! volta per sottomissione.
//!
//! ## Politica di replacement (decisione esplicita):
//! **cancel-and-replace**: una nuova submit cancella il task precedente
//! (timer, sleep e richieste in volo comprese) prima di installare la nuova
//! entità ottimistica. Niente coda, niente merge. L'abort è best-effort su
//! runtime multi-thread, quindi ogni mutazione dello slot è comunque
//! vincolata al `local_id` della sottomissione che l'ha emessa.
//!
//! ## Error handling:
//! Ogni fallimento della catena viene catturato al boundary e convertito
//! nello stato terminale `Error` con messaggio leggibile; nulla risale al
//! chiamante come rejection non gestita. La promozione fallita viene loggata
//! e inghiottita, mai mostrata.

use crate::{
    api::{PostPayload, PublishApi, StoryPayload},
    config::Config,
    error::PublishError,
    pending::{PendingContent, PendingKind, PendingSlot, PendingStatus},
    preview::{PreviewRegistry, PreviewUrl},
    progress::{FixedStep, RandomStep},
    publisher::ticker::ProgressTicker,
    session::SessionStore,
};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

/// User-composed post before any network interaction
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub text: String,
    pub media_files: Vec<PathBuf>,
    pub category: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub promotion_tier: Option<String>,
}

/// Handle over one fire-and-forget submission.
///
/// All outcomes flow through the shared pending slot, never through this
/// handle; it only exists to support explicit cancellation.
pub struct PublishTask {
    handle: JoinHandle<()>,
}

impl PublishTask {
    /// Abort the submission: timers, sleeps and in-flight requests included
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the task to finish or be cancelled (test and CLI support)
    pub async fn wait(self) {
        let _ = self.handle.await;
    }
}

/// Main publish orchestrator, one instance per embedding application
pub struct Publisher<A: PublishApi + 'static> {
    api: Arc<A>,
    config: Config,
    session: Arc<dyn SessionStore>,
    previews: Arc<PreviewRegistry>,
    post_slot: Arc<PendingSlot>,
    story_slot: Arc<PendingSlot>,
    refresh_key: Arc<AtomicU64>,
    post_abort: Mutex<Option<AbortHandle>>,
    story_abort: Mutex<Option<AbortHandle>>,
}

impl<A: PublishApi + 'static> Publisher<A> {
    /// Create a new publisher instance
    pub fn new(api: A, config: Config, session: Arc<dyn SessionStore>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            api: Arc::new(api),
            config,
            session,
            previews: PreviewRegistry::new(),
            post_slot: Arc::new(PendingSlot::new()),
            story_slot: Arc::new(PendingSlot::new()),
            refresh_key: Arc::new(AtomicU64::new(0)),
            post_abort: Mutex::new(None),
            story_abort: Mutex::new(None),
        })
    }

    /// Observe the pending post indicator state
    pub fn subscribe_posts(&self) -> watch::Receiver<Option<PendingContent>> {
        self.post_slot.subscribe()
    }

    /// Observe the pending story indicator state
    pub fn subscribe_stories(&self) -> watch::Receiver<Option<PendingContent>> {
        self.story_slot.subscribe()
    }

    /// Counter bumped once per finished story submission; the story list
    /// re-fetches whenever it changes
    pub fn refresh_key(&self) -> u64 {
        self.refresh_key.load(Ordering::Relaxed)
    }

    /// Registry of live local preview URLs
    pub fn preview_registry(&self) -> &Arc<PreviewRegistry> {
        &self.previews
    }

    fn author_fields(&self) -> (Option<String>, Option<String>) {
        match self.session.load() {
            Ok(Some(profile)) => (Some(profile.user_name), profile.user_avatar),
            _ => (None, None),
        }
    }

    fn abort_previous(slot: &Mutex<Option<AbortHandle>>) {
        let mut guard = slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = guard.take() {
            previous.abort();
        }
    }

    fn track_task(slot: &Mutex<Option<AbortHandle>>, next: AbortHandle) {
        let mut guard = slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(next);
    }

    /// Submit a post. Fire-and-forget: the caller never awaits the outcome,
    /// it observes the pending slot instead.
    pub fn submit_post(&self, draft: PostDraft) -> PublishTask {
        // Replace, then install: the previous task must stop before the new
        // card goes up
        Self::abort_previous(&self.post_abort);

        // Build the optimistic entity synchronously, before any suspension
        let previews: Vec<PreviewUrl> = draft
            .media_files
            .iter()
            .map(|f| self.previews.acquire(f))
            .collect();
        let preview_urls = previews.iter().map(|p| p.url().to_string()).collect();
        let (author_name, author_avatar) = self.author_fields();

        let content = PendingContent::new(PendingKind::Post, draft.text.clone(), preview_urls)
            .with_author(author_name, author_avatar);
        let local_id = content.local_id.clone();

        info!("🚀 Publishing post ({} media file(s))", draft.media_files.len());
        // The indicator lives on the feed; make it visible regardless of
        // where the user was
        info!("📰 Switching to the feed view");
        self.post_slot.install(content);

        let api = Arc::clone(&self.api);
        let slot = Arc::clone(&self.post_slot);
        let config = self.config.clone();

        let handle = tokio::spawn(run_post_submission(
            api, config, slot, local_id, draft, previews,
        ));
        Self::track_task(&self.post_abort, handle.abort_handle());

        PublishTask { handle }
    }

    /// Submit a story. Same fire-and-forget shape as posts, without the
    /// connecting phase and with immediate cleanup on completion.
    pub fn submit_story(&self, payload: StoryPayload) -> PublishTask {
        Self::abort_previous(&self.story_abort);

        let previews: Vec<PreviewUrl> = payload
            .media_file
            .iter()
            .map(|f| self.previews.acquire(f))
            .collect();
        let preview_urls = previews.iter().map(|p| p.url().to_string()).collect();
        let (author_name, author_avatar) = self.author_fields();

        let text = payload.text.clone().unwrap_or_default();
        let content = PendingContent::new(PendingKind::Story, text, preview_urls)
            .with_author(author_name, author_avatar);
        let local_id = content.local_id.clone();

        info!("🚀 Publishing story (media: {})", payload.media_file.is_some());
        self.story_slot.install(content);

        let api = Arc::clone(&self.api);
        let slot = Arc::clone(&self.story_slot);
        let config = self.config.clone();
        let refresh_key = Arc::clone(&self.refresh_key);

        let handle = tokio::spawn(run_story_submission(
            api,
            config,
            slot,
            local_id,
            refresh_key,
            payload,
            previews,
        ));
        Self::track_task(&self.story_abort, handle.abort_handle());

        PublishTask { handle }
    }
}

/// Full post submission lifecycle; owns the previews until teardown
async fn run_post_submission<A: PublishApi>(
    api: Arc<A>,
    config: Config,
    slot: Arc<PendingSlot>,
    local_id: String,
    draft: PostDraft,
    mut previews: Vec<PreviewUrl>,
) {
    // Connecting phase: progress held at 0
    tokio::time::sleep(config.connect_delay()).await;

    // Counting phase: cosmetic ticker, concurrent with the real chain
    let ticker = ProgressTicker::start(
        Arc::clone(&slot),
        local_id.clone(),
        Box::new(FixedStep::new(
            config.post_tick_step,
            Duration::from_millis(config.post_tick_ms),
        )),
        config.progress_ceiling,
    );

    let result = post_chain(api.as_ref(), &draft, &mut previews).await;

    match result {
        Ok(()) => {
            ticker.stop();
            slot.snap_complete(&local_id);
            tokio::time::sleep(config.success_hold()).await;
            slot.set_status(&local_id, PendingStatus::Success);
            info!("✅ Post published");

            tokio::time::sleep(config.post_success_clear()).await;
            slot.clear(&local_id);
        }
        Err(e) => {
            ticker.stop();
            let message = e.user_message();
            warn!("❌ Post publish failed: {}", e);
            slot.set_status(&local_id, PendingStatus::Error(message));

            tokio::time::sleep(config.post_error_clear()).await;
            slot.clear(&local_id);
        }
    }
    // Any preview not already substituted is released here, on teardown
}

/// The real network chain, strictly sequential: upload → create → promote
async fn post_chain<A: PublishApi>(
    api: &A,
    draft: &PostDraft,
    previews: &mut [PreviewUrl],
) -> Result<(), PublishError> {
    let media = if draft.media_files.is_empty() {
        Vec::new()
    } else {
        let stored = api.upload_multiple(&draft.media_files).await?;
        // Durable URLs substitute the local previews; revoke them now
        for preview in previews.iter_mut() {
            preview.release();
        }
        stored
    };

    let payload = PostPayload {
        content: draft.text.clone(),
        category: draft.category.clone(),
        city: draft.city.clone(),
        phone: draft.phone.clone(),
        media,
        promotion_tier: draft.promotion_tier.clone(),
    };

    let created = api.create_post(&payload).await?;
    debug!("Post created with id {}", created.id);

    // Best effort: a failed promotion never aborts or surfaces
    if let Some(tier) = &draft.promotion_tier {
        if let Err(e) = api.promote_post(&created.id, tier).await {
            warn!("Promotion to tier '{}' failed (ignored): {}", tier, e);
        }
    }

    Ok(())
}

/// Story submission lifecycle: no connecting phase, immediate cleanup
async fn run_story_submission<A: PublishApi>(
    api: Arc<A>,
    config: Config,
    slot: Arc<PendingSlot>,
    local_id: String,
    refresh_key: Arc<AtomicU64>,
    payload: StoryPayload,
    previews: Vec<PreviewUrl>,
) {
    let ticker = ProgressTicker::start(
        Arc::clone(&slot),
        local_id.clone(),
        Box::new(RandomStep::new(
            config.story_tick_max_step,
            Duration::from_millis(config.story_tick_ms),
        )),
        config.progress_ceiling,
    );

    let result = api.create_story(&payload).await;
    ticker.stop();

    match result {
        Ok(()) => {
            slot.snap_complete(&local_id);
            slot.set_status(&local_id, PendingStatus::Success);
            info!("✅ Story published");
        }
        Err(e) => {
            slot.set_status(&local_id, PendingStatus::Error(e.user_message()));
            warn!("❌ Story publish failed: {}", e);
        }
    }

    // Let observers paint the terminal state before it disappears
    tokio::task::yield_now().await;

    // No cooldown window for stories; the list re-fetches instead
    slot.clear(&local_id);
    refresh_key.fetch_add(1, Ordering::Relaxed);
    drop(previews);
}
