//! Builder sessions.
//!
//! A [`DraftController`] holds one operator's working copy of a tenant's
//! token document. Edits apply to the local draft immediately and never
//! wait on the network. A background task saves the draft once edits have
//! been quiet for the configured debounce period. Saves and publishes go
//! through a single write gate, so at most one write per session is in
//! flight and a save requested meanwhile runs after it.

mod edit;
mod steps;

pub use edit::{ColorRole, Edit, Feature, FontRole, OverviewField};
pub use steps::Step;

use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info, warn};

use vitrine_shared::{AccessCode, DocumentBody, TenantId, Template, TokenDocument};
use vitrine_store::TokenBackend;

use crate::config::EngineConfig;
use crate::error::{DraftError, SyncError};
use crate::store_client::{Publication, TokenStoreClient};

/// The working copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub tenant_id: TenantId,
    /// Version of the document this draft was forked from or last wrote.
    pub base_version: Option<u64>,
    pub body: DocumentBody,
    pub is_dirty: bool,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub save_error: Option<SyncError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftPhase {
    Editing(Step),
    Saving,
    Saved,
    SaveErrored,
    Published,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Saved,
    Failed,
    Published,
}

/// Observable session state, published through a `watch` channel.
#[derive(Debug, Clone)]
pub struct DraftState {
    draft: Draft,
    step: Step,
    saving: bool,
    outcome: Option<Outcome>,
    /// Bumped by every edit; a save only clears `is_dirty` if no edit
    /// landed while it was in flight.
    revision: u64,
    published: bool,
    access_code: Option<AccessCode>,
    closed: bool,
}

impl DraftState {
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn phase(&self) -> DraftPhase {
        if self.saving {
            return DraftPhase::Saving;
        }
        match self.outcome {
            None => DraftPhase::Editing(self.step),
            Some(Outcome::Saved) => DraftPhase::Saved,
            Some(Outcome::Failed) => DraftPhase::SaveErrored,
            Some(Outcome::Published) => DraftPhase::Published,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.draft.is_dirty
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.draft.last_saved_at
    }

    pub fn save_error(&self) -> Option<&SyncError> {
        self.draft.save_error.as_ref()
    }

    pub fn is_published(&self) -> bool {
        self.published
    }

    pub fn access_code(&self) -> Option<&AccessCode> {
        self.access_code.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.draft.is_dirty = true;
        self.outcome = None;
    }

    fn record_write(&mut self, document: &TokenDocument, revision: u64, outcome: Outcome) {
        self.saving = false;
        self.draft.base_version = Some(document.version);
        self.draft.last_saved_at = Some(document.updated_at);
        self.draft.save_error = None;
        if self.revision == revision {
            self.draft.is_dirty = false;
            self.outcome = Some(outcome);
        }
    }

    fn record_failure(&mut self, error: &SyncError) {
        self.saving = false;
        self.draft.save_error = Some(error.clone());
        self.outcome = Some(Outcome::Failed);
    }
}

struct Shared<B> {
    client: Arc<TokenStoreClient<B>>,
    tenant: TenantId,
    state: watch::Sender<DraftState>,
    write_gate: Mutex<()>,
    autosave: mpsc::Sender<()>,
}

impl<B: TokenBackend> Shared<B> {
    fn schedule_autosave(&self) {
        // A full slot means an autosave is already pending.
        let _ = self.autosave.try_send(());
    }

    /// Mark the draft as being written and hand back what to write.
    fn begin_write(&self) -> (DocumentBody, u64) {
        let mut pending = (DocumentBody::default(), 0);
        self.state.send_modify(|s| {
            s.saving = true;
            pending = (s.draft.body.clone(), s.revision);
        });
        pending
    }

    async fn save_now(&self) -> Result<Option<TokenDocument>, SyncError> {
        let _gate = self.write_gate.lock().await;
        let dirty = self.state.borrow().draft.is_dirty;
        if !dirty {
            return Ok(None);
        }
        let (body, revision) = self.begin_write();

        let result = self.client.write(self.tenant, &body).await;
        self.state.send_modify(|s| match &result {
            Ok(document) => s.record_write(document, revision, Outcome::Saved),
            Err(e) => s.record_failure(e),
        });

        let document = result?;
        info!(tenant = %self.tenant.short(), version = document.version, "Draft saved");
        Ok(Some(document))
    }

    async fn publish_now(&self) -> Result<Publication, SyncError> {
        let _gate = self.write_gate.lock().await;
        let (body, revision) = self.begin_write();

        let result = self.client.publish(self.tenant, &body).await;
        self.state.send_modify(|s| match &result {
            Ok(publication) => {
                s.record_write(&publication.document, revision, Outcome::Published);
                s.published = true;
                s.access_code = Some(publication.access_code.clone());
            }
            Err(e) => s.record_failure(e),
        });

        result
    }
}

async fn autosave_loop<B: TokenBackend>(
    shared: Weak<Shared<B>>,
    mut requests: mpsc::Receiver<()>,
    debounce: Duration,
) {
    while requests.recv().await.is_some() {
        // Every further request restarts the quiet period.
        loop {
            tokio::select! {
                next = requests.recv() => {
                    if next.is_none() {
                        return;
                    }
                }
                () = tokio::time::sleep(debounce) => break,
            }
        }

        let Some(shared) = shared.upgrade() else {
            return;
        };
        let closed = shared.state.borrow().closed;
        if closed {
            debug!(tenant = %shared.tenant.short(), "Session closed, pending autosave dropped");
            return;
        }
        if let Err(e) = shared.save_now().await {
            debug!(tenant = %shared.tenant.short(), "Autosave failed: {e}");
        }
    }
}

/// Handle to a builder session. Clones share the session.
pub struct DraftController<B> {
    shared: Arc<Shared<B>>,
}

impl<B> Clone for DraftController<B> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<B: TokenBackend> DraftController<B> {
    /// Fork the tenant's active document (or an empty body) into a new
    /// session.
    pub async fn open(
        client: Arc<TokenStoreClient<B>>,
        tenant: TenantId,
        config: &EngineConfig,
    ) -> Result<Self, SyncError> {
        let base = client.fetch_active(tenant).await?;
        Ok(Self::fork(client, tenant, base, config))
    }

    /// Start a session from `base`. Must be called inside a Tokio runtime.
    pub fn fork(
        client: Arc<TokenStoreClient<B>>,
        tenant: TenantId,
        base: Option<TokenDocument>,
        config: &EngineConfig,
    ) -> Self {
        let (body, base_version) = match base {
            Some(doc) => {
                let (body, diags) = doc.parse_body();
                for diag in &diags {
                    warn!(path = %diag.path, problem = %diag.problem, "Dropping unreadable value from draft");
                }
                (body, Some(doc.version))
            }
            None => (DocumentBody::default(), None),
        };

        let (state, _) = watch::channel(DraftState {
            draft: Draft {
                tenant_id: tenant,
                base_version,
                body,
                is_dirty: false,
                last_saved_at: None,
                save_error: None,
            },
            step: Step::Overview,
            saving: false,
            outcome: None,
            revision: 0,
            published: false,
            access_code: None,
            closed: false,
        });
        let (autosave, requests) = mpsc::channel(1);

        let shared = Arc::new(Shared {
            client,
            tenant,
            state,
            write_gate: Mutex::new(()),
            autosave,
        });
        tokio::spawn(autosave_loop(
            Arc::downgrade(&shared),
            requests,
            config.autosave_debounce,
        ));

        info!(tenant = %tenant.short(), base_version, "Builder session opened");
        Self { shared }
    }

    pub fn tenant(&self) -> TenantId {
        self.shared.tenant
    }

    pub fn state(&self) -> DraftState {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DraftState> {
        self.shared.state.subscribe()
    }

    pub fn draft(&self) -> Draft {
        self.shared.state.borrow().draft.clone()
    }

    pub fn phase(&self) -> DraftPhase {
        self.shared.state.borrow().phase()
    }

    pub fn is_dirty(&self) -> bool {
        self.shared.state.borrow().is_dirty()
    }

    pub fn is_saving(&self) -> bool {
        self.shared.state.borrow().is_saving()
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.shared.state.borrow().last_saved_at()
    }

    pub fn save_error(&self) -> Option<SyncError> {
        self.shared.state.borrow().save_error().cloned()
    }

    pub fn is_published(&self) -> bool {
        self.shared.state.borrow().is_published()
    }

    pub fn access_code(&self) -> Option<AccessCode> {
        self.shared.state.borrow().access_code().cloned()
    }

    // -- editing ---------------------------------------------------------

    pub fn edit(&self, edit: Edit) -> Result<(), DraftError> {
        self.edit_with(|body| edit.apply(body))
    }

    /// Apply an arbitrary change to the draft body. `f` must not call back
    /// into this controller.
    pub fn edit_with(&self, f: impl FnOnce(&mut DocumentBody)) -> Result<(), DraftError> {
        let mut closed = false;
        self.shared.state.send_if_modified(|s| {
            if s.closed {
                closed = true;
                return false;
            }
            f(&mut s.draft.body);
            s.touch();
            true
        });

        if closed {
            return Err(DraftError::Closed);
        }
        self.shared.schedule_autosave();
        Ok(())
    }

    pub fn apply_template(&self, template: &Template) -> Result<(), DraftError> {
        debug!(tenant = %self.tenant().short(), template = template.id, "Applying template");
        self.edit_with(|body| template.apply(body))
    }

    // -- steps -----------------------------------------------------------

    pub fn step(&self) -> Step {
        self.shared.state.borrow().step
    }

    /// Required fields of the current step that are not satisfied yet.
    pub fn missing_fields(&self) -> Vec<String> {
        let s = self.shared.state.borrow();
        s.step.missing_fields(&s.draft.body)
    }

    pub fn can_go_next(&self) -> bool {
        let s = self.shared.state.borrow();
        !s.step.is_final() && s.step.missing_fields(&s.draft.body).is_empty()
    }

    pub fn can_go_prev(&self) -> bool {
        !self.step().is_first()
    }

    pub fn next_step(&self) -> Result<Step, DraftError> {
        let mut result = Err(DraftError::AtFinalStep);
        self.shared.state.send_if_modified(|s| {
            let Some(next) = s.step.next() else {
                return false;
            };
            let missing = s.step.missing_fields(&s.draft.body);
            if !missing.is_empty() {
                result = Err(DraftError::Incomplete {
                    step: s.step,
                    missing,
                });
                return false;
            }
            s.step = next;
            s.outcome = None;
            result = Ok(next);
            true
        });
        result
    }

    pub fn prev_step(&self) -> Result<Step, DraftError> {
        let mut result = Err(DraftError::AtFirstStep);
        self.shared.state.send_if_modified(|s| {
            let Some(prev) = s.step.prev() else {
                return false;
            };
            s.step = prev;
            s.outcome = None;
            result = Ok(prev);
            true
        });
        result
    }

    // -- writes ----------------------------------------------------------

    /// Save now instead of waiting for the debounce. A no-op when nothing
    /// changed since the last save. Waits for a write already in flight.
    pub async fn save(&self) -> Result<(), DraftError> {
        if self.shared.state.borrow().closed {
            return Err(DraftError::Closed);
        }
        self.detached(|shared| async move { shared.save_now().await })
            .await?;
        Ok(())
    }

    /// Write the draft, mark the tenant published and return its access
    /// code. Only available from the final step with every step complete.
    pub async fn publish(&self) -> Result<AccessCode, DraftError> {
        self.check_publishable()?;
        let publication = self
            .detached(|shared| async move { shared.publish_now().await })
            .await?;
        Ok(publication.access_code)
    }

    /// Run a write on its own task. Dropping the caller's future then only
    /// stops the wait: the write, its change announcement and the session
    /// state update still complete.
    async fn detached<T, F>(&self, op: impl FnOnce(Arc<Shared<B>>) -> F) -> Result<T, SyncError>
    where
        F: Future<Output = Result<T, SyncError>> + Send + 'static,
        T: Send + 'static,
    {
        tokio::spawn(op(Arc::clone(&self.shared)))
            .await
            .unwrap_or_else(|e| Err(SyncError::Transient(format!("write task ended: {e}"))))
    }

    fn check_publishable(&self) -> Result<(), DraftError> {
        let s = self.shared.state.borrow();
        if s.closed {
            return Err(DraftError::Closed);
        }
        if !s.step.is_final() {
            return Err(DraftError::NotOnFinalStep);
        }
        for step in Step::ALL {
            let missing = step.missing_fields(&s.draft.body);
            if !missing.is_empty() {
                return Err(DraftError::Incomplete { step, missing });
            }
        }
        Ok(())
    }

    /// Compare the draft's base version with the store.
    ///
    /// Returns a [`SyncError::Conflict`] when someone else wrote the tenant
    /// since this session last read or wrote it. Informational only: saving
    /// still overwrites.
    pub async fn detect_conflict(&self) -> Result<Option<SyncError>, SyncError> {
        let _gate = self.shared.write_gate.lock().await;
        let base = self.shared.state.borrow().draft.base_version;
        let active = self.shared.client.fetch_active(self.shared.tenant).await?;

        Ok(match active {
            Some(doc) if Some(doc.version) != base => {
                warn!(
                    tenant = %self.tenant().short(),
                    expected = base,
                    found = doc.version,
                    "Draft is based on an outdated document"
                );
                Some(SyncError::Conflict {
                    expected: base,
                    found: doc.version,
                })
            }
            _ => None,
        })
    }

    /// End the session. A pending autosave is dropped; a write already in
    /// flight completes.
    pub fn close(&self) {
        let changed = self.shared.state.send_if_modified(|s| !std::mem::replace(&mut s.closed, true));
        if changed {
            info!(tenant = %self.tenant().short(), dirty = self.is_dirty(), "Builder session closed");
        }
    }
}
