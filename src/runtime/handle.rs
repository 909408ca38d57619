use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, broadcast, mpsc, oneshot};

use crate::{
    core::{
        links::UnlinkOutcome,
        store::{CatalogStore, StoreError},
    },
    movie::{MovieDraft, MoviePatch, MovieRecord},
    performer::{PerformerDraft, PerformerPatch, PerformerRecord},
    persist::{CatalogSink, LoadReport, PersistError},
    sync::{
        SyncError,
        fetch::{MetadataRecord, MetadataSource, validate_external_id},
        merge::{self, MergeOutcome},
    },
    types::{MovieId, PerformerId, Rating},
};

use super::events::CatalogEvent;

/// Errors surfaced through the runtime handle.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Catalog store rejection.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Persistence failure; the store keeps its dirty flag set.
    #[error(transparent)]
    Persist(#[from] PersistError),
    /// Synchronization failure; the target movie is untouched.
    #[error(transparent)]
    Sync(#[from] SyncError),
    /// The runtime loop is gone.
    #[error("catalog runtime channel closed")]
    ChannelClosed,
}

/// Tuning knobs for the runtime loop.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Bound of the command queue feeding the loop.
    pub cmd_queue_bound: usize,
    /// Capacity of the broadcast event channel.
    pub event_capacity: usize,
    /// Save a dirty catalog during shutdown when a sink is configured.
    pub save_on_shutdown: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cmd_queue_bound: 256,
            event_capacity: 1024,
            save_on_shutdown: false,
        }
    }
}

/// Cloneable async handle to the single-writer catalog loop.
pub struct CatalogHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<CatalogEvent>,
}

impl Clone for CatalogHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

enum Command {
    AddMovie {
        draft: MovieDraft,
        resp: oneshot::Sender<Result<MovieId, RuntimeError>>,
    },
    AddPerformer {
        draft: PerformerDraft,
        link_to: Option<MovieId>,
        resp: oneshot::Sender<Result<PerformerId, RuntimeError>>,
    },
    UpdateMovie {
        id: MovieId,
        patch: MoviePatch,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    UpdatePerformer {
        id: PerformerId,
        patch: PerformerPatch,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    RemoveMovie {
        id: MovieId,
        resp: oneshot::Sender<Result<Vec<PerformerId>, RuntimeError>>,
    },
    RemovePerformer {
        id: PerformerId,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    Link {
        movie: MovieId,
        performer: PerformerId,
        resp: oneshot::Sender<Result<bool, RuntimeError>>,
    },
    Unlink {
        movie: MovieId,
        performer: PerformerId,
        resp: oneshot::Sender<Result<UnlinkOutcome, RuntimeError>>,
    },
    GetMovie {
        id: MovieId,
        resp: oneshot::Sender<Option<MovieRecord>>,
    },
    GetPerformer {
        id: PerformerId,
        resp: oneshot::Sender<Option<PerformerRecord>>,
    },
    Movies {
        resp: oneshot::Sender<Vec<MovieRecord>>,
    },
    Performers {
        resp: oneshot::Sender<Vec<PerformerRecord>>,
    },
    FindPerformer {
        name: String,
        resp: oneshot::Sender<Option<PerformerRecord>>,
    },
    WouldOrphan {
        movie: MovieId,
        resp: oneshot::Sender<Result<Vec<PerformerId>, RuntimeError>>,
    },
    OverallRating {
        movie: MovieId,
        resp: oneshot::Sender<Result<Rating, RuntimeError>>,
    },
    IsDirty {
        resp: oneshot::Sender<bool>,
    },
    Save {
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    Load {
        resp: oneshot::Sender<Result<LoadReport, RuntimeError>>,
    },
    Synchronize {
        movie: MovieId,
        external_id: String,
        resp: oneshot::Sender<Result<MergeOutcome, RuntimeError>>,
    },
    Shutdown {
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
}

/// Completed fetch marshaled back into the loop before any mutation.
struct SyncDone {
    movie: MovieId,
    fetched: Result<MetadataRecord, SyncError>,
    resp: oneshot::Sender<Result<MergeOutcome, RuntimeError>>,
}

type SharedSink = Arc<Mutex<Box<dyn CatalogSink>>>;

/// Spawns the single-writer catalog loop and returns its handle.
///
/// All catalog mutation happens on the spawned task; blocking filesystem
/// and network work runs on blocking tasks and is marshaled back, so
/// multi-step link/unlink/cascade operations never interleave.
pub fn spawn_catalog(
    store: CatalogStore,
    sink: Option<Box<dyn CatalogSink>>,
    source: Option<Arc<dyn MetadataSource>>,
    config: RuntimeConfig,
) -> CatalogHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.cmd_queue_bound);
    let (events_tx, _) = broadcast::channel::<CatalogEvent>(config.event_capacity);

    let sink: Option<SharedSink> = sink.map(|s| Arc::new(Mutex::new(s)));
    let events_tx_loop = events_tx.clone();

    tokio::spawn(async move {
        let mut store = store;
        let (sync_tx, mut sync_rx) = mpsc::unbounded_channel::<SyncDone>();

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    let Some(cmd) = cmd else { break; };
                    let done = handle_command(
                        cmd,
                        &mut store,
                        &events_tx_loop,
                        sink.as_ref(),
                        source.as_ref(),
                        &sync_tx,
                        &config,
                    )
                    .await;
                    if done {
                        break;
                    }
                }
                done = sync_rx.recv() => {
                    if let Some(done) = done {
                        finish_sync(done, &mut store, &events_tx_loop);
                    }
                }
            }
        }
    });

    CatalogHandle { cmd_tx, events_tx }
}

impl CatalogHandle {
    /// Subscribes to the runtime event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.events_tx.subscribe()
    }

    /// Adds a movie and returns its id.
    pub async fn add_movie(&self, draft: MovieDraft) -> Result<MovieId, RuntimeError> {
        self.request(|resp| Command::AddMovie { draft, resp }).await?
    }

    /// Adds a performer, optionally linking it to a movie in the same step.
    pub async fn add_performer(
        &self,
        draft: PerformerDraft,
        link_to: Option<MovieId>,
    ) -> Result<PerformerId, RuntimeError> {
        self.request(|resp| Command::AddPerformer { draft, link_to, resp })
            .await?
    }

    /// Applies a sparse patch to a movie.
    pub async fn update_movie(&self, id: MovieId, patch: MoviePatch) -> Result<(), RuntimeError> {
        self.request(|resp| Command::UpdateMovie { id, patch, resp })
            .await?
    }

    /// Applies a sparse patch to a performer.
    pub async fn update_performer(
        &self,
        id: PerformerId,
        patch: PerformerPatch,
    ) -> Result<(), RuntimeError> {
        self.request(|resp| Command::UpdatePerformer { id, patch, resp })
            .await?
    }

    /// Removes a movie, returning performers removed by the cascade.
    pub async fn remove_movie(&self, id: MovieId) -> Result<Vec<PerformerId>, RuntimeError> {
        self.request(|resp| Command::RemoveMovie { id, resp }).await?
    }

    /// Removes a performer.
    pub async fn remove_performer(&self, id: PerformerId) -> Result<(), RuntimeError> {
        self.request(|resp| Command::RemovePerformer { id, resp })
            .await?
    }

    /// Links a movie and a performer; true when a new link was made.
    pub async fn link(&self, movie: MovieId, performer: PerformerId) -> Result<bool, RuntimeError> {
        self.request(|resp| Command::Link { movie, performer, resp })
            .await?
    }

    /// Unlinks a movie and a performer, reporting the orphan state.
    pub async fn unlink(
        &self,
        movie: MovieId,
        performer: PerformerId,
    ) -> Result<UnlinkOutcome, RuntimeError> {
        self.request(|resp| Command::Unlink { movie, performer, resp })
            .await?
    }

    /// Gets a movie by id.
    pub async fn get_movie(&self, id: MovieId) -> Result<Option<MovieRecord>, RuntimeError> {
        self.request(|resp| Command::GetMovie { id, resp }).await
    }

    /// Gets a performer by id.
    pub async fn get_performer(
        &self,
        id: PerformerId,
    ) -> Result<Option<PerformerRecord>, RuntimeError> {
        self.request(|resp| Command::GetPerformer { id, resp }).await
    }

    /// All movies in display order.
    pub async fn movies(&self) -> Result<Vec<MovieRecord>, RuntimeError> {
        self.request(|resp| Command::Movies { resp }).await
    }

    /// All performers in display order.
    pub async fn performers(&self) -> Result<Vec<PerformerRecord>, RuntimeError> {
        self.request(|resp| Command::Performers { resp }).await
    }

    /// Looks up a performer by exact full name.
    pub async fn find_performer(
        &self,
        name: impl Into<String>,
    ) -> Result<Option<PerformerRecord>, RuntimeError> {
        self.request(|resp| Command::FindPerformer {
            name: name.into(),
            resp,
        })
        .await
    }

    /// Performers that removing this movie would orphan; confirmation
    /// prompts belong to the embedding, this only supplies the facts.
    pub async fn would_orphan(&self, movie: MovieId) -> Result<Vec<PerformerId>, RuntimeError> {
        self.request(|resp| Command::WouldOrphan { movie, resp })
            .await?
    }

    /// Computed overall rating for a movie.
    pub async fn overall_rating(&self, movie: MovieId) -> Result<Rating, RuntimeError> {
        self.request(|resp| Command::OverallRating { movie, resp })
            .await?
    }

    /// True when the catalog has unsaved mutations.
    pub async fn is_dirty(&self) -> Result<bool, RuntimeError> {
        self.request(|resp| Command::IsDirty { resp }).await
    }

    /// Saves the catalog; the dirty flag clears only on success.
    pub async fn save(&self) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Save { resp }).await?
    }

    /// Replaces the catalog with the persisted state.
    pub async fn load(&self) -> Result<LoadReport, RuntimeError> {
        self.request(|resp| Command::Load { resp }).await?
    }

    /// Fetches remote metadata for the external id and merges it into the
    /// movie. The fetch runs on a blocking task; the movie stays untouched
    /// until a usable record is marshaled back into the loop.
    pub async fn synchronize(
        &self,
        movie: MovieId,
        external_id: impl Into<String>,
    ) -> Result<MergeOutcome, RuntimeError> {
        self.request(|resp| Command::Synchronize {
            movie,
            external_id: external_id.into(),
            resp,
        })
        .await?
    }

    /// Stops the loop, optionally saving first per the runtime config.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Shutdown { resp }).await?
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

async fn handle_command(
    cmd: Command,
    store: &mut CatalogStore,
    events_tx: &broadcast::Sender<CatalogEvent>,
    sink: Option<&SharedSink>,
    source: Option<&Arc<dyn MetadataSource>>,
    sync_tx: &mpsc::UnboundedSender<SyncDone>,
    config: &RuntimeConfig,
) -> bool {
    match cmd {
        Command::AddMovie { draft, resp } => {
            let id = store.add_movie(draft);
            let _ = events_tx.send(CatalogEvent::MovieAdded { id });
            let _ = resp.send(Ok(id));
        }
        Command::AddPerformer { draft, link_to, resp } => {
            let out = (|| -> Result<PerformerId, RuntimeError> {
                if let Some(movie) = link_to
                    && store.get_movie(movie).is_none()
                {
                    return Err(StoreError::MissingMovie(movie).into());
                }
                let id = store.add_performer(draft);
                if let Some(movie) = link_to {
                    store.link(movie, id)?;
                }
                Ok(id)
            })();
            if let Ok(id) = &out {
                let _ = events_tx.send(CatalogEvent::PerformerAdded { id: *id });
            }
            let _ = resp.send(out);
        }
        Command::UpdateMovie { id, patch, resp } => {
            let out = store.update_movie(id, patch).map_err(RuntimeError::from);
            if out.is_ok() {
                let _ = events_tx.send(CatalogEvent::MovieUpdated { id });
            }
            let _ = resp.send(out);
        }
        Command::UpdatePerformer { id, patch, resp } => {
            let out = store.update_performer(id, patch).map_err(RuntimeError::from);
            if out.is_ok() {
                let _ = events_tx.send(CatalogEvent::PerformerUpdated { id });
            }
            let _ = resp.send(out);
        }
        Command::RemoveMovie { id, resp } => {
            let out = store.remove_movie(id).map_err(RuntimeError::from);
            if let Ok(performers_removed) = &out {
                let _ = events_tx.send(CatalogEvent::MovieRemoved {
                    id,
                    performers_removed: performers_removed.clone(),
                });
            }
            let _ = resp.send(out);
        }
        Command::RemovePerformer { id, resp } => {
            let out = store.remove_performer(id).map_err(RuntimeError::from);
            if out.is_ok() {
                let _ = events_tx.send(CatalogEvent::PerformerRemoved { id });
            }
            let _ = resp.send(out);
        }
        Command::Link { movie, performer, resp } => {
            let out = store.link(movie, performer).map_err(RuntimeError::from);
            if let Ok(true) = out {
                let _ = events_tx.send(CatalogEvent::Linked { movie, performer });
            }
            let _ = resp.send(out);
        }
        Command::Unlink { movie, performer, resp } => {
            let out = store.unlink(movie, performer).map_err(RuntimeError::from);
            if let Ok(outcome) = &out
                && outcome.was_linked
            {
                let _ = events_tx.send(CatalogEvent::Unlinked {
                    movie,
                    performer,
                    orphaned: outcome.orphaned,
                });
            }
            let _ = resp.send(out);
        }
        Command::GetMovie { id, resp } => {
            let _ = resp.send(store.get_movie_cloned(id));
        }
        Command::GetPerformer { id, resp } => {
            let _ = resp.send(store.get_performer_cloned(id));
        }
        Command::Movies { resp } => {
            let _ = resp.send(store.movies_cloned());
        }
        Command::Performers { resp } => {
            let _ = resp.send(store.performers_cloned());
        }
        Command::FindPerformer { name, resp } => {
            let _ = resp.send(store.find_performer_by_name(&name).cloned());
        }
        Command::WouldOrphan { movie, resp } => {
            let _ = resp.send(store.orphans_after_removal(movie).map_err(RuntimeError::from));
        }
        Command::OverallRating { movie, resp } => {
            let _ = resp.send(store.overall_rating(movie).map_err(RuntimeError::from));
        }
        Command::IsDirty { resp } => {
            let _ = resp.send(store.is_dirty());
        }
        Command::Save { resp } => {
            let out = save_store(store, sink, events_tx).await;
            let _ = resp.send(out);
        }
        Command::Load { resp } => {
            let out = match sink {
                Some(sink) => {
                    let sink_ref = Arc::clone(sink);
                    let res = tokio::task::spawn_blocking(move || sink_ref.blocking_lock().load())
                        .await
                        .map_err(|err| PersistError::Message(format!("join error: {err}")))
                        .and_then(|r| r);
                    match res {
                        Ok((snapshot, report)) => {
                            *store = CatalogStore::from_snapshot(snapshot);
                            let _ = events_tx.send(CatalogEvent::Loaded { report });
                            Ok(report)
                        }
                        Err(err) => {
                            tracing::warn!(%err, "catalog load failed");
                            Err(RuntimeError::from(err))
                        }
                    }
                }
                None => Err(no_sink_error()),
            };
            let _ = resp.send(out);
        }
        Command::Synchronize { movie, external_id, resp } => {
            if store.get_movie(movie).is_none() {
                let _ = resp.send(Err(StoreError::MissingMovie(movie).into()));
            } else if let Err(err) = validate_external_id(&external_id) {
                let _ = resp.send(Err(err.into()));
            } else if let Some(source) = source {
                let source = Arc::clone(source);
                let sync_tx = sync_tx.clone();
                tokio::spawn(async move {
                    let fetched =
                        match tokio::task::spawn_blocking(move || source.fetch(&external_id)).await
                        {
                            Ok(result) => result,
                            Err(err) => Err(SyncError::BadConnection(format!("join error: {err}"))),
                        };
                    let _ = sync_tx.send(SyncDone { movie, fetched, resp });
                });
            } else {
                let _ = resp.send(Err(SyncError::BadConnection(
                    "no metadata source configured".to_string(),
                )
                .into()));
            }
        }
        Command::Shutdown { resp } => {
            let out = if config.save_on_shutdown && store.is_dirty() && sink.is_some() {
                save_store(store, sink, events_tx).await
            } else {
                Ok(())
            };
            let _ = resp.send(out);
            return true;
        }
    }

    false
}

fn finish_sync(
    done: SyncDone,
    store: &mut CatalogStore,
    events_tx: &broadcast::Sender<CatalogEvent>,
) {
    let SyncDone { movie, fetched, resp } = done;
    let out = fetched.map_err(RuntimeError::from).and_then(|record| {
        merge::apply_record(store, movie, &record).map_err(RuntimeError::from)
    });
    if out.is_ok() {
        let _ = events_tx.send(CatalogEvent::Synchronized { movie });
    }
    let _ = resp.send(out);
}

async fn save_store(
    store: &mut CatalogStore,
    sink: Option<&SharedSink>,
    events_tx: &broadcast::Sender<CatalogEvent>,
) -> Result<(), RuntimeError> {
    let Some(sink) = sink else {
        return Err(no_sink_error());
    };

    let snapshot = store.export_snapshot();
    let sink_ref = Arc::clone(sink);
    let res = tokio::task::spawn_blocking(move || sink_ref.blocking_lock().save(&snapshot))
        .await
        .map_err(|err| PersistError::Message(format!("join error: {err}")))
        .and_then(|r| r);

    match res {
        Ok(()) => {
            store.mark_saved();
            let _ = events_tx.send(CatalogEvent::Saved);
            Ok(())
        }
        Err(err) => {
            tracing::warn!(%err, "catalog save failed, dirty flag kept");
            Err(RuntimeError::from(err))
        }
    }
}

fn no_sink_error() -> RuntimeError {
    RuntimeError::Persist(PersistError::Message(
        "no persistence sink configured".to_string(),
    ))
}
