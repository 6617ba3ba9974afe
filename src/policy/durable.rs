//! Replay-and-append policy
//!
//! State machine of a [`JournalInstance`]:
//!
//! ```text
//! Unopened --run()--> Replaying --ok--> Appending
//!                         |
//!                         +--error--> Failed
//! ```
//!
//! Hooks can only be registered while `Unopened`. `persist` is only legal
//! in `Appending`. A failed append also moves the instance to `Failed`: a
//! partially written line may be on disk and nothing more may follow it.
//!
//! The instance is a single-threaded shared handle (`Rc<RefCell<..>>`), so
//! it cannot be sent to another thread.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{error, info};

use crate::journal::{
    hook_name, now_us, validate_container_name, Hook, HookFailure, HookTable, JournalConfig,
    JournalError, JournalLine, JournalReader, JournalReplayer, JournalResult, JournalState,
    JournalWriter, ReplayStats,
};

use super::{Journaled, Lifecycle, Persister, Policy};

/// Durable policy: replay the journal at startup, then append to it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayFromAndAppendToFile;

struct Inner {
    config: JournalConfig,
    state: JournalState,
    containers: BTreeSet<String>,
    hooks: HookTable,
    writer: Option<JournalWriter>,
}

#[derive(Clone)]
pub struct JournalInstance {
    inner: Rc<RefCell<Inner>>,
}

impl JournalInstance {
    /// Instance over `path` with default configuration.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_config(JournalConfig::new(path))
    }

    pub fn with_config(config: JournalConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                config,
                state: JournalState::Unopened,
                containers: BTreeSet::new(),
                hooks: HookTable::new(),
                writer: None,
            })),
        }
    }

    /// Instance configured from a JSON config file.
    pub fn from_config_file(path: &Path) -> JournalResult<Self> {
        JournalConfig::load(path).map(Self::with_config)
    }

    pub fn state(&self) -> JournalState {
        self.inner.borrow().state
    }

    pub fn path(&self) -> PathBuf {
        self.inner.borrow().config.journal_path.clone()
    }

    /// Lines appended since `run()` completed.
    pub fn records_appended(&self) -> u64 {
        self.inner
            .borrow()
            .writer
            .as_ref()
            .map_or(0, JournalWriter::records_appended)
    }

    /// Registers replay hooks; all-or-nothing.
    pub fn register_hooks(&self, hooks: Vec<(String, Hook)>) -> JournalResult<()> {
        let mut inner = self.inner.borrow_mut();

        if inner.state != JournalState::Unopened {
            let name = hooks.into_iter().next().map(|(name, _)| name).unwrap_or_default();
            return Err(JournalError::LateRegistration(name));
        }

        inner.hooks.register_all(hooks)
    }

    /// Claims container `name` and registers its hooks; all-or-nothing.
    pub fn register_container(&self, name: &str, hooks: Vec<(String, Hook)>) -> JournalResult<()> {
        validate_container_name(name)?;

        if self.inner.borrow().containers.contains(name) {
            return Err(JournalError::DuplicateContainer(name.to_string()));
        }
        self.register_hooks(hooks)?;

        self.inner.borrow_mut().containers.insert(name.to_string());
        Ok(())
    }

    /// Replays the journal into the registered hooks and opens it for
    /// appending. Callable exactly once.
    pub fn run(&self) -> JournalResult<ReplayStats> {
        let mut inner = self.inner.borrow_mut();

        if inner.state != JournalState::Unopened {
            return Err(JournalError::AlreadyRun);
        }
        inner.state = JournalState::Replaying;

        info!(
            path = %inner.config.journal_path.display(),
            hooks = inner.hooks.len(),
            "replaying journal"
        );

        match Self::replay_and_open(&mut inner) {
            Ok(stats) => {
                inner.state = JournalState::Appending;
                info!(
                    records = stats.records_replayed,
                    first_timestamp_us = ?stats.first_timestamp_us,
                    last_timestamp_us = ?stats.last_timestamp_us,
                    "journal replay complete, appending"
                );
                Ok(stats)
            }
            Err(e) => {
                inner.state = JournalState::Failed;
                error!(code = e.code(), error = %e, "journal replay failed");
                Err(e)
            }
        }
    }

    fn replay_and_open(inner: &mut Inner) -> JournalResult<ReplayStats> {
        inner.config.validate()?;

        let stats = match JournalReader::open(&inner.config.journal_path)? {
            Some(mut reader) => JournalReplayer::replay(&mut reader, &mut inner.hooks)?,
            None => ReplayStats::default(),
        };

        inner.writer = Some(JournalWriter::open(&inner.config)?);
        Ok(stats)
    }

    /// Appends `<now>\t<hook>\t<payload>` and syncs it before returning.
    pub fn persist(&self, hook: &str, payload: &str) -> JournalResult<()> {
        let mut inner = self.inner.borrow_mut();
        let state = inner.state;

        let writer = match inner.writer.as_mut() {
            Some(writer) if state == JournalState::Appending => writer,
            _ => return Err(JournalError::NotAppending(state)),
        };

        let result = writer.append(&JournalLine::new(now_us(), hook, payload));
        if let Err(e) = &result {
            inner.state = JournalState::Failed;
            error!(code = e.code(), error = %e, hook, "journal append failed");
        }
        result
    }
}

impl Lifecycle for JournalInstance {
    fn run(&self) -> JournalResult<ReplayStats> {
        JournalInstance::run(self)
    }
}

impl fmt::Debug for JournalInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("JournalInstance")
            .field("path", &inner.config.journal_path)
            .field("state", &inner.state)
            .field("containers", &inner.containers)
            .field("hooks", &inner.hooks)
            .finish()
    }
}

/// Writes one journal line per mutation of the container it was bound to.
#[derive(Debug)]
pub struct JournalPersister {
    instance: JournalInstance,
    name: String,
}

impl JournalPersister {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<S: Journaled> Persister<S> for JournalPersister {
    fn persist(&mut self, mutation: &S::Mutation) -> JournalResult<()> {
        let (operation, payload) =
            S::encode(mutation).map_err(|source| JournalError::EncodeFailed {
                hook: self.name.clone(),
                source,
            })?;

        self.instance
            .persist(&hook_name(&self.name, operation), &payload)
    }
}

impl Policy for ReplayFromAndAppendToFile {
    type Instance = JournalInstance;
    type Persister<S: Journaled> = JournalPersister;

    fn bind<S: Journaled>(
        instance: &JournalInstance,
        name: &str,
        storage: &Rc<RefCell<S>>,
    ) -> JournalResult<JournalPersister> {
        let hooks = S::OPERATIONS
            .iter()
            .map(|&operation| {
                let storage = Rc::clone(storage);
                let hook: Hook = Box::new(move |payload: &str| {
                    let mutation =
                        S::decode(operation, payload).map_err(HookFailure::Undecodable)?;
                    let mut storage = storage.try_borrow_mut().map_err(|_| {
                        HookFailure::Rejected("storage is borrowed during replay".to_string())
                    })?;
                    storage
                        .apply(mutation)
                        .map_err(|e| HookFailure::Rejected(e.to_string()))
                });
                (hook_name(name, operation), hook)
            })
            .collect();

        instance.register_container(name, hooks)?;

        Ok(JournalPersister {
            instance: instance.clone(),
            name: name.to_string(),
        })
    }
}
