//! Hook table: journal hook name -> replay callback
//!
//! Containers register one hook per operation at construction time, named
//! `<container-name>.<operation>`. Replay looks every journal line up here.

use std::collections::BTreeMap;
use std::fmt;

use crate::codec::CodecError;

use super::errors::{JournalError, JournalResult};
use super::record::JournalLine;

/// Why a hook could not apply a historical payload.
#[derive(Debug)]
pub enum HookFailure {
    /// The payload did not decode into the expected mutation
    Undecodable(CodecError),
    /// The payload decoded but the storage refused the mutation
    Rejected(String),
}

/// Replay callback. Receives the raw payload field.
pub type Hook = Box<dyn FnMut(&str) -> Result<(), HookFailure>>;

/// Builds the journal hook name for a container operation.
pub fn hook_name(container: &str, operation: &str) -> String {
    format!("{}.{}", container, operation)
}

/// Container names become part of every journal line they write.
pub fn validate_container_name(name: &str) -> JournalResult<()> {
    if name.is_empty() || name.contains(['\t', '\n', '\r']) {
        return Err(JournalError::InvalidHookName(name.to_string()));
    }
    Ok(())
}

#[derive(Default)]
pub struct HookTable {
    hooks: BTreeMap<String, Hook>,
}

impl HookTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.hooks.contains_key(name)
    }

    /// Registers a group of hooks atomically: either all names are free and
    /// every hook is added, or nothing is added.
    pub fn register_all(&mut self, hooks: Vec<(String, Hook)>) -> JournalResult<()> {
        for (i, (name, _)) in hooks.iter().enumerate() {
            let repeated_in_group = hooks[..i].iter().any(|(other, _)| other == name);
            if self.hooks.contains_key(name) || repeated_in_group {
                return Err(JournalError::DuplicateHook(name.clone()));
            }
        }

        self.hooks.extend(hooks);
        Ok(())
    }

    /// Applies one historical line through its hook.
    pub fn dispatch(&mut self, line: &JournalLine, line_number: u64) -> JournalResult<()> {
        let hook = self
            .hooks
            .get_mut(&line.hook)
            .ok_or_else(|| JournalError::UnknownHook {
                line: line_number,
                hook: line.hook.clone(),
            })?;

        hook(&line.payload).map_err(|failure| match failure {
            HookFailure::Undecodable(source) => JournalError::UndecodablePayload {
                line: line_number,
                hook: line.hook.clone(),
                source,
            },
            HookFailure::Rejected(reason) => JournalError::ReplayRejected {
                line: line_number,
                hook: line.hook.clone(),
                reason,
            },
        })
    }
}

impl fmt::Debug for HookTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.hooks.keys()).finish()
    }
}
