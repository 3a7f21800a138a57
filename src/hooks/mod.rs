//! Record and server lifecycle events, and the hooks that run on them.
//!
//! Hooks are plain functions collected into a [`Hooks`] registry at startup
//! and invoked synchronously by the host: record hooks by the write handlers
//! before anything is persisted, the serve hook once before listening. A
//! record hook returning an error aborts the write.

use thiserror::Error;

pub mod annotate;

#[derive(Error, Debug)]
pub enum HookError {
    #[error("record rejected: {0}")]
    Rejected(String),
}

/// A file submitted with the current record write: its raw bytes plus the
/// display name it will be stored under. Hooks may rewrite the name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub data: Vec<u8>,
}

pub struct RecordCreateEvent<'a> {
    pub record: &'a mut crate::models::photos::Photo,
    pub files: &'a mut [UploadedFile],
    pub embed_dimensions: bool,
}

pub struct RecordUpdateEvent<'a> {
    pub record: &'a mut crate::models::photos::Photo,
    pub files: &'a mut [UploadedFile],
    pub embed_dimensions: bool,
}

pub struct ServeEvent<'a> {
    pub app: &'a mut tide::Server<crate::State>,
}

type BeforeCreateHook = fn(&mut RecordCreateEvent<'_>) -> Result<(), HookError>;
type BeforeUpdateHook = fn(&mut RecordUpdateEvent<'_>) -> Result<(), HookError>;
type ServeStartHook = fn(&mut ServeEvent<'_>) -> Result<(), HookError>;

#[derive(Clone, Debug)]
pub struct Hooks {
    before_create: Vec<BeforeCreateHook>,
    before_update: Vec<BeforeUpdateHook>,
    serve_start: Vec<ServeStartHook>,
}

impl Hooks {
    pub fn defaults() -> Self {
        Hooks {
            before_create: vec![annotate::before_create],
            before_update: vec![annotate::before_update],
            serve_start: vec![crate::web::serve_start],
        }
    }

    pub fn run_before_create(&self, event: &mut RecordCreateEvent<'_>) -> Result<(), HookError> {
        for hook in &self.before_create {
            hook(event)?;
        }
        Ok(())
    }

    pub fn run_before_update(&self, event: &mut RecordUpdateEvent<'_>) -> Result<(), HookError> {
        for hook in &self.before_update {
            hook(event)?;
        }
        Ok(())
    }

    pub fn run_serve_start(&self, event: &mut ServeEvent<'_>) -> Result<(), HookError> {
        for hook in &self.serve_start {
            hook(event)?;
        }
        Ok(())
    }
}
