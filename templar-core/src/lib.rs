//! Templar core library: domain types, record store, configuration, errors,
//! and the capability traits the reconciler consumes.
//!
//! - [`types`]: newtypes, records and remote data shapes
//! - [`error`]: [`StoreError`], [`ConfigError`], [`RemoteError`]
//! - [`store`]: [`RecordStore`] plus YAML-file and in-memory implementations
//! - [`config`]: [`Config`] loading
//! - [`capability`]: [`Repository`], [`Controller`], [`Notifier`]

pub mod capability;
pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use capability::{Controller, Notifier, Repository};
pub use config::Config;
pub use error::{ConfigError, RemoteError, StoreError};
pub use store::{FileRecordStore, MemoryRecordStore, RecordStore};
pub use types::{
    BranchOutcome, DeviceType, Environment, ProjectName, PullRequest, RepoFile, StatusUpdate,
    SyncStatus, TemplateDetail, TemplateIdentity, TemplateName, TemplateRecord, TemplateSummary,
    TemplateUpload,
};
