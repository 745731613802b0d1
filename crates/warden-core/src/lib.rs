//! warden-core
//!
//! Check scheduling for the REUSE compliance service: decide which
//! repositories need a fresh lint, run at most one check per repository at a
//! time on a bounded runner pool, and write results back to the record store.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（RepoUrl, Protocol, Task, RepositoryRecord, decision, errors）
//! - **ports**: 抽象化レイヤー（RepositoryStore, HashResolver, RemoteChecker, Clock）
//! - **queue**: URL で重複排除する in-memory task queue
//! - **app**: Scheduler, runners, builder
//! - **impls**: 実装（git ls-remote, ssh, in-memory store）
//! - **config**: TOML 設定

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod queue;

#[cfg(test)]
mod testing;

pub use app::{BuildError, QueueCounts, RunOutcome, Scheduler, SchedulerBuilder};
pub use config::{ConfigError, SchedulerConfig, SshConfig, WardenConfig};
