//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryRepositoryStore**: 開発用・テスト用の record store
//! - **GitLsRemoteResolver**: `git ls-remote` による HEAD 解決
//! - **SshRemoteChecker**: SSH 経由の compliance check

pub mod git_resolver;
pub mod memory_store;
pub mod ssh_checker;

pub use self::git_resolver::GitLsRemoteResolver;
pub use self::memory_store::InMemoryRepositoryStore;
pub use self::ssh_checker::{SSH_TRANSPORT_FAILURE, SshRemoteChecker};
