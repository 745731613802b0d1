//! App - アプリケーション層
//!
//! ports を組み合わせて scheduling を実装する。
//!
//! # 主要コンポーネント
//! - **SchedulerBuilder**: 構築とワイヤリング
//! - **Scheduler**: schedule / run / join
//! - **RepoKeyResolver**: protocol と HEAD の解決
//! - **runner**: queue から task を取り出して check を実行
//! - **status**: 観測用のカウンタ

pub mod builder;
pub mod resolver;
pub mod runner;
pub mod scheduler;
pub mod status;

pub use self::builder::{BuildError, SchedulerBuilder};
pub use self::resolver::RepoKeyResolver;
pub use self::runner::RunOutcome;
pub use self::scheduler::Scheduler;
pub use self::status::QueueCounts;
