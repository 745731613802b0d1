//! Ports - 抽象化レイヤー
//!
//! Collaborators the scheduler talks to but does not own. Each trait is a
//! seam: production adapters live in `impls`, tests plug in fakes.

pub mod clock;
pub mod hash_resolver;
pub mod remote_checker;
pub mod repository_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::hash_resolver::HashResolver;
pub use self::remote_checker::RemoteChecker;
pub use self::repository_store::RepositoryStore;
