//! # Queue Mover Core
//!
//! The per-pair mover state machine and its collaborators: the long-poll
//! watcher, the batch transfer pass, the destination queue provisioner, and
//! the supervisor that runs one mover per configured queue pair.
//!
//! ## Architecture
//!
//! Each queue pair gets one mover and one watcher task. The watcher performs
//! cheap non-consuming presence checks on the source queue; when it observes
//! messages it hands off to the mover via a `wake`/`resume` channel pair and
//! does not poll again until the mover's transfer pass has finished. This
//! handoff, not a lock, is what guarantees that at most one of the two tasks
//! ever consumes from the source.
//!
//! Shutdown is a single cooperative broadcast: every task checks it ahead of
//! its next action, in-flight remote calls run to completion, and an
//! in-flight transfer pass always reaches its join barrier before the mover
//! exits.

pub mod config;
pub mod error;
pub mod mover;
pub mod provisioner;
pub mod shutdown;
pub mod supervisor;
pub mod transfer;
pub mod watcher;

pub use config::{ConfigError, MoverConfig, QueuePairConfig};
pub use error::MoverError;
pub use mover::{Mover, MoverState};
pub use provisioner::ensure_destination;
pub use shutdown::{ShutdownController, ShutdownSignal};
pub use supervisor::Supervisor;
pub use transfer::{transfer, TransferOutcome};
pub use watcher::Watcher;
