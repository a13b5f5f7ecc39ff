//! Proclet - cooperative fine-grain processes on a shared-memory node.
//!
//! Many logical ranks ("proclets") are multiplexed onto each OS process
//! by a cooperative scheduler. Proclets yield at well-defined points and
//! are resumed either in round-robin order or when an event they wait on
//! is notified by the transport's progress hook. Proclets hosted by the
//! same OS process share per-group rank-translation tables and barrier
//! state through reference-counted [`GroupShared`] blocks.
//!
//! # Quick Start
//!
//! ```no_run
//! use proclet::init;
//! use proclet::init::RuntimeConfig;
//! use proclet::node::Node;
//! use proclet::sched::Idle;
//!
//! let node: Node = Node::local(4).unwrap();
//!
//! init::run(RuntimeConfig::new(), node, Idle, |cx| async move {
//!   println!("hello from {}", cx.world_rank());
//!   cx.yield_now().await;
//! })
//! .unwrap();
//! ```
//!
//! # Core Modules
//!
//! - [`init`]: Runtime configuration and entry point
//! - [`sched`]: Proclet scheduler and event wait/notify
//! - [`rtw`]: Local to world rank translation tables
//! - [`group`]: Reference-counted group state and co-located barrier
//! - [`node`]: World layout and per-process start-up context
//! - [`transport`]: In-process transport driven by the progress hook
//! - [`lang`]: Identifier types
//! - [`error`]: Error types
//! - [`consts`]: Default configuration values
//!
//! [`GroupShared`]: crate::group::GroupShared

mod loom;

pub mod consts;
pub mod error;
pub mod group;
pub mod init;
pub mod lang;
pub mod node;
pub mod rtw;
pub mod sched;
pub mod transport;
