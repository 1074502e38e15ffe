//! Core of the apidump interception layer.
//!
//! The pieces are independent of any particular loader: a concurrent
//! [`DispatchRegistry`] keyed by [`DispatchKey`], a [`ResourceTracker`] for
//! handles that cannot find their owner on their own, an
//! [`OutputSerializer`] that keeps concurrent output from interleaving, and
//! [`LayerContext::intercept`], the single generic trampoline body driven by
//! the [`entry_point`] descriptor table.

pub mod config;
pub mod context;
pub mod entry_point;
pub mod error;
pub mod frame;
pub mod output;
pub mod record;
pub mod registry;
pub mod sink;
pub mod tracker;

pub use config::LayerConfig;
pub use context::{CallResult, LayerContext};
pub use entry_point::{EntryPoint, KeySource, Lifecycle, TableCategory};
pub use error::LayerError;
pub use frame::FrameCounter;
pub use output::OutputSerializer;
pub use record::{Arg, ArgValue, CallRecord};
pub use registry::{DispatchKey, DispatchRegistry, KeyExtractor};
pub use sink::OutputSink;
pub use tracker::{PoolMembership, ResourceTracker};
