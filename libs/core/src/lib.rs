//! Nomios core contracts and value types.
//!
//! This crate owns the canonical event address shared by every registry adapter, the
//! provider-agnostic envelope handed to the trigger manager, and a few small helpers
//! (timestamps, event info, version reporting) used by the ingress and trigger-manager
//! services.
pub mod event;
pub mod event_uri;
pub mod info;
pub mod run;
pub mod timestamp;
pub mod version;

pub use event::*;
pub use event_uri::*;
pub use info::*;
pub use run::*;
pub use timestamp::*;
pub use version::*;
