#![deny(unsafe_code)]

pub mod adapters;
pub mod error;
pub mod order;
pub mod repetition;
pub mod swap;

pub use adapters::{
    AdapterOptions, BariAdapter, Classification, GE_DESCRIPTIONS, LeedsAdapter,
    SheffieldAdapter, SiteAdapter, TurkuAdapter, adapter_for, ge_lookup,
};
pub use error::ClassifyError;
pub use order::{CanonicalBuffer, ChannelCoverage, channel_coverage};
pub use repetition::{RepetitionTracker, assign_repetition};
pub use swap::SwapResolver;
