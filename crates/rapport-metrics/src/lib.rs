//! Derived views over the consolidated message store.
//!
//! Everything here is a pure function of [`MessageView`]s read out of a
//! store: the per-message export, a conversation log seen from the owner's
//! side, per-contact time series and social reciprocity.
//!
//! [`MessageView`]: rapport_core::view::MessageView

pub mod conversation;
pub mod reciprocity;
pub mod series;

pub use conversation::{ContactEvent, Direction, conversation_log};
pub use reciprocity::{Reciprocity, reciprocity};
pub use series::{Bucket, TimeSeries, time_series};
