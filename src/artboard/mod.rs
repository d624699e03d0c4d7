//! Artboard handles, the name catalog and fit/alignment math.

pub mod artboard;
pub mod catalog;
pub mod layout;

pub use artboard::{
    Artboard, ArtboardParams, EventsCallback, NamedEventCallback, RenderTickHook,
    StateMachineTickHook, SubscriptionId,
};
pub use catalog::ArtboardCatalog;
pub use layout::{compute_alignment, contained_extents, extents_to_target, target_to_artboard};
