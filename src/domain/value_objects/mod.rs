//! Value objects - Immutable objects defined by their attributes

mod format;
mod ids;
mod settings;

pub use format::{ContentFormat, InputMode, RenderStyle, CATEGORIES};
pub use ids::{SavedSetId, SessionId};
pub use settings::{RemoteSettings, SettingsUpdate};
