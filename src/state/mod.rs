/// State management module
///
/// This module holds the data a session is built from:
/// - Shared data structures (data.rs)
/// - Per-layout shot counts and overlay rules (layout.rs)
/// - Persisted guest preferences (preferences.rs)
/// - Overlay asset lookup (assets.rs)

pub mod assets;
pub mod data;
pub mod layout;
pub mod preferences;
