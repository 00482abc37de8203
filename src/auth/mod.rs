//! Authentication: the remote provider, profile rows and the session store.

/// HTTP provider for GoTrue-compatible auth services
pub mod gotrue;
/// Profile rows mirrored from provider accounts
pub mod profile;
/// Provider trait and the types it exchanges
pub mod provider;
/// Current-user session state
pub mod session;
