/// Router Module Index
///
/// Splits the surface by audience. The route guard wrapping the whole router
/// decides who may reach each half; these modules only declare paths.

/// Localized reading pages, the login surface and health checks.
pub mod public;

/// The session-gated CMS: dashboard, article views and mutation actions.
pub mod admin;
