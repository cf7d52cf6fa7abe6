/// Router Module Index
///
/// Routes are grouped by who may reach them. Access is decided inside the handlers
/// through the access evaluator, so every denial renders a labelled notice instead of
/// a bare status.

/// Routes open to everyone: health, root redirect, sign-out.
pub mod public;

/// Sign-in and sign-up forms. Signed-in viewers are redirected to the dashboard.
pub mod guest;

/// Resource pages below the section prefix, gated per resource permission.
pub mod admin;

/// JSON render plans and navigation.
pub mod api;
