/// Middleware module
///
/// Request gating and cross-cutting concerns applied around route handlers.

mod role_guard;

pub use role_guard::RoleGuard;
