//! Service-level routes that sit outside the auth API: the root banner and the
//! readiness probe.

pub mod health;
