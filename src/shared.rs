//! Process-wide default engine
//!
//! Built on first access, bound to the default location, and kept for the
//! life of the process. Initialization happens exactly once even when first
//! accessed from several threads at the same time; if it fails the shared
//! engine stays degraded for the rest of the process.

use once_cell::sync::Lazy;

use crate::engine::Engine;

static SHARED: Lazy<Engine> = Lazy::new(|| Engine::new(None));

/// The default engine
pub fn shared() -> &'static Engine {
    &SHARED
}
