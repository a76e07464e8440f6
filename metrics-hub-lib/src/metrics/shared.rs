use super::{DiscoveryRoot, Registry};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

const LOG_TARGET: &str = "  registry";

static REGISTRIES: LazyLock<Mutex<HashMap<Utf8PathBuf, Arc<Registry>>>> = LazyLock::new(Default::default);

/// Returns the process-wide registry for a configuration directory.
///
/// The first call for a directory runs discovery; later calls return the same
/// registry. Discovery runs under the lock, so concurrent first calls still build a
/// single registry. Registries are keyed by directory alone: the module set of the
/// first caller wins.
#[must_use]
pub fn shared(root: &DiscoveryRoot) -> Arc<Registry> {
    let mut registries = REGISTRIES.lock().unwrap_or_else(PoisonError::into_inner);

    let registry = registries.entry(root.config_dir().to_path_buf()).or_insert_with(|| {
        log::debug!(target: LOG_TARGET, "Building shared registry for '{}'", root.config_dir());
        Arc::new(Registry::discover(root))
    });

    Arc::clone(registry)
}

/// Drops the shared registry for a directory so the next [`shared`] call rediscovers it.
///
/// Returns whether a registry was cached. Callers holding the old registry keep it.
pub fn reset(config_dir: &Utf8Path) -> bool {
    let mut registries = REGISTRIES.lock().unwrap_or_else(PoisonError::into_inner);
    registries.remove(config_dir).is_some()
}
