//! Process-wide schema model cache.
//!
//! A model is built once per database definition and shared read-only by
//! every connection afterwards. First-time construction for the same
//! definition from two threads is serialized by the registry lock; later
//! lookups clone an `Arc` and never rebuild.

use crate::error::Result;
use crate::model::DatabaseModel;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

static MODELS: OnceLock<Mutex<HashMap<String, Arc<DatabaseModel>>>> = OnceLock::new();
static CONNECTION_COUNTER: AtomicU64 = AtomicU64::new(0);

fn models() -> &'static Mutex<HashMap<String, Arc<DatabaseModel>>> {
    MODELS.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Return the cached model for `key`, building it with `build` on first
/// request. Construction errors are not cached; a later call retries.
pub fn get_or_build<F>(key: &str, build: F) -> Result<Arc<DatabaseModel>>
where
    F: FnOnce() -> Result<DatabaseModel>,
{
    let mut map = models().lock().expect("model registry poisoned");
    if let Some(model) = map.get(key) {
        tracing::debug!(database = key, "Schema model cache hit");
        return Ok(Arc::clone(model));
    }
    let model = Arc::new(build()?);
    map.insert(key.to_string(), Arc::clone(&model));
    Ok(model)
}

/// The cached model for `key`, if one has been built.
#[must_use]
pub fn get(key: &str) -> Option<Arc<DatabaseModel>> {
    models()
        .lock()
        .expect("model registry poisoned")
        .get(key)
        .cloned()
}

/// Next process-unique connection id, used to derive connection names.
#[must_use]
pub fn next_connection_id() -> u64 {
    CONNECTION_COUNTER.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{DatabaseMeta, EntityMeta};
    use crate::model::TypeCapabilities;

    struct AnyDialect;
    impl TypeCapabilities for AnyDialect {
        fn dialect_name(&self) -> &'static str {
            "any"
        }
    }

    fn build_once(name: &str) -> Result<DatabaseModel> {
        let meta = DatabaseMeta::new(name, 1).table(
            EntityMeta::new("T").field("id", "int").primary_key("id"),
            "t",
        );
        DatabaseModel::build(&meta, &AnyDialect)
    }

    #[test]
    fn test_memoization_short_circuits() {
        let mut builds = 0;
        let a = get_or_build("registry_test_memo", || {
            builds += 1;
            build_once("registry_test_memo")
        })
        .unwrap();
        let b = get_or_build("registry_test_memo", || {
            builds += 1;
            build_once("registry_test_memo")
        })
        .unwrap();

        assert_eq!(builds, 1);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(get("registry_test_memo").is_some());
    }

    #[test]
    fn test_failed_build_is_not_cached() {
        let r = get_or_build("registry_test_fail", || {
            Err(crate::error::Error::UnknownEntity("X".into()))
        });
        assert!(r.is_err());
        assert!(get("registry_test_fail").is_none());

        let r = get_or_build("registry_test_fail", || build_once("registry_test_fail"));
        assert!(r.is_ok());
    }

    #[test]
    fn test_concurrent_first_build_is_serialized() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static BUILDS: AtomicUsize = AtomicUsize::new(0);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                std::thread::spawn(|| {
                    get_or_build("registry_test_race", || {
                        BUILDS.fetch_add(1, Ordering::SeqCst);
                        build_once("registry_test_race")
                    })
                    .unwrap()
                })
            })
            .collect();

        let models: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(BUILDS.load(Ordering::SeqCst), 1);
        for m in &models[1..] {
            assert!(Arc::ptr_eq(&models[0], m));
        }
    }

    #[test]
    fn test_connection_ids_are_unique() {
        let a = next_connection_id();
        let b = next_connection_id();
        assert_ne!(a, b);
    }
}
