//! Reference-counted, filename-keyed cache of loaded resources.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::Level;
use volumetric_core::diagnostics::{default_sink, SharedSink};

use crate::error::{ResourceError, ResourceResult};
use crate::filesystem::{FileSystem, StdFileSystem};
use crate::options::CacheOptions;

const CATEGORY: &str = "ResourceCache";

type EntryId = u64;

struct Entry<T> {
    data: Rc<T>,
    used_by: u64,
    filename: String,
}

/// A handle registered with the cache, kept alive so its address cannot be
/// reused while it is indexed.
struct Handle<T> {
    entry: EntryId,
    _resource: Rc<T>,
}

fn address<T>(resource: &Rc<T>) -> usize {
    Rc::as_ptr(resource) as usize
}

/// Shares loaded resources between consumers by filename.
///
/// Every registered resource is indexed both by its filename and by the
/// address of the handle it was registered with. An entry stays alive while
/// its usage count is positive; the count is raised by [`register`] and
/// [`acquire`] and lowered by [`dispose`].
///
/// With caching disabled, every registration creates its own entry and
/// [`dispose`] drops the handle's index entry right away, whatever its
/// remaining usage count.
///
/// [`register`]: ResourceCache::register
/// [`acquire`]: ResourceCache::acquire
/// [`dispose`]: ResourceCache::dispose
pub struct ResourceCache<T> {
    entries: HashMap<EntryId, Entry<T>>,
    by_filename: BTreeMap<String, EntryId>,
    by_address: HashMap<usize, Handle<T>>,
    next_id: EntryId,
    caching: bool,
    search_paths: Vec<PathBuf>,
    file_system: Box<dyn FileSystem>,
    sink: SharedSink,
}

impl<T> Default for ResourceCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ResourceCache<T> {
    /// Creates a caching cache over the host file system.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            by_filename: BTreeMap::new(),
            by_address: HashMap::new(),
            next_id: 0,
            caching: true,
            search_paths: Vec::new(),
            file_system: Box::new(StdFileSystem),
            sink: default_sink(),
        }
    }

    /// Creates a cache configured by `options`.
    pub fn from_options(options: &CacheOptions) -> Self {
        let mut cache = Self::new();
        cache.caching = options.caching;
        for path in &options.search_paths {
            cache.add_search_path(path);
        }
        cache
    }

    /// Resolves and opens files through `file_system`.
    #[must_use]
    pub fn with_file_system(mut self, file_system: impl FileSystem + 'static) -> Self {
        self.file_system = Box::new(file_system);
        self
    }

    /// Routes diagnostics to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    fn report(&self, level: Level, message: &str) {
        self.sink.report(level, CATEGORY, message);
    }

    /// Whether entries are shared by filename. Fixed at construction.
    pub fn is_caching(&self) -> bool {
        self.caching
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Registers `resource` as loaded from `filename` and returns the handle
    /// consumers should use.
    ///
    /// When caching is enabled and `filename` already has an entry, the
    /// entry's usage count is raised, `resource` is attached to it and the
    /// entry's original handle is returned. Otherwise a new entry with a usage
    /// count of one is created.
    pub fn register(&mut self, resource: Rc<T>, filename: &str) -> Rc<T> {
        if self.caching {
            if let Some(&id) = self.by_filename.get(filename) {
                if let Some(entry) = self.entries.get_mut(&id) {
                    entry.used_by += 1;
                    let shared = Rc::clone(&entry.data);
                    log::debug!(
                        target: CATEGORY,
                        "'{filename}' now used by {}",
                        entry.used_by
                    );
                    self.link(&resource, id);
                    return shared;
                }
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(
            id,
            Entry {
                data: Rc::clone(&resource),
                used_by: 1,
                filename: filename.to_string(),
            },
        );
        self.by_filename.insert(filename.to_string(), id);
        self.link(&resource, id);
        log::debug!(target: CATEGORY, "registered '{filename}'");
        resource
    }

    fn link(&mut self, resource: &Rc<T>, entry: EntryId) {
        self.by_address.insert(
            address(resource),
            Handle {
                entry,
                _resource: Rc::clone(resource),
            },
        );
    }

    /// Returns the cached resource for `filename` and raises its usage count.
    ///
    /// Always `None` with caching disabled.
    pub fn acquire(&mut self, filename: &str) -> Option<Rc<T>> {
        if !self.caching {
            return None;
        }
        let id = *self.by_filename.get(filename)?;
        let entry = self.entries.get_mut(&id)?;
        entry.used_by += 1;
        Some(Rc::clone(&entry.data))
    }

    /// Releases one use of the entry `resource` was registered with.
    ///
    /// Unknown handles are ignored. Returns true if the entry was freed.
    pub fn dispose(&mut self, resource: &Rc<T>) -> bool {
        let key = address(resource);
        let Some(id) = self.by_address.get(&key).map(|h| h.entry) else {
            return false;
        };
        if !self.caching {
            self.by_address.remove(&key);
        }

        let remaining = match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.used_by = entry.used_by.saturating_sub(1);
                entry.used_by
            }
            None => {
                self.by_address.remove(&key);
                return false;
            }
        };
        if remaining > 0 {
            return false;
        }

        if let Some(entry) = self.entries.remove(&id) {
            if self.by_filename.get(&entry.filename) == Some(&id) {
                self.by_filename.remove(&entry.filename);
            }
            log::debug!(target: CATEGORY, "freed '{}'", entry.filename);
        }
        self.by_address.retain(|_, handle| handle.entry != id);
        true
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Returns the cached resource for `filename` without changing its count.
    pub fn get(&self, filename: &str) -> Option<Rc<T>> {
        let id = self.by_filename.get(filename)?;
        self.entries.get(id).map(|e| Rc::clone(&e.data))
    }

    pub fn is_loaded(&self, filename: &str) -> bool {
        self.by_filename.contains_key(filename)
    }

    /// Usage count of the entry for `filename`.
    pub fn used_by(&self, filename: &str) -> Option<u64> {
        let id = self.by_filename.get(filename)?;
        self.entries.get(id).map(|e| e.used_by)
    }

    /// Whether `resource` is indexed by address.
    pub fn is_registered(&self, resource: &Rc<T>) -> bool {
        self.by_address.contains_key(&address(resource))
    }

    /// Filenames with a live entry, sorted.
    pub fn filenames(&self) -> Vec<&str> {
        self.by_filename.keys().map(String::as_str).collect()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ========================================================================
    // Search paths
    // ========================================================================

    /// Appends a search path unless it is already present.
    pub fn add_search_path(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        if !self.search_paths.iter().any(|p| p == path) {
            self.search_paths.push(path.to_path_buf());
        }
    }

    /// Removes a search path. Unknown paths are ignored.
    pub fn remove_search_path(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.search_paths.retain(|p| p != path);
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Finds the file for `filename`: as given if it exists, otherwise under
    /// the first search path that contains it. Leading separators of
    /// `filename` are dropped before it is appended to a search path, so
    /// `/sub/x.dat` resolves to `<prefix>/sub/x.dat`.
    pub fn resolve_path(&self, filename: &str) -> ResourceResult<PathBuf> {
        if filename.is_empty() {
            return Err(ResourceError::NotFound(String::new()));
        }
        let direct = Path::new(filename);
        if self.file_system.exists(direct) {
            return Ok(direct.to_path_buf());
        }
        let relative = filename.trim_start_matches(std::path::is_separator);
        self.search_paths
            .iter()
            .map(|prefix| prefix.join(relative))
            .find(|candidate| self.file_system.exists(candidate))
            .ok_or_else(|| {
                self.report(
                    Level::Warn,
                    &format!("'{filename}' not found in {} search paths", self.search_paths.len()),
                );
                ResourceError::NotFound(filename.to_string())
            })
    }

    /// Returns the cached resource for `filename`, or resolves, opens and
    /// decodes it with `loader` and registers the result.
    pub fn load_with<E, F>(&mut self, filename: &str, loader: F) -> ResourceResult<Rc<T>>
    where
        E: fmt::Display,
        F: FnOnce(&mut dyn Read) -> Result<T, E>,
    {
        if let Some(cached) = self.acquire(filename) {
            return Ok(cached);
        }
        let path = self.resolve_path(filename)?;
        let mut reader = self.file_system.open(&path)?;
        let resource = loader(&mut reader).map_err(|err| {
            let reason = err.to_string();
            self.report(
                Level::Error,
                &format!("failed to load '{}': {reason}", path.display()),
            );
            ResourceError::LoadFailed {
                path: path.clone(),
                reason,
            }
        })?;
        log::info!(target: CATEGORY, "loaded '{}'", path.display());
        Ok(self.register(Rc::new(resource), filename))
    }
}

impl<T> Drop for ResourceCache<T> {
    fn drop(&mut self) {
        for entry in self.entries.values() {
            if entry.used_by > 1 {
                self.sink.report(
                    Level::Warn,
                    CATEGORY,
                    &format!(
                        "'{}' still used by {} consumers at cache destruction",
                        entry.filename, entry.used_by
                    ),
                );
            } else {
                log::debug!(target: CATEGORY, "freeing '{}'", entry.filename);
            }
        }
        self.by_address.clear();
        self.by_filename.clear();
        self.entries.clear();
    }
}

impl<T> fmt::Debug for ResourceCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceCache")
            .field("filenames", &self.filenames())
            .field("caching", &self.caching)
            .field("search_paths", &self.search_paths)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::MemoryFileSystem;
    use volumetric_core::diagnostics::RecordingSink;

    fn memory_cache() -> ResourceCache<String> {
        let fs = MemoryFileSystem::new()
            .with_file("/b/x.dat", b"from b".to_vec())
            .with_file("local.dat", b"local".to_vec());
        ResourceCache::new().with_file_system(fs)
    }

    #[test]
    fn test_register_shares_by_filename() {
        let mut cache = ResourceCache::new();
        let p = Rc::new(1u32);
        let p2 = Rc::new(2u32);
        let first = cache.register(Rc::clone(&p), "f");
        let second = cache.register(Rc::clone(&p2), "f");

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.used_by("f"), Some(2));
        assert!(Rc::ptr_eq(&first, &p));
        assert!(Rc::ptr_eq(&second, &p));
        assert!(cache.is_registered(&p2));

        assert!(!cache.dispose(&p));
        assert!(cache.is_loaded("f"));
        assert_eq!(cache.used_by("f"), Some(1));

        assert!(cache.dispose(&p2));
        assert!(!cache.is_loaded("f"));
        assert!(!cache.is_registered(&p));
        assert!(!cache.is_registered(&p2));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_dispose_unknown_is_noop() {
        let mut cache = ResourceCache::new();
        let stranger = Rc::new(0u8);
        assert!(!cache.dispose(&stranger));

        let p = Rc::new(1u8);
        cache.register(Rc::clone(&p), "f");
        assert!(cache.dispose(&p));
        assert!(!cache.dispose(&p));
    }

    #[test]
    fn test_without_caching_every_register_is_new() {
        let mut cache = ResourceCache::from_options(&CacheOptions::new().with_caching(false));
        assert!(!cache.is_caching());
        let p = Rc::new("a".to_string());
        let p2 = Rc::new("b".to_string());
        let first = cache.register(Rc::clone(&p), "f");
        let second = cache.register(Rc::clone(&p2), "f");
        assert!(Rc::ptr_eq(&first, &p));
        assert!(Rc::ptr_eq(&second, &p2));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.used_by("f"), Some(1));
        assert!(cache.acquire("f").is_none());

        assert!(cache.dispose(&p2));
        assert!(!cache.is_registered(&p2));
        assert_eq!(cache.len(), 1);
        assert!(!cache.is_loaded("f"));
    }

    #[test]
    fn test_caching_follows_options() {
        let cache: ResourceCache<u8> = ResourceCache::new();
        assert!(cache.is_caching());
        let mut cache: ResourceCache<u8> =
            ResourceCache::from_options(&CacheOptions::new().with_caching(false));
        let p = cache.register(Rc::new(1), "one");
        assert_eq!(cache.used_by("one"), Some(1));
        assert!(cache.dispose(&p));
        assert!(cache.is_empty());
        assert!(!cache.is_caching());
    }

    #[test]
    fn test_acquire_raises_count() {
        let mut cache = ResourceCache::new();
        let p = cache.register(Rc::new(5i32), "five");
        let again = cache.acquire("five").unwrap();
        assert!(Rc::ptr_eq(&p, &again));
        assert_eq!(cache.used_by("five"), Some(2));
        assert!(cache.acquire("six").is_none());
        assert_eq!(*cache.get("five").unwrap(), 5);
        assert_eq!(cache.used_by("five"), Some(2));
    }

    #[test]
    fn test_search_paths_are_deduplicated() {
        let mut cache: ResourceCache<()> = ResourceCache::new();
        cache.add_search_path("/a");
        cache.add_search_path("/b");
        cache.add_search_path("/a");
        assert_eq!(cache.search_paths(), &[PathBuf::from("/a"), PathBuf::from("/b")]);
        cache.remove_search_path("/a");
        cache.remove_search_path("/zzz");
        assert_eq!(cache.search_paths(), &[PathBuf::from("/b")]);
    }

    #[test]
    fn test_resolve_path() {
        let mut cache = memory_cache();
        cache.add_search_path("/a");
        cache.add_search_path("/b");
        assert_eq!(cache.resolve_path("x.dat").unwrap(), PathBuf::from("/b/x.dat"));
        assert_eq!(cache.resolve_path("local.dat").unwrap(), PathBuf::from("local.dat"));
        assert!(matches!(
            cache.resolve_path("y.dat"),
            Err(ResourceError::NotFound(name)) if name == "y.dat"
        ));
        assert!(matches!(cache.resolve_path(""), Err(ResourceError::NotFound(_))));
    }

    #[test]
    fn test_resolve_rooted_name_under_search_path() {
        let fs = MemoryFileSystem::new().with_file("/b/sub/x.dat", b"nested".to_vec());
        let mut cache: ResourceCache<String> = ResourceCache::new().with_file_system(fs);
        assert!(cache.resolve_path("/sub/x.dat").is_err());
        cache.add_search_path("/b");
        assert_eq!(
            cache.resolve_path("/sub/x.dat").unwrap(),
            PathBuf::from("/b/sub/x.dat")
        );
        assert_eq!(
            cache.resolve_path("sub/x.dat").unwrap(),
            PathBuf::from("/b/sub/x.dat")
        );
    }

    #[test]
    fn test_load_with_caches() {
        let mut cache = memory_cache();
        cache.add_search_path("/b");
        let decode = |r: &mut dyn Read| {
            let mut s = String::new();
            r.read_to_string(&mut s).map(|_| s)
        };
        let first = cache.load_with("x.dat", decode).unwrap();
        assert_eq!(first.as_str(), "from b");
        let second = cache.load_with("x.dat", decode).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(cache.used_by("x.dat"), Some(2));
        assert_eq!(cache.filenames(), vec!["x.dat"]);
    }

    #[test]
    fn test_load_with_failure() {
        let sink = Rc::new(RecordingSink::new());
        let mut cache = memory_cache().with_sink(sink.clone());
        let result = cache.load_with("local.dat", |_: &mut dyn Read| Err::<String, _>("bad header"));
        assert!(matches!(result, Err(ResourceError::LoadFailed { .. })));
        assert!(cache.is_empty());
        assert!(sink.contains("bad header"));

        let missing = cache.load_with("nope.dat", |_: &mut dyn Read| Ok::<_, String>(String::new()));
        assert!(matches!(missing, Err(ResourceError::NotFound(_))));
    }

    #[test]
    fn test_drop_reports_leaks() {
        let sink = Rc::new(RecordingSink::new());
        {
            let mut cache = ResourceCache::new().with_sink(sink.clone());
            let p = Rc::new(1u16);
            cache.register(Rc::clone(&p), "shared");
            cache.register(Rc::clone(&p), "shared");
            cache.register(Rc::new(2u16), "single");
        }
        assert_eq!(sink.count_at_least(Level::Warn), 1);
        assert!(sink.contains("'shared' still used by 2"));
    }

    #[test]
    fn test_drop_releases_resources() {
        let p = Rc::new(7u8);
        {
            let mut cache = ResourceCache::new();
            cache.register(Rc::clone(&p), "seven");
            assert!(Rc::strong_count(&p) > 1);
        }
        assert_eq!(Rc::strong_count(&p), 1);
    }
}
