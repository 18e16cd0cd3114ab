//! Layout registry
//!
//! Interns layouts by signature so that every buffer built from the same
//! schema shares one committed tree. Entries are never evicted.
//!
//! The signature map is always guarded by a mutex, so a registry can be shared
//! between threads. Lookup, cooking and insertion happen under a single lock,
//! which means two threads interning the same schema still end up with one tree.

use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::constants::registry::{DEFAULT_INITIAL_CAPACITY, DEFAULT_WARN_THRESHOLD};
use crate::error::{fatal, LayoutError, LayoutResult};
use crate::layout::cooked::CookedLayout;
use crate::layout::element::LayoutElement;
use crate::layout::raw::RawLayout;

lazy_static! {
    /// Process-wide registry, created with the default config on first use
    static ref GLOBAL_REGISTRY: LayoutRegistry = LayoutRegistry::new();
}

/// Registry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Initial capacity of the signature map
    pub initial_capacity: usize,

    /// Log a warning once the number of interned layouts exceeds this
    pub warn_threshold: Option<usize>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            warn_threshold: Some(DEFAULT_WARN_THRESHOLD),
        }
    }
}

impl RegistryConfig {
    /// Parse a config from TOML; missing keys keep their defaults
    pub fn from_toml_str(raw: &str) -> LayoutResult<Self> {
        toml::from_str(raw).map_err(|e| LayoutError::Parse {
            what: "registry config",
            reason: e.to_string(),
        })
    }
}

/// Maps layout signatures to shared, committed trees
pub struct LayoutRegistry {
    config: RegistryConfig,
    layouts: Mutex<FxHashMap<String, Arc<LayoutElement>>>,
}

impl Default for LayoutRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutRegistry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        let layouts = FxHashMap::with_capacity_and_hasher(config.initial_capacity, Default::default());
        Self {
            config,
            layouts: Mutex::new(layouts),
        }
    }

    /// The process-wide registry.
    ///
    /// Prefer passing an explicit registry around; this exists for code that
    /// has no natural place to own one.
    pub fn global() -> &'static LayoutRegistry {
        &GLOBAL_REGISTRY
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Turn a raw layout into a cooked one, reusing the tree of an identical
    /// schema if one was interned before.
    ///
    /// `raw` is reset to an empty layout afterwards, whether its tree was
    /// cooked or discarded. On error the layout is left untouched if the
    /// signature could not be computed, and reset otherwise.
    pub fn try_intern(&self, raw: &mut RawLayout) -> LayoutResult<CookedLayout> {
        let signature = raw.try_signature()?;
        let mut layouts = self.layouts.lock();

        if let Some(root) = layouts.get(&signature) {
            log::debug!("[LayoutRegistry] Reusing layout {}", signature);
            raw.clear();
            return Ok(CookedLayout::new(Arc::clone(root)));
        }

        let root = Arc::new(raw.cook_and_relinquish()?);
        log::debug!(
            "[LayoutRegistry] Interned layout {} ({} bytes)",
            signature,
            root.size_in_bytes()
        );
        layouts.insert(signature, Arc::clone(&root));

        if let Some(threshold) = self.config.warn_threshold {
            if layouts.len() == threshold + 1 {
                log::warn!(
                    "[LayoutRegistry] More than {} layouts interned; layouts are never evicted",
                    threshold
                );
            }
        }

        Ok(CookedLayout::new(root))
    }

    #[track_caller]
    pub fn intern(&self, raw: &mut RawLayout) -> CookedLayout {
        fatal(self.try_intern(raw))
    }

    /// Look up an already interned layout by signature
    pub fn get(&self, signature: &str) -> Option<CookedLayout> {
        self.layouts
            .lock()
            .get(signature)
            .map(|root| CookedLayout::new(Arc::clone(root)))
    }

    pub fn contains(&self, signature: &str) -> bool {
        self.layouts.lock().contains_key(signature)
    }

    /// Number of distinct layouts interned
    pub fn len(&self) -> usize {
        self.layouts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{ElementType, LeafType};

    fn light_layout() -> RawLayout {
        let mut lay = RawLayout::new();
        lay.add(LeafType::Float3, "pos").add(ElementType::Array, "falloff");
        lay.key_mut("falloff").set_array(LeafType::Float, 3);
        lay
    }

    #[test]
    fn test_identical_schemas_share_a_tree() {
        let registry = LayoutRegistry::new();
        let a = registry.intern(&mut light_layout());
        let b = registry.intern(&mut light_layout());

        assert!(a.shares_root_with(&b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_different_schemas_get_different_trees() {
        let registry = LayoutRegistry::new();
        let a = registry.intern(&mut light_layout());

        let mut other = RawLayout::new();
        other.add(LeafType::Float3, "position");
        let b = registry.intern(&mut other);

        assert!(!a.shares_root_with(&b));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_intern_resets_raw_layout() {
        let registry = LayoutRegistry::new();
        let mut lay = light_layout();
        registry.intern(&mut lay);
        assert!(lay.is_empty());

        // a hit also discards the tree
        let mut again = light_layout();
        registry.intern(&mut again);
        assert!(again.is_empty());
        again.add(LeafType::Float, "pos");
    }

    #[test]
    fn test_get_by_signature() {
        let registry = LayoutRegistry::new();
        let cooked = registry.intern(&mut light_layout());
        let signature = cooked.signature();

        assert!(registry.contains(&signature));
        let fetched = registry.get(&signature).unwrap();
        assert!(fetched.shares_root_with(&cooked));
        assert!(registry.get("St{}").is_none());
    }

    #[test]
    fn test_invalid_layout_is_not_interned() {
        let registry = LayoutRegistry::new();

        let mut unset = RawLayout::new();
        unset.add(ElementType::Array, "arr");
        assert!(matches!(
            registry.try_intern(&mut unset),
            Err(LayoutError::ArrayUnset)
        ));
        // signature failed, so the layout can still be completed
        unset.key_mut("arr").set_array(LeafType::Float, 2);
        assert!(registry.try_intern(&mut unset).is_ok());

        assert!(matches!(
            registry.try_intern(&mut RawLayout::new()),
            Err(LayoutError::EmptyStruct)
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_oversized_layout_is_reported_not_interned() {
        let registry = LayoutRegistry::new();
        let mut lay = RawLayout::new();
        lay.add(ElementType::Array, "arr");
        lay.key_mut("arr").set_array(LeafType::Float, usize::MAX / 8);

        assert!(matches!(
            registry.try_intern(&mut lay),
            Err(LayoutError::LayoutTooLarge)
        ));
        assert!(registry.is_empty());
    }

    #[test]
    #[should_panic(expected = "Layout is too large to address")]
    fn test_oversized_layout_is_fatal() {
        let mut lay = RawLayout::new();
        lay.add(ElementType::Array, "arr");
        lay.key_mut("arr").set_array(LeafType::Matrix, usize::MAX / 32);
        LayoutRegistry::new().intern(&mut lay);
    }

    #[test]
    fn test_concurrent_interning_yields_one_tree() {
        let registry = LayoutRegistry::new();
        let roots: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| registry.intern(&mut light_layout()).take_root()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(roots.iter().all(|root| Arc::ptr_eq(root, &roots[0])));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_config_from_toml() {
        let config = RegistryConfig::from_toml_str("initial_capacity = 8").unwrap();
        assert_eq!(config.initial_capacity, 8);
        assert_eq!(config.warn_threshold, Some(DEFAULT_WARN_THRESHOLD));

        assert!(RegistryConfig::from_toml_str("initial_capacity = \"many\"").is_err());
    }

    #[test]
    fn test_global_registry_is_shared() {
        assert!(std::ptr::eq(LayoutRegistry::global(), LayoutRegistry::global()));
    }
}
