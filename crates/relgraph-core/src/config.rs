//! Resolver configuration.

/// Default bound on supertype chain length.
pub const DEFAULT_MAX_SUPERTYPE_DEPTH: usize = 64;

/// Configuration for relation resolution and memoization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Resolve fields inherited from supertypes ahead of declared fields.
    pub include_inherited_fields: bool,

    /// Treat a `cascade = all` marker as remove plus orphan removal when
    /// deriving the composition flag.
    pub cascade_all_is_composition: bool,

    /// Longest supertype chain walked before reporting a cycle.
    pub max_supertype_depth: usize,

    /// Memoize resolutions per (entity, catalog generation).
    pub cache_enabled: bool,

    /// Maximum number of memoized resolutions. None means unbounded.
    pub cache_capacity: Option<usize>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            include_inherited_fields: true,
            cascade_all_is_composition: true,
            max_supertype_depth: DEFAULT_MAX_SUPERTYPE_DEPTH,
            cache_enabled: true,
            cache_capacity: None,
        }
    }
}

impl ResolverConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether inherited fields are resolved.
    pub fn include_inherited_fields(mut self, include: bool) -> Self {
        self.include_inherited_fields = include;
        self
    }

    /// Set whether `cascade = all` implies composition.
    pub fn cascade_all_is_composition(mut self, enabled: bool) -> Self {
        self.cascade_all_is_composition = enabled;
        self
    }

    /// Set the supertype chain bound.
    pub fn max_supertype_depth(mut self, depth: usize) -> Self {
        self.max_supertype_depth = depth;
        self
    }

    /// Disable memoization.
    pub fn without_cache(mut self) -> Self {
        self.cache_enabled = false;
        self
    }

    /// Bound the number of memoized resolutions.
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ResolverConfig::default();
        assert!(config.include_inherited_fields);
        assert!(config.cascade_all_is_composition);
        assert!(config.cache_enabled);
        assert_eq!(config.max_supertype_depth, DEFAULT_MAX_SUPERTYPE_DEPTH);
        assert!(config.cache_capacity.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = ResolverConfig::new()
            .include_inherited_fields(false)
            .cascade_all_is_composition(false)
            .max_supertype_depth(4)
            .cache_capacity(128);

        assert!(!config.include_inherited_fields);
        assert!(!config.cascade_all_is_composition);
        assert_eq!(config.max_supertype_depth, 4);
        assert_eq!(config.cache_capacity, Some(128));

        assert!(!ResolverConfig::new().without_cache().cache_enabled);
    }
}
