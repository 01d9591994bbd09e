//! Bridge configuration.

/// Switches for a [`Bridge`](crate::Bridge).
///
/// The script engine's primitive wrap policy is not part of this; it is
/// read from the host on every wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Expose protected members in lookups that do not ask explicitly.
    pub include_non_public: bool,
    /// Remember resolved overloads per argument class vector.
    pub overload_memo: bool,
    /// Reuse interface adapters per (script object, interface).
    pub adapter_cache: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            include_non_public: false,
            overload_memo: true,
            adapter_cache: true,
        }
    }
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_include_non_public(mut self, include: bool) -> Self {
        self.include_non_public = include;
        self
    }

    pub fn with_overload_memo(mut self, enabled: bool) -> Self {
        self.overload_memo = enabled;
        self
    }

    pub fn with_adapter_cache(mut self, enabled: bool) -> Self {
        self.adapter_cache = enabled;
        self
    }
}
