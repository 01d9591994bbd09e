//! Bridges over synthetic introspectors for unit tests.

use std::sync::Arc;

use hostbridge_core::DirectHost;
use hostbridge_core::synthetic::SyntheticIntrospector;

use crate::bridge::Bridge;
use crate::config::BridgeConfig;

pub(crate) fn bridge(intro: SyntheticIntrospector) -> Arc<Bridge> {
    bridge_with_config(intro, BridgeConfig::default())
}

pub(crate) fn bridge_with_config(intro: SyntheticIntrospector, config: BridgeConfig) -> Arc<Bridge> {
    Bridge::new(Arc::new(intro), Arc::new(DirectHost::default()), config)
}

/// A bridge that knows only the built-in types.
pub(crate) fn standard_bridge() -> Arc<Bridge> {
    bridge(SyntheticIntrospector::with_standard_types())
}
