use std::any::Any;
use std::fmt;
use std::sync::Arc;

use hostbridge_core::{BridgeResult, NativeValue, ScriptCallable, ScriptValue};
use hostbridge_registry::OverloadSet;

use crate::bridge::Bridge;

/// An overload set as a script function.
///
/// Instance methods read through a wrapper stay bound to that receiver.
/// Unbound ones take the receiver from the script `this` of the call.
pub struct MethodFunction {
    bridge: Arc<Bridge>,
    set: Arc<OverloadSet>,
    this: Option<NativeValue>,
}

impl MethodFunction {
    pub(crate) fn new(bridge: Arc<Bridge>, set: Arc<OverloadSet>, this: Option<NativeValue>) -> Self {
        Self { bridge, set, this }
    }

    pub fn overloads(&self) -> &Arc<OverloadSet> {
        &self.set
    }
}

impl ScriptCallable for MethodFunction {
    fn name(&self) -> &str {
        &self.set.name
    }

    fn call(&self, this: &ScriptValue, args: &[ScriptValue]) -> BridgeResult<ScriptValue> {
        let receiver = self.this.clone().or_else(|| this.unwrap_native());
        self.bridge.invoke(&self.set, receiver.as_ref(), args)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for MethodFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodFunction")
            .field("name", &self.set.name)
            .field("overloads", &self.set.len())
            .field("bound", &self.this.is_some())
            .finish()
    }
}
