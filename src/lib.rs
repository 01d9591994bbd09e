//! Script/native host interop.
//!
//! `hostbridge` lets a dynamically typed script engine use native objects
//! described by a [`NativeTypeIntrospector`]: reading and writing their
//! fields and bean properties, calling overloaded methods and constructors,
//! and passing script values into native code.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use hostbridge::prelude::*;
//! use hostbridge::synthetic::{MethodBuilder, SyntheticIntrospector, TypeBuilder};
//!
//! let intro = SyntheticIntrospector::with_standard_types();
//! let int = TypeDescriptor::numeric(NumericKind::Int);
//! intro.register(
//!     TypeBuilder::class("demo.Math").method(
//!         MethodBuilder::new("twice")
//!             .param(int.clone())
//!             .returns(int)
//!             .flags(MemberFlags::STATIC)
//!             .invoke(|_, args| Ok(NativeValue::Int(args[0].as_f64().unwrap_or(0.0) as i32 * 2))),
//!     ),
//! );
//!
//! let bridge = Bridge::new(Arc::new(intro), Arc::new(DirectHost::default()), BridgeConfig::default());
//! let math = bridge.lookup_members(TypeHash::from_name("demo.Math"), None, false)?;
//! let twice = math.methods("twice", true).expect("declared above");
//! assert_eq!(bridge.invoke(twice, None, &["21".into()])?.as_number(), Some(42.0));
//! # Ok::<(), BridgeError>(())
//! ```
//!
//! # Layout
//!
//! - [`conversion`]: conversion weights and script-to-native conversion,
//!   interface adapters
//! - [`overload`]: overload resolution and invocation
//! - [`wrappers`]: script-visible proxies of native values
//! - [`Bridge`]: the facade tying these to a registry and a script host

pub mod bridge;
pub mod config;
pub mod conversion;
pub mod overload;
pub mod wrappers;

#[cfg(test)]
mod testing;

pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use conversion::{AdapterCache, InterfaceAdapter, Rank, conversion_weight, convert};
pub use overload::{Resolution, resolve};

pub use hostbridge_core::*;
pub use hostbridge_registry::{MemberEntry, MemberRegistry, NativeCallable, OverloadSet, ValueMarshal};

pub mod prelude {
    pub use crate::bridge::*;
    pub use crate::config::*;
    pub use crate::conversion::{AdapterCache, InterfaceAdapter, Rank};
    pub use crate::overload::Resolution;
    pub use crate::wrappers::*;
    pub use hostbridge_core::{
        BridgeError, BridgeResult, DirectHost, HintKind, MemberFlags, NativeTypeIntrospector, NativeValue,
        NumericKind, PropertyKey, ScriptCallable, ScriptHost, ScriptObject, ScriptValue, TypeDescriptor, TypeHash,
        WrapPolicy,
    };
    pub use hostbridge_registry::{MemberEntry, OverloadSet, ValueMarshal};
}
