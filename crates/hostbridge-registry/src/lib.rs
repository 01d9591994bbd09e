//! Member registry for the host-interop bridge.
//!
//! - [`Consolidator`] resolves the type variables of inherited member
//!   signatures for a concrete type
//! - [`MemberRegistry`] discovers and caches the methods, fields, bean
//!   properties and constructors of native types
//! - [`OverloadMemo`] remembers resolved overloads per argument class vector

pub mod bean;
pub mod consolidate;
pub mod discovery;
pub mod members;
pub mod memo;
pub mod registry;

pub use consolidate::Consolidator;
pub use members::{
    BeanProperty, FieldAccessor, MemberDescriptor, MemberEntry, MemberTable, NativeCallable, OverloadSet,
    ValueMarshal,
};
pub use memo::{OverloadMemo, ResolvedOverload};
pub use registry::MemberRegistry;
