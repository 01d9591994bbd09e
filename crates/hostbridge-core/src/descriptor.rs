//! Immutable descriptors of native-side types.
//!
//! A [`TypeDescriptor`] is a cheap, reference-counted handle to a
//! [`DescriptorKind`]. `Plain`, `Enum` and `Interface` descriptors are interned
//! process-wide by native type identity, so two descriptors of the same host
//! type share one allocation. Composite descriptors (arrays, parameterized
//! types, variables) compare structurally.
//!
//! Structural rewrites ([`TypeDescriptor::consolidate`],
//! [`TypeDescriptor::resolve_unbound`]) return the receiver itself when nothing
//! inside needs substitution. Callers detect "no change" with
//! [`TypeDescriptor::ptr_eq`].
//!
//! # Example
//!
//! ```
//! use hostbridge_core::{ConsolidationMapping, TypeDescriptor, TypeHash, TypeVariable};
//!
//! let list = TypeDescriptor::interface("host.List", false);
//! let element = TypeVariable::new(TypeHash::from_name("host.List"), "E");
//! let list_of_e = TypeDescriptor::parameterized(
//!     list.clone(),
//!     vec![TypeDescriptor::variable(element.clone(), TypeDescriptor::object())],
//! );
//!
//! let mut mapping = ConsolidationMapping::new();
//! mapping.insert(element, TypeDescriptor::string());
//! assert_eq!(list_of_e.consolidate(&mapping).signature(), "host.List<host.String>");
//! ```

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use num_enum::IntoPrimitive;
use once_cell::sync::Lazy;
use ordered_float::OrderedFloat;
use rustc_hash::{FxBuildHasher, FxHashMap};

use crate::native::{NativeArray, NativeRef, NativeValue};
use crate::type_hash::{TypeHash, well_known};

// ============================================================================
// Primitive Kinds
// ============================================================================

/// Numeric primitive kinds, ordered by size rank.
///
/// The discriminant is the size rank used by the conversion weights:
/// wider types rank better (lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, IntoPrimitive)]
#[repr(u8)]
pub enum NumericKind {
    Double = 1,
    Float = 2,
    Long = 3,
    Int = 4,
    Short = 5,
    Char = 6,
    Byte = 7,
}

impl NumericKind {
    /// All numeric kinds, widest first.
    pub const ALL: [NumericKind; 7] = [
        NumericKind::Double,
        NumericKind::Float,
        NumericKind::Long,
        NumericKind::Int,
        NumericKind::Short,
        NumericKind::Char,
        NumericKind::Byte,
    ];

    /// Size rank: double 1 (widest) through byte 7 (narrowest).
    #[inline]
    pub fn size_rank(self) -> u8 {
        self.into()
    }

    pub fn type_id(self) -> TypeHash {
        match self {
            NumericKind::Double => well_known::DOUBLE,
            NumericKind::Float => well_known::FLOAT,
            NumericKind::Long => well_known::LONG,
            NumericKind::Int => well_known::INT,
            NumericKind::Short => well_known::SHORT,
            NumericKind::Char => well_known::CHAR,
            NumericKind::Byte => well_known::BYTE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NumericKind::Double => well_known::DOUBLE_NAME,
            NumericKind::Float => well_known::FLOAT_NAME,
            NumericKind::Long => well_known::LONG_NAME,
            NumericKind::Int => well_known::INT_NAME,
            NumericKind::Short => well_known::SHORT_NAME,
            NumericKind::Char => well_known::CHAR_NAME,
            NumericKind::Byte => well_known::BYTE_NAME,
        }
    }

    /// Returns true for the kinds that hold whole numbers.
    pub fn is_integral(self) -> bool {
        !matches!(self, NumericKind::Double | NumericKind::Float)
    }

    /// Inclusive value range of an integral kind.
    pub fn integral_range(self) -> Option<(i64, i64)> {
        match self {
            NumericKind::Long => Some((i64::MIN, i64::MAX)),
            NumericKind::Int => Some((i32::MIN as i64, i32::MAX as i64)),
            NumericKind::Short => Some((i16::MIN as i64, i16::MAX as i64)),
            NumericKind::Char => Some((0, u16::MAX as i64)),
            NumericKind::Byte => Some((i8::MIN as i64, i8::MAX as i64)),
            NumericKind::Double | NumericKind::Float => None,
        }
    }
}

/// Primitive native types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Void,
    Boolean,
    Numeric(NumericKind),
}

impl PrimitiveKind {
    pub fn from_type_id(id: TypeHash) -> Option<PrimitiveKind> {
        if id == well_known::VOID {
            return Some(PrimitiveKind::Void);
        }
        if id == well_known::BOOLEAN {
            return Some(PrimitiveKind::Boolean);
        }
        NumericKind::ALL
            .into_iter()
            .find(|kind| kind.type_id() == id)
            .map(PrimitiveKind::Numeric)
    }

    pub fn type_id(self) -> TypeHash {
        match self {
            PrimitiveKind::Void => well_known::VOID,
            PrimitiveKind::Boolean => well_known::BOOLEAN,
            PrimitiveKind::Numeric(kind) => kind.type_id(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Void => well_known::VOID_NAME,
            PrimitiveKind::Boolean => well_known::BOOLEAN_NAME,
            PrimitiveKind::Numeric(kind) => kind.name(),
        }
    }
}

// ============================================================================
// Type References
// ============================================================================

/// A named native type: identity plus qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub id: TypeHash,
    pub name: Arc<str>,
}

impl TypeRef {
    pub fn new(name: &str) -> Self {
        Self {
            id: TypeHash::from_name(name),
            name: Arc::from(name),
        }
    }
}

/// A type variable, identified by its binding site (the generic type or
/// member that declares it) and its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeVariable {
    pub id: TypeHash,
    pub site: TypeHash,
    pub name: Arc<str>,
}

impl TypeVariable {
    pub fn new(site: TypeHash, name: &str) -> Self {
        Self {
            id: TypeHash::from_variable(site, name),
            site,
            name: Arc::from(name),
        }
    }
}

// ============================================================================
// Descriptors
// ============================================================================

/// The closed set of descriptor variants.
///
/// The script-literal variants (`StringConstant` through `FunctionShape`) are
/// only produced by signature inference, never by reflection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    /// "No conversion requested".
    None,
    Plain(TypeRef),
    Array(TypeDescriptor),
    Parameterized {
        raw: TypeDescriptor,
        params: Vec<TypeDescriptor>,
    },
    Enum(TypeRef),
    Interface {
        ty: TypeRef,
        functional: bool,
    },
    Variable {
        var: TypeVariable,
        bound: TypeDescriptor,
    },
    StringConstant(Arc<str>),
    NumberConstant(OrderedFloat<f64>),
    BooleanConstant(bool),
    Union(Vec<TypeDescriptor>),
    ObjectShape(Vec<(Arc<str>, TypeDescriptor)>),
    FunctionShape {
        params: Vec<TypeDescriptor>,
        ret: TypeDescriptor,
    },
}

/// Shared handle to an immutable type descriptor.
#[derive(Clone)]
pub struct TypeDescriptor(Arc<DescriptorKind>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum InternTag {
    Plain,
    Enum,
    Interface,
}

static INTERNER: Lazy<DashMap<(InternTag, TypeHash), TypeDescriptor, FxBuildHasher>> =
    Lazy::new(|| DashMap::with_hasher(FxBuildHasher));

static NONE: Lazy<TypeDescriptor> = Lazy::new(|| TypeDescriptor(Arc::new(DescriptorKind::None)));

fn intern(tag: InternTag, id: TypeHash, make: impl FnOnce() -> DescriptorKind) -> TypeDescriptor {
    if let Some(existing) = INTERNER.get(&(tag, id)) {
        return existing.value().clone();
    }
    INTERNER
        .entry((tag, id))
        .or_insert_with(|| TypeDescriptor(Arc::new(make())))
        .value()
        .clone()
}

impl TypeDescriptor {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// The "no conversion requested" descriptor.
    pub fn none() -> Self {
        NONE.clone()
    }

    /// Interned descriptor of a plain class (or primitive) type.
    pub fn plain(name: &str) -> Self {
        let ty = TypeRef::new(name);
        intern(InternTag::Plain, ty.id, || DescriptorKind::Plain(ty))
    }

    /// Interned descriptor of an enum type.
    pub fn enumeration(name: &str) -> Self {
        let ty = TypeRef::new(name);
        intern(InternTag::Enum, ty.id, || DescriptorKind::Enum(ty))
    }

    /// Interned descriptor of an interface type.
    ///
    /// The first registration of an interface decides its `functional` flag.
    pub fn interface(name: &str, functional: bool) -> Self {
        let ty = TypeRef::new(name);
        intern(InternTag::Interface, ty.id, || DescriptorKind::Interface { ty, functional })
    }

    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self::plain(kind.name())
    }

    pub fn numeric(kind: NumericKind) -> Self {
        Self::plain(kind.name())
    }

    pub fn boolean() -> Self {
        Self::plain(well_known::BOOLEAN_NAME)
    }

    pub fn void() -> Self {
        Self::plain(well_known::VOID_NAME)
    }

    pub fn object() -> Self {
        Self::plain(well_known::OBJECT_NAME)
    }

    pub fn string() -> Self {
        Self::plain(well_known::STRING_NAME)
    }

    pub fn array(component: TypeDescriptor) -> Self {
        TypeDescriptor(Arc::new(DescriptorKind::Array(component)))
    }

    pub fn parameterized(raw: TypeDescriptor, params: Vec<TypeDescriptor>) -> Self {
        TypeDescriptor(Arc::new(DescriptorKind::Parameterized { raw, params }))
    }

    pub fn variable(var: TypeVariable, bound: TypeDescriptor) -> Self {
        TypeDescriptor(Arc::new(DescriptorKind::Variable { var, bound }))
    }

    pub fn string_constant(value: &str) -> Self {
        TypeDescriptor(Arc::new(DescriptorKind::StringConstant(Arc::from(value))))
    }

    pub fn number_constant(value: f64) -> Self {
        TypeDescriptor(Arc::new(DescriptorKind::NumberConstant(OrderedFloat(value))))
    }

    pub fn boolean_constant(value: bool) -> Self {
        TypeDescriptor(Arc::new(DescriptorKind::BooleanConstant(value)))
    }

    pub fn union(members: Vec<TypeDescriptor>) -> Self {
        TypeDescriptor(Arc::new(DescriptorKind::Union(members)))
    }

    pub fn object_shape(fields: Vec<(Arc<str>, TypeDescriptor)>) -> Self {
        TypeDescriptor(Arc::new(DescriptorKind::ObjectShape(fields)))
    }

    pub fn function_shape(params: Vec<TypeDescriptor>, ret: TypeDescriptor) -> Self {
        TypeDescriptor(Arc::new(DescriptorKind::FunctionShape { params, ret }))
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    #[inline]
    pub fn kind(&self) -> &DescriptorKind {
        &self.0
    }

    /// Identity comparison.
    #[inline]
    pub fn ptr_eq(a: &TypeDescriptor, b: &TypeDescriptor) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub fn is_none(&self) -> bool {
        matches!(self.kind(), DescriptorKind::None)
    }

    pub fn is_variable(&self) -> bool {
        matches!(self.kind(), DescriptorKind::Variable { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind(), DescriptorKind::Array(_))
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.as_plain_type().kind(), DescriptorKind::Enum(_))
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.as_plain_type().kind(), DescriptorKind::Interface { .. })
    }

    pub fn is_functional_interface(&self) -> bool {
        matches!(
            self.as_plain_type().kind(),
            DescriptorKind::Interface { functional: true, .. }
        )
    }

    /// The named type of an interned descriptor.
    pub fn type_ref(&self) -> Option<&TypeRef> {
        match self.kind() {
            DescriptorKind::Plain(ty) | DescriptorKind::Enum(ty) => Some(ty),
            DescriptorKind::Interface { ty, .. } => Some(ty),
            _ => None,
        }
    }

    /// Native identity of the erased type, if the descriptor denotes one.
    pub fn type_id(&self) -> Option<TypeHash> {
        match self.kind() {
            DescriptorKind::Plain(ty) | DescriptorKind::Enum(ty) => Some(ty.id),
            DescriptorKind::Interface { ty, .. } => Some(ty.id),
            DescriptorKind::Array(component) => component.type_id().map(TypeHash::from_array),
            DescriptorKind::Parameterized { raw, .. } => raw.type_id(),
            DescriptorKind::Variable { bound, .. } => bound.type_id(),
            _ => None,
        }
    }

    /// Erasure: parameterized types become their raw type, variables their
    /// bound's erasure, arrays erase their component.
    pub fn as_plain_type(&self) -> TypeDescriptor {
        match self.kind() {
            DescriptorKind::Parameterized { raw, .. } => raw.as_plain_type(),
            DescriptorKind::Variable { bound, .. } => bound.as_plain_type(),
            DescriptorKind::Array(component) => {
                let erased = component.as_plain_type();
                if TypeDescriptor::ptr_eq(&erased, component) {
                    self.clone()
                } else {
                    TypeDescriptor::array(erased)
                }
            }
            _ => self.clone(),
        }
    }

    /// Component type of an array descriptor.
    pub fn component_type(&self) -> Option<&TypeDescriptor> {
        match self.kind() {
            DescriptorKind::Array(component) => Some(component),
            _ => None,
        }
    }

    /// The `i`-th type argument of a parameterized descriptor; `None`
    /// descriptor when absent or out of range.
    pub fn param(&self, i: usize) -> TypeDescriptor {
        match self.kind() {
            DescriptorKind::Parameterized { params, .. } => {
                params.get(i).cloned().unwrap_or_else(TypeDescriptor::none)
            }
            _ => TypeDescriptor::none(),
        }
    }

    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self.kind() {
            DescriptorKind::Plain(ty) => PrimitiveKind::from_type_id(ty.id),
            _ => None,
        }
    }

    pub fn numeric_kind(&self) -> Option<NumericKind> {
        match self.primitive_kind() {
            Some(PrimitiveKind::Numeric(kind)) => Some(kind),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        self.primitive_kind().is_some()
    }

    pub fn is_void(&self) -> bool {
        self.primitive_kind() == Some(PrimitiveKind::Void)
    }

    /// Primitive types and `String`.
    pub fn is_primitive_like(&self) -> bool {
        self.is_primitive() || self.type_id() == Some(well_known::STRING)
    }

    /// Numeric primitives and the boxed `Number` type.
    pub fn is_numeric_kind(&self) -> bool {
        self.numeric_kind().is_some()
            || (self.type_ref().is_some() && self.type_id() == Some(well_known::NUMBER))
    }

    /// Returns true if a `Variable` occurs anywhere inside the descriptor.
    pub fn has_variables(&self) -> bool {
        match self.kind() {
            DescriptorKind::Variable { .. } => true,
            DescriptorKind::Array(component) => component.has_variables(),
            DescriptorKind::Parameterized { params, .. } => params.iter().any(Self::has_variables),
            DescriptorKind::Union(members) => members.iter().any(Self::has_variables),
            DescriptorKind::ObjectShape(fields) => fields.iter().any(|(_, ty)| ty.has_variables()),
            DescriptorKind::FunctionShape { params, ret } => {
                params.iter().any(Self::has_variables) || ret.has_variables()
            }
            _ => false,
        }
    }

    /// A native array of `length` default elements of this component type.
    pub fn new_array(&self, length: usize) -> NativeValue {
        NativeValue::Object(NativeRef::new(NativeArray::with_length(self.clone(), length)))
    }

    /// Stable textual form for diagnostics and ambiguity reports.
    pub fn signature(&self) -> String {
        self.to_string()
    }

    // ------------------------------------------------------------------
    // Rewriting
    // ------------------------------------------------------------------

    /// Substitute bound type variables.
    ///
    /// Returns `self` by identity when nothing inside is substituted.
    pub fn consolidate(&self, mapping: &ConsolidationMapping) -> TypeDescriptor {
        if mapping.is_empty() {
            return self.clone();
        }
        self.rewrite(&|var, _| mapping.get(var).cloned())
    }

    /// Erase every remaining variable to its bound.
    ///
    /// Returns `self` by identity when the descriptor holds no variable.
    pub fn resolve_unbound(&self) -> TypeDescriptor {
        self.rewrite(&|_, bound| Some(bound.as_plain_type()))
    }

    fn rewrite(
        &self,
        leaf: &dyn Fn(&TypeVariable, &TypeDescriptor) -> Option<TypeDescriptor>,
    ) -> TypeDescriptor {
        match self.kind() {
            DescriptorKind::Variable { var, bound } => leaf(var, bound).unwrap_or_else(|| self.clone()),
            DescriptorKind::Array(component) => {
                let rewritten = component.rewrite(leaf);
                if TypeDescriptor::ptr_eq(&rewritten, component) {
                    self.clone()
                } else {
                    TypeDescriptor::array(rewritten)
                }
            }
            DescriptorKind::Parameterized { raw, params } => match rewrite_all(params, leaf) {
                Some(params) => TypeDescriptor::parameterized(raw.clone(), params),
                None => self.clone(),
            },
            DescriptorKind::Union(members) => match rewrite_all(members, leaf) {
                Some(members) => TypeDescriptor::union(members),
                None => self.clone(),
            },
            DescriptorKind::ObjectShape(fields) => {
                let rewritten: Vec<_> = fields.iter().map(|(_, ty)| ty.rewrite(leaf)).collect();
                let unchanged = rewritten
                    .iter()
                    .zip(fields)
                    .all(|(new, (_, old))| TypeDescriptor::ptr_eq(new, old));
                if unchanged {
                    self.clone()
                } else {
                    TypeDescriptor::object_shape(
                        fields.iter().map(|(name, _)| name.clone()).zip(rewritten).collect(),
                    )
                }
            }
            DescriptorKind::FunctionShape { params, ret } => {
                let new_ret = ret.rewrite(leaf);
                let new_params = rewrite_all(params, leaf);
                if new_params.is_none() && TypeDescriptor::ptr_eq(&new_ret, ret) {
                    self.clone()
                } else {
                    TypeDescriptor::function_shape(new_params.unwrap_or_else(|| params.clone()), new_ret)
                }
            }
            _ => self.clone(),
        }
    }
}

/// Rewrite every descriptor; `None` when all came back unchanged.
fn rewrite_all(
    items: &[TypeDescriptor],
    leaf: &dyn Fn(&TypeVariable, &TypeDescriptor) -> Option<TypeDescriptor>,
) -> Option<Vec<TypeDescriptor>> {
    let rewritten: Vec<_> = items.iter().map(|item| item.rewrite(leaf)).collect();
    if rewritten
        .iter()
        .zip(items)
        .all(|(new, old)| TypeDescriptor::ptr_eq(new, old))
    {
        None
    } else {
        Some(rewritten)
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

impl Eq for TypeDescriptor {}

impl std::hash::Hash for TypeDescriptor {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            DescriptorKind::None => write!(f, "?"),
            DescriptorKind::Plain(ty) | DescriptorKind::Enum(ty) => write!(f, "{}", ty.name),
            DescriptorKind::Interface { ty, .. } => write!(f, "{}", ty.name),
            DescriptorKind::Array(component) => write!(f, "{}[]", component),
            DescriptorKind::Parameterized { raw, params } => {
                write!(f, "{}<", raw)?;
                write_list(f, params, ", ")?;
                write!(f, ">")
            }
            DescriptorKind::Variable { var, .. } => write!(f, "{}", var.name),
            DescriptorKind::StringConstant(s) => write!(f, "{:?}", s),
            DescriptorKind::NumberConstant(n) => write!(f, "{}", n),
            DescriptorKind::BooleanConstant(b) => write!(f, "{}", b),
            DescriptorKind::Union(members) => write_list(f, members, " | "),
            DescriptorKind::ObjectShape(fields) => {
                write!(f, "{{")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, ty)?;
                }
                write!(f, "}}")
            }
            DescriptorKind::FunctionShape { params, ret } => {
                write!(f, "(")?;
                write_list(f, params, ", ")?;
                write!(f, ") => {}", ret)
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[TypeDescriptor], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDescriptor({})", self)
    }
}

// ============================================================================
// Consolidation Mapping
// ============================================================================

/// Bindings of type variables to descriptors for one concrete native type.
///
/// Built once per type by the consolidator and shared immutably afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsolidationMapping {
    bindings: FxHashMap<TypeVariable, TypeDescriptor>,
}

impl ConsolidationMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn get(&self, var: &TypeVariable) -> Option<&TypeDescriptor> {
        self.bindings.get(var)
    }

    /// Bind `var`, replacing any previous binding.
    pub fn insert(&mut self, var: TypeVariable, ty: TypeDescriptor) {
        self.bindings.insert(var, ty);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TypeVariable, &TypeDescriptor)> {
        self.bindings.iter()
    }
}

// ============================================================================
// Tests
// ============================================================================
