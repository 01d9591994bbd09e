//! Deterministic hash-based native type identity.
//!
//! [`TypeHash`] is a 64-bit hash computed from a qualified native type name.
//! Because identities are derived from names, descriptors, member caches and
//! overload memo keys can all be built without a central id allocator, and the
//! same host type always maps to the same key no matter which thread saw it
//! first.
//!
//! # Hash Computation
//!
//! Uses XXHash64 with domain-specific mixing constants so that type names,
//! member signatures, array types and parameterized instances never collide
//! with one another.
//!
//! # Examples
//!
//! ```
//! use hostbridge_core::TypeHash;
//!
//! let a = TypeHash::from_name("demo.Point");
//! let b = TypeHash::from_name("demo.Point");
//! assert_eq!(a, b);
//!
//! let int_array = TypeHash::from_array(TypeHash::from_name("int"));
//! assert_ne!(int_array, TypeHash::from_name("int"));
//! ```

use std::fmt;
use xxhash_rust::const_xxh64;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
pub mod hash_constants {
    /// Separator constant for composite hashes
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for type hashes
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for member signature hashes (name + erased parameters)
    pub const SIGNATURE: u64 = 0x5ea77ffbcdf5f302;

    /// Domain marker for array types
    pub const ARRAY: u64 = 0x7d3c8b4a92e15f6d;

    /// Domain marker for type variables
    pub const VARIABLE: u64 = 0x3e9f5d2a8c7b1403;

    /// Parameter position mixing constants.
    /// Each position gets a unique constant so that parameter order matters.
    pub const PARAM_MARKERS: [u64; 16] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0x8648dbbc94d49b8d,
        0xa2b48b2c69e0d657,
        0x7c3e9f2a5b8d1403,
        0x5d8c7b4a3e9f2106,
        0x3f1e9d8c7b5a4203,
        0x1a2b3c4d5e6f7089,
        0x9f8e7d6c5b4a3210,
        0x2468ace013579bdf,
        0xfdb97531eca86420,
        0x123456789abcdef0,
    ];
}

/// A deterministic 64-bit hash identifying a native type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a type hash from a qualified type name.
    ///
    /// This is a `const fn` so that well-known ids can be computed at compile
    /// time; it produces the same value as hashing at run time.
    #[inline]
    pub const fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ const_xxh64::xxh64(name.as_bytes(), 0))
    }

    /// Create a member signature hash from a member name and its erased
    /// parameter type ids.
    ///
    /// Used by member discovery to de-duplicate declarations seen on several
    /// types of a hierarchy. Parameter order matters.
    #[inline]
    pub fn from_signature(name: &str, param_hashes: &[TypeHash]) -> Self {
        let hash = hash_constants::SIGNATURE ^ xxh64(name.as_bytes(), 0);
        TypeHash(mix_params(hash, param_hashes))
    }

    /// Create the identity of an array type from its component identity.
    #[inline]
    pub const fn from_array(component: TypeHash) -> Self {
        TypeHash((hash_constants::ARRAY ^ component.0).wrapping_mul(hash_constants::SEP))
    }

    /// Create the identity of a parameterized instance (e.g. `List<String>`)
    /// from its raw type and type argument identities.
    ///
    /// Type argument order matters.
    #[inline]
    pub fn from_parameterized(raw: TypeHash, args: &[TypeHash]) -> Self {
        TypeHash(mix_params(raw.0, args))
    }

    /// Create the identity of a type variable from its binding site and name.
    #[inline]
    pub fn from_variable(site: TypeHash, name: &str) -> Self {
        TypeHash(hash_constants::VARIABLE ^ site.0 ^ xxh64(name.as_bytes(), 0))
    }

    /// Check if this is an empty/invalid hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

#[inline]
fn mix_params(seed: u64, params: &[TypeHash]) -> u64 {
    let mut hash = seed;
    for (i, param) in params.iter().enumerate() {
        let marker = hash_constants::PARAM_MARKERS
            .get(i)
            .copied()
            .unwrap_or_else(|| hash_constants::PARAM_MARKERS[0].wrapping_add(i as u64));
        // wrapping_mul keeps the mix order-sensitive
        hash = hash.wrapping_mul(hash_constants::SEP).wrapping_add(marker ^ param.0);
    }
    hash
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Well-known native type ids.
///
/// The bridge treats these types specially when weighing and converting
/// values. Hosts must describe the corresponding types under exactly these
/// names for the special handling to apply.
pub mod well_known {
    use super::TypeHash;

    pub const VOID_NAME: &str = "void";
    pub const BOOLEAN_NAME: &str = "boolean";
    pub const CHAR_NAME: &str = "char";
    pub const BYTE_NAME: &str = "byte";
    pub const SHORT_NAME: &str = "short";
    pub const INT_NAME: &str = "int";
    pub const LONG_NAME: &str = "long";
    pub const FLOAT_NAME: &str = "float";
    pub const DOUBLE_NAME: &str = "double";

    pub const OBJECT_NAME: &str = "host.Object";
    pub const STRING_NAME: &str = "host.String";
    pub const NUMBER_NAME: &str = "host.Number";
    pub const CHAR_SEQUENCE_NAME: &str = "host.CharSequence";
    pub const CLASS_NAME: &str = "host.Class";
    pub const COLLECTION_NAME: &str = "host.Collection";
    pub const LIST_NAME: &str = "host.List";
    pub const SET_NAME: &str = "host.Set";
    pub const MAP_NAME: &str = "host.Map";

    pub const VOID: TypeHash = TypeHash::from_name(VOID_NAME);
    pub const BOOLEAN: TypeHash = TypeHash::from_name(BOOLEAN_NAME);
    pub const CHAR: TypeHash = TypeHash::from_name(CHAR_NAME);
    pub const BYTE: TypeHash = TypeHash::from_name(BYTE_NAME);
    pub const SHORT: TypeHash = TypeHash::from_name(SHORT_NAME);
    pub const INT: TypeHash = TypeHash::from_name(INT_NAME);
    pub const LONG: TypeHash = TypeHash::from_name(LONG_NAME);
    pub const FLOAT: TypeHash = TypeHash::from_name(FLOAT_NAME);
    pub const DOUBLE: TypeHash = TypeHash::from_name(DOUBLE_NAME);

    pub const OBJECT: TypeHash = TypeHash::from_name(OBJECT_NAME);
    pub const STRING: TypeHash = TypeHash::from_name(STRING_NAME);
    pub const NUMBER: TypeHash = TypeHash::from_name(NUMBER_NAME);
    pub const CHAR_SEQUENCE: TypeHash = TypeHash::from_name(CHAR_SEQUENCE_NAME);
    pub const CLASS: TypeHash = TypeHash::from_name(CLASS_NAME);
    pub const COLLECTION: TypeHash = TypeHash::from_name(COLLECTION_NAME);
    pub const LIST: TypeHash = TypeHash::from_name(LIST_NAME);
    pub const SET: TypeHash = TypeHash::from_name(SET_NAME);
    pub const MAP: TypeHash = TypeHash::from_name(MAP_NAME);

    /// Memo key of the script `undefined` value.
    pub const SCRIPT_UNDEFINED: TypeHash = TypeHash::from_name("script.undefined");
    /// Memo key of generic script objects.
    pub const SCRIPT_OBJECT: TypeHash = TypeHash::from_name("script.Object");
    /// Memo key of script arrays.
    pub const SCRIPT_ARRAY: TypeHash = TypeHash::from_name("script.Array");
    /// Memo key of script callables.
    pub const SCRIPT_FUNCTION: TypeHash = TypeHash::from_name("script.Function");
    /// Memo key prefix of native primitives wrapped as script objects.
    pub const SCRIPT_BOXED: TypeHash = TypeHash::from_name("script.Boxed");

    /// Native runtime type of script values carried through the native world
    /// untouched (targets that requested no conversion).
    pub const SCRIPT_HANDLE: TypeHash = TypeHash::from_name("script.Handle");

    /// Direct supertypes the bridge assumes for built-in types the host
    /// introspector does not describe.
    pub fn builtin_supertypes(id: TypeHash) -> &'static [TypeHash] {
        match id {
            id if id == LIST || id == SET => &[COLLECTION],
            id if id == STRING => &[CHAR_SEQUENCE],
            id if id == OBJECT || id == VOID => &[],
            id if crate::descriptor::PrimitiveKind::from_type_id(id).is_some() => &[],
            _ => &[OBJECT],
        }
    }

    /// Returns true for the primitive types and `String`, the types whose
    /// generic consolidation is always empty.
    pub fn is_primitive_like(id: TypeHash) -> bool {
        id == STRING || crate::descriptor::PrimitiveKind::from_type_id(id).is_some()
    }
}
