//! Read-only module tables consumed by the IL layer.
//!
//! The `.smx` loader (an external collaborator) produces a type table for variables,
//! debug symbols for user-named locals and globals, the native-function table and the
//! signature of every function. Once a module is loaded none of these are mutated, so
//! they can be shared freely between functions processed in parallel.
//!
//! # Key Types
//!
//! - [`Cell`] - The 32-bit machine word of the SourcePawn VM
//! - [`VarType`] / [`TypeTag`] - Semantic type of a variable or expression
//! - [`DebugSymbol`] - Debug metadata of a user-named variable
//! - [`NativeTable`] - Natives keyed by their index in the module
//! - [`FunctionSignature`] - Declared return type and arguments of a function

use std::fmt;

use strum::{Display, IntoStaticStr};

/// The machine word of the SourcePawn VM.
///
/// Constants, global addresses, stack offsets and program counters are all cells.
pub type Cell = i32;

/// Base tag of a semantic type, as recorded in the module's debug type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum TypeTag {
    /// Plain cell-sized integer (`int`)
    Int,
    /// Boolean (`bool`)
    Bool,
    /// IEEE-754 single precision (`float`)
    Float,
    /// Character (`char`), mostly seen as arrays holding strings
    Char,
    /// Untyped cell (`any`)
    Any,
    /// No value; only meaningful as a return type
    Void,
    /// Enumeration or methodmap tag, identified by its tag index
    #[strum(to_string = "enum")]
    Enum(u32),
}

/// Semantic type of a variable or expression.
///
/// `dimcount` is the number of array dimensions: `int x` has 0, `char name[64]` has 1,
/// `float grid[4][4]` has 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarType {
    /// Base tag
    pub tag: TypeTag,
    /// Number of array dimensions
    pub dimcount: u32,
}

impl VarType {
    /// `int`
    pub const INT: VarType = VarType::scalar(TypeTag::Int);
    /// `bool`
    pub const BOOL: VarType = VarType::scalar(TypeTag::Bool);
    /// `float`
    pub const FLOAT: VarType = VarType::scalar(TypeTag::Float);
    /// `void`
    pub const VOID: VarType = VarType::scalar(TypeTag::Void);

    /// Creates a non-array type with the given tag.
    #[must_use]
    pub const fn scalar(tag: TypeTag) -> Self {
        Self { tag, dimcount: 0 }
    }

    /// Creates an array type with `dimcount` dimensions.
    #[must_use]
    pub const fn array(tag: TypeTag, dimcount: u32) -> Self {
        Self { tag, dimcount }
    }

    /// Returns `true` if this type has at least one array dimension.
    #[must_use]
    pub const fn is_array(&self) -> bool {
        self.dimcount > 0
    }

    /// Returns `true` for the scalar `bool` type.
    #[must_use]
    pub fn is_bool(&self) -> bool {
        self.tag == TypeTag::Bool && self.dimcount == 0
    }

    /// Returns `true` for `void`.
    #[must_use]
    pub fn is_void(&self) -> bool {
        self.tag == TypeTag::Void
    }

    /// Returns the type of one element of this array, or `None` for scalars.
    #[must_use]
    pub const fn element(&self) -> Option<VarType> {
        if self.dimcount == 0 {
            None
        } else {
            Some(VarType {
                tag: self.tag,
                dimcount: self.dimcount - 1,
            })
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag)?;
        for _ in 0..self.dimcount {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

/// Debug metadata of a user-named variable.
///
/// Variables introduced by the compiler (temporaries for `&&`/`||`, spilled
/// intermediate values) carry no symbol, which is how the temporary elimination pass
/// tells them apart from locals the programmer wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugSymbol {
    /// Source name of the variable
    pub name: String,
    /// Declared type
    pub ty: VarType,
}

impl DebugSymbol {
    /// Creates a new debug symbol.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: VarType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A native function imported by the module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Native {
    /// Native name as bound by the host (e.g. `FloatAdd`, `__FLOAT_GT__`)
    pub name: String,
}

/// Natives of a module keyed by their index, as referenced by `sysreq` instructions.
#[derive(Debug, Clone, Default)]
pub struct NativeTable {
    natives: Vec<Native>,
}

impl NativeTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a native and returns its index.
    pub fn push(&mut self, name: impl Into<String>) -> u32 {
        let index = u32::try_from(self.natives.len()).unwrap_or(u32::MAX);
        self.natives.push(Native { name: name.into() });
        index
    }

    /// Returns the native at `index`, if the module declares one.
    #[must_use]
    pub fn get(&self, index: u32) -> Option<&Native> {
        self.natives.get(index as usize)
    }

    /// Returns the index of the first native called `name`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<u32> {
        self.natives
            .iter()
            .position(|native| native.name == name)
            .and_then(|index| u32::try_from(index).ok())
    }

    /// Returns the number of natives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.natives.len()
    }

    /// Returns `true` if the table holds no natives.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.natives.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for NativeTable {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            natives: iter
                .into_iter()
                .map(|name| Native { name: name.into() })
                .collect(),
        }
    }
}

/// Declared signature of a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    /// Function name
    pub name: String,
    /// Declared return type; `None` when the module has no debug information for it
    pub return_type: Option<VarType>,
    /// Declared argument types, in order
    pub args: Vec<VarType>,
}

impl FunctionSignature {
    /// Creates a signature without arguments.
    #[must_use]
    pub fn new(name: impl Into<String>, return_type: Option<VarType>) -> Self {
        Self {
            name: name.into(),
            return_type,
            args: Vec::new(),
        }
    }

    /// Returns `true` if the function is declared to return `void`.
    ///
    /// A missing return type is not treated as void.
    #[must_use]
    pub fn returns_void(&self) -> bool {
        self.return_type.is_some_and(|ty| ty.is_void())
    }
}
