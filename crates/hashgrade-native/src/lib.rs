//! hashgrade-native: grade a hash function compiled to a shared object.
//!
//! The submission exports one C function:
//!
//! ```c
//! unsigned short hash(const char *input);
//! ```
//!
//! [`NativeHash`] opens the library, resolves the symbol and adapts it to
//! [`HashFunction`]. Each line is passed as a fresh NUL-terminated copy, so
//! lines containing NUL bytes cannot be represented and are rejected with
//! [`CapabilityError::InvalidInput`].
//!
//! # Safety
//!
//! Calling foreign code is inherently unsafe; a crashing submission takes
//! the grader down with it. Run the grader in a sandbox.

use std::ffi::{CString, c_char, c_void};
use std::fmt;
use std::path::Path;

use hashgrade_core::capability::HashFunction;
use hashgrade_core::error::CapabilityError;
use shared_library::dynamic_library::DynamicLibrary;

/// Default exported symbol name.
pub const DEFAULT_SYMBOL: &str = "hash";

/// Signature of the exported hash function.
pub type RawHashFn = unsafe extern "C" fn(*const c_char) -> u16;

/// A hash function resolved from a shared object.
pub struct NativeHash {
    func: RawHashFn,
    origin: String,
    symbol: String,
    // Keeps `func` mapped; must outlive every call.
    _library: Option<DynamicLibrary>,
}

impl NativeHash {
    /// Open `path` and resolve `symbol` as a [`RawHashFn`].
    ///
    /// `path` goes to the dynamic loader as given: a bare file name is looked
    /// up on the loader search path, so use `./libhash.so` for the current
    /// directory.
    pub fn load(path: impl AsRef<Path>, symbol: &str) -> Result<Self, CapabilityError> {
        let path = path.as_ref();
        let origin = path.display().to_string();

        let library =
            DynamicLibrary::open(Some(path)).map_err(|reason| CapabilityError::LoadFailed {
                path: origin.clone(),
                reason,
            })?;

        let not_found = || CapabilityError::SymbolNotFound {
            path: origin.clone(),
            symbol: symbol.to_string(),
        };
        // SAFETY: the address is only reinterpreted, never dereferenced as data.
        let raw = unsafe { library.symbol::<c_void>(symbol) }.map_err(|_| not_found())?;
        if raw.is_null() {
            return Err(not_found());
        }
        // SAFETY: a non-null exported symbol, which the submission contract
        // declares as `unsigned short hash(const char *)`. Data and function
        // pointers share a representation on every supported platform.
        let func = unsafe { std::mem::transmute::<*mut c_void, RawHashFn>(raw) };

        tracing::info!(library = %origin, symbol, "loaded native hash function");
        Ok(Self {
            func,
            origin,
            symbol: symbol.to_string(),
            _library: Some(library),
        })
    }

    /// Wrap a function that is already linked into the process.
    ///
    /// # Safety
    ///
    /// `func` must read a NUL-terminated string from its argument and must
    /// not retain the pointer after returning.
    #[must_use]
    pub unsafe fn from_raw(func: RawHashFn, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            func,
            origin: "<linked>".to_string(),
            symbol: name,
            _library: None,
        }
    }

    /// Where the function came from (library path, or `<linked>`).
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl fmt::Debug for NativeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeHash")
            .field("origin", &self.origin)
            .field("symbol", &self.symbol)
            .finish_non_exhaustive()
    }
}

impl HashFunction for NativeHash {
    fn hash(&self, input: &[u8]) -> Result<u64, CapabilityError> {
        let c_input = CString::new(input).map_err(|e| {
            CapabilityError::InvalidInput(format!("NUL byte at offset {}", e.nul_position()))
        })?;
        // SAFETY: `c_input` is NUL-terminated and outlives the call; the
        // library (if any) is held by `self`.
        let value = unsafe { (self.func)(c_input.as_ptr()) };
        Ok(u64::from(value))
    }
}
