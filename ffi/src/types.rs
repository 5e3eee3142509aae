//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! enums with explicit discriminants. Conversion functions live here to keep
//! `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use collection_core::{HttpMethod, ResolveError, ResolvedRequest};

/// Opaque handle to a loaded `TemplateStore`.
pub struct FfiTemplateStore {
    pub(crate) inner: collection_core::TemplateStore,
}

/// Opaque handle to a `VariableEnvironment` the C caller fills in.
pub struct FfiEnvironment {
    pub(crate) inner: collection_core::VariableEnvironment,
}

/// Convert a Rust string into an owned C string, dropping interior NUL bytes.
///
/// Only diagnostic text may lose bytes here. Request data is checked with
/// [`interior_nul`] before conversion and rejected instead.
pub(crate) fn c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    let mut bytes = s.into();
    bytes.retain(|&b| b != 0);
    CString::new(bytes).unwrap_or_default().into_raw()
}

/// Name of the first field of `req` that cannot be a C string.
pub(crate) fn interior_nul(req: &ResolvedRequest) -> Option<&'static str> {
    let has_nul = |s: &str| s.contains('\0');
    if has_nul(&req.url) {
        Some("url")
    } else if has_nul(&req.path) {
        Some("path")
    } else if req.query.iter().any(|(k, v)| has_nul(k) || has_nul(v)) {
        Some("query")
    } else if req.headers.iter().any(|(k, v)| has_nul(k) || has_nul(v)) {
        Some("headers")
    } else if req.body.as_deref().is_some_and(has_nul) {
        Some("body")
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Patch = 3,
    Delete = 4,
    Head = 5,
    Options = 6,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Patch => FfiHttpMethod::Patch,
            HttpMethod::Delete => FfiHttpMethod::Delete,
            HttpMethod::Head => FfiHttpMethod::Head,
            HttpMethod::Options => FfiHttpMethod::Options,
        }
    }
}

/// A key-value pair of C strings, used for headers and query parameters.
#[repr(C)]
pub struct FfiPair {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// A resolved request described as C-compatible plain data.
///
/// `url` is complete and ready to send. `body` is null when the template has
/// no body.
#[repr(C)]
pub struct FfiResolvedRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub path: *mut c_char,
    pub query: *mut FfiPair,
    pub query_len: u32,
    pub headers: *mut FfiPair,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiResolvedRequest {
    /// Convert a core `ResolvedRequest` into a heap-allocated `FfiResolvedRequest`.
    pub(crate) fn from_core(req: ResolvedRequest) -> *mut Self {
        let (query, query_len) = pairs_into_raw(req.query);
        let (headers, headers_len) = pairs_into_raw(req.headers);
        let body = match req.body {
            Some(b) => c_string(b),
            None => std::ptr::null_mut(),
        };
        Box::into_raw(Box::new(FfiResolvedRequest {
            method: req.method.into(),
            url: c_string(req.url),
            path: c_string(req.path),
            query,
            query_len,
            headers,
            headers_len,
            body,
        }))
    }
}

fn pairs_into_raw(pairs: Vec<(String, String)>) -> (*mut FfiPair, u32) {
    if pairs.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let len = pairs.len() as u32;
    let ffi_pairs: Box<[FfiPair]> = pairs
        .into_iter()
        .map(|(k, v)| FfiPair {
            key: c_string(k),
            value: c_string(v),
        })
        .collect();
    (Box::into_raw(ffi_pairs) as *mut FfiPair, len)
}

/// Free an array produced by `pairs_into_raw` together with its strings.
///
/// # Safety
/// `ptr` and `len` must come from the same `pairs_into_raw` call.
pub(crate) unsafe fn free_pairs(ptr: *mut FfiPair, len: u32) {
    if ptr.is_null() || len == 0 {
        return;
    }
    let pairs = unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len as usize)) };
    for p in pairs.iter() {
        if !p.key.is_null() {
            drop(unsafe { CString::from_raw(p.key) });
        }
        if !p.value.is_null() {
            drop(unsafe { CString::from_raw(p.value) });
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiResolveResult`.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    UnresolvedVariable = 1,
    UnknownTemplate = 2,
    DuplicateTemplate = 3,
    MalformedTemplate = 4,
    InvalidBody = 5,
    Deserialization = 6,
    Panic = 7,
    NullArg = 8,
    RecursiveVariable = 9,
    /// A resolved value contains a NUL byte and cannot cross as a C string.
    InvalidString = 10,
}

/// Result envelope for `pmt_resolve`.
///
/// On success `error_code` is `Ok`, `error_message` and `variable` are null,
/// and `request` points to the resolved request. On failure `request` is
/// null, `error_message` describes the failure, and for
/// `UnresolvedVariable` `variable` names the missing placeholder, and for
/// `RecursiveVariable` the variable that refers to itself.
#[repr(C)]
pub struct FfiResolveResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub variable: *mut c_char,
    pub request: *mut FfiResolvedRequest,
}

impl FfiResolveResult {
    pub(crate) fn ok(req: ResolvedRequest) -> *mut Self {
        if let Some(field) = interior_nul(&req) {
            return Self::error(
                FfiErrorCode::InvalidString,
                format!("resolved {field} contains a NUL byte"),
                std::ptr::null_mut(),
            );
        }
        Box::into_raw(Box::new(FfiResolveResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            variable: std::ptr::null_mut(),
            request: FfiResolvedRequest::from_core(req),
        }))
    }

    pub(crate) fn from_error(err: ResolveError) -> *mut Self {
        let msg = err.to_string();
        let (error_code, variable) = match err {
            ResolveError::UnresolvedVariable { name, .. } => {
                (FfiErrorCode::UnresolvedVariable, c_string(name))
            }
            ResolveError::RecursiveVariable(name) => {
                (FfiErrorCode::RecursiveVariable, c_string(name))
            }
            ResolveError::UnknownTemplate(_) => (FfiErrorCode::UnknownTemplate, std::ptr::null_mut()),
            ResolveError::DuplicateTemplate(_) => {
                (FfiErrorCode::DuplicateTemplate, std::ptr::null_mut())
            }
            ResolveError::MalformedTemplate(_) => {
                (FfiErrorCode::MalformedTemplate, std::ptr::null_mut())
            }
            ResolveError::InvalidBody(_) => (FfiErrorCode::InvalidBody, std::ptr::null_mut()),
            ResolveError::Deserialization(_) => {
                (FfiErrorCode::Deserialization, std::ptr::null_mut())
            }
        };
        Self::error(error_code, msg, variable)
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::error(
            FfiErrorCode::NullArg,
            format!("null or non-UTF-8 argument: {name}"),
            std::ptr::null_mut(),
        )
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::error(FfiErrorCode::Panic, msg.to_string(), std::ptr::null_mut())
    }

    fn error(error_code: FfiErrorCode, msg: String, variable: *mut c_char) -> *mut Self {
        Box::into_raw(Box::new(FfiResolveResult {
            error_code,
            error_message: c_string(msg),
            variable,
            request: std::ptr::null_mut(),
        }))
    }
}
