//! C-ABI wrapper around `collection-core`.
//!
//! # Overview
//! Lets any language with a C FFI load a request collection, fill in a
//! variable environment, resolve a named template into a ready-to-send
//! request, look up payment status descriptions, and verify signed redirect
//! URLs, without linking to serde or the Rust standard library directly.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Stores and environments are opaque handles.
//! - A single `FfiResolveResult` envelope carries either the resolved request
//!   or an error code, message and the unresolved variable name.
//! - The C caller owns all returned pointers and must call the matching
//!   `pmt_*_free` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;

use collection_core::{
    verify_redirect_signature, PaymentStatus, SignatureError, TemplateStore, VariableEnvironment,
};

use types::*;

/// Borrow a C string as `&str`. `None` for null or non-UTF-8 input.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
unsafe fn read_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Store lifecycle
// ---------------------------------------------------------------------------

/// Load a template store from collection JSON.
///
/// Returns null if `collection_json` is null, is not a valid collection, or
/// contains a malformed or duplicate request. The caller must free the
/// returned pointer with `pmt_store_free`.
#[unsafe(no_mangle)]
pub extern "C" fn pmt_store_new(collection_json: *const c_char) -> *mut FfiTemplateStore {
    catch_unwind(|| {
        let Some(json) = (unsafe { read_str(collection_json) }) else {
            return std::ptr::null_mut();
        };
        match TemplateStore::from_collection_json(json) {
            Ok(store) => Box::into_raw(Box::new(FfiTemplateStore { inner: store })),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Number of templates in the store. 0 for null.
#[unsafe(no_mangle)]
pub extern "C" fn pmt_store_len(store: *const FfiTemplateStore) -> u32 {
    if store.is_null() {
        return 0;
    }
    catch_unwind(|| unsafe { &*store }.inner.len() as u32).unwrap_or(0)
}

/// Free a store created by `pmt_store_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pmt_store_free(store: *mut FfiTemplateStore) {
    if !store.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(store) });
        });
    }
}

// ---------------------------------------------------------------------------
// Environment lifecycle
// ---------------------------------------------------------------------------

/// Create an empty variable environment. Free with `pmt_env_free`.
#[unsafe(no_mangle)]
pub extern "C" fn pmt_env_new() -> *mut FfiEnvironment {
    catch_unwind(|| {
        Box::into_raw(Box::new(FfiEnvironment {
            inner: VariableEnvironment::new(),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Load an environment from a Postman environment export.
///
/// Returns null if `environment_json` is null or cannot be parsed.
#[unsafe(no_mangle)]
pub extern "C" fn pmt_env_from_json(environment_json: *const c_char) -> *mut FfiEnvironment {
    catch_unwind(|| {
        let Some(json) = (unsafe { read_str(environment_json) }) else {
            return std::ptr::null_mut();
        };
        match VariableEnvironment::from_postman_json(json) {
            Ok(env) => Box::into_raw(Box::new(FfiEnvironment { inner: env })),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Bind `key` to `value`, replacing any previous value.
///
/// Returns false if any argument is null or not UTF-8.
#[unsafe(no_mangle)]
pub extern "C" fn pmt_env_set(
    env: *mut FfiEnvironment,
    key: *const c_char,
    value: *const c_char,
) -> bool {
    catch_unwind(|| {
        if env.is_null() {
            return false;
        }
        let (Some(key), Some(value)) = (unsafe { read_str(key) }, unsafe { read_str(value) }) else {
            return false;
        };
        unsafe { &mut *env }.inner.set(key, value);
        true
    })
    .unwrap_or(false)
}

/// Free an environment. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pmt_env_free(env: *mut FfiEnvironment) {
    if !env.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(env) });
        });
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve the template called `name` against `env`.
///
/// `env` may be null, meaning an empty environment. Always returns a result
/// envelope; free it with `pmt_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn pmt_resolve(
    store: *const FfiTemplateStore,
    name: *const c_char,
    env: *const FfiEnvironment,
) -> *mut FfiResolveResult {
    catch_unwind(|| {
        if store.is_null() {
            return FfiResolveResult::null_arg("store");
        }
        let Some(name) = (unsafe { read_str(name) }) else {
            return FfiResolveResult::null_arg("name");
        };
        let store = unsafe { &*store };
        let empty = VariableEnvironment::new();
        let env = if env.is_null() {
            &empty
        } else {
            &unsafe { &*env }.inner
        };
        match store.inner.resolve(name, env) {
            Ok(req) => FfiResolveResult::ok(req),
            Err(e) => FfiResolveResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiResolveResult::panic("panic in pmt_resolve"))
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

/// Description of a snake_case payment status, e.g. `requires_capture`.
///
/// Returns null for an unknown status. Free with `pmt_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn pmt_status_description(status: *const c_char) -> *mut c_char {
    catch_unwind(|| {
        let Some(status) = (unsafe { read_str(status) }) else {
            return std::ptr::null_mut();
        };
        match status.parse::<PaymentStatus>() {
            Ok(s) => c_string(s.description()),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Verify the HMAC-SHA512 signature on a redirect URL.
///
/// Returns 1 if valid, 0 if the signature does not match, -1 for a null
/// argument, -2 if the URL carries no signature, -3 for any other error
/// (unparseable URL, unsupported algorithm, non-hex signature).
#[unsafe(no_mangle)]
pub extern "C" fn pmt_verify_redirect(url: *const c_char, key: *const c_char) -> i32 {
    catch_unwind(|| {
        let (Some(url), Some(key)) = (unsafe { read_str(url) }, unsafe { read_str(key) }) else {
            return -1;
        };
        match verify_redirect_signature(url, key) {
            Ok(true) => 1,
            Ok(false) => 0,
            Err(SignatureError::MissingSignature) => -2,
            Err(_) => -3,
        }
    })
    .unwrap_or(-3)
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a result returned by `pmt_resolve`, including its request.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pmt_free_result(result: *mut FfiResolveResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if !result.variable.is_null() {
            drop(unsafe { CString::from_raw(result.variable) });
        }
        if !result.request.is_null() {
            free_request(unsafe { Box::from_raw(result.request) });
        }
    });
}

fn free_request(req: Box<FfiResolvedRequest>) {
    for s in [req.url, req.path, req.body] {
        if !s.is_null() {
            drop(unsafe { CString::from_raw(s) });
        }
    }
    unsafe {
        free_pairs(req.query, req.query_len);
        free_pairs(req.headers, req.headers_len);
    }
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pmt_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
