//! C-ABI wrapper around `ib-foundation`'s request builder.
//!
//! # Overview
//! Lets a native host (Swift, C) build requests with the same path
//! normalization, query encoding and header rules as the Rust side, then
//! execute them with its own HTTP stack and hand the status and body back
//! for checking.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Builder handles are immutable: `ib_builder_add_*` return a new handle
//!   and leave the input untouched, so a host can keep a base handle and
//!   branch from it.
//! - The C caller owns all returned pointers and must call the matching
//!   `ib_*_free` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;

use ib_foundation::builder::DEFAULT_SCHEME;
use ib_foundation::service::parse_response;
use ib_foundation::{HttpResponse, JsonDecoder, RequestBuilder, RequestBuilding};

use types::*;

/// Borrow a C string as UTF-8. `None` for null or invalid UTF-8.
fn read_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Like `read_str`, but a null pointer means `default`.
fn read_str_or<'a>(ptr: *const c_char, default: &'a str) -> Option<&'a str> {
    if ptr.is_null() {
        Some(default)
    } else {
        read_str(ptr)
    }
}

// ---------------------------------------------------------------------------
// Builder lifecycle
// ---------------------------------------------------------------------------

/// Create a new request builder.
///
/// `scheme` may be null (defaults to `https`); `base_path` may be null
/// (defaults to empty). Returns null if `host` or `path` is null or any
/// argument is not valid UTF-8. Free with `ib_builder_free`.
#[unsafe(no_mangle)]
pub extern "C" fn ib_builder_new(
    scheme: *const c_char,
    host: *const c_char,
    base_path: *const c_char,
    path: *const c_char,
) -> *mut FfiRequestBuilder {
    catch_unwind(|| {
        let (Some(scheme), Some(host), Some(base_path), Some(path)) = (
            read_str_or(scheme, DEFAULT_SCHEME),
            read_str(host),
            read_str_or(base_path, ""),
            read_str(path),
        ) else {
            return std::ptr::null_mut();
        };
        FfiRequestBuilder::into_raw(RequestBuilder::with_base_path(scheme, host, base_path, path))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a builder handle. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn ib_builder_free(builder: *mut FfiRequestBuilder) {
    if !builder.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(builder) });
        });
    }
}

/// Return a new builder with `port` set.
#[unsafe(no_mangle)]
pub extern "C" fn ib_builder_set_port(
    builder: *const FfiRequestBuilder,
    port: u16,
) -> *mut FfiRequestBuilder {
    catch_unwind(|| {
        if builder.is_null() {
            return std::ptr::null_mut();
        }
        let builder = unsafe { &*builder };
        FfiRequestBuilder::into_raw(builder.inner.with_port(port))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Return a new builder with a query item appended.
///
/// A null `value` appends a flag-style item (`?name`). Returns null if
/// `builder` or `name` is null.
#[unsafe(no_mangle)]
pub extern "C" fn ib_builder_add_query_item(
    builder: *const FfiRequestBuilder,
    name: *const c_char,
    value: *const c_char,
) -> *mut FfiRequestBuilder {
    catch_unwind(|| {
        if builder.is_null() {
            return std::ptr::null_mut();
        }
        let Some(name) = read_str(name) else {
            return std::ptr::null_mut();
        };
        let value = if value.is_null() {
            None
        } else {
            match read_str(value) {
                Some(v) => Some(v),
                None => return std::ptr::null_mut(),
            }
        };
        let builder = unsafe { &*builder };
        match builder.inner.add_query_item(name, value) {
            Some(next) => FfiRequestBuilder::into_raw(next),
            None => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Return a new builder with `field` set to `value`, replacing any earlier
/// value for the same field.
#[unsafe(no_mangle)]
pub extern "C" fn ib_builder_add_header(
    builder: *const FfiRequestBuilder,
    field: *const c_char,
    value: *const c_char,
) -> *mut FfiRequestBuilder {
    catch_unwind(|| {
        if builder.is_null() {
            return std::ptr::null_mut();
        }
        let (Some(field), Some(value)) = (read_str(field), read_str(value)) else {
            return std::ptr::null_mut();
        };
        let builder = unsafe { &*builder };
        FfiRequestBuilder::into_raw(builder.inner.add_header(field, value))
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Finalizing
// ---------------------------------------------------------------------------

/// Finalize a builder into a request.
///
/// Returns null if `builder` is null or its parts cannot form a valid URL.
/// Free with `ib_request_free`.
#[unsafe(no_mangle)]
pub extern "C" fn ib_builder_build(builder: *const FfiRequestBuilder) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if builder.is_null() {
            return std::ptr::null_mut();
        }
        let builder = unsafe { &*builder };
        builder
            .inner
            .build()
            .and_then(FfiHttpRequest::from_core)
            .unwrap_or(std::ptr::null_mut())
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a request returned by `ib_builder_build`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn ib_request_free(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        if !req.url.is_null() {
            drop(unsafe { CString::from_raw(req.url) });
        }
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Vec::from_raw_parts(req.headers, req.headers_len as usize, req.headers_len as usize)
            };
            free_headers(headers);
        }
    });
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Whether `status` is in the `[200, 300)` success range.
#[unsafe(no_mangle)]
pub extern "C" fn ib_response_is_success(status: u16) -> bool {
    ib_foundation::http::is_success_status(status)
}

/// Check a response the host executed itself: the status must be in
/// `[200, 300)` and the body must be well-formed JSON.
///
/// A null body is treated as empty. Free with `ib_result_free`.
#[unsafe(no_mangle)]
pub extern "C" fn ib_check_response(response: *const FfiHttpResponse) -> *mut FfiResult {
    catch_unwind(|| {
        if response.is_null() {
            return FfiResult::null_arg("response");
        }
        let resp = unsafe { &*response };
        let body = if resp.body.is_null() {
            String::new()
        } else {
            unsafe { CStr::from_ptr(resp.body) }
                .to_string_lossy()
                .into_owned()
        };
        let core_resp = HttpResponse {
            status: resp.status,
            headers: Vec::new(),
            body,
        };
        match parse_response::<serde_json::Value>(&JsonDecoder::new(), &core_resp) {
            Ok(_) => FfiResult::ok(resp.status),
            Err(e) => FfiResult::from_error(e, resp.status),
        }
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in ib_check_response"))
}

/// Free a result returned by `ib_check_response`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn ib_result_free(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
    });
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
