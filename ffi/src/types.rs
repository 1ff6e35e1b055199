//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible representations:
//! `*mut c_char` instead of `String`, a pointer plus length instead of a map,
//! and enums with explicit discriminants. Conversion functions live here to
//! keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use ib_foundation::ApiError;

/// Opaque handle to a `RequestBuilder`. Every mutator hands back a new
/// handle; the one passed in stays valid and unchanged.
pub struct FfiRequestBuilder {
    pub(crate) inner: ib_foundation::RequestBuilder,
}

impl FfiRequestBuilder {
    pub(crate) fn into_raw(inner: ib_foundation::RequestBuilder) -> *mut Self {
        Box::into_raw(Box::new(FfiRequestBuilder { inner }))
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// A finalized request: URL plus headers, sorted by field name.
///
/// Returned by `ib_builder_build`. The C caller executes the request and
/// may pass the response back through `ib_check_response`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    ///
    /// Returns `None` if any string holds an interior NUL byte.
    pub(crate) fn from_core(req: ib_foundation::HttpRequest) -> Option<*mut Self> {
        let mut ffi_headers = Vec::with_capacity(req.headers.len());
        for (k, v) in req.headers {
            match (CString::new(k), CString::new(v)) {
                (Ok(key), Ok(value)) => ffi_headers.push(FfiHeader {
                    key: key.into_raw(),
                    value: value.into_raw(),
                }),
                _ => {
                    free_headers(ffi_headers);
                    return None;
                }
            }
        }
        let url = match CString::new(req.url) {
            Ok(url) => url.into_raw(),
            Err(_) => {
                free_headers(ffi_headers);
                return None;
            }
        };

        let headers_len = ffi_headers.len() as u32;
        let headers = if ffi_headers.is_empty() {
            std::ptr::null_mut()
        } else {
            // Length and capacity must match for `Vec::from_raw_parts` on free.
            let mut boxed = ffi_headers.into_boxed_slice();
            let ptr = boxed.as_mut_ptr();
            std::mem::forget(boxed);
            ptr
        };

        Some(Box::into_raw(Box::new(FfiHttpRequest {
            url,
            headers,
            headers_len,
        })))
    }
}

pub(crate) fn free_headers(headers: Vec<FfiHeader>) {
    for h in headers {
        if !h.key.is_null() {
            drop(unsafe { CString::from_raw(h.key) });
        }
        if !h.value.is_null() {
            drop(unsafe { CString::from_raw(h.value) });
        }
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller fills this in after executing a request and passes a
/// pointer to `ib_check_response`. The FFI layer reads but does not free
/// these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    MalformedUrl = 1,
    Transport = 2,
    BadServerResponse = 3,
    Decode = 4,
    Configuration = 5,
    Panic = 6,
    NullArg = 7,
}

/// Result envelope for response checks.
///
/// On success `error_code` is `Ok` and `error_message` is null. On failure
/// `error_code` names the category and `error_message` is a human-readable
/// C string. `http_status` echoes the status that was checked.
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
}

impl FfiResult {
    pub(crate) fn ok(http_status: u16) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status,
        }))
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError, http_status: u16) -> *mut Self {
        let error_code = match &err {
            ApiError::MalformedUrl { .. } => FfiErrorCode::MalformedUrl,
            ApiError::Transport(_) => FfiErrorCode::Transport,
            ApiError::BadServerResponse { .. } => FfiErrorCode::BadServerResponse,
            ApiError::Decode(_) => FfiErrorCode::Decode,
            ApiError::Configuration(_) => FfiErrorCode::Configuration,
        };
        Self::error(error_code, &err.to_string(), http_status)
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::error(FfiErrorCode::NullArg, &format!("null argument: {name}"), 0)
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::error(FfiErrorCode::Panic, msg, 0)
    }

    fn error(error_code: FfiErrorCode, msg: &str, http_status: u16) -> *mut Self {
        let message = CString::new(msg.replace('\0', " ")).unwrap_or_default();
        Box::into_raw(Box::new(FfiResult {
            error_code,
            error_message: message.into_raw(),
            http_status,
        }))
    }
}
