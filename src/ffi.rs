//! FFI bindings for Symbiome Core
//!
//! This module provides C-compatible functions for calling the core from the
//! dashboard shell. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using
//! `symbiome_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::aggregator::ResilienceAggregator;
use crate::config::AggregatorConfig;
use crate::readings::ReadingParser;
use crate::score::ScoreReport;
use crate::types::SessionData;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Score a JSON array of session records.
///
/// # Safety
/// - `history_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `symbiome_free_string`.
/// - Returns NULL on error; call `symbiome_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn symbiome_aggregate_score(history_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(history_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let history: Vec<SessionData> = match serde_json::from_str(&json_str) {
        Ok(h) => h,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    match serde_json::to_string(&ScoreReport::from_history(&history)) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful API
// ============================================================================

/// Opaque handle to a ResilienceAggregator
pub struct SymbiomeAggregatorHandle {
    aggregator: ResilienceAggregator,
}

/// Create a new aggregator.
///
/// A negative `seed` draws the outcome policy seed from OS entropy.
///
/// # Safety
/// - Returns a pointer to a newly allocated aggregator.
/// - Must be freed with `symbiome_aggregator_free`.
#[no_mangle]
pub unsafe extern "C" fn symbiome_aggregator_new(seed: i64) -> *mut SymbiomeAggregatorHandle {
    clear_last_error();

    let config = AggregatorConfig {
        seed: u64::try_from(seed).ok(),
        ..Default::default()
    };

    let handle = Box::new(SymbiomeAggregatorHandle {
        aggregator: ResilienceAggregator::with_config(config),
    });
    Box::into_raw(handle)
}

/// Free an aggregator.
///
/// # Safety
/// - `aggregator` must be a valid pointer returned by `symbiome_aggregator_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn symbiome_aggregator_free(aggregator: *mut SymbiomeAggregatorHandle) {
    if !aggregator.is_null() {
        let mut handle = Box::from_raw(aggregator);
        handle.aggregator.teardown();
    }
}

/// Complete a session from a JSON array of readings.
///
/// Returns the session record as JSON, or the string `null` when the array
/// is empty (no state change).
///
/// # Safety
/// - `aggregator` must be a valid pointer returned by `symbiome_aggregator_new`.
/// - `readings_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `symbiome_free_string`.
/// - Returns NULL on error; call `symbiome_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn symbiome_aggregator_complete_session(
    aggregator: *mut SymbiomeAggregatorHandle,
    readings_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if aggregator.is_null() {
        set_last_error("Null aggregator pointer");
        return ptr::null_mut();
    }

    let handle = &mut *aggregator;

    let json_str = match cstr_to_string(readings_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let readings = match ReadingParser::parse_array(&json_str) {
        Ok(r) => r,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    let session = handle.aggregator.complete_session(&readings);
    match serde_json::to_string(&session) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Score the aggregator's history.
///
/// # Safety
/// - `aggregator` must be a valid pointer returned by `symbiome_aggregator_new`.
/// - Returns a newly allocated string that must be freed with `symbiome_free_string`.
/// - Returns NULL on error; call `symbiome_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn symbiome_aggregator_score(
    aggregator: *mut SymbiomeAggregatorHandle,
) -> *mut c_char {
    clear_last_error();

    if aggregator.is_null() {
        set_last_error("Null aggregator pointer");
        return ptr::null_mut();
    }

    let handle = &*aggregator;
    let report = ScoreReport::from_history(handle.aggregator.sessions());

    match serde_json::to_string(&report) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Save the aggregator's store to JSON.
///
/// # Safety
/// - `aggregator` must be a valid pointer returned by `symbiome_aggregator_new`.
/// - Returns a newly allocated string that must be freed with `symbiome_free_string`.
/// - Returns NULL on error; call `symbiome_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn symbiome_aggregator_save_state(
    aggregator: *mut SymbiomeAggregatorHandle,
) -> *mut c_char {
    clear_last_error();

    if aggregator.is_null() {
        set_last_error("Null aggregator pointer");
        return ptr::null_mut();
    }

    let handle = &*aggregator;

    match handle.aggregator.save_state() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Load the aggregator's store from JSON.
///
/// # Safety
/// - `aggregator` must be a valid pointer returned by `symbiome_aggregator_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
/// - On error, call `symbiome_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn symbiome_aggregator_load_state(
    aggregator: *mut SymbiomeAggregatorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if aggregator.is_null() {
        set_last_error("Null aggregator pointer");
        return -1;
    }

    let handle = &mut *aggregator;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    match handle.aggregator.load_state(&json_str) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Symbiome functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Symbiome function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn symbiome_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Symbiome function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn symbiome_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn symbiome_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readings_json() -> CString {
        CString::new(r#"[{"hrv": 80, "gsr": 20, "facialCalm": 90}]"#).unwrap()
    }

    #[test]
    fn test_ffi_aggregate_score() {
        let history = CString::new("[]").unwrap();

        unsafe {
            let result = symbiome_aggregate_score(history.as_ptr());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            let report: serde_json::Value = serde_json::from_str(result_str).unwrap();
            assert_eq!(report["score"]["overall"], 65.0);

            symbiome_free_string(result);
        }
    }

    #[test]
    fn test_ffi_aggregator_lifecycle() {
        unsafe {
            let aggregator = symbiome_aggregator_new(7);
            assert!(!aggregator.is_null());

            let readings = readings_json();
            let session = symbiome_aggregator_complete_session(aggregator, readings.as_ptr());
            assert!(!session.is_null());
            let session_str = CStr::from_ptr(session).to_str().unwrap();
            let value: serde_json::Value = serde_json::from_str(session_str).unwrap();
            assert!((value["sri"].as_f64().unwrap() - 83.5).abs() < 1e-9);
            symbiome_free_string(session);

            let score = symbiome_aggregator_score(aggregator);
            assert!(!score.is_null());
            let score_str = CStr::from_ptr(score).to_str().unwrap();
            let report: serde_json::Value = serde_json::from_str(score_str).unwrap();
            assert_eq!(report["session_count"], 1);
            symbiome_free_string(score);

            let state = symbiome_aggregator_save_state(aggregator);
            assert!(!state.is_null());

            let aggregator2 = symbiome_aggregator_new(-1);
            assert_eq!(symbiome_aggregator_load_state(aggregator2, state), 0);

            symbiome_free_string(state);
            symbiome_aggregator_free(aggregator);
            symbiome_aggregator_free(aggregator2);
        }
    }

    #[test]
    fn test_ffi_empty_readings_return_null_json() {
        unsafe {
            let aggregator = symbiome_aggregator_new(1);
            let empty = CString::new("[]").unwrap();

            let result = symbiome_aggregator_complete_session(aggregator, empty.as_ptr());
            assert!(!result.is_null());
            assert_eq!(CStr::from_ptr(result).to_str().unwrap(), "null");

            symbiome_free_string(result);
            symbiome_aggregator_free(aggregator);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid = CString::new("not json").unwrap();
            let result = symbiome_aggregate_score(invalid.as_ptr());
            assert!(result.is_null());

            let error = symbiome_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = symbiome_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
