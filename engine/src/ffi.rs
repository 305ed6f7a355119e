//! FFI layer for embedding the merge engine in a client app.
//!
//! All data crosses the boundary as JSON strings. Cards are validated against
//! [`CardSchema`](crate::CardSchema) before they reach the merge.
//!
//! # Memory Management
//!
//! - Strings returned by `lofi_*` functions are allocated by Rust
//! - Caller must free them with `lofi_string_free`
//! - Store pointers must be freed with `lofi_store_free`
//!
//! # Error Handling
//!
//! Functions return JSON with either:
//! - `{"ok": <result>}` on success
//! - `{"error": "<message>"}` on failure

use crate::{Card, CardId, CardStore, MergeConfig, MutableField, Resolver};
use std::ffi::{c_char, CStr, CString};
use std::ptr;

/// Result wrapper for FFI responses.
#[derive(serde::Serialize)]
#[serde(untagged)]
enum FfiResult<T: serde::Serialize> {
    Ok { ok: T },
    Err { error: String },
}

impl<T: serde::Serialize> FfiResult<T> {
    fn ok(value: T) -> Self {
        FfiResult::Ok { ok: value }
    }

    fn err(message: impl Into<String>) -> Self {
        FfiResult::Err {
            error: message.into(),
        }
    }

    fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"error":"serialization failed: {}"}}"#, e))
    }
}

/// Convert a Rust string to a C string pointer.
/// Caller must free with `lofi_string_free`.
fn to_c_string(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(cs) => cs.into_raw(),
        Err(_) => c"{\"error\":\"string contained null bytes\"}".to_owned().into_raw(),
    }
}

/// Convert a C string pointer to a Rust string.
/// Returns None if pointer is null or invalid UTF-8.
unsafe fn from_c_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Read and validate a card argument. `label` names it in error messages.
unsafe fn read_card(ptr: *const c_char, label: &str) -> Result<Card, String> {
    let json = from_c_string(ptr).ok_or_else(|| format!("invalid {label} string"))?;
    Card::from_json(&json).map_err(|e| format!("{label}: {e}"))
}

/// Read both cards and the optional config.
unsafe fn read_inputs(
    local_json: *const c_char,
    remote_json: *const c_char,
    config_json: *const c_char,
) -> Result<(Card, Card, Resolver), String> {
    let local = read_card(local_json, "local card")?;
    let remote = read_card(remote_json, "remote card")?;
    let config = read_config(config_json)?;
    Ok((local, remote, Resolver::new(config)))
}

/// Null means default configuration.
unsafe fn read_config(ptr: *const c_char) -> Result<MergeConfig, String> {
    match from_c_string(ptr) {
        None => Ok(MergeConfig::default()),
        Some(s) => serde_json::from_str(&s).map_err(|e| format!("config parse error: {e}")),
    }
}

/// Free a string allocated by the engine.
///
/// # Safety
/// - `s` must be a valid pointer from a `lofi_*` function
/// - Must not be called twice on the same pointer
#[no_mangle]
pub unsafe extern "C" fn lofi_string_free(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Merge a local card with its remote counterpart.
///
/// # Arguments
/// - `local_json`: JSON string of the local Card
/// - `remote_json`: JSON string of the remote Card
/// - `config_json`: JSON string of MergeConfig, or null for defaults
///
/// # Returns
/// JSON string: `{"ok": Card}` or `{"error": "message"}`
///
/// # Safety
/// - All arguments must be valid null-terminated C strings or null
/// - Caller must free the returned string with `lofi_string_free`
#[no_mangle]
pub unsafe extern "C" fn lofi_merge_cards(
    local_json: *const c_char,
    remote_json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    match read_inputs(local_json, remote_json, config_json) {
        Ok((local, remote, resolver)) => {
            to_c_string(FfiResult::ok(resolver.merge(&local, &remote)).to_json())
        }
        Err(e) => to_c_string(FfiResult::<()>::err(e).to_json()),
    }
}

/// Merge and report per-field resolution.
///
/// # Returns
/// JSON string: `{"ok": MergeOutcome}` or `{"error": "message"}`
///
/// # Safety
/// - All arguments must be valid null-terminated C strings or null
/// - Caller must free the returned string with `lofi_string_free`
#[no_mangle]
pub unsafe extern "C" fn lofi_resolve_cards(
    local_json: *const c_char,
    remote_json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    match read_inputs(local_json, remote_json, config_json) {
        Ok((local, remote, resolver)) => {
            to_c_string(FfiResult::ok(resolver.resolve(&local, &remote)).to_json())
        }
        Err(e) => to_c_string(FfiResult::<()>::err(e).to_json()),
    }
}

// ============================================================================
// Store Lifecycle
// ============================================================================

/// Create a new card store.
///
/// # Arguments
/// - `config_json`: JSON string of MergeConfig, or null for defaults
///
/// # Returns
/// Pointer to CardStore, or null if the config does not parse.
///
/// # Safety
/// - `config_json` must be a valid null-terminated C string or null
/// - Caller must free the returned pointer with `lofi_store_free`
#[no_mangle]
pub unsafe extern "C" fn lofi_store_new(config_json: *const c_char) -> *mut CardStore {
    match read_config(config_json) {
        Ok(config) => Box::into_raw(Box::new(CardStore::with_config(config))),
        Err(_) => ptr::null_mut(),
    }
}

/// Free a store.
///
/// # Safety
/// - `store` must be a valid pointer from `lofi_store_new`
/// - Must not be called twice on the same pointer
#[no_mangle]
pub unsafe extern "C" fn lofi_store_free(store: *mut CardStore) {
    if !store.is_null() {
        drop(Box::from_raw(store));
    }
}

// ============================================================================
// Store Operations
// ============================================================================

/// Insert or replace a card as-is.
///
/// # Returns
/// JSON string: `{"ok": null}` or `{"error": "message"}`
///
/// # Safety
/// - `store` must be a valid pointer from `lofi_store_new` or null
/// - `card_json` must be a valid null-terminated C string or null
/// - Caller must free the returned string with `lofi_string_free`
#[no_mangle]
pub unsafe extern "C" fn lofi_store_upsert(
    store: *mut CardStore,
    card_json: *const c_char,
) -> *mut c_char {
    let store = match store.as_mut() {
        Some(s) => s,
        None => return to_c_string(FfiResult::<()>::err("null store pointer").to_json()),
    };

    match read_card(card_json, "card") {
        Ok(card) => {
            store.upsert(card);
            to_c_string(FfiResult::ok(()).to_json())
        }
        Err(e) => to_c_string(FfiResult::<()>::err(e).to_json()),
    }
}

/// Get a card by ID.
///
/// # Returns
/// JSON string: `{"ok": Card}` or `{"ok": null}` or `{"error": "message"}`
///
/// # Safety
/// - `store` must be a valid pointer from `lofi_store_new` or null
/// - `id` must be a valid null-terminated C string or null
/// - Caller must free the returned string with `lofi_string_free`
#[no_mangle]
pub unsafe extern "C" fn lofi_store_get(store: *const CardStore, id: *const c_char) -> *mut c_char {
    let store = match store.as_ref() {
        Some(s) => s,
        None => return to_c_string(FfiResult::<()>::err("null store pointer").to_json()),
    };

    let id = match from_c_string(id) {
        Some(s) => CardId::new(s),
        None => return to_c_string(FfiResult::<()>::err("invalid card id").to_json()),
    };

    to_c_string(FfiResult::ok(store.get(&id)).to_json())
}

/// Merge an incoming remote card into the store.
///
/// # Returns
/// JSON string: `{"ok": MergeOutcome}` or `{"error": "message"}`
///
/// # Safety
/// - `store` must be a valid pointer from `lofi_store_new` or null
/// - `remote_json` must be a valid null-terminated C string or null
/// - Caller must free the returned string with `lofi_string_free`
#[no_mangle]
pub unsafe extern "C" fn lofi_store_apply_remote(
    store: *mut CardStore,
    remote_json: *const c_char,
) -> *mut c_char {
    let store = match store.as_mut() {
        Some(s) => s,
        None => return to_c_string(FfiResult::<()>::err("null store pointer").to_json()),
    };

    match read_card(remote_json, "remote card") {
        Ok(remote) => to_c_string(FfiResult::ok(store.apply_remote(remote)).to_json()),
        Err(e) => to_c_string(FfiResult::<()>::err(e).to_json()),
    }
}

/// Apply a local edit to one field.
///
/// # Arguments
/// - `id`: card ID
/// - `field`: mutable field name, e.g. `"title"`
/// - `value_json`: JSON value for the field
/// - `timestamp_ms`: edit time in milliseconds since epoch
///
/// # Returns
/// JSON string: `{"ok": null}` or `{"error": "message"}`
///
/// # Safety
/// - `store` must be a valid pointer from `lofi_store_new` or null
/// - `id`, `field` and `value_json` must be valid null-terminated C strings or null
/// - Caller must free the returned string with `lofi_string_free`
#[no_mangle]
pub unsafe extern "C" fn lofi_store_edit(
    store: *mut CardStore,
    id: *const c_char,
    field: *const c_char,
    value_json: *const c_char,
    timestamp_ms: i64,
) -> *mut c_char {
    let store = match store.as_mut() {
        Some(s) => s,
        None => return to_c_string(FfiResult::<()>::err("null store pointer").to_json()),
    };

    let id = match from_c_string(id) {
        Some(s) => CardId::new(s),
        None => return to_c_string(FfiResult::<()>::err("invalid card id").to_json()),
    };

    let field = match from_c_string(field).as_deref().and_then(MutableField::from_name) {
        Some(f) => f,
        None => return to_c_string(FfiResult::<()>::err("unknown field").to_json()),
    };

    let value: serde_json::Value = match from_c_string(value_json).map(|s| serde_json::from_str(&s)) {
        Some(Ok(v)) => v,
        Some(Err(e)) => {
            return to_c_string(FfiResult::<()>::err(format!("parse error: {}", e)).to_json())
        }
        None => return to_c_string(FfiResult::<()>::err("invalid value JSON").to_json()),
    };

    let timestamp = match chrono::DateTime::from_timestamp_millis(timestamp_ms) {
        Some(t) => t,
        None => return to_c_string(FfiResult::<()>::err("timestamp out of range").to_json()),
    };

    match store.edit(&id, field, value, timestamp) {
        Ok(()) => to_c_string(FfiResult::ok(()).to_json()),
        Err(e) => to_c_string(FfiResult::<()>::err(e.to_string()).to_json()),
    }
}

/// Record that a card has been pushed and confirmed.
///
/// # Returns
/// JSON string: `{"ok": null}` or `{"error": "message"}`
///
/// # Safety
/// - `store` must be a valid pointer from `lofi_store_new` or null
/// - `id` must be a valid null-terminated C string or null
/// - Caller must free the returned string with `lofi_string_free`
#[no_mangle]
pub unsafe extern "C" fn lofi_store_mark_synced(
    store: *mut CardStore,
    id: *const c_char,
) -> *mut c_char {
    let store = match store.as_mut() {
        Some(s) => s,
        None => return to_c_string(FfiResult::<()>::err("null store pointer").to_json()),
    };

    let id = match from_c_string(id) {
        Some(s) => CardId::new(s),
        None => return to_c_string(FfiResult::<()>::err("invalid card id").to_json()),
    };

    match store.mark_synced(&id) {
        Ok(()) => to_c_string(FfiResult::ok(()).to_json()),
        Err(e) => to_c_string(FfiResult::<()>::err(e.to_string()).to_json()),
    }
}

/// Get the engine version.
///
/// # Returns
/// Static string with version (do not free).
#[no_mangle]
pub extern "C" fn lofi_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}
