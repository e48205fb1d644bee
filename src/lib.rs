//! # Shortlist Core
//!
//! Durable, toggle-driven shortlists for a B2B matchmaking front end: the
//! user's favorite manufacturers and the side-by-side compare list. Built on
//! LMDB so a shortlist survives reloads, restarts and hot restarts, and exposed
//! over a C-compatible FFI for whatever UI host renders the cards.
//!
//! ## Features
//!
//! - **Toggle semantics**: one call adds an absent listing or removes a present one
//! - **Capacity limits**: the compare list holds at most three listings
//! - **Atomic persistence**: every completed change is committed before the call returns
//! - **Forgiving startup**: a missing or corrupt slot starts as an empty list
//! - **Observers**: collaborators can subscribe to completed changes
//!
//! ## Quick Start
//!
//! ```no_run
//! use shortlist_core::{create_store, toggle_entity, contains_entity};
//! use std::ffi::CString;
//!
//! let name = CString::new("shortlists").unwrap();
//! let key = CString::new("compareManufacturers").unwrap();
//! let handle = create_store(name.as_ptr(), key.as_ptr(), 3);
//!
//! let listing = CString::new(r#"{"id":1,"name":"Acme Plastics"}"#).unwrap();
//! let result = toggle_entity(handle, listing.as_ptr());
//! assert!(contains_entity(handle, 1));
//! ```
//!
//! ## FFI Functions
//!
//! - [`create_store`] - Open a collection on a slot database
//! - [`toggle_entity`] - Add or remove a record
//! - [`contains_entity`] - Membership check
//! - [`list_entities`] - All records in insertion order
//! - [`clear_entities`] - Empty the collection
//! - [`reset_store`] - Empty the collection and delete its slot
//! - [`reload_entities`] - Re-read the slot written by another session
//! - [`close_store`] - Flush and release a handle
//! - [`free_c_string`] - Release a string returned by this library

pub mod app_response;
pub mod config;
pub mod entity;
pub mod lmdb_slots;
pub mod notice;
pub mod shortlists;
pub mod slot;
pub mod store;

pub use crate::app_response::AppResponse;

use crate::config::CollectionConfig;
use crate::entity::{Entity, EntityId};
use crate::lmdb_slots::LmdbSlots;
use crate::notice::Notice;
use crate::store::{ToggleOutcome, ToggledCollection};

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use log::{info, warn};
use serde::Serialize;

/// Collection type behind every FFI handle.
pub type CollectionHandle = ToggledCollection<Entity, LmdbSlots>;

#[derive(Serialize)]
struct ToggleReport<'a> {
    outcome: ToggleOutcome,
    message: String,
    notice: &'a Notice,
    len: usize,
}

/// Opens a collection stored in the slot database `<name>.lmdb`.
///
/// # Parameters
///
/// * `name` - Null-terminated database name
/// * `key` - Null-terminated slot key, e.g. `favoriteManufacturers`
/// * `capacity` - Maximum item count; zero or negative means unbounded
///
/// # Returns
///
/// A handle to pass to the other functions, or null on failure. Release it
/// with [`close_store`].
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use shortlist_core::create_store;
///
/// let name = CString::new("shortlists").unwrap();
/// let key = CString::new("favoriteManufacturers").unwrap();
/// let handle = create_store(name.as_ptr(), key.as_ptr(), 0);
///
/// if !handle.is_null() {
///     // Store ready
/// }
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_store(name: *const c_char, key: *const c_char, capacity: i32) -> *mut CollectionHandle {
    let name_str = match c_ptr_to_str(name) {
        Some(s) => s,
        None => {
            warn!("Null or invalid name passed to create_store");
            return std::ptr::null_mut();
        }
    };

    let key_str = match c_ptr_to_str(key) {
        Some(s) if !s.is_empty() => s,
        _ => {
            warn!("Null, empty or invalid key passed to create_store");
            return std::ptr::null_mut();
        }
    };

    let slots = match LmdbSlots::init(name_str) {
        Ok(slots) => slots,
        Err(e) => {
            warn!("❌ Failed to open slot database '{}': {}", name_str, e);
            return std::ptr::null_mut();
        }
    };

    let config = CollectionConfig::for_key(key_str).with_capacity(capacity.max(0) as usize);
    let collection = ToggledCollection::initialize(slots, config);
    info!("✅ Collection '{}' opened with {} item(s)", key_str, collection.len());

    Box::into_raw(Box::new(collection))
}

/// Toggles a record given as JSON (`{"id": 1, ...}`).
///
/// Returns an `Ok` envelope whose payload is
/// `{"outcome": "added" | "removed" | "rejected_capacity", "message", "notice", "len"}`.
/// A full collection is not an error; it answers `rejected_capacity`.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use shortlist_core::{create_store, toggle_entity};
///
/// let name = CString::new("shortlists").unwrap();
/// let key = CString::new("compareManufacturers").unwrap();
/// let handle = create_store(name.as_ptr(), key.as_ptr(), 3);
///
/// let json = CString::new(r#"{"id":4,"name":"Delta Metals","rating":4.6}"#).unwrap();
/// let result = toggle_entity(handle, json.as_ptr());
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn toggle_entity(handle: *mut CollectionHandle, json_ptr: *const c_char) -> *const c_char {
    let collection = match unsafe { handle.as_mut() } {
        Some(c) => c,
        None => {
            let error = AppResponse::BadRequest("Null handle passed to toggle_entity".to_string());
            return response_to_c_string(&error);
        }
    };

    let json_str = match c_ptr_to_string(json_ptr, "JSON") {
        Ok(json) => json,
        Err(err) => return err,
    };

    let entity: Entity = match serde_json::from_str(&json_str) {
        Ok(e) => e,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid entity JSON: {e}"));
            return response_to_c_string(&error);
        }
    };

    match collection.toggle(entity) {
        Ok(outcome) => {
            let notice = Notice::for_outcome(outcome, collection.config());
            let report = ToggleReport {
                outcome,
                message: notice.to_string(),
                notice: &notice,
                len: collection.len(),
            };
            json_response(&report)
        }
        Err(e) => response_to_c_string(&e),
    }
}

/// Whether a record with `id` is present. A null handle answers `false`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn contains_entity(handle: *const CollectionHandle, id: EntityId) -> bool {
    match unsafe { handle.as_ref() } {
        Some(collection) => collection.contains(id),
        None => {
            warn!("Null handle passed to contains_entity");
            false
        }
    }
}

/// Returns every record as a JSON array, in insertion order.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn list_entities(handle: *const CollectionHandle) -> *const c_char {
    match unsafe { handle.as_ref() } {
        Some(collection) => json_response(collection.list()),
        None => {
            let error = AppResponse::BadRequest("Null handle passed to list_entities".to_string());
            response_to_c_string(&error)
        }
    }
}

/// Empties the collection and its slot.
///
/// The `Ok` payload is the human-readable notice.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn clear_entities(handle: *mut CollectionHandle) -> *const c_char {
    let collection = match unsafe { handle.as_mut() } {
        Some(c) => c,
        None => {
            let error = AppResponse::BadRequest("Null handle passed to clear_entities".to_string());
            return response_to_c_string(&error);
        }
    };

    match collection.clear() {
        Ok(()) => {
            let notice = Notice::cleared(collection.config());
            response_to_c_string(&AppResponse::success(notice.to_string()))
        }
        Err(e) => response_to_c_string(&e),
    }
}

/// Empties the collection and deletes its slot from the database.
///
/// A store opened on the same key afterwards starts as a first run.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn reset_store(handle: *mut CollectionHandle) -> *const c_char {
    let collection = match unsafe { handle.as_mut() } {
        Some(c) => c,
        None => {
            let error = AppResponse::BadRequest("Null handle passed to reset_store".to_string());
            return response_to_c_string(&error);
        }
    };

    match collection.purge() {
        Ok(true) => response_to_c_string(&AppResponse::success(format!(
            "Slot '{}' was reset successfully",
            collection.key()
        ))),
        Ok(false) => {
            let not_found = AppResponse::NotFound(format!("No slot stored for '{}'", collection.key()));
            response_to_c_string(&not_found)
        }
        Err(e) => response_to_c_string(&e),
    }
}

/// Re-reads the slot and returns the resulting records as a JSON array.
///
/// Use after another window or process may have written the same slot.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn reload_entities(handle: *mut CollectionHandle) -> *const c_char {
    match unsafe { handle.as_mut() } {
        Some(collection) => {
            collection.reload();
            json_response(collection.list())
        }
        None => {
            let error = AppResponse::BadRequest("Null handle passed to reload_entities".to_string());
            response_to_c_string(&error)
        }
    }
}

/// Flushes the slot database and releases the handle.
///
/// The handle must not be used afterwards.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use shortlist_core::{create_store, close_store};
///
/// let name = CString::new("shortlists").unwrap();
/// let key = CString::new("favoriteManufacturers").unwrap();
/// let handle = create_store(name.as_ptr(), key.as_ptr(), 0);
///
/// // Before hot restart or application shutdown
/// let result = close_store(handle);
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_store(handle: *mut CollectionHandle) -> *const c_char {
    if handle.is_null() {
        let error = AppResponse::BadRequest("Null handle passed to close_store".to_string());
        return response_to_c_string(&error);
    }

    let collection = unsafe { Box::from_raw(handle) };
    let key = collection.key().to_string();
    if let Err(e) = collection.slot().sync() {
        warn!("Failed to sync slot database for '{}': {}", key, e);
    }
    drop(collection);

    info!("Collection '{}' closed", key);
    response_to_c_string(&AppResponse::success(format!("Collection '{key}' closed successfully")))
}

/// Releases a string returned by any function of this library.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_c_string(ptr: *const c_char) {
    if ptr.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(ptr as *mut c_char) });
}

/// Serializes `value` and wraps it in an `Ok` envelope.
fn json_response<T: Serialize + ?Sized>(value: &T) -> *const c_char {
    match serde_json::to_string(value) {
        Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
        Err(e) => {
            let error = AppResponse::from(e);
            response_to_c_string(&error)
        }
    }
}

/// Converts an [`AppResponse`] to a heap C string owned by the caller.
///
/// Returns null if serialization or C string creation fails.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

fn c_ptr_to_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Converts a C string pointer to a `String`, or to a ready error envelope.
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}
