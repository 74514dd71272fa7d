//! Marshalling between managed records and native fixed-layout structs.
//!
//! A marshaller is a stateless strategy tying one managed type to one
//! native type. Fixed-size fields copy directly; variable-length fields
//! (strings) need separately owned native memory, allocated on the marshal
//! path and released on the unmarshal path so the native side never holds
//! a reference past the managed value's lifetime.

use std::ffi::{CStr, CString, c_char};

use tracing::warn;

/// Conversion strategy between a managed record `M` and its native
/// counterpart `N`.
///
/// Implementations carry no mutable state and may be shared across
/// threads. Both directions are total over well-formed inputs.
pub trait Marshaller<M, N>: Send + Sync {
    /// Copy a managed record into a native struct, allocating owned
    /// native memory for variable-length fields.
    fn marshal(&self, managed: &M, native: &mut N);

    /// Rebuild a managed record from a native struct, releasing any
    /// native memory the marshal path allocated.
    fn unmarshal(&self, native: &mut N) -> M;
}

/// Allocate a native NUL-terminated copy of `value`.
///
/// Interior NULs cannot be represented; the string is truncated at the
/// first one. Ownership of the allocation transfers to the caller, who
/// must release it with [`release_native_string`].
pub fn string_to_native(value: &str) -> *mut c_char {
    let bytes = match value.as_bytes().iter().position(|&b| b == 0) {
        Some(nul) => {
            warn!("truncating string at interior NUL for native marshalling");
            &value.as_bytes()[..nul]
        }
        None => value.as_bytes(),
    };
    // Just verified there is no interior NUL in `bytes`
    let owned = unsafe { CString::from_vec_unchecked(bytes.to_vec()) };
    owned.into_raw()
}

/// Read a managed copy of a native string without taking ownership.
///
/// Returns `None` for a null pointer. Invalid UTF-8 is replaced
/// lossily; wire type names are ASCII in practice.
///
/// # Safety
/// `ptr` must be null or point to a valid NUL-terminated string.
pub unsafe fn string_from_native(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let c_str = unsafe { CStr::from_ptr(ptr) };
    Some(c_str.to_string_lossy().into_owned())
}

/// Release a native string previously produced by [`string_to_native`].
///
/// Null pointers are ignored, so unmarshal paths can release
/// unconditionally.
///
/// # Safety
/// `ptr` must be null or a pointer obtained from [`string_to_native`]
/// that has not been released yet.
pub unsafe fn release_native_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_ownership_round_trip() {
        let ptr = string_to_native("Net::AppId");
        let read = unsafe { string_from_native(ptr) };
        assert_eq!(read.as_deref(), Some("Net::AppId"));
        unsafe { release_native_string(ptr) };
    }

    #[test]
    fn null_pointer_reads_as_none() {
        assert_eq!(unsafe { string_from_native(std::ptr::null()) }, None);
        // releasing null is a no-op
        unsafe { release_native_string(std::ptr::null_mut()) };
    }

    #[test]
    fn interior_nul_truncates() {
        let ptr = string_to_native("ab\0cd");
        let read = unsafe { string_from_native(ptr) };
        assert_eq!(read.as_deref(), Some("ab"));
        unsafe { release_native_string(ptr) };
    }

    // A representative fixed-layout pair exercising the trait surface.
    struct ManagedSample {
        id: i32,
        label: String,
    }

    #[repr(C)]
    struct NativeSample {
        id: i32,
        label: *mut c_char,
    }

    struct SampleMarshaller;

    impl Marshaller<ManagedSample, NativeSample> for SampleMarshaller {
        fn marshal(&self, managed: &ManagedSample, native: &mut NativeSample) {
            native.id = managed.id;
            native.label = string_to_native(&managed.label);
        }

        fn unmarshal(&self, native: &mut NativeSample) -> ManagedSample {
            let label = unsafe { string_from_native(native.label) }.unwrap_or_default();
            unsafe { release_native_string(native.label) };
            native.label = std::ptr::null_mut();
            ManagedSample {
                id: native.id,
                label,
            }
        }
    }

    #[test]
    fn marshal_unmarshal_round_trip() {
        let marshaller = SampleMarshaller;
        let managed = ManagedSample {
            id: 7,
            label: "front".to_string(),
        };
        let mut native = NativeSample {
            id: 0,
            label: std::ptr::null_mut(),
        };

        marshaller.marshal(&managed, &mut native);
        assert_eq!(native.id, 7);
        assert!(!native.label.is_null());

        let back = marshaller.unmarshal(&mut native);
        assert_eq!(back.id, 7);
        assert_eq!(back.label, "front");
        assert!(native.label.is_null());
    }
}
