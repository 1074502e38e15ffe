//! Helpers for turning raw trampoline parameters into recorded arguments.

use std::ffi::{c_char, CStr};
use std::fmt::Debug;

use apidump_core::ArgValue;
use ash::vk;

/// Read an array of C strings (extension or layer names).
pub(crate) unsafe fn read_string_array(ptrs: *const *const c_char, count: u32) -> Vec<String> {
    slice(ptrs, count)
        .iter()
        .filter(|p| !p.is_null())
        .map(|p| CStr::from_ptr(*p).to_string_lossy().into_owned())
        .collect()
}

pub(crate) unsafe fn string_list(ptrs: *const *const c_char, count: u32) -> ArgValue {
    ArgValue::List(
        read_string_array(ptrs, count)
            .into_iter()
            .map(ArgValue::Text)
            .collect(),
    )
}

pub(crate) unsafe fn c_string(p: *const c_char) -> ArgValue {
    if p.is_null() {
        ArgValue::Null
    } else {
        ArgValue::Text(CStr::from_ptr(p).to_string_lossy().into_owned())
    }
}

/// View a `(pointer, count)` pair as a slice; null or empty gives `&[]`.
pub(crate) unsafe fn slice<'a, T>(ptr: *const T, count: u32) -> &'a [T] {
    if ptr.is_null() || count == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(ptr, count as usize)
    }
}

/// Value behind an optional `uint32_t*` in/out count.
pub(crate) unsafe fn count(p: *const u32) -> ArgValue {
    if p.is_null() {
        ArgValue::Null
    } else {
        ArgValue::UInt(u64::from(*p))
    }
}

/// Symbolic value of a Vulkan enum or flags type.
pub(crate) fn named<T: Debug>(value: T, raw: i64) -> ArgValue {
    ArgValue::Enum {
        name: format!("{:?}", value),
        raw,
    }
}

pub(crate) fn uint(v: impl Into<u64>) -> ArgValue {
    ArgValue::UInt(v.into())
}

pub(crate) fn bool32(v: vk::Bool32) -> ArgValue {
    ArgValue::Bool(v != vk::FALSE)
}

pub(crate) fn api_version(v: u32) -> ArgValue {
    ArgValue::Text(format!(
        "{}.{}.{}",
        vk::api_version_major(v),
        vk::api_version_minor(v),
        vk::api_version_patch(v)
    ))
}

/// Fixed-size `char[N]` field of a Vulkan struct.
pub(crate) fn fixed_string(chars: &[c_char]) -> ArgValue {
    let bytes: Vec<u8> = chars
        .iter()
        .take_while(|c| **c != 0)
        .map(|c| *c as u8)
        .collect();
    ArgValue::Text(String::from_utf8_lossy(&bytes).into_owned())
}
