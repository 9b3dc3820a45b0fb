use std::ffi::CString;
use std::os::raw::{c_char, c_int};
use std::ptr;

use crate::types::LlmResponseContext;

/// Move `responses` into an engine-owned response context.
pub fn response_context(responses: Vec<String>, done: bool) -> LlmResponseContext {
    let array: Box<[*mut c_char]> = responses
        .into_iter()
        .map(|text| to_c_string(text).into_raw())
        .collect();
    let count = array.len() as c_int;
    LlmResponseContext {
        response_array: Box::into_raw(array) as *mut *mut c_char,
        response_count: count,
        done,
    }
}

/// Free the array and strings of a context built by `response_context`.
///
/// The fields are reset afterwards, so releasing twice is a no-op.
///
/// # Safety
///
/// `context` must have been produced by `response_context` (or be null).
pub unsafe fn release(context: &mut LlmResponseContext) {
    if context.response_array.is_null() {
        return;
    }
    let count = usize::try_from(context.response_count).unwrap_or(0);
    let slice = ptr::slice_from_raw_parts_mut(context.response_array, count);
    let array = unsafe { Box::from_raw(slice) };
    for &text in array.iter() {
        if !text.is_null() {
            drop(unsafe { CString::from_raw(text) });
        }
    }
    context.response_array = ptr::null_mut();
    context.response_count = 0;
}

fn to_c_string(text: String) -> CString {
    CString::new(text).unwrap_or_else(|e| {
        let mut bytes = e.into_vec();
        bytes.retain(|&b| b != 0);
        CString::new(bytes).unwrap_or_default()
    })
}
