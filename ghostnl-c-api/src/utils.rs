use std::os::raw::c_char;

use ghostnl::Error;

/// Copy `string` to the C buffer `buffer` of size `bufflen`, including a
/// NULL terminator.
pub unsafe fn copy_str_to_c(string: &str, buffer: *mut c_char, bufflen: usize) -> Result<(), Error> {
    if string.len() >= bufflen {
        return Err(Error::InvalidParameter(format!(
            "string buffer is not big enough: got space for {} bytes, need {}",
            bufflen, string.len() + 1
        )));
    }

    std::ptr::copy(string.as_ptr(), buffer.cast::<u8>(), string.len());
    // NULL-terminate the string
    buffer.add(string.len()).write(0);
    return Ok(());
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;
    use super::*;

    #[test]
    fn copy_str() {
        let mut buffer = [1 as c_char; 8];
        unsafe {
            copy_str_to_c("abc", buffer.as_mut_ptr(), buffer.len()).unwrap();
            assert_eq!(CStr::from_ptr(buffer.as_ptr()).to_str().unwrap(), "abc");

            let error = copy_str_to_c("too long!", buffer.as_mut_ptr(), buffer.len()).unwrap_err();
            assert!(matches!(error, Error::InvalidParameter(_)));
        }
    }
}
