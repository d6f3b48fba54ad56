//! Error types for fallible internal operations.

use core::fmt;

/// Returned when a request cannot be satisfied: every existing region lacked
/// a large-enough free chunk and the OS arena source refused to map a new
/// region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OomError;

impl fmt::Display for OomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("out of memory: no region could be mapped to satisfy the request")
    }
}
