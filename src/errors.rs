// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Engine error taxonomy.
//!
//! `InvalidProfile` is the only hard failure the engine raises: it means the
//! setup data is physiologically impossible and the caller must fix it. Every
//! per-metric failure (missing sensor, degenerate input, divide-by-zero)
//! degrades to `None` in the result bundle instead of producing an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Physiologically impossible profile input, e.g. resting HR at or above
    /// max HR. Raised immediately so callers fix setup data.
    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    /// A background analysis task was cancelled or panicked.
    #[error("analysis task failed: {0}")]
    Task(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_profile_display() {
        let err = EngineError::InvalidProfile("resting HR (190) must be below max HR (60)".into());
        assert!(err.to_string().contains("invalid profile"));
        assert!(err.to_string().contains("190"));
    }
}
