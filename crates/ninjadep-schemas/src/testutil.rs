//! Shared proptest strategies for schema tests.

use proptest::prelude::*;

/// Strategy for generating project-relative file paths like `src/foo.cpp`.
pub fn arb_file() -> impl Strategy<Value = String> {
    "(src|include|test)/[a-z_]{1,12}\\.(cpp|hpp|h)"
}

/// Strategy for generating executable output paths like `bin/test_foo`.
pub fn arb_executable() -> impl Strategy<Value = String> {
    "bin/(test|example)_[a-z]{1,8}"
}
