//! Testing utilities and fixtures for rvsn.
//!
//! - **Fixtures**: temporary project trees with text and binary files
//! - **Assertions**: helpers comparing files and whole trees
//!
//! # Example Usage
//!
//! ```rust
//! use rvsn_test_utils::TestProject;
//!
//! let project = TestProject::new()
//!     .with_file("a.txt", "hello")
//!     .with_binary("img.png", &[0x89, b'P', b'N', b'G', 0, 1])
//!     .build();
//!
//! assert!(project.file_exists("a.txt"));
//! ```

pub mod assertions;
pub mod fixtures;

pub use fixtures::{BuiltTestProject, TestProject, TreeState};
