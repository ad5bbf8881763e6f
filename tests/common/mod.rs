//! Shared test utilities and fixtures.

use std::path::PathBuf;

use tradinglimit::HaircutTable;
use tradinglimit::haircut::loader::{self, HaircutColumn};

/// Path to the test fixtures directory.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Haircut table built from the fixture broker export (house column).
pub fn haircuts() -> HaircutTable {
    loader::load(&fixtures_dir().join("haircut.txt"), HaircutColumn::House)
        .expect("failed to load fixture haircut table")
}
