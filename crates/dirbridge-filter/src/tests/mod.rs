//! Unit tests for `dirbridge_filter`.
