//! Integration tests for the full encode/decode pipeline

mod roundtrip;
