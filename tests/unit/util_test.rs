//! Tests for utility functions

use slot_pools::util::{init_tracing, now_ms, DEFAULT_LOG_DIRECTIVE};

#[test]
fn test_now_ms_is_monotonic_enough() {
    let a = now_ms();
    let b = now_ms();
    assert!(a > 0);
    assert!(b >= a);
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
    assert!(DEFAULT_LOG_DIRECTIVE.starts_with("slot_pools"));
}
