//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `rollbook_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    // Why: keep a tiny CLI probe to validate core crate wiring independently
    // from any frontend runtime setup.
    println!("rollbook_core ping={}", rollbook_core::ping());
    println!("rollbook_core version={}", rollbook_core::core_version());
}
