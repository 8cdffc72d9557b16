//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;

use borehole_rs::{CollectingNotifier, ModelContext, ModelSettings};
use std::sync::Arc;

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Context reading real CSV files, with warnings collected for inspection
pub fn collecting_context(settings: ModelSettings) -> (ModelContext, Arc<CollectingNotifier>) {
    let notifier = Arc::new(CollectingNotifier::new());
    let ctx = ModelContext::with_settings(settings).with_notifier(notifier.clone());
    (ctx, notifier)
}

/// Default settings context with collected warnings
pub fn test_context() -> (ModelContext, Arc<CollectingNotifier>) {
    collecting_context(ModelSettings::default())
}
