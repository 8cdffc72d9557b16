//! User-facing warnings
//!
//! The model never blocks on the user. When a file cannot be used it fires a
//! `(title, message)` warning through a [`Notifier`] and carries on.

use std::sync::Mutex;

/// Receives fire-and-forget warnings from the model
pub trait Notifier: Send + Sync {
    fn warn(&self, title: &str, message: &str);
}

/// Notifier that only logs the warning
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn warn(&self, title: &str, message: &str) {
        tracing::warn!(title, "{}", message);
    }
}

/// A warning buffered by [`CollectingNotifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub title: String,
    pub message: String,
}

/// Notifier that buffers warnings until a front end drains them
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    warnings: Mutex<Vec<Warning>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every buffered warning, oldest first
    pub fn drain(&self) -> Vec<Warning> {
        match self.warnings.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn len(&self) -> usize {
        self.warnings.lock().map(|w| w.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for CollectingNotifier {
    fn warn(&self, title: &str, message: &str) {
        tracing::debug!(title, "{}", message);
        let warning = Warning {
            title: title.to_string(),
            message: message.to_string(),
        };
        match self.warnings.lock() {
            Ok(mut guard) => guard.push(warning),
            Err(poisoned) => poisoned.into_inner().push(warning),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_notifier_drains_in_order() {
        let notifier = CollectingNotifier::new();
        notifier.warn("Wrong filename", "a.csv");
        notifier.warn("File not exist", "b.csv");
        assert_eq!(notifier.len(), 2);

        let drained = notifier.drain();
        assert_eq!(drained[0].title, "Wrong filename");
        assert_eq!(drained[1].message, "b.csv");
        assert!(notifier.is_empty());
    }
}
