use std::sync::Arc;

use super::adapter::SignalCollector;

/// Ordered list of registered collectors.
///
/// DESIGN:
/// - Registration order is the order of the collected result list
/// - No de-duplication and no key validation: duplicate keys are
///   accepted, the selector resolves them (first registered wins)
/// - No removal
///
#[derive(Clone, Default)]
pub struct CollectorRegistry {
    collectors: Vec<Arc<dyn SignalCollector>>,
}

impl CollectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, collector: Arc<dyn SignalCollector>) -> &mut Self {
        self.collectors.push(collector);
        self
    }

    /// Builder-style `register`.
    pub fn with(mut self, collector: Arc<dyn SignalCollector>) -> Self {
        self.collectors.push(collector);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn SignalCollector>> {
        self.collectors.iter()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.collectors.iter().map(|c| c.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }
}

impl std::fmt::Debug for CollectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}
