//! HTTP handlers, one module per resource.

pub mod alerts;
pub mod jobs;
pub mod media;
pub mod status;
pub mod system;

use serde::Deserialize;

use fieldwatch_core::defaults;

/// `?limit=` query shared by the listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

impl LimitQuery {
    /// Requested page size, defaulting to 10 and capped at `max`.
    pub fn resolve(&self, max: usize) -> usize {
        self.limit.unwrap_or(defaults::PAGE_LIMIT).min(max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_defaults_and_caps() {
        assert_eq!(LimitQuery::default().resolve(100), 10);
        assert_eq!(LimitQuery { limit: Some(500) }.resolve(100), 100);
        assert_eq!(LimitQuery { limit: Some(3) }.resolve(100), 3);
    }
}
