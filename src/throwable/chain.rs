//! Configurable sequence of throwable filters
//!
//! A chain is written as a comma separated list of filters, each with an
//! optional argument string after a colon:
//!
//! ```text
//! unpack: app::WrapperError, keep: app|std::io
//! ```

use super::data::ThrowableData;
use super::filters::{DropCauseFilter, KeepFilter, StripFilter, ThrowableFilter, UnpackFilter};
use crate::core::diagnostics::InternalLogger;
use crate::core::registry::{Named, Registry};
use std::sync::Arc;

/// Factory for one kind of throwable filter
pub trait FilterBuilder: Named + Send + Sync {
    fn create(&self, arguments: Option<&str>) -> Arc<dyn ThrowableFilter>;
}

struct StandardFilter {
    name: &'static str,
    make: fn(Option<&str>) -> Arc<dyn ThrowableFilter>,
}

impl Named for StandardFilter {
    fn name(&self) -> &str {
        self.name
    }
}

impl FilterBuilder for StandardFilter {
    fn create(&self, arguments: Option<&str>) -> Arc<dyn ThrowableFilter> {
        (self.make)(arguments)
    }
}

/// Registry holding `keep`, `strip`, `unpack` and `drop`
pub fn standard_filters() -> Registry<dyn FilterBuilder> {
    let mut registry: Registry<dyn FilterBuilder> = Registry::new();
    registry.register(Arc::new(StandardFilter {
        name: "keep",
        make: |arguments| Arc::new(KeepFilter::new(arguments)) as Arc<dyn ThrowableFilter>,
    }));
    registry.register(Arc::new(StandardFilter {
        name: "strip",
        make: |arguments| Arc::new(StripFilter::new(arguments)) as Arc<dyn ThrowableFilter>,
    }));
    registry.register(Arc::new(StandardFilter {
        name: "unpack",
        make: |arguments| Arc::new(UnpackFilter::new(arguments)) as Arc<dyn ThrowableFilter>,
    }));
    registry.register(Arc::new(StandardFilter {
        name: "drop",
        make: |arguments| Arc::new(DropCauseFilter::new(arguments)) as Arc<dyn ThrowableFilter>,
    }));
    registry
}

/// Filters applied one after another; the output of one is the input of the
/// next.
#[derive(Debug, Clone, Default)]
pub struct ThrowableFilterChain {
    filters: Vec<Arc<dyn ThrowableFilter>>,
}

impl ThrowableFilterChain {
    pub fn new(filters: Vec<Arc<dyn ThrowableFilter>>) -> Self {
        Self { filters }
    }

    /// Build a chain from its configuration string. Unknown filter names are
    /// reported and left out; building itself never fails.
    pub fn parse(
        configuration: &str,
        registry: &Registry<dyn FilterBuilder>,
        diagnostics: &InternalLogger,
    ) -> Self {
        let mut filters = Vec::new();

        for item in configuration.split(',') {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }

            let (name, arguments) = match item.split_once(':') {
                Some((name, arguments)) => (name.trim(), Some(arguments.trim())),
                None => (item, None),
            };

            match registry.lookup(name) {
                Some(builder) => filters.push(builder.create(arguments)),
                None => diagnostics.error(format!(
                    "Unknown throwable filter '{}' in '{}'",
                    name, configuration
                )),
            }
        }

        Self { filters }
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl ThrowableFilter for ThrowableFilterChain {
    fn filter(&self, origin: Arc<ThrowableData>) -> Arc<ThrowableData> {
        self.filters
            .iter()
            .fold(origin, |data, filter| filter.filter(data))
    }
}
