//! Selection of the active backend
//!
//! Without a `backend` key every registered builder contributes a backend.
//! With the key, only the named builders do; `nop` and `internal` can be
//! named but are never picked up automatically. Resolution never fails:
//! problems are reported as diagnostics and a fallback is used instead.

use super::internal::BuiltinBackendBuilder;
use super::{BackendBuilder, BundleBackend, InternalBackend, LoggingBackend};
use crate::core::registry::Named;
use crate::core::runtime::LoggingRuntime;
use std::sync::Arc;

/// Configuration key naming the backends to use
pub const BACKEND_KEY: &str = "backend";

/// Build the backend for `runtime`. Freezes the runtime's configuration.
pub fn resolve(runtime: &LoggingRuntime) -> Arc<dyn LoggingBackend> {
    let configuration = runtime.configuration();
    configuration.freeze();

    let names = configuration.get_list(BACKEND_KEY).unwrap_or_default();
    let mut names_deduplicated: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !names_deduplicated.contains(&name) {
            names_deduplicated.push(name);
        }
    }

    if names_deduplicated.is_empty() {
        discover(runtime)
    } else {
        select(runtime, &names_deduplicated)
    }
}

fn discover(runtime: &LoggingRuntime) -> Arc<dyn LoggingBackend> {
    let backends: Vec<_> = runtime
        .backend_builders()
        .all()
        .iter()
        .filter_map(|builder| create(runtime, builder.as_ref()))
        .collect();

    if backends.is_empty() {
        runtime.diagnostics().warn(
            "No logging backend could be found, only warnings and errors are output",
        );
        return internal(runtime);
    }

    combine(backends)
}

fn select(runtime: &LoggingRuntime, names: &[String]) -> Arc<dyn LoggingBackend> {
    let diagnostics = runtime.diagnostics();
    let builtins = BuiltinBackendBuilder::all();
    let mut backends = Vec::with_capacity(names.len());

    for name in names {
        let discovered = runtime.backend_builders().lookup(name);
        let builder: Option<&dyn BackendBuilder> = match &discovered {
            Some(builder) => Some(builder.as_ref()),
            None => builtins
                .iter()
                .find(|builtin| builtin.name() == name.as_str())
                .map(|builtin| builtin as &dyn BackendBuilder),
        };

        match builder {
            Some(builder) => {
                if let Some(backend) = create(runtime, builder) {
                    backends.push(backend);
                }
            }
            None => diagnostics.error(format!(
                "Could not find any logging backend with the name '{}'",
                name
            )),
        }
    }

    if !backends.is_empty() {
        return combine(backends);
    }

    diagnostics.error(format!(
        "None of the configured logging backends '{}' is usable, falling back to default",
        names.join(", ")
    ));
    runtime
        .backend_builders()
        .all()
        .first()
        .and_then(|builder| create(runtime, builder.as_ref()))
        .unwrap_or_else(|| internal(runtime))
}

fn create(runtime: &LoggingRuntime, builder: &dyn BackendBuilder) -> Option<Arc<dyn LoggingBackend>> {
    match builder.create(runtime) {
        Ok(backend) => Some(backend),
        Err(error) => {
            runtime.diagnostics().error_with(
                format!("Failed to create logging backend '{}'", builder.name()),
                &error,
            );
            None
        }
    }
}

fn combine(mut backends: Vec<Arc<dyn LoggingBackend>>) -> Arc<dyn LoggingBackend> {
    if backends.len() == 1 {
        backends.remove(0)
    } else {
        Arc::new(BundleBackend::new(backends))
    }
}

fn internal(runtime: &LoggingRuntime) -> Arc<dyn LoggingBackend> {
    Arc::new(InternalBackend::new(runtime.diagnostics().clone()))
}
