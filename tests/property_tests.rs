//! Property-based tests for rust_log_runtime using proptest

use proptest::prelude::*;
use rust_log_runtime::core::diagnostics::InternalLogger;
use rust_log_runtime::core::registry::Registry;
use rust_log_runtime::format::{FormatCompiler, PlaceholderBuilder};
use rust_log_runtime::prelude::*;
use rust_log_runtime::throwable::{standard_filters, StackFrame, ThrowableFilter, ThrowableFilterChain};
use std::sync::Arc;

fn any_event_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Trace),
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
    ]
}

struct Fixture {
    placeholders: Registry<dyn PlaceholderBuilder>,
    filters: Registry<dyn FilterBuilder>,
    diagnostics: InternalLogger,
    sink: Arc<MemorySink>,
}

impl Fixture {
    fn new() -> Self {
        let sink = Arc::new(MemorySink::new());
        Self {
            placeholders: Registry::new(),
            filters: standard_filters(),
            diagnostics: InternalLogger::new(sink.clone()),
            sink,
        }
    }

    fn compiler(&self) -> FormatCompiler<'_> {
        FormatCompiler::new(&self.placeholders, &self.filters, &self.diagnostics)
    }
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    /// Level names parse back to the same level, in any letter case
    #[test]
    fn test_log_level_str_roundtrip(level in any_event_level(), upper in any::<bool>()) {
        let name = if upper {
            level.to_str().to_string()
        } else {
            level.to_str().to_lowercase()
        };
        let parsed: LogLevel = name.parse().unwrap();
        prop_assert_eq!(level, parsed);
    }

    /// Ordering follows severity
    #[test]
    fn test_log_level_ordering(level1 in any_event_level(), level2 in any_event_level()) {
        let val1 = level1 as u8;
        let val2 = level2 as u8;

        prop_assert_eq!(level1 <= level2, val1 <= val2);
        prop_assert!(level1 < LogLevel::Off);
    }
}

// ============================================================================
// Format Pattern Tests
// ============================================================================

proptest! {
    /// Text without braces is rendered verbatim and never reported
    #[test]
    fn test_text_without_braces_is_literal(text in "[^{}]{0,64}") {
        let fixture = Fixture::new();
        let pipeline = fixture.compiler().compile(&text);
        let event = LogEvent::with_text(LogLevel::Info, "ignored");

        prop_assert_eq!(pipeline.render(&event), text);
        prop_assert!(fixture.sink.entries().is_empty());
    }

    /// The message placeholder reproduces any message unchanged
    #[test]
    fn test_message_is_rendered_unchanged(
        prefix in "[^{}]{0,16}",
        message in ".{0,128}",
        level in any_event_level(),
    ) {
        let fixture = Fixture::new();
        let pipeline = fixture.compiler().compile(&format!("{}{{message}}", prefix));
        let event = LogEvent::with_text(level, message.clone());

        prop_assert_eq!(pipeline.render(&event), format!("{}{}", prefix, message));
    }

    /// Compiling arbitrary input never panics and never loses trailing text
    /// after an unclosed bracket
    #[test]
    fn test_unclosed_bracket_keeps_rest_literal(head in "[a-z ]{0,16}", tail in "[^{}]{0,32}") {
        let fixture = Fixture::new();
        let pattern = format!("{}{{{}", head, tail);
        let pipeline = fixture.compiler().compile(&pattern);
        let event = LogEvent::new(LogLevel::Info, None);

        prop_assert_eq!(pipeline.render(&event), pattern);
        prop_assert_eq!(fixture.sink.count(LogLevel::Warn), 1);
    }

    #[test]
    fn test_compile_never_panics(pattern in ".{0,64}") {
        let fixture = Fixture::new();
        let pipeline = fixture.compiler().compile(&pattern);
        let _ = pipeline.render(&LogEvent::with_text(LogLevel::Warn, "x"));
    }
}

// ============================================================================
// Throwable Filter Tests
// ============================================================================

fn frames() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(
        (
            prop_oneof![Just("app::db"), Just("app::net"), Just("std::thread"), Just("tokio::rt")],
            "[a-z]{1,8}",
        )
            .prop_map(|(class, method)| (class.to_string(), method)),
        0..16,
    )
}

fn throwable(frames: &[(String, String)]) -> Arc<ThrowableData> {
    let stack = frames
        .iter()
        .map(|(class, method)| StackFrame::new(class.as_str(), method.as_str()))
        .collect();
    Arc::new(ThrowableData::new("app::Error").with_stack_trace(stack))
}

proptest! {
    /// keep and strip with the same prefix never overlap and never add frames
    #[test]
    fn test_keep_and_strip_partition_frames(frames in frames()) {
        let fixture = Fixture::new();
        let keep = ThrowableFilterChain::parse("keep: app", &fixture.filters, &fixture.diagnostics);
        let strip = ThrowableFilterChain::parse("strip: app", &fixture.filters, &fixture.diagnostics);
        let origin = throwable(&frames);

        let kept = keep.filter(Arc::clone(&origin));
        let stripped = strip.filter(Arc::clone(&origin));

        prop_assert!(kept.stack_trace().len() <= origin.stack_trace().len());
        prop_assert!(stripped.stack_trace().len() <= origin.stack_trace().len());
        prop_assert_eq!(kept.class_name(), origin.class_name());
        prop_assert!(kept.stack_trace().iter().all(|frame| frame.class.starts_with("app")));
        prop_assert!(stripped.stack_trace().iter().all(|frame| !frame.class.starts_with("app")));
    }

    /// An empty chain returns the very same throwable
    #[test]
    fn test_empty_chain_is_identity(frames in frames()) {
        let origin = throwable(&frames);
        let filtered = ThrowableFilterChain::default().filter(Arc::clone(&origin));
        prop_assert!(Arc::ptr_eq(&origin, &filtered));
    }
}

// ============================================================================
// Identifier Quoting Tests
// ============================================================================

#[cfg(feature = "jdbc")]
proptest! {
    /// Quoted identifiers unquote back to the input
    #[test]
    fn test_quoted_identifier_roundtrip(identifier in "[^\r\n]{0,32}") {
        use rust_log_runtime::writers::jdbc::quote_identifier;

        let quoted = quote_identifier(&identifier, Some("\"")).unwrap();
        prop_assert!(quoted.starts_with('"') && quoted.ends_with('"'));

        let inner = &quoted[1..quoted.len() - 1];
        prop_assert_eq!(inner.replace("\"\"", "\""), identifier);
    }

    /// Without quote string only plain identifiers are accepted
    #[test]
    fn test_unquoted_identifier_charset(identifier in ".{1,16}") {
        use rust_log_runtime::writers::jdbc::quote_identifier;

        let legal = identifier
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '@' | '$' | '#'));
        prop_assert_eq!(quote_identifier(&identifier, None).is_ok(), legal);
    }
}
