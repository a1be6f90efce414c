//! Standard throwable filters
//!
//! Every filter takes its arguments as one string with entries separated by a
//! vertical bar, e.g. `org.example|com.example`. Entries are trimmed and empty
//! entries are ignored, so an empty or blank string means "no arguments".

use super::data::{StackFrame, ThrowableData};
use std::fmt;
use std::sync::Arc;

/// Transforms the snapshot of an error before it gets rendered.
///
/// Filters never mutate their input; they either hand back the same `Arc` or a
/// freshly built node.
pub trait ThrowableFilter: fmt::Debug + Send + Sync {
    fn filter(&self, origin: Arc<ThrowableData>) -> Arc<ThrowableData>;
}

pub(crate) fn parse_arguments(arguments: Option<&str>) -> Vec<String> {
    arguments
        .unwrap_or_default()
        .split('|')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect()
}

fn rewrite_frames(
    origin: &ThrowableData,
    keep_frame: &dyn Fn(&StackFrame) -> bool,
) -> Arc<ThrowableData> {
    let cause = origin
        .cause()
        .map(|cause| rewrite_frames(cause, keep_frame));
    let frames = origin
        .stack_trace()
        .iter()
        .filter(|frame| keep_frame(frame))
        .cloned()
        .collect();
    Arc::new(origin.rebuild(frames, cause))
}

/// Keeps only stack frames of the configured packages and classes.
///
/// Matching is a plain string prefix test on the frame's class name: `org.ex`
/// matches `org.example.Foo` as well. Without any argument every frame is
/// removed.
#[derive(Debug, Clone, Default)]
pub struct KeepFilter {
    prefixes: Vec<String>,
}

impl KeepFilter {
    pub fn new(arguments: Option<&str>) -> Self {
        Self {
            prefixes: parse_arguments(arguments),
        }
    }
}

impl ThrowableFilter for KeepFilter {
    fn filter(&self, origin: Arc<ThrowableData>) -> Arc<ThrowableData> {
        rewrite_frames(&origin, &|frame| {
            self.prefixes
                .iter()
                .any(|prefix| frame.class.starts_with(prefix.as_str()))
        })
    }
}

/// Removes stack frames of the configured packages and classes; the inverse of
/// [`KeepFilter`]. Without any argument nothing is removed.
#[derive(Debug, Clone, Default)]
pub struct StripFilter {
    prefixes: Vec<String>,
}

impl StripFilter {
    pub fn new(arguments: Option<&str>) -> Self {
        Self {
            prefixes: parse_arguments(arguments),
        }
    }
}

impl ThrowableFilter for StripFilter {
    fn filter(&self, origin: Arc<ThrowableData>) -> Arc<ThrowableData> {
        if self.prefixes.is_empty() {
            return origin;
        }
        rewrite_frames(&origin, &|frame| {
            !self
                .prefixes
                .iter()
                .any(|prefix| frame.class.starts_with(prefix.as_str()))
        })
    }
}

/// Replaces a wrapping error by its cause.
///
/// Applies when the error has a cause and either no class names are configured
/// or its class name equals one of them. The cause is filtered again, so
/// several matching wrappers are peeled off in one pass.
#[derive(Debug, Clone, Default)]
pub struct UnpackFilter {
    class_names: Vec<String>,
}

impl UnpackFilter {
    pub fn new(arguments: Option<&str>) -> Self {
        Self {
            class_names: parse_arguments(arguments),
        }
    }

    fn matches(&self, data: &ThrowableData) -> bool {
        self.class_names.is_empty()
            || self
                .class_names
                .iter()
                .any(|name| name == data.class_name())
    }
}

impl ThrowableFilter for UnpackFilter {
    fn filter(&self, origin: Arc<ThrowableData>) -> Arc<ThrowableData> {
        match origin.cause() {
            Some(cause) if self.matches(&origin) => self.filter(Arc::clone(cause)),
            _ => origin,
        }
    }
}

/// Cuts the cause chain below matching errors. Without any argument every
/// cause is dropped.
#[derive(Debug, Clone, Default)]
pub struct DropCauseFilter {
    class_names: Vec<String>,
}

impl DropCauseFilter {
    pub fn new(arguments: Option<&str>) -> Self {
        Self {
            class_names: parse_arguments(arguments),
        }
    }
}

impl ThrowableFilter for DropCauseFilter {
    fn filter(&self, origin: Arc<ThrowableData>) -> Arc<ThrowableData> {
        let Some(cause) = origin.cause() else {
            return origin;
        };

        let drop_here = self.class_names.is_empty()
            || self
                .class_names
                .iter()
                .any(|name| name == origin.class_name());
        if drop_here {
            return Arc::new(origin.rebuild(origin.stack_trace().to_vec(), None));
        }

        let filtered = self.filter(Arc::clone(cause));
        if Arc::ptr_eq(&filtered, cause) {
            origin
        } else {
            Arc::new(origin.rebuild(origin.stack_trace().to_vec(), Some(filtered)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(classes: &[&str]) -> Vec<StackFrame> {
        classes
            .iter()
            .enumerate()
            .map(|(i, class)| StackFrame::new(*class, "run").with_location("Main.java", i as u32 + 1))
            .collect()
    }

    fn sample() -> Arc<ThrowableData> {
        Arc::new(
            ThrowableData::new("java.lang.RuntimeException")
                .with_message("Hello Heaven!")
                .with_stack_trace(trace(&[
                    "org.tinylog.throwable.KeepThrowableFilterTest",
                    "jdk.internal.reflect.NativeMethodAccessorImpl",
                    "java.lang.reflect.Method",
                    "org.junit.runners.model.FrameworkMethod",
                    "sun.reflect.Whatever",
                ]))
                .with_cause(
                    ThrowableData::new("java.lang.NullPointerException")
                        .with_message("Hello Hell!")
                        .with_stack_trace(trace(&["org.tinylog.Cause", "java.util.Objects"])),
                ),
        )
    }

    #[test]
    fn test_keep_passes_class_message_and_cause() {
        let data = KeepFilter::new(None).filter(sample());

        assert_eq!(data.class_name(), "java.lang.RuntimeException");
        assert_eq!(data.message(), Some("Hello Heaven!"));
        let cause = data.cause().unwrap();
        assert_eq!(cause.class_name(), "java.lang.NullPointerException");
        assert_eq!(cause.message(), Some("Hello Hell!"));
    }

    #[test]
    fn test_keep_empty_removes_all_frames() {
        let data = KeepFilter::new(Some("")).filter(sample());
        assert!(data.stack_trace().is_empty());
        assert!(data.cause().unwrap().stack_trace().is_empty());
    }

    #[test]
    fn test_keep_single_package() {
        let data = KeepFilter::new(Some("org.tinylog")).filter(sample());
        assert_eq!(data.stack_trace().len(), 1);
        assert!(data.stack_trace()[0].class.starts_with("org.tinylog"));
        assert_eq!(data.cause().unwrap().stack_trace().len(), 1);
    }

    #[test]
    fn test_keep_is_plain_prefix_match() {
        let data = KeepFilter::new(Some("o")).filter(sample());
        assert_eq!(data.stack_trace().len(), 2);
        assert!(data.stack_trace().iter().all(|frame| frame.class.starts_with('o')));

        let data = KeepFilter::new(Some("org.tiny")).filter(sample());
        assert_eq!(data.stack_trace().len(), 1);

        let data = KeepFilter::new(Some("net")).filter(sample());
        assert!(data.stack_trace().is_empty());
    }

    #[test]
    fn test_keep_multiple_packages() {
        let origin = sample();
        let data = KeepFilter::new(Some("com|java|javax|jdk|org|sun")).filter(Arc::clone(&origin));
        assert_eq!(data.stack_trace().len(), origin.stack_trace().len());
    }

    #[test]
    fn test_strip_removes_matching_frames() {
        let data = StripFilter::new(Some("jdk.internal|sun")).filter(sample());
        assert_eq!(data.stack_trace().len(), 3);

        let origin = sample();
        let untouched = StripFilter::new(Some("  ")).filter(Arc::clone(&origin));
        assert!(Arc::ptr_eq(&origin, &untouched));
    }

    #[test]
    fn test_unpack_without_cause_returns_origin() {
        let origin = Arc::new(ThrowableData::new("java.lang.RuntimeException"));
        let data = UnpackFilter::new(None).filter(Arc::clone(&origin));
        assert!(Arc::ptr_eq(&origin, &data));
    }

    #[test]
    fn test_unpack_non_matching_class_keeps_origin() {
        let origin = sample();
        let data = UnpackFilter::new(Some("java.lang.IllegalStateException")).filter(Arc::clone(&origin));
        assert!(Arc::ptr_eq(&origin, &data));
    }

    #[test]
    fn test_unpack_matching_class_returns_cause() {
        let origin = sample();
        let data = UnpackFilter::new(Some("java.lang.IllegalStateException|java.lang.RuntimeException"))
            .filter(Arc::clone(&origin));
        assert!(Arc::ptr_eq(data_cause_of(&origin), &data));
        assert_eq!(data.class_name(), "java.lang.NullPointerException");
    }

    fn data_cause_of(data: &Arc<ThrowableData>) -> &Arc<ThrowableData> {
        data.cause().unwrap()
    }

    /// A wraps B wraps C
    fn three_levels() -> Arc<ThrowableData> {
        Arc::new(
            ThrowableData::new("A").with_cause(
                ThrowableData::new("B").with_cause(ThrowableData::new("C").with_message("root")),
            ),
        )
    }

    #[test]
    fn test_unpack_only_outer_class_stops_at_middle() {
        let origin = three_levels();
        let data = UnpackFilter::new(Some("A")).filter(Arc::clone(&origin));

        assert_eq!(data.class_name(), "B");
        assert!(Arc::ptr_eq(data_cause_of(&origin), &data));
        assert_eq!(data_cause_of(&data).class_name(), "C");
    }

    #[test]
    fn test_unpack_outer_and_middle_reaches_innermost() {
        let origin = three_levels();
        let data = UnpackFilter::new(Some("A | B")).filter(Arc::clone(&origin));

        assert_eq!(data.class_name(), "C");
        assert!(Arc::ptr_eq(data_cause_of(data_cause_of(&origin)), &data));
        assert!(data.cause().is_none());
    }

    #[test]
    fn test_unpack_without_arguments_reaches_innermost() {
        let origin = three_levels();

        for arguments in [None, Some(""), Some("  ")] {
            let data = UnpackFilter::new(arguments).filter(Arc::clone(&origin));
            assert_eq!(data.class_name(), "C");
            assert_eq!(data.message(), Some("root"));
            assert!(data.cause().is_none());
        }
    }

    #[test]
    fn test_unpack_innermost_class_without_cause_is_kept() {
        let origin = three_levels();
        let data = UnpackFilter::new(Some("A|B|C")).filter(Arc::clone(&origin));

        assert_eq!(data.class_name(), "C");
        assert!(data.cause().is_none());
    }

    #[test]
    fn test_drop_cause_for_all() {
        let data = DropCauseFilter::new(None).filter(sample());
        assert!(data.cause().is_none());
        assert_eq!(data.stack_trace().len(), 5);
    }

    #[test]
    fn test_drop_cause_only_below_matching_class() {
        let origin = sample();
        let kept = DropCauseFilter::new(Some("java.lang.NullPointerException")).filter(Arc::clone(&origin));
        assert!(Arc::ptr_eq(&origin, &kept));

        let dropped = DropCauseFilter::new(Some("java.lang.RuntimeException")).filter(origin);
        assert!(dropped.cause().is_none());
    }
}
