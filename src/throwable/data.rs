//! Immutable snapshot of an error and its cause chain

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// One frame of a captured stack trace
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StackFrame {
    pub class: String,
    pub method: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl StackFrame {
    pub fn new(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            method: method.into(),
            file: None,
            line: None,
        }
    }

    #[must_use]
    pub fn with_location(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.class, self.method)?;
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{}:{})", file, line),
            (Some(file), None) => write!(f, "{})", file),
            _ => write!(f, "Unknown Source)"),
        }
    }
}

/// Backend-agnostic view of an error.
///
/// Causes are shared through `Arc`, so a filter that returns an unchanged cause
/// hands out the very same node. A node can only point at causes that existed
/// before it, which keeps every chain finite and acyclic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrowableData {
    class_name: String,
    message: Option<String>,
    cause: Option<Arc<ThrowableData>>,
    stack_trace: Vec<StackFrame>,
}

impl ThrowableData {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            message: None,
            cause: None,
            stack_trace: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<Arc<ThrowableData>>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    #[must_use]
    pub fn with_frame(mut self, frame: StackFrame) -> Self {
        self.stack_trace.push(frame);
        self
    }

    #[must_use]
    pub fn with_stack_trace(mut self, stack_trace: Vec<StackFrame>) -> Self {
        self.stack_trace = stack_trace;
        self
    }

    /// Snapshot a typed error; its `source()` chain becomes the cause chain
    pub fn from_error<E: Error + 'static>(error: &E) -> Self {
        let mut data = Self::from_dyn_error(error);
        data.class_name = std::any::type_name::<E>().to_string();
        data
    }

    /// Snapshot an error trait object.
    ///
    /// Without static type information the class name is taken from the error's
    /// `Debug` representation (`ParseIntError { .. }` becomes `ParseIntError`).
    pub fn from_dyn_error(error: &(dyn Error + 'static)) -> Self {
        let mut chain: Vec<&(dyn Error + 'static)> = vec![error];
        while let Some(source) = chain.last().copied().and_then(|current| current.source()) {
            chain.push(source);
        }

        let mut cause: Option<Arc<ThrowableData>> = None;
        for node in chain.into_iter().rev() {
            let mut data = ThrowableData::new(dyn_class_name(node)).with_message(node.to_string());
            data.cause = cause.take();
            cause = Some(Arc::new(data));
        }

        match cause {
            Some(top) => Arc::try_unwrap(top).unwrap_or_else(|shared| (*shared).clone()),
            None => ThrowableData::new("Error"),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn cause(&self) -> Option<&Arc<ThrowableData>> {
        self.cause.as_ref()
    }

    pub fn stack_trace(&self) -> &[StackFrame] {
        &self.stack_trace
    }

    /// Number of nodes in the chain, this one included
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut current = self.cause.as_deref();
        while let Some(node) = current {
            depth += 1;
            current = node.cause.as_deref();
        }
        depth
    }

    /// Copy of this node with another stack trace and cause
    pub fn rebuild(
        &self,
        stack_trace: Vec<StackFrame>,
        cause: Option<Arc<ThrowableData>>,
    ) -> ThrowableData {
        ThrowableData {
            class_name: self.class_name.clone(),
            message: self.message.clone(),
            cause,
            stack_trace,
        }
    }

    /// Append the classic trace representation: header, `\tat` frames, and
    /// `Caused by:` sections for every cause
    pub fn render_into(&self, out: &mut String) {
        let mut current = Some(self);
        let mut first = true;
        while let Some(node) = current {
            if !first {
                out.push_str("\nCaused by: ");
            }
            first = false;

            out.push_str(&node.class_name);
            if let Some(message) = &node.message {
                out.push_str(": ");
                out.push_str(message);
            }
            for frame in &node.stack_trace {
                out.push_str("\n\tat ");
                out.push_str(&frame.to_string());
            }
            current = node.cause.as_deref();
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }
}

fn dyn_class_name(error: &(dyn Error + 'static)) -> String {
    if error.downcast_ref::<std::io::Error>().is_some() {
        return "std::io::Error".to_string();
    }

    let debug = format!("{:?}", error);
    let name: String = debug
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == ':')
        .collect();
    if name.is_empty() {
        "Error".to_string()
    } else {
        name
    }
}
