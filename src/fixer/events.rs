//! Change journal of the code fixer.
//!
//! Every rewrite a pass performs is recorded as an [`Event`] in an [`EventLog`],
//! with the block and node it happened at and the pass that did it. The log can be
//! inspected by tests and tooling or ignored.
//!
//! # Example
//!
//! ```rust
//! use smxscope::fixer::{EventKind, EventLog};
//!
//! let mut log = EventLog::new();
//! log.record(EventKind::StoreCoalesced)
//!     .pass("store-coalescing")
//!     .message("int x = a + b");
//!
//! assert_eq!(log.count_kind(EventKind::StoreCoalesced), 1);
//! assert_eq!(log.summary(), "1 store coalesced");
//! ```

use std::{collections::BTreeMap, fmt};

use strum::EnumIter;

use crate::{cfg::BlockId, il::NodeId};

/// Categories of events that can be logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum EventKind {
    /// A constant used as an array base became a global reference.
    GlobalResolved,
    /// An implicit element-zero access got an explicit index.
    ArrayIndexInserted,
    /// Pointer arithmetic on an array became an element access.
    ArrayArithmeticIndexed,
    /// A float native call became an operator.
    FloatNativeReplaced,
    /// A returned value was stripped in a void function.
    ReturnValueStripped,
    /// A comparison of a bool against zero was simplified.
    BoolCompareSimplified,
    /// A store was folded into the declaration before it.
    StoreCoalesced,
    /// A store wrapping an increment or decrement was dropped.
    IncDecUnwrapped,
    /// A compiler temporary was inlined at its use.
    TemporaryInlined,
    /// An unused compiler temporary was removed.
    TemporaryRemoved,
    /// A short-circuit boolean temporary was folded into the branch.
    ShortCircuitFlattened,
    /// A basic block was removed.
    BlockRemoved,

    /// A pass completed.
    PassCompleted,
}

impl EventKind {
    /// Returns a human-readable description of this event kind.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::GlobalResolved => "global resolved",
            Self::ArrayIndexInserted => "array index inserted",
            Self::ArrayArithmeticIndexed => "array arithmetic indexed",
            Self::FloatNativeReplaced => "float native replaced",
            Self::ReturnValueStripped => "return value stripped",
            Self::BoolCompareSimplified => "bool compare simplified",
            Self::StoreCoalesced => "store coalesced",
            Self::IncDecUnwrapped => "inc/dec unwrapped",
            Self::TemporaryInlined => "temporary inlined",
            Self::TemporaryRemoved => "temporary removed",
            Self::ShortCircuitFlattened => "short circuit flattened",
            Self::BlockRemoved => "block removed",
            Self::PassCompleted => "pass completed",
        }
    }

    /// Returns true if this event represents a rewrite of the graph.
    #[must_use]
    pub fn is_transformation(&self) -> bool {
        !matches!(self, Self::PassCompleted)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A single logged event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// The type of event.
    pub kind: EventKind,
    /// Block the event happened in, when it is tied to one.
    pub block: Option<BlockId>,
    /// Node the event is about, when it is tied to one.
    pub node: Option<NodeId>,
    /// Human-readable description.
    pub message: String,
    /// Name of the pass that recorded the event.
    pub pass: Option<&'static str>,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.kind)?;
        if let Some(block) = self.block {
            write!(f, " {block}")?;
        }
        if let Some(node) = self.node {
            write!(f, " {node}")?;
        }
        write!(f, " {}", self.message)
    }
}

/// Builder for creating events with a fluent API.
///
/// Created by [`EventLog::record`]. The event is added to the log when the builder is
/// dropped.
pub struct EventBuilder<'a> {
    log: &'a mut EventLog,
    kind: EventKind,
    block: Option<BlockId>,
    node: Option<NodeId>,
    message: Option<String>,
    pass: Option<&'static str>,
}

impl<'a> EventBuilder<'a> {
    fn new(log: &'a mut EventLog, kind: EventKind) -> Self {
        Self {
            log,
            kind,
            block: None,
            node: None,
            message: None,
            pass: None,
        }
    }

    /// Sets the block and node where the event occurred.
    pub fn at(mut self, block: BlockId, node: NodeId) -> Self {
        self.block = Some(block);
        self.node = Some(node);
        self
    }

    /// Sets only the block.
    pub fn block(mut self, block: BlockId) -> Self {
        self.block = Some(block);
        self
    }

    /// Sets a custom message describing the event.
    pub fn message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Associates this event with a pass.
    pub fn pass(mut self, pass_name: &'static str) -> Self {
        self.pass = Some(pass_name);
        self
    }
}

impl Drop for EventBuilder<'_> {
    fn drop(&mut self) {
        let message = self
            .message
            .take()
            .unwrap_or_else(|| self.kind.description().to_string());

        self.log.events.push(Event {
            kind: self.kind,
            block: self.block,
            node: self.node,
            message,
            pass: self.pass,
        });
    }
}

/// Collection of events from one fixer run.
///
/// Statistics are derived from the events rather than tracked separately.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Creates an empty event log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no events have been logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns the total number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Starts building a new event of the given kind.
    ///
    /// The event is added when the builder is dropped.
    pub fn record(&mut self, kind: EventKind) -> EventBuilder<'_> {
        EventBuilder::new(self, kind)
    }

    /// Returns true if any event of the given kind exists.
    #[must_use]
    pub fn has(&self, kind: EventKind) -> bool {
        self.events.iter().any(|e| e.kind == kind)
    }

    /// Counts events of the given kind.
    #[must_use]
    pub fn count_kind(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    /// Returns an iterator over all events.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Returns an iterator over events recorded by the named pass.
    pub fn filter_pass<'a>(&'a self, pass: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.events.iter().filter(move |e| e.pass == Some(pass))
    }

    /// Returns the number of transformation events.
    #[must_use]
    pub fn transformation_count(&self) -> usize {
        self.events.iter().filter(|e| e.kind.is_transformation()).count()
    }

    /// Generates a human-readable summary of all events.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return "no events".to_string();
        }

        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for event in self.events.iter().filter(|e| e.kind.is_transformation()) {
            *counts.entry(event.kind.description()).or_insert(0) += 1;
        }
        let mut parts: Vec<String> = counts
            .iter()
            .map(|(description, count)| format!("{count} {description}"))
            .collect();

        if parts.is_empty() {
            return format!("{} events", self.len());
        }

        parts.sort();
        parts.join(", ")
    }
}
