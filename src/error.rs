use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Rewrites themselves never fail: a pass whose preconditions do not hold leaves the graph
/// untouched, and broken internal invariants panic. The errors below are reserved for input
/// handed over by the lifter that cannot be processed at all, and for the verifiers that check
/// a graph after the fact.
///
/// # Error Categories
///
/// ## Input Errors
/// - [`Error::Malformed`] - A CFG whose shape contradicts its terminators
/// - [`Error::Empty`] - A function without blocks
///
/// ## Verification Errors
/// - [`Error::GraphError`] - Inconsistent use-def lists, one-sided edges, duplicate blocks
///
/// # Examples
///
/// ```rust
/// use smxscope::{cfg::IlControlFlowGraph, Error};
///
/// let mut cfg = IlControlFlowGraph::new(0);
/// cfg.add_block(0x10)?;
/// match cfg.add_block(0x10) {
///     Err(Error::GraphError(message)) => assert!(message.contains("already starts")),
///     other => panic!("unexpected {other:?}"),
/// }
/// # Ok::<(), smxscope::Error>(())
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The input graph is damaged and could not be processed.
    ///
    /// The error includes the source location where the malformation was detected for
    /// debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Provided input was empty.
    ///
    /// Returned when a function without any block is handed to the pipeline.
    #[error("Provided input was empty")]
    Empty,

    /// Graph construction or verification error.
    ///
    /// Raised when building a CFG with conflicting blocks or edges, and by the verifiers
    /// ([`IlGraph::check_use_def`](crate::il::IlGraph::check_use_def),
    /// [`IlControlFlowGraph::check_edges`](crate::cfg::IlControlFlowGraph::check_edges)).
    #[error("{0}")]
    GraphError(String),
}
