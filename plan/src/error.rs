use thiserror::Error;

/// The pipeline error taxonomy.
///
/// Only `InvalidInput` and `MissingBoundary` propagate out of
/// `produce_layout`; every other kind is recoverable and gets captured
/// into `RunStats` alongside a partial layout.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The floor plan or configuration violates an input invariant.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The plan has neither a boundary, bounds, nor walls to derive one
    /// from.
    #[error("no boundary, bounds or walls to work from")]
    MissingBoundary,

    /// The allowed region came out empty after subtracting constraints.
    #[error("no feasible space left inside the boundary")]
    NoFeasibleSpace,

    /// The robust geometry backend was unavailable and a degraded
    /// fallback was used.
    #[error("geometry kernel degraded")]
    KernelDegraded,

    /// A stage ran out of its wall-clock budget.
    #[error("{stage} stage timed out")]
    TimeoutExpired { stage: &'static str },

    /// Pathfinding failed for one corridor edge.
    #[error("no path between {from} and {to}")]
    PathNotFound { from: String, to: String },

    /// The caller's cancellation token fired.
    #[error("cancelled")]
    Cancelled,
}
