use thiserror::Error;

/// Failures from geometric primitives on malformed input.
///
/// Operations whose *result* is geometrically empty return an empty value
/// instead of an error; these variants only cover inputs that never were
/// valid geometry.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// Fewer than three distinct vertices.
    #[error("polygon needs at least 3 vertices, got {0}")]
    InvalidPolygon(usize),

    /// A coordinate was NaN or infinite.
    #[error("non-finite coordinate")]
    InvalidPoint,

    /// The vertices are valid but span no area.
    #[error("degenerate polygon with zero area")]
    Degenerate,

    /// An operation that needs a non-empty input received none.
    #[error("empty geometry")]
    Empty,
}
