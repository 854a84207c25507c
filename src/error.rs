use thiserror::Error;

/// Fatal simulation failures. None of these are recoverable: the run stops,
/// but the pendulum keeps its last consistent state so partial statistics
/// (collision count, energy, last collision) stay readable.
#[derive(Debug, Error)]
pub enum PendulumError {
    /// The tangential-projection case analysis matched no quadrant case.
    /// Signals degenerate collision geometry or precision loss.
    #[error("precision limit reached: no tangential case for theta = {theta}, beta = {beta}")]
    GeometryExhausted { theta: f64, beta: f64 },

    /// The bob drifted more than 10% away from the nominal string length.
    #[error("the string was broken at t = {t} (x = {x}, y = {y}, energy = {energy})")]
    ConstraintViolated { t: f64, x: f64, y: f64, energy: f64 },

    /// An unrecognized diagnostic output mode was requested.
    #[error("invalid output mode: {selector}")]
    InvalidOutputSelector { selector: u8 },

    /// The diagnostic sink rejected a record.
    #[error("output error: {0}")]
    Output(#[from] csv::Error),
}
