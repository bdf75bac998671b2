//! Errors the engine raises loudly. Most failure modes in the span engine
//! are total (they return a sentinel) per the engine's error taxonomy; this
//! type only covers the one case that must fail loudly instead.

/// Crate-wide result alias, named the way a host crate's top-level
/// `Result<T>` alias is usually named, but backed by this crate's own
/// typed error rather than a blanket `anyhow::Error`.
pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Raised by the concat document facade's generic `offset_at`/`position_at`
    /// guard: those APIs only exist to satisfy a general document interface
    /// and are never correct here, since the concat document has
    /// discontiguous real coordinates.
    #[error(
        "offset_at/position_at are not meaningful on the concat document \
         (its real coordinates are discontiguous); use the explicit cell-aware variants"
    )]
    ConcatFacadeMisuse,
}
