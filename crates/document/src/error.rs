use model::{Geometry, GeometryError, PaletteError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// Even an empty ring could not hold the step; the edit must not proceed.
    #[error("undo step needs {requested} bytes but the budget is {limit} bytes")]
    InsufficientBudget { requested: usize, limit: usize },
    #[error("could not allocate {bytes} bytes for an undo step")]
    AllocationFailed { bytes: usize },
    #[error("frame geometry {frame:?} does not match live geometry {live:?}")]
    GeometryMismatch { frame: Geometry, live: Geometry },
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Palette(#[from] PaletteError),
}
