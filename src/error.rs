use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompositorError {
    /// A spatial query found no widget: either the widget is not part of
    /// the current layout, or no widget sits under the queried coordinate.
    #[error("no widget: {0}")]
    NoWidget(String),
}

// Create a type alias for convenience
pub type Result<T> = std::result::Result<T, CompositorError>;
