//! Engine configuration. There are no environment variables and no CLI: the
//! only configuration surface is what a caller passes in when constructing
//! a [`crate::document::Document`].

/// Resolved, caller-supplied configuration for one concat document.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Globally disables type-suppression span synthesis when `false`.
    pub suppress_type_errors: bool,

    /// Whether this document is in interactive-window mode, where closing a
    /// notebook cell is a no-op and only closing the interactive input cell
    /// clears state.
    pub interactive: bool,

    /// The URI scheme that identifies the interactive input cell.
    pub interactive_scheme: String,

    /// Default word-boundary pattern substituted when the caller-supplied
    /// pattern is absent or can match the empty string.
    pub default_word_pattern: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            suppress_type_errors: true,
            interactive: false,
            interactive_scheme: "vscode-interactive-input".to_owned(),
            default_word_pattern: r"\w+".to_owned(),
        }
    }
}
