//! Error types for the order and dependency core.
//!
//! Three families of failure, each handled differently by callers:
//!
//! - [`ContentError`] - malformed content found while building the catalog.
//!   Collected into a [`LoadReport`](crate::catalog::LoadReport), the
//!   offending node is skipped and loading continues.
//! - [`SaveError`] - a saved order record that violates the save schema.
//!   Fatal to the single load operation.
//! - [`GameError`] - everything the world API can reject at runtime.

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for world operations.
#[derive(Debug, Error)]
pub enum GameError {
    /// Invalid unit identifier.
    #[error("Unit not found: {0}")]
    UnitNotFound(u64),

    /// Invalid player identifier.
    #[error("Player not found: {0}")]
    PlayerNotFound(u8),

    /// A content identifier that does not name anything in the catalog.
    #[error("Unknown {kind} '{ident}'")]
    UnknownIdent {
        /// What kind of definition was looked up.
        kind: &'static str,
        /// The identifier that failed to resolve.
        ident: String,
    },

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path (or label) of the document that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Position outside of the map.
    #[error("Tile ({x}, {y}) is not on map layer {map_layer}")]
    OffMap {
        /// Tile x.
        x: i32,
        /// Tile y.
        y: i32,
        /// Map layer index.
        map_layer: usize,
    },

    /// Snapshot encoding failure.
    #[error("Snapshot failed: {0}")]
    Snapshot(String),

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// A saved order could not be restored.
    #[error(transparent)]
    Save(#[from] SaveError),

    /// Content failed validation.
    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Configuration errors reported while loading content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    /// A dependency node carries a tag with no registered builder.
    #[error("{owner}: unknown dependency tag '{tag}'")]
    UnknownDependencyTag {
        /// Definition owning the dependency tree.
        owner: String,
        /// The unrecognized tag.
        tag: String,
    },

    /// A reference to a definition that does not exist.
    #[error("{owner}: unresolved {kind} reference '{ident}'")]
    UnresolvedReference {
        /// Definition owning the reference.
        owner: String,
        /// Kind of the referenced definition.
        kind: &'static str,
        /// The identifier that failed to resolve.
        ident: String,
    },

    /// A dependency node lacks a field its tag requires.
    #[error("{owner}: '{tag}' dependency is missing field '{field}'")]
    MissingField {
        /// Definition owning the dependency tree.
        owner: String,
        /// Tag of the incomplete node.
        tag: String,
        /// Name of the missing field.
        field: &'static str,
    },

    /// A unit-type leaf with `count: 0`; "must not have" is written as `not`.
    #[error("{owner}: unit type '{unit_type}' requires count 0; wrap a count-1 leaf in 'not' instead")]
    ZeroCountLeaf {
        /// Definition owning the dependency tree.
        owner: String,
        /// Unit type named by the leaf.
        unit_type: String,
    },

    /// Both a scoped dependency and a legacy requirement list were given.
    #[error("{owner}: both 'dependency' and 'requirements' are set; keeping 'dependency'")]
    ConflictingDependency {
        /// Definition carrying both forms.
        owner: String,
    },

    /// A cost entry or setting below zero; it is loaded as zero.
    #[error("{owner}: {field} is negative ({value}); using 0")]
    NegativeValue {
        /// Definition (or `settings`) carrying the value.
        owner: String,
        /// Field name, with the resource for cost entries.
        field: String,
        /// The rejected value.
        value: i32,
    },

    /// Two definitions of the same kind share an identifier.
    #[error("duplicate {kind} '{ident}'")]
    DuplicateIdent {
        /// Kind of the definition.
        kind: &'static str,
        /// The repeated identifier.
        ident: String,
    },
}

/// Save/load schema violations for order records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveError {
    /// The record text is not well formed.
    #[error("syntax error at byte {offset}: {message}")]
    Syntax {
        /// Byte offset of the problem.
        offset: usize,
        /// What was expected.
        message: String,
    },

    /// The record tag names no known order kind.
    #[error("unknown order kind '{0}'")]
    UnknownOrder(String),

    /// A key that the order kind does not understand.
    #[error("{order}: unsupported tag '{key}'")]
    UnknownField {
        /// Order tag being loaded.
        order: String,
        /// The rejected key.
        key: String,
    },

    /// A key whose value has the wrong shape.
    #[error("{order}: bad value for '{key}': expected {expected}, found {found}")]
    MalformedValue {
        /// Order tag being loaded.
        order: String,
        /// Key whose value was rejected.
        key: String,
        /// Description of the expected value.
        expected: &'static str,
        /// Rendering of the value found.
        found: String,
    },

    /// A value with the right shape but outside the allowed range.
    #[error("{order}: value {value} out of range for '{key}'")]
    InvalidValue {
        /// Order tag being loaded.
        order: String,
        /// Offending key.
        key: String,
        /// Offending value.
        value: i64,
    },

    /// A mandatory key was absent.
    #[error("{order}: missing mandatory field '{field}'")]
    MissingField {
        /// Order tag being loaded.
        order: String,
        /// Name of the missing field.
        field: &'static str,
    },
}
