use thiserror::Error;

/// Fatal errors raised while tokenizing footprint text. No partial tree is
/// returned when one of these occurs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unbalanced parentheses at byte {offset}")]
    UnbalancedParens { offset: usize },

    #[error("empty document: no top-level form found")]
    EmptyDocument,
}

/// Soft errors raised while building a single element. The element is
/// dropped and the rest of the module is still built, except for
/// `UnknownLayer`, which keeps the element on the fallback layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ElementError {
    #[error("missing required `{node}` node")]
    MissingNode { node: &'static str },

    #[error("`{node}` needs {expected} fields, found {found}")]
    TooFewFields {
        node: String,
        expected: usize,
        found: usize,
    },

    #[error("`{node}` has a non-numeric or non-finite value {value:?}")]
    InvalidNumber { node: String, value: String },

    #[error("arc points are collinear")]
    DegenerateArc,

    #[error("unknown pad type {0:?}")]
    UnknownPadType(String),

    #[error("unsupported pad shape {0:?}")]
    UnsupportedPadShape(String),

    #[error("unrecognized layer {0:?}, drawn on the front default layer")]
    UnknownLayer(String),
}

#[derive(Error, Debug)]
pub enum PreviewError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("invalid canvas size {width}x{height}")]
    InvalidCanvas { width: f64, height: f64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
