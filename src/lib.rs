use std::error::Error as StdError;
use std::fmt;

mod behaviors;
mod dom;
mod dom_utils;
mod html;
mod page;
mod selector;


pub use behaviors::{
    AlertAutoDismiss, AlertElement, AlertWidget, CartFeedback, DEFAULT_DELETE_PROMPT, ImagePreview,
    PageBehaviors, QuantityClamp, RatingWidget, RemoveOnClose, ScrollTopButton, SearchFilter,
    confirm_delete, scroll_to_top,
};
pub use page::{Page, PendingTimer, ScrollRequest, SelectedFile};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    UnsupportedSelector(String),
    SelectorNotFound(String),
    TypeMismatch {
        selector: String,
        expected: String,
        actual: String,
    },
    Behavior(String),
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::TypeMismatch {
                selector,
                expected,
                actual,
            } => write!(
                f,
                "type mismatch for {selector}: expected {expected}, actual {actual}"
            ),
            Self::Behavior(msg) => write!(f, "behavior error: {msg}"),
            Self::AssertionFailed {
                selector,
                expected,
                actual,
                dom_snippet,
            } => write!(
                f,
                "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
            ),
        }
    }
}

impl StdError for Error {}
