//! AI-assisted function review
//!
//! The core never talks to a model directly. Functions are prioritized,
//! given a review context, and handed to a [`Reviewer`] implementation on a
//! bounded worker pool. Structured replies are mapped back into findings.
//!
//! # Example
//!
//! ```rust,ignore
//! use codediag::ai::{prioritize_functions, review_functions, ReplayReviewer};
//!
//! let reviewer = ReplayReviewer::from_file(Path::new("replies.json"))?;
//! let candidates = prioritize_functions(&analysis);
//! let outcome = review_functions(&reviewer, &candidates, &analysis.modules, root, &config.ai)?;
//! ```

mod context;
mod prioritize;
mod replay;
mod review;

pub use context::{build_review_context, ReviewContext};
pub use prioritize::{prioritize_functions, priority_score};
pub use replay::ReplayReviewer;
pub use review::{
    map_reply, review_functions, RawFinding, ReviewOutcome, ReviewReply, ReviewRequest, Reviewer,
};

use thiserror::Error;

/// Errors from a single review request, or from setting up the review stage
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("No reply available for {0}")]
    NoReply(String),

    #[error("Reviewer failed: {0}")]
    Failed(String),

    #[error("Malformed reply: {0}")]
    Malformed(String),

    #[error("Reviewer panicked while reviewing {0}")]
    Panicked(String),

    #[error("Failed to build review pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to parse replies: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ReviewResult<T> = Result<T, ReviewError>;
