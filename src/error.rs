//! The public, matchable error type. Everything else the pipeline can fail at - a bad decimal, an
//! unparseable date, a collaborator callback panicking its way into an `Err` - is tolerated and
//! logged rather than surfaced here (see the error handling design notes).
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessError {
    /// Malformed SSML: unclosed tags, a nested `<speak>`, or an element placed somewhere the
    /// containment rules forbid.
    #[error("malformed SSML input")]
    InputFormat(#[from] anyhow::Error),
    /// Tree construction finished without ever seeing a root `Speak` node - only reachable if the
    /// SSML reader's own "missing root `<speak>`" check was bypassed, so this indicates a bug in
    /// the caller's use of the lower-level reader rather than bad input.
    #[error("processed graph has no root Speak node")]
    MissingRoot,
}
