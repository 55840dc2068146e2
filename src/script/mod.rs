//! Request description files.
//!
//! A description file is line oriented:
//!
//! ```text
//! # full-line comment
//! x-client: replay        # header in the current scope
//! [login]                 # switch to (or create) the "login" sequence
//! +2.5                    # pause 2.5s before the next request
//! POST /session?next=/    # request line
//! accept: text/plain,     # header on the request just opened
//!   application/json      # indented lines continue the previous header
//! -x-client               # delete a header in the current scope
//! !x-client               # reset a header to its inherited value
//! []                      # back to the global scope
//! ```
mod model;
mod parser;

#[cfg(test)]
mod tests;

pub use model::{Entry, Gap, Request, Sequence};
pub use parser::{ParseState, parse_files, parse_str};
