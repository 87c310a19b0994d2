//! Sign controller network CLI
//!
//! The invocation surface the web GUI shells out to: wired apply via
//! positional arguments, wireless apply via a JSON object on stdin, and a
//! wireless scan producing a JSON array on stdout.

pub mod commands;
