//! CLI prompts using cliclack (Charm-style inline prompts)
//!
//! This module is optional and only available when the `tui` feature is enabled.

mod prompts;

pub use prompts::{
    default_answers, load_versions, resolve_destination, resolve_template, run, CreateArgs,
};
