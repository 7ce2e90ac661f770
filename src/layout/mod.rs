// SPDX-License-Identifier: GPL-3.0-only

//! JSON layout loading for softboard keyboards.
//!
//! This module turns a declarative JSON layout document into a fully resolved
//! [`crate::keyboard::Keyboard`] in two stages:
//!
//! 1. **Parsing** ([`parser`]): JSON text → [`KeyboardSpec`], with I/O and
//!    syntax errors carrying file-path and line-number context.
//! 2. **Building** ([`builder`]): [`KeyboardSpec`] + display width →
//!    [`crate::keyboard::Keyboard`], resolving keyboard → row → key sizing
//!    inheritance, percentage dimensions, and popup-layout references, while
//!    collecting [`ValidationIssue`]s.
//!
//! # Example
//!
//! ```rust,ignore
//! use softboard::keyboard::EnterKeyKind;
//! use softboard::layout::{build, parse_layout_file};
//!
//! let spec = parse_layout_file("layouts/qwerty.json")?;
//! let keyboard = build(&spec, 360.0, EnterKeyKind::Enter)?;
//! println!("{} keys over {} rows", keyboard.key_count(), keyboard.rows().len());
//! ```

pub mod builder;
pub mod parser;
pub mod types;

pub use builder::build;
pub use parser::{parse_layout_file, parse_layout_from_string};
pub use types::{
    Dimension, EdgeFlag, KeySpec, KeyboardSpec, LayoutError, RowSpec, Severity, ValidationIssue,
};
