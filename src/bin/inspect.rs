// SPDX-License-Identifier: GPL-3.0-only

//! Softboard layout inspector.
//!
//! Loads a JSON layout file, builds the keyboard geometry, and dumps the row
//! layout plus the initial draw-command list. Useful for checking a layout
//! document without wiring up a host adapter.
//!
//! Usage: `softboard-inspect <layout.json> [display_width]`

use std::process::ExitCode;

use softboard::keyboard::EnterKeyKind;
use softboard::layout::{build, parse_layout_file};
use softboard::render::{Renderer, VisualState};

const DEFAULT_DISPLAY_WIDTH: f32 = 360.0;

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("softboard=info".parse().expect("static directive parses")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: softboard-inspect <layout.json> [display_width]");
        return ExitCode::FAILURE;
    };
    let display_width = match args.next() {
        Some(raw) => match raw.parse::<f32>() {
            Ok(width) if width > 0.0 => width,
            _ => {
                eprintln!("display_width must be a positive number, got '{raw}'");
                return ExitCode::FAILURE;
            }
        },
        None => DEFAULT_DISPLAY_WIDTH,
    };

    let spec = match parse_layout_file(&path) {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("failed to load '{path}': {e}");
            return ExitCode::FAILURE;
        }
    };

    let keyboard = match build(&spec, display_width, EnterKeyKind::Enter) {
        Ok(keyboard) => keyboard,
        Err(e) => {
            eprintln!("failed to build '{path}': {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        layout = %spec.name,
        keys = keyboard.key_count(),
        rows = keyboard.rows().len(),
        width = keyboard.min_width,
        height = keyboard.height,
        "built keyboard"
    );

    for (i, row) in keyboard.rows().iter().enumerate() {
        println!(
            "row {i}: y={:.1} height={:.1} width={:.1}",
            row.y, row.height, row.declared_width
        );
        for key in &keyboard.keys()[row.keys.clone()] {
            let extras = [
                key.repeatable.then_some("repeatable"),
                key.popup_characters.as_deref().map(|_| "popup"),
                (key.edge_flags.left || key.edge_flags.right).then_some("edge"),
            ]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(",");
            println!(
                "  [{:>4}] '{}' x={:.1} w={:.1} {}",
                key.code, key.label, key.x, key.width, extras
            );
        }
    }

    let mut renderer = Renderer::new();
    let commands = renderer.paint(&keyboard, &VisualState::default());
    println!("initial paint: {} draw commands", commands.len());
    for command in &commands {
        println!("  {command:?}");
    }

    ExitCode::SUCCESS
}
