//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Show
//!
//! ```text
//! 00012-3456.png (PNG)
//! Prompt
//!     a lighthouse on a cliff
//! Negative prompt
//!     blurry
//! Parameters
//!     CFG scale: 7
//!     Steps: 30
//! ```
//!
//! Images without an annotation show the configured not-found text in place
//! of the three sections, plus a `Note:` line with the reason when verbose.
//!
//! ## Edit
//!
//! ```text
//! ==> Reading 00012-3456.png
//! ==> Wrote 00012-3456_edit.png (48213 bytes)
//! ```
//!
//! # Architecture
//!
//! Each `format_*` function returns `Vec<String>` (or a `String` for JSON)
//! and does no I/O; the `print_*` wrappers write to stdout.

use crate::prompt::ParsedPrompt;
use crate::session::LoadedImage;
use serde::Serialize;
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// A titled section with each line of `body` indented under it.
/// Empty bodies are skipped entirely.
fn section(title: &str, body: &str) -> Vec<String> {
    if body.is_empty() {
        return Vec::new();
    }
    std::iter::once(title.to_string())
        .chain(body.lines().map(|line| format!("{}{}", indent(1), line)))
        .collect()
}

/// Format the prompt, negative prompt and parameters for display.
pub fn format_prompt(parsed: &ParsedPrompt) -> Vec<String> {
    let mut lines = section("Prompt", &parsed.prompt);
    lines.extend(section("Negative prompt", &parsed.negative));
    lines.extend(section("Parameters", &parsed.param_text()));
    lines
}

/// Format everything known about a loaded image.
pub fn format_show_output(image: &LoadedImage, not_found_text: &str, verbose: bool) -> Vec<String> {
    let mut lines = vec![format!("{} ({})", image.name, image.format)];
    if image.has_annotation() && !image.parsed.is_empty() {
        lines.extend(format_prompt(&image.parsed));
    } else {
        lines.push(format!("{}{}", indent(1), not_found_text));
    }
    if verbose {
        if let Some(diagnostic) = &image.diagnostic {
            lines.push(format!("{}Note: {}", indent(1), diagnostic));
        }
    }
    lines
}

#[derive(Serialize)]
struct ShowJson<'a> {
    name: &'a str,
    format: crate::format::ImageFormat,
    found: bool,
    #[serde(flatten)]
    parsed: &'a ParsedPrompt,
}

/// Machine-readable form of a loaded image's annotation.
pub fn format_show_json(image: &LoadedImage) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ShowJson {
        name: &image.name,
        format: image.format,
        found: image.has_annotation(),
        parsed: &image.parsed,
    })
}

/// Stage line, as printed by the `edit` command.
pub fn format_stage(action: &str, path: &Path) -> String {
    format!("==> {} {}", action, path.display())
}

pub fn format_saved(path: &Path, len: usize) -> String {
    format!("==> Wrote {} ({} bytes)", path.display(), len)
}

pub fn print_show_output(image: &LoadedImage, not_found_text: &str, verbose: bool) {
    for line in format_show_output(image, not_found_text, verbose) {
        println!("{}", line);
    }
}

pub fn print_stage(action: &str, path: &Path) {
    println!("{}", format_stage(action, path));
}

pub fn print_saved(path: &Path, len: usize) {
    println!("{}", format_saved(path, len));
}
