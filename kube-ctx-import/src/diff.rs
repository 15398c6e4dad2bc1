use std::fmt::Write as _;

use console::style;
use similar::{ChangeTag, TextDiff};

/// Line diff of two rendered kubeconfigs, removals in red and additions in
/// green.
pub fn render(before: &str, after: &str) -> String {
    let mut out = String::new();
    for change in TextDiff::from_lines(before, after).iter_all_changes() {
        let line = change.value().trim_end_matches('\n');
        // Writing to a String cannot fail.
        let _ = match change.tag() {
            ChangeTag::Delete => writeln!(out, "{}", style(format!("-{line}")).red().for_stderr()),
            ChangeTag::Insert => writeln!(out, "{}", style(format!("+{line}")).green().for_stderr()),
            ChangeTag::Equal => writeln!(out, " {line}"),
        };
    }
    out
}
