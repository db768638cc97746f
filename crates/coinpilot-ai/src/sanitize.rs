//! Lightweight markdown stripping for streamed fragments

use std::sync::LazyLock;

use regex::Regex;

static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());

static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.*?)\*").unwrap());

/// One or more `###` markers at the start of a line, with trailing blanks.
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?:###[ \t]*)+").unwrap());

static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^- ").unwrap());

/// Strip emphasis and heading markers and turn `- ` list items into bullets.
///
/// Works on a single fragment; a marker pair split across two fragments is
/// left untouched.
pub fn sanitize(fragment: &str) -> String {
    let text = BOLD.replace_all(fragment, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    let text = HEADING.replace_all(&text, "");
    LIST_ITEM.replace_all(&text, "• ").into_owned()
}
