//! ctype vocabulary, native-tag classification and collapse preferences.
//!
//! Both preference functions are ordered rule tables evaluated top to bottom.
//! The order is translator-visible behavior and must not be reshuffled.

pub const TAB: &str = "tab";
pub const VARIABLE_NAME: &str = "variable-name";
pub const VARIABLE: &str = "variable";
pub const BOLD: &str = "bold";
pub const ITALIC: &str = "italic";
pub const UNDERLINED: &str = "underlined";
pub const PLAIN: &str = "plain";
pub const SUPERSCRIPT: &str = "superscript";
pub const SUBSCRIPT: &str = "subscript";
pub const NORMAL_POSITION: &str = "normal-position";
pub const LINE_BREAK: &str = "lb";
pub const LINK: &str = "link";
pub const IMAGE: &str = "image";
pub const UNMATCHED_CLOSE: &str = "x-unmatched-close";
/// Inline native content that is not an element, such as a comment.
pub const NATIVE_CONTENT: &str = "x-native";

/// Prefix of extension ctypes that carry no standard meaning.
pub const GENERIC_PREFIX: &str = "x-";

/// Standard ctype for a native inline element, `x-<name>` when unknown.
pub fn native_ctype(tag_name: &str) -> String {
    let name = tag_name.to_ascii_lowercase();
    let ctype = match name.as_str() {
        "b" | "strong" => BOLD,
        "i" | "em" | "cite" | "dfn" => ITALIC,
        "u" | "ins" => UNDERLINED,
        "a" => LINK,
        "sup" => SUPERSCRIPT,
        "sub" => SUBSCRIPT,
        "br" => LINE_BREAK,
        "img" => IMAGE,
        "var" => VARIABLE,
        "tab" => TAB,
        "code" | "kbd" | "samp" | "tt" => "x-code",
        "font" | "span" => "x-font",
        _ => return format!("{}{}", GENERIC_PREFIX, name),
    };
    ctype.to_string()
}

/// A ctype that is neither empty nor an extension (`x-`) value.
pub fn is_meaningful(ctype: &str) -> bool {
    !ctype.is_empty() && !ctype.starts_with(GENERIC_PREFIX)
}

/// Preference order for two adjacent `x` tags collapsing into one.
const STANDALONE_PREFERENCE: &[&str] = &[
    TAB,
    VARIABLE_NAME,
    VARIABLE,
    BOLD,
    ITALIC,
    PLAIN,
    SUPERSCRIPT,
    SUBSCRIPT,
    NORMAL_POSITION,
    LINE_BREAK,
    LINK,
];

/// ctype for the `x` replacing two adjacent `x` tags.
///
/// The first entry of the preference table present on either side wins; with
/// no match the second ctype is kept.
pub fn prefer_standalone<'a>(first: &'a str, second: &'a str) -> &'a str {
    STANDALONE_PREFERENCE
        .iter()
        .find(|preferred| first == **preferred || second == **preferred)
        .map_or(second, |preferred| {
            if first == *preferred { first } else { second }
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Link,
    Outer,
    Inner,
}

struct NestedRule {
    applies: fn(&str, &str) -> bool,
    choice: Choice,
}

fn either_is_link(outer: &str, inner: &str) -> bool {
    outer == LINK || inner == LINK
}

fn only_outer_meaningful(outer: &str, inner: &str) -> bool {
    is_meaningful(outer) && !is_meaningful(inner)
}

fn only_inner_meaningful(outer: &str, inner: &str) -> bool {
    !is_meaningful(outer) && is_meaningful(inner)
}

const NESTED_RULES: &[NestedRule] = &[
    NestedRule {
        applies: either_is_link,
        choice: Choice::Link,
    },
    NestedRule {
        applies: only_outer_meaningful,
        choice: Choice::Outer,
    },
    NestedRule {
        applies: only_inner_meaningful,
        choice: Choice::Inner,
    },
];

/// ctype for a placeholder replacing an outer code wrapped around an inner one
/// (`bx bx … ex ex` and `bx x ex`).
///
/// `link` always wins; otherwise the only side with a meaningful ctype; when
/// both or neither are meaningful, the inner one.
pub fn prefer_nested<'a>(outer: &'a str, inner: &'a str) -> &'a str {
    let choice = NESTED_RULES
        .iter()
        .find(|rule| (rule.applies)(outer, inner))
        .map_or(Choice::Inner, |rule| rule.choice);
    match choice {
        Choice::Link => LINK,
        Choice::Outer => outer,
        Choice::Inner => inner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_ctype_table() {
        assert_eq!(native_ctype("B"), "bold");
        assert_eq!(native_ctype("em"), "italic");
        assert_eq!(native_ctype("a"), "link");
        assert_eq!(native_ctype("br"), "lb");
        assert_eq!(native_ctype("blink"), "x-blink");
    }

    #[test]
    fn test_tab_beats_bold() {
        assert_eq!(prefer_standalone("tab", "bold"), "tab");
        assert_eq!(prefer_standalone("bold", "tab"), "tab");
    }

    #[test]
    fn test_standalone_order_is_respected() {
        assert_eq!(prefer_standalone("link", "lb"), "lb");
        assert_eq!(prefer_standalone("italic", "variable"), "variable");
        assert_eq!(prefer_standalone("superscript", "plain"), "plain");
        assert_eq!(prefer_standalone("normal-position", "subscript"), "subscript");
    }

    #[test]
    fn test_standalone_falls_back_to_second() {
        assert_eq!(prefer_standalone("x-foo", "x-bar"), "x-bar");
        assert_eq!(prefer_standalone("image", ""), "");
    }

    #[test]
    fn test_link_always_wins_when_nested() {
        assert_eq!(prefer_nested("x-foo", "link"), "link");
        assert_eq!(prefer_nested("link", "bold"), "link");
    }

    #[test]
    fn test_meaningful_side_wins_when_nested() {
        assert_eq!(prefer_nested("bold", "x-font"), "bold");
        assert_eq!(prefer_nested("x-font", "italic"), "italic");
        assert_eq!(prefer_nested("", "x-font"), "x-font");
    }

    #[test]
    fn test_nested_tie_prefers_inner() {
        assert_eq!(prefer_nested("bold", "italic"), "italic");
        assert_eq!(prefer_nested("x-a", "x-b"), "x-b");
    }
}
