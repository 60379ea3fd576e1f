//! Block applicators
//!
//! One pure function per block type, plus [`apply_transformation`] which
//! routes a block to its function. Applicators never fail: a block that cannot
//! do its job hands the value back unchanged and the dispatcher records a
//! [`Diagnostic`](super::types::Diagnostic) in the context.
//!
//! Copyright (c) 2025 Wikimap Team
//! Licensed under the Apache-2.0 license

use crate::error::Severity;
use crate::field_path::resolve_field_path;
use super::types::{
    BlockConfig, ComposeConfig, DiagnosticKind, FindReplaceConfig, PrefixConfig, RegexConfig,
    SuffixConfig, TransformationBlock, TransformationContext,
};
use regex::{Captures, NoExpand, Regex, RegexBuilder};
use serde_json::Value;
use std::sync::OnceLock;

/// Regex flags that keep their meaning when carried over from the editor
pub const SAFE_FLAGS: [char; 5] = ['g', 'i', 'm', 's', 'u'];

static COMPOSE_TOKEN: OnceLock<Regex> = OnceLock::new();

fn compose_token() -> &'static Regex {
    COMPOSE_TOKEN.get_or_init(|| {
        Regex::new(r"\{\{(?:(value)|field:([^{}]+)|wikidata:([^{}]+))\}\}")
            .expect("compose token pattern is valid")
    })
}

/// `text + value`
pub fn apply_prefix(value: &str, config: &PrefixConfig) -> String {
    if config.text.is_empty() {
        return value.to_string();
    }
    format!("{}{}", config.text, value)
}

/// `value + text`
pub fn apply_suffix(value: &str, config: &SuffixConfig) -> String {
    if config.text.is_empty() {
        return value.to_string();
    }
    format!("{}{}", value, config.text)
}

/// Replace every literal occurrence of `find`.
///
/// `find` is never interpreted as a pattern. Matching is case-insensitive
/// unless `caseSensitive` is set, and `useWholeWord` restricts matches to
/// Unicode word boundaries, so accented letters count as word characters.
/// The replacement is inserted literally.
pub fn apply_find_replace(value: &str, config: &FindReplaceConfig) -> String {
    if config.find.is_empty() {
        return value.to_string();
    }

    let escaped = regex::escape(&config.find);
    let pattern = if config.use_whole_word {
        format!(r"\b{}\b", escaped)
    } else {
        escaped
    };

    match RegexBuilder::new(&pattern)
        .case_insensitive(!config.case_sensitive)
        .build()
    {
        Ok(regex) => regex.replace_all(value, NoExpand(&config.replace)).into_owned(),
        Err(e) => {
            // Escaped literals only fail on size limits
            log::warn!("Find/replace pattern for '{}' could not be built: {}", config.find, e);
            value.to_string()
        }
    }
}

/// Render a compose template.
///
/// `{{value}}` becomes the current value, `{{field:<path>}}` the resolved field
/// of `source` (empty when it does not resolve or there is no source) and
/// `{{wikidata:<QID>}}` the bare identifier. Tokens are expanded in one pass,
/// so text they insert is never expanded again; any other `{{...}}` is left as is.
pub fn apply_compose(value: &str, config: &ComposeConfig, source: Option<&Value>) -> String {
    let source = config.source_data.as_ref().or(source);

    compose_token()
        .replace_all(&config.pattern, |caps: &Captures<'_>| {
            if caps.get(1).is_some() {
                value.to_string()
            } else if let Some(path) = caps.get(2) {
                source
                    .map(|record| resolve_field_path(record, path.as_str()))
                    .unwrap_or_default()
            } else if let Some(qid) = caps.get(3) {
                qid.as_str().to_string()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Split a flag string into the honored subset and the dropped remainder.
///
/// Duplicates of honored flags are collapsed.
pub fn sanitize_flags(flags: &str) -> (String, String) {
    let mut kept = String::new();
    let mut dropped = String::new();
    for flag in flags.chars() {
        if SAFE_FLAGS.contains(&flag) {
            if !kept.contains(flag) {
                kept.push(flag);
            }
        } else {
            dropped.push(flag);
        }
    }
    (kept, dropped)
}

/// Compile a regex block's pattern with its sanitized flags.
///
/// `g` does not affect compilation; it is read by [`apply_regex`].
pub fn compile_regex(pattern: &str, flags: &str) -> Result<Regex, regex::Error> {
    let (flags, _) = sanitize_flags(flags);
    RegexBuilder::new(pattern)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .unicode(true)
        .build()
}

/// Rewrite `value` with a regex block.
///
/// Without the `g` flag only the first match is replaced. An empty pattern
/// leaves the value alone. Compilation errors are returned to the caller,
/// which decides how to degrade.
pub fn apply_regex(value: &str, config: &RegexConfig) -> Result<String, regex::Error> {
    if config.pattern.is_empty() {
        return Ok(value.to_string());
    }

    let regex = compile_regex(&config.pattern, &config.flags)?;
    let (flags, _) = sanitize_flags(&config.flags);
    let replacement = translate_replacement(&config.replacement, &regex);

    let result = if flags.contains('g') {
        regex.replace_all(value, replacement.as_str())
    } else {
        regex.replace(value, replacement.as_str())
    };
    Ok(result.into_owned())
}

/// Convert editor-style replacement syntax to the `regex` crate's.
///
/// Supported: `$1`..`$99` (two digits only when that group exists), `$&`,
/// `$<name>` and `$$`. Every other `$` is kept literally.
fn translate_replacement(replacement: &str, regex: &Regex) -> String {
    let group_count = regex.captures_len().saturating_sub(1);
    let chars: Vec<char> = replacement.chars().collect();
    let mut out = String::with_capacity(replacement.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '$' {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        match chars.get(i + 1) {
            Some('$') => {
                out.push_str("$$");
                i += 2;
            }
            Some('&') => {
                out.push_str("${0}");
                i += 2;
            }
            Some('<') => {
                let close = chars[i + 2..].iter().position(|c| *c == '>');
                match close {
                    Some(len) => {
                        let name: String = chars[i + 2..i + 2 + len].iter().collect();
                        if regex.capture_names().flatten().any(|n| n == name) {
                            out.push_str(&format!("${{{}}}", name));
                        } else {
                            out.push_str("$$<");
                            out.push_str(&name);
                            out.push('>');
                        }
                        i += 3 + len;
                    }
                    None => {
                        out.push_str("$$");
                        i += 1;
                    }
                }
            }
            Some(d) if d.is_ascii_digit() => {
                let first = d.to_digit(10).unwrap_or(0) as usize;
                let two_digit = chars
                    .get(i + 2)
                    .and_then(|c| c.to_digit(10))
                    .map(|second| first * 10 + second as usize)
                    .filter(|n| *n >= 1 && *n <= group_count);

                if let Some(group) = two_digit {
                    out.push_str(&format!("${{{}}}", group));
                    i += 3;
                } else if first >= 1 && first <= group_count {
                    out.push_str(&format!("${{{}}}", first));
                    i += 2;
                } else {
                    out.push_str("$$");
                    i += 1;
                }
            }
            _ => {
                out.push_str("$$");
                i += 1;
            }
        }
    }

    out
}

/// Apply one block to `value`.
///
/// Never fails. Invalid regex patterns and unsupported block types pass the
/// value through and leave a diagnostic in `context`.
pub fn apply_transformation(
    value: &str,
    block: &TransformationBlock,
    context: &mut TransformationContext<'_>,
) -> String {
    match &block.config {
        BlockConfig::Prefix(config) => apply_prefix(value, config),
        BlockConfig::Suffix(config) => apply_suffix(value, config),
        BlockConfig::FindReplace(config) => apply_find_replace(value, config),
        BlockConfig::Compose(config) => apply_compose(value, config, context.source_data),
        BlockConfig::Regex(config) => {
            let (_, dropped) = sanitize_flags(&config.flags);
            if !dropped.is_empty() {
                context.report(
                    block,
                    DiagnosticKind::DroppedFlags,
                    Severity::Info,
                    format!("Ignored unsupported regex flags '{}'", dropped),
                );
            }

            match apply_regex(value, config) {
                Ok(result) => result,
                Err(e) => {
                    context.report(
                        block,
                        DiagnosticKind::InvalidPattern,
                        Severity::Warning,
                        format!("Invalid regex pattern '{}': {}", config.pattern, e),
                    );
                    value.to_string()
                }
            }
        }
        BlockConfig::Invalid { reason, .. } => {
            context.report(
                block,
                DiagnosticKind::InvalidConfig,
                Severity::Warning,
                format!("Block config could not be used ({}), value passed through", reason),
            );
            value.to_string()
        }
        BlockConfig::Unsupported { type_name, .. } => {
            context.report(
                block,
                DiagnosticKind::UnsupportedBlockType,
                Severity::Warning,
                format!("Unknown transformation type '{}', value passed through", type_name),
            );
            value.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn regex_config(pattern: &str, flags: &str, replacement: &str) -> RegexConfig {
        RegexConfig {
            pattern: pattern.to_string(),
            flags: flags.to_string(),
            replacement: replacement.to_string(),
        }
    }

    #[test]
    fn test_sanitize_flags() {
        assert_eq!(sanitize_flags("gi"), ("gi".to_string(), String::new()));
        assert_eq!(sanitize_flags("gxy"), ("g".to_string(), "xy".to_string()));
        assert_eq!(sanitize_flags("ggimsuy"), ("gimsu".to_string(), "y".to_string()));
        assert_eq!(sanitize_flags(""), (String::new(), String::new()));
    }

    #[test]
    fn test_replacement_translation() {
        let regex = Regex::new(r"(\d{4})-(\d{2})").unwrap();
        assert_eq!(translate_replacement("[$1]", &regex), "[${1}]");
        assert_eq!(translate_replacement("$2/$1", &regex), "${2}/${1}");
        assert_eq!(translate_replacement("$1x", &regex), "${1}x");
        assert_eq!(translate_replacement("$&!", &regex), "${0}!");
        assert_eq!(translate_replacement("$$5", &regex), "$$5");
        assert_eq!(translate_replacement("$9", &regex), "$$9");
        assert_eq!(translate_replacement("cost $", &regex), "cost $$");
    }

    #[test]
    fn test_two_digit_group_only_when_it_exists() {
        let regex = Regex::new(r"(a)").unwrap();
        // $10 with a single group is group 1 followed by "0"
        assert_eq!(translate_replacement("$10", &regex), "${1}0");
    }

    #[test]
    fn test_named_groups() {
        let config = regex_config(r"(?P<year>\d{4})", "g", "<$<year>>");
        assert_eq!(apply_regex("in 1999", &config).unwrap(), "in <1999>");

        let config = regex_config(r"(\d{4})", "g", "$<missing>");
        assert_eq!(apply_regex("1999", &config).unwrap(), "$<missing>");
    }

    #[test]
    fn test_regex_without_global_flag_replaces_first_match() {
        let config = regex_config("o", "", "0");
        assert_eq!(apply_regex("foo boo", &config).unwrap(), "f0o boo");

        let config = regex_config("o", "g", "0");
        assert_eq!(apply_regex("foo boo", &config).unwrap(), "f00 b00");
    }

    #[test]
    fn test_regex_flags() {
        let config = regex_config("^abc", "gim", "X");
        assert_eq!(apply_regex("ABC\nabc", &config).unwrap(), "X\nX");

        let config = regex_config("a.b", "gs", "X");
        assert_eq!(apply_regex("a\nb", &config).unwrap(), "X");

        let config = regex_config("a.b", "g", "X");
        assert_eq!(apply_regex("a\nb", &config).unwrap(), "a\nb");
    }

    #[test]
    fn test_regex_empty_pattern_is_identity() {
        let config = regex_config("", "g", "X");
        assert_eq!(apply_regex("abc", &config).unwrap(), "abc");
    }

    #[test]
    fn test_unsupported_js_syntax_is_an_error() {
        // backreferences and the `[^]` any-char class have no equivalent here
        assert!(apply_regex("hello hello", &regex_config(r"(\w+)\s\1", "g", "$1")).is_err());
        assert!(apply_regex("ab", &regex_config("a[^]", "g", "X")).is_err());
        assert!(apply_regex("ab", &regex_config("a(?=b)", "g", "X")).is_err());
    }

    #[test]
    fn test_whole_word_boundaries_are_unicode_aware() {
        let config = FindReplaceConfig {
            find: "caf".to_string(),
            replace: "bar".to_string(),
            use_whole_word: true,
            ..Default::default()
        };
        assert_eq!(apply_find_replace("café", &config), "café");
        assert_eq!(apply_find_replace("caf é", &config), "bar é");

        let config = FindReplaceConfig {
            find: "Jos".to_string(),
            replace: "J.".to_string(),
            use_whole_word: true,
            ..Default::default()
        };
        assert_eq!(apply_find_replace("José, Jos", &config), "José, J.");
    }

    #[test]
    fn test_find_replace_case_sensitivity() {
        let mut config = FindReplaceConfig {
            find: "Paris".to_string(),
            replace: "Lyon".to_string(),
            ..Default::default()
        };
        assert_eq!(apply_find_replace("paris, PARIS", &config), "Lyon, Lyon");

        config.case_sensitive = true;
        assert_eq!(apply_find_replace("paris, Paris", &config), "paris, Lyon");
    }

    #[test]
    fn test_find_replace_inserts_replacement_literally() {
        let config = FindReplaceConfig {
            find: "price".to_string(),
            replace: "$1 & $&".to_string(),
            ..Default::default()
        };
        assert_eq!(apply_find_replace("price", &config), "$1 & $&");
    }

    #[test]
    fn test_compose_sources() {
        let config = ComposeConfig {
            pattern: "{{value}} ({{field:date}})".to_string(),
            source_data: None,
        };
        let record = json!({"date": "1642"});
        assert_eq!(apply_compose("Night Watch", &config, Some(&record)), "Night Watch (1642)");
        assert_eq!(apply_compose("Night Watch", &config, None), "Night Watch ()");

        let own = ComposeConfig {
            source_data: Some(json!({"date": "1665"})),
            ..config
        };
        assert_eq!(apply_compose("Girl", &own, Some(&record)), "Girl (1665)");
    }

    #[test]
    fn test_compose_is_single_pass() {
        let config = ComposeConfig {
            pattern: "{{value}}|{{field:a}}".to_string(),
            source_data: Some(json!({"a": "{{value}}"})),
        };
        assert_eq!(apply_compose("{{field:a}}", &config, None), "{{field:a}}|{{value}}");
    }

    #[test]
    fn test_compose_leaves_unknown_tokens() {
        let config = ComposeConfig {
            pattern: "{{value}} {{other:x}} {{ value }} {value}".to_string(),
            source_data: None,
        };
        assert_eq!(apply_compose("v", &config, None), "v {{other:x}} {{ value }} {value}");
    }
}
