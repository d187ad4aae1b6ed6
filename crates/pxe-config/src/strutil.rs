/*
 * SPDX-FileCopyrightText: Copyright (c) 2026 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
 * SPDX-License-Identifier: LicenseRef-NvidiaProprietary
 *
 * NVIDIA CORPORATION, its affiliates and licensors retain all intellectual
 * property and proprietary rights in and to this material, related
 * documentation and any modifications thereto. Any use, reproduction,
 * disclosure or distribution of this material and related documentation
 * without an express license agreement from NVIDIA CORPORATION or
 * its affiliates is strictly prohibited.
 */

//! Small string helpers shared by the config parser and the host-side tooling.

const WHITESPACE: &[char] = &[' ', '\t', '\n', '\r'];

/// Trims spaces, tabs and line endings from both ends.
pub fn strip(s: &str) -> &str {
    s.trim_matches(WHITESPACE)
}

/// Trims spaces, tabs and line endings from the end only.
pub fn strip_right(s: &str) -> &str {
    s.trim_end_matches(WHITESPACE)
}

/// ASCII case-insensitive prefix test.
pub fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len()
        && s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Returns the text following `keyword` and a single space or tab separator.
///
/// The keyword comparison ignores ASCII case. `None` is returned when the line
/// does not start with the keyword, or when the keyword is not followed by a
/// separator (so `labels foo` does not match `label`).
pub fn keyword_argument<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    if !starts_with_ignore_case(line, keyword) {
        return None;
    }
    let rest = &line[keyword.len()..];
    rest.strip_prefix(' ').or_else(|| rest.strip_prefix('\t'))
}

/// Splits `s` on `pattern`. A trailing empty element is dropped, empty
/// elements in between are kept.
pub fn split<'a>(s: &'a str, pattern: &str) -> Vec<&'a str> {
    let mut parts: Vec<&str> = s.split(pattern).collect();
    if parts.last().is_some_and(|last| last.is_empty()) {
        parts.pop();
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip() {
        assert_eq!(strip("  \tfoo bar \n"), "foo bar");
        assert_eq!(strip(""), "");
        assert_eq!(strip_right("  foo\t \r\n"), "  foo");
    }

    #[test]
    fn test_starts_with_ignore_case() {
        assert!(starts_with_ignore_case("LABEL linux", "label"));
        assert!(starts_with_ignore_case("label", "label"));
        assert!(!starts_with_ignore_case("lab", "label"));
        assert!(!starts_with_ignore_case("kernel", "label"));
    }

    #[test]
    fn test_keyword_argument() {
        assert_eq!(keyword_argument("Kernel vmlinuz", "kernel"), Some("vmlinuz"));
        assert_eq!(keyword_argument("kernel\tvmlinuz", "kernel"), Some("vmlinuz"));
        assert_eq!(keyword_argument("say  indented", "say"), Some(" indented"));
        assert_eq!(keyword_argument("kernels vmlinuz", "kernel"), None);
        assert_eq!(keyword_argument("kernel", "kernel"), None);
    }

    #[test]
    fn test_split() {
        assert_eq!(split("a:b:c", ":"), vec!["a", "b", "c"]);
        assert_eq!(split("a::c:", ":"), vec!["a", "", "c"]);
        assert_eq!(split("KEY=value=x", "="), vec!["KEY", "value", "x"]);
        assert!(split("", ":").is_empty());
    }
}
