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

//! Line oriented parser for the subset of the PXELINUX configuration syntax
//! that matters for booting a kernel: `say`, `default`, `label`, `kernel` and
//! `append`. Keywords are matched case-insensitively and may be separated from
//! their argument by a space or a tab. Everything else is ignored, which keeps
//! the parser usable on real-world configs full of `menu`, `timeout` and
//! `prompt` lines.

use std::io::BufRead;

use crate::entry::BootEntry;
use crate::menu::BootMenu;
use crate::strutil::{keyword_argument, strip, strip_right};

const SAY: &str = "say";
const LABEL: &str = "label";
const KERNEL: &str = "kernel";
const APPEND: &str = "append";
const DEFAULT: &str = "default";

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("line {line}: '{directive}' is only valid inside a label section")]
    OutsideEntry {
        line: usize,
        directive: &'static str,
    },
    #[error("line {line}: '{directive}' requires an argument")]
    MissingArgument {
        line: usize,
        directive: &'static str,
    },
    #[error("Error reading PXE configuration: {0}")]
    Io(#[from] std::io::Error),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// How the parser treats directives it understands but which are misplaced
/// or incomplete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Ignore them, like PXELINUX does.
    #[default]
    Permissive,
    /// Reject them with a [`ParseError`].
    Strict,
}

/// Where the parser currently is in the file.
#[derive(Debug, Clone, Default)]
enum ParserState {
    /// Before the first `label`, or between entries.
    #[default]
    Global,
    /// Collecting `kernel`/`append` lines for the entry being built.
    Entry(BootEntry),
}

/// Builds a [`BootMenu`] from PXE configuration lines.
///
/// A parser handles a single configuration; create a new one per file.
#[derive(Debug, Default)]
pub struct PxeParser {
    mode: ParseMode,
    state: ParserState,
    menu: BootMenu,
    line_no: usize,
}

impl PxeParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: ParseMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn in_entry(&self) -> bool {
        matches!(self.state, ParserState::Entry(_))
    }

    /// Processes a single line. Blank lines and `#` comments are always no-ops.
    pub fn feed_line(&mut self, line: &str) -> ParseResult<()> {
        self.line_no += 1;

        let line = strip(line);
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }
        tracing::trace!(
            line_no = self.line_no,
            line,
            in_entry = self.in_entry(),
            "PXE config line"
        );

        // A `label` inside an entry closes that entry and is then handled
        // again from the global section, where it opens the next one. The
        // second pass can never loop again because the state is Global by then.
        let mut pending = Some(line);
        while let Some(line) = pending.take() {
            if self.in_entry() && keyword_argument(line, LABEL).is_some() {
                self.finish_entry();
                pending = Some(line);
                continue;
            }

            if self.in_entry() {
                self.feed_entry_line(line)?;
            } else {
                self.feed_global_line(line)?;
            }
        }

        Ok(())
    }

    fn feed_global_line(&mut self, line: &str) -> ParseResult<()> {
        if let Some(text) = keyword_argument(line, SAY) {
            self.menu.add_message(strip_right(text));
        } else if let Some(name) = keyword_argument(line, LABEL) {
            self.state = ParserState::Entry(BootEntry::new(strip(name)));
        } else if let Some(label) = keyword_argument(line, DEFAULT) {
            self.menu.set_default_label(strip(label));
        } else if self.mode == ParseMode::Strict {
            self.check_bare(line, &[LABEL, DEFAULT])?;
            for directive in [KERNEL, APPEND] {
                if is_directive(line, directive) {
                    return Err(ParseError::OutsideEntry {
                        line: self.line_no,
                        directive,
                    });
                }
            }
        }

        Ok(())
    }

    fn feed_entry_line(&mut self, line: &str) -> ParseResult<()> {
        let ParserState::Entry(entry) = &mut self.state else {
            return Ok(());
        };

        if let Some(kernel) = keyword_argument(line, KERNEL) {
            entry.set_kernel(strip(kernel));
        } else if let Some(append) = keyword_argument(line, APPEND) {
            entry.set_append(strip(append));
        } else if self.mode == ParseMode::Strict {
            self.check_bare(line, &[KERNEL, APPEND])?;
        }

        Ok(())
    }

    fn check_bare(&self, line: &str, directives: &[&'static str]) -> ParseResult<()> {
        match directives.iter().find(|d| line.eq_ignore_ascii_case(d)) {
            Some(&directive) => Err(ParseError::MissingArgument {
                line: self.line_no,
                directive,
            }),
            None => Ok(()),
        }
    }

    fn finish_entry(&mut self) {
        if let ParserState::Entry(entry) = std::mem::take(&mut self.state) {
            tracing::trace!(
                label = entry.label(),
                kernel = entry.kernel(),
                initrd = entry.initrd(),
                append = entry.append(),
                "Adding boot entry"
            );
            self.menu.add_entry(entry);
        }
    }

    /// Stores an entry that is still open when the input ends. Calling it more
    /// than once is harmless.
    pub fn finish_parsing(&mut self) {
        self.finish_entry();
    }

    /// Feeds every line of `reader`, then finishes parsing.
    pub fn parse_stream<R: BufRead>(&mut self, reader: R) -> ParseResult<()> {
        for line in reader.lines() {
            self.feed_line(&line?)?;
        }
        self.finish_parsing();
        Ok(())
    }

    /// The menu as parsed so far. Complete only after [`PxeParser::finish_parsing`].
    pub fn config(&self) -> &BootMenu {
        &self.menu
    }

    /// Finishes parsing and hands out the menu.
    pub fn into_menu(mut self) -> BootMenu {
        self.finish_parsing();
        self.menu
    }
}

fn is_directive(line: &str, directive: &str) -> bool {
    line.eq_ignore_ascii_case(directive) || keyword_argument(line, directive).is_some()
}

/// Parses a whole configuration permissively.
pub fn parse(text: &str) -> BootMenu {
    let mut parser = PxeParser::new();
    for line in text.lines() {
        if let Err(e) = parser.feed_line(line) {
            tracing::warn!(error = %e, "Unexpected error in permissive PXE parsing");
        }
    }
    parser.into_menu()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_say_accumulates_in_order() {
        let menu = parse("say First line   \nSAY\tSecond line\nsay  indented\n");
        assert_eq!(menu.message(), "\nFirst line\nSecond line\n indented");
    }

    #[test]
    fn test_say_inside_entry_is_ignored() {
        let menu = parse("label a\nsay hidden\n");
        assert_eq!(menu.message(), "");
        assert_eq!(menu.len(), 1);
    }

    #[test]
    fn test_keywords_ignore_case_and_accept_tabs() {
        let menu = parse("LABEL\tLinux\nKeRnEl\t vmlinuz \nAPPEND  initrd=i.img quiet  \n");
        let entry = menu.entry("linux");
        assert_eq!(entry.label(), "Linux");
        assert_eq!(entry.kernel(), "vmlinuz");
        assert_eq!(entry.append(), "initrd=i.img quiet");
        assert_eq!(entry.initrd(), "i.img");
    }

    #[test]
    fn test_directives_before_first_label_are_dropped() {
        let menu = parse("kernel lost.bin\nappend lost=1\nlabel a\n");
        let entry = menu.entry("a");
        assert_eq!(entry.kernel(), "");
        assert_eq!(entry.append(), "");
    }

    #[test]
    fn test_default_label() {
        let menu = parse("default  rescue \nlabel linux\nlabel rescue\n");
        assert_eq!(menu.default_label(), Some("rescue"));
        assert_eq!(menu.default_entry().map(BootEntry::label), Some("rescue"));
    }

    #[test]
    fn test_unknown_directives_are_ignored() {
        let menu = parse(
            "prompt 1\ntimeout 50\nmenu title Lab\n\
             label a\nmenu label ^A\nipappend 2\nkernel a.bin\n",
        );
        assert_eq!(menu.len(), 1);
        assert_eq!(menu.entry("a").kernel(), "a.bin");
    }

    #[test]
    fn test_label_without_separator_is_not_a_label() {
        let menu = parse("label a\nlabels b\nlabel\n");
        assert_eq!(menu.entry_names(), vec!["a"]);
    }

    #[test]
    fn test_finish_parsing_is_idempotent() {
        let mut parser = PxeParser::new();
        parser.feed_line("label a").unwrap();
        assert!(parser.in_entry());
        assert!(parser.config().is_empty());

        parser.finish_parsing();
        parser.finish_parsing();
        assert!(!parser.in_entry());
        assert_eq!(parser.config().len(), 1);
    }

    #[test]
    fn test_strict_mode_rejects_misplaced_directives() {
        let mut parser = PxeParser::with_mode(ParseMode::Strict);
        parser.feed_line("# comment").unwrap();
        parser.feed_line("").unwrap();
        let err = parser.feed_line("kernel vmlinuz").unwrap_err();
        assert!(matches!(
            err,
            ParseError::OutsideEntry {
                line: 3,
                directive: "kernel"
            }
        ));

        let mut parser = PxeParser::with_mode(ParseMode::Strict);
        parser.feed_line("label a").unwrap();
        let err = parser.feed_line("append").unwrap_err();
        assert!(matches!(
            err,
            ParseError::MissingArgument {
                line: 2,
                directive: "append"
            }
        ));

        let mut parser = PxeParser::with_mode(ParseMode::Strict);
        assert!(parser.feed_line("LABEL").is_err());
    }

    #[test]
    fn test_permissive_mode_never_fails() {
        let mut parser = PxeParser::new();
        for line in ["kernel x", "append", "label", "default", "label a", "kernel"] {
            parser.feed_line(line).unwrap();
        }
        assert_eq!(parser.into_menu().len(), 1);
    }

    #[test]
    fn test_parse_stream_handles_crlf() {
        let mut parser = PxeParser::new();
        parser
            .parse_stream("label a\r\nkernel a.bin\r\n".as_bytes())
            .unwrap();
        assert_eq!(parser.config().entry("a").kernel(), "a.bin");
    }
}
