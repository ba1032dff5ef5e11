//! Logical record extraction and classification for the SPICE-like
//! input syntax.
//!
//! The reader collapses line continuations and strips comments; the
//! classifier resolves each logical record into a closed [`Record`]
//! enum once, against the injected profile, so no string-prefix
//! inspection leaks into later stages.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::config::BoardProfile;

/// A lazily evaluated stream of logical records. Single pass, not
/// restartable; one reader per conversion run.
pub struct RecordReader<'a> {
    lines: std::str::Lines<'a>,
    buffer: String,
}

/// Iterates the logical records of a raw input text.
pub fn logical_records(input: &str) -> RecordReader<'_> {
    RecordReader {
        lines: input.lines(),
        buffer: String::new(),
    }
}

impl Iterator for RecordReader<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let Some(raw) = self.lines.next() else {
                // EOF flushes a still-pending continuation buffer.
                if self.buffer.split_whitespace().next().is_none() {
                    return None;
                }
                let record = collapse_whitespace(&self.buffer);
                self.buffer.clear();
                return Some(record);
            };

            // Comment stripping happens before continuation detection.
            // A line that is empty afterwards contributes nothing and
            // does not break a pending continuation chain.
            let line = strip_comments(raw);
            if line.trim().is_empty() {
                continue;
            }

            let line = line.trim_end();
            if let Some(stem) = line.strip_suffix('\\') {
                self.buffer.push_str(stem.trim_end());
                self.buffer.push(' ');
                continue;
            }

            self.buffer.push_str(line);
            let record = collapse_whitespace(&self.buffer);
            self.buffer.clear();
            if record.is_empty() {
                continue;
            }
            return Some(record);
        }
    }
}

/// Truncates an inline `;` comment and drops `*` full-line comments.
fn strip_comments(line: &str) -> &str {
    let line = match line.split_once(';') {
        Some((content, _)) => content,
        None => line,
    };

    if line.trim_start().starts_with('*') {
        ""
    } else {
        line
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The two-terminal device families recognized by reference prefix.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DiscreteKind {
    Capacitor,
    Resistor,
}

/// One classified logical record.
#[derive(Debug, PartialEq, Clone)]
pub enum Record {
    /// `REF NET1 NET2 VALUE` for a two-terminal device.
    Discrete {
        reference: String,
        kind: DiscreteKind,
        nets: [String; 2],
        value: String,
    },
    /// `pin_name=net_name` assignments for a multi-pin instance,
    /// already resolved to its component reference.
    Subcircuit {
        reference: String,
        assignments: Vec<(String, String)>,
    },
    /// End-of-netlist directive; consumed with no effect.
    End,
    /// Sources, directives, and unrecognized prefixes carry no
    /// pin-level connectivity and are dropped.
    Ignored,
}

#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("malformed `{head}` record: expected {expected} tokens, found {found}")]
    Malformed {
        head: String,
        expected: usize,
        found: usize,
    },
}

fn assignment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([A-Za-z0-9._]+)=(\S+)$").unwrap())
}

/// Accepts only `identifier=value` tokens with no embedded whitespace;
/// malformed assignment tokens are dropped individually.
pub(crate) fn parse_assignments(tokens: &[&str]) -> Vec<(String, String)> {
    let assignment = assignment_pattern();

    let mut assignments = Vec::new();
    for token in tokens {
        // The trailing subcircuit template token only names the source
        // template; strip it before assignment parsing.
        if token.ends_with(".subckt") {
            continue;
        }
        match assignment.captures(token) {
            Some(captures) => assignments.push((captures[1].to_string(), captures[2].to_string())),
            None => log::warn!("ignoring malformed pin assignment token `{token}`"),
        }
    }
    assignments
}

/// Decides the handling of one logical record.
pub fn classify(record: &str, profile: &BoardProfile) -> Result<Record, RecordError> {
    let tokens: Vec<&str> = record.split_whitespace().collect();
    let Some(&first) = tokens.first() else {
        return Ok(Record::Ignored);
    };
    let head = first.to_ascii_uppercase();

    if head.starts_with(".END") {
        return Ok(Record::End);
    }

    if let Some(subcircuit) = profile.subcircuit(&head) {
        return Ok(Record::Subcircuit {
            reference: subcircuit.reference.clone(),
            assignments: parse_assignments(&tokens[1..]),
        });
    }

    let kind = if head.len() > 1
        && head.starts_with('C')
        && head[1..].chars().all(|c| c.is_ascii_digit())
    {
        Some(DiscreteKind::Capacitor)
    } else if head.starts_with('R') {
        Some(DiscreteKind::Resistor)
    } else {
        None
    };

    if let Some(kind) = kind {
        if tokens.len() < 4 {
            return Err(RecordError::Malformed {
                head: first.to_string(),
                expected: 4,
                found: tokens.len(),
            });
        }
        return Ok(Record::Discrete {
            reference: first.to_string(),
            kind,
            nets: [tokens[1].to_string(), tokens[2].to_string()],
            // Trailing tokens past the value carry no connectivity.
            value: tokens[3].to_string(),
        });
    }

    // Voltage/current sources and other unknown prefixes.
    Ok(Record::Ignored)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(input: &str) -> Vec<String> {
        logical_records(input).collect()
    }

    #[test]
    fn comment_lines_are_dropped() {
        assert_eq!(
            records("* a comment\nR1 VCC OUT 220\n"),
            vec!["R1 VCC OUT 220"]
        );
    }

    #[test]
    fn inline_comments_are_truncated() {
        assert_eq!(
            records("R1 VCC OUT 220 ; pull-up\n"),
            vec!["R1 VCC OUT 220"]
        );
    }

    #[test]
    fn blank_lines_are_dropped() {
        assert_eq!(records("\n\nC1 VCC GND 100n\n\n"), vec!["C1 VCC GND 100n"]);
    }

    #[test]
    fn continuation_joins_lines_and_collapses_whitespace() {
        let input = "XU2 RS=CTRL_RS \\\n    RW=0   E=CTRL_E \\\n    lcd.subckt\n";
        assert_eq!(records(input), vec!["XU2 RS=CTRL_RS RW=0 E=CTRL_E lcd.subckt"]);
    }

    #[test]
    fn comment_only_line_does_not_break_a_continuation() {
        let input = "XU2 RS=CTRL_RS \\\n* annotation\nRW=0\n";
        assert_eq!(records(input), vec!["XU2 RS=CTRL_RS RW=0"]);
    }

    #[test]
    fn pending_buffer_is_flushed_at_end_of_input() {
        assert_eq!(records("XU2 RS=CTRL_RS \\"), vec!["XU2 RS=CTRL_RS"]);
    }

    #[test]
    fn classifies_capacitor_records() {
        let profile = BoardProfile::default();
        assert_eq!(
            classify("C1 VCC GND 100n", &profile),
            Ok(Record::Discrete {
                reference: "C1".to_string(),
                kind: DiscreteKind::Capacitor,
                nets: ["VCC".to_string(), "GND".to_string()],
                value: "100n".to_string(),
            })
        );
    }

    #[test]
    fn classifies_resistor_family_records() {
        let profile = BoardProfile::default();
        let Ok(Record::Discrete { kind, .. }) = classify("RLED LED1 0 330", &profile) else {
            panic!("expected a discrete record");
        };
        assert_eq!(kind, DiscreteKind::Resistor);
    }

    #[test]
    fn over_long_discrete_record_keeps_only_the_value_token() {
        let profile = BoardProfile::default();
        let Ok(Record::Discrete { value, .. }) = classify("R1 VCC OUT 220 TC=0.1", &profile)
        else {
            panic!("expected a discrete record");
        };
        assert_eq!(value, "220");
    }

    #[test]
    fn short_discrete_record_is_malformed() {
        let profile = BoardProfile::default();
        assert_eq!(
            classify("C1 VCC GND", &profile),
            Err(RecordError::Malformed {
                head: "C1".to_string(),
                expected: 4,
                found: 3,
            })
        );
    }

    #[test]
    fn classifies_subcircuit_records_and_strips_template_token() {
        let profile = BoardProfile::default();
        assert_eq!(
            classify("XU2 RS=CTRL_RS RW=0 E=CTRL_E lcd.subckt", &profile),
            Ok(Record::Subcircuit {
                reference: "U2".to_string(),
                assignments: vec![
                    ("RS".to_string(), "CTRL_RS".to_string()),
                    ("RW".to_string(), "0".to_string()),
                    ("E".to_string(), "CTRL_E".to_string()),
                ],
            })
        );
    }

    #[test]
    fn malformed_assignment_tokens_are_dropped_individually() {
        let profile = BoardProfile::default();
        let Ok(Record::Subcircuit { assignments, .. }) =
            classify("XU1 P0.14=NET_RS =broken P0.15=NET_RW", &profile)
        else {
            panic!("expected a subcircuit record");
        };
        assert_eq!(assignments.len(), 2);
    }

    #[test]
    fn end_directive_and_sources_have_no_effect() {
        let profile = BoardProfile::default();
        assert_eq!(classify(".END", &profile), Ok(Record::End));
        assert_eq!(classify("VCC VCC 0 DC 5V", &profile), Ok(Record::Ignored));
        assert_eq!(classify("I1 A B 1m", &profile), Ok(Record::Ignored));
    }
}
