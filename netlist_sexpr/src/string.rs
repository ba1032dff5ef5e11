//! Parser for quoted strings.
//!
//! - Enclosed by double quotes
//! - Can contain any raw unescaped code point besides \ and "
//! - Matches the escape sequences \n, \r, \t, \", \\ (the set the
//!   writer can produce)

use nom::branch::alt;
use nom::bytes::complete::is_not;
use nom::character::complete::char;
use nom::combinator::{map, value, verify};
use nom::multi::fold_many0;
use nom::sequence::{delimited, preceded};
use nom::IResult;

/// A fragment of a quoted string: either a run of literal characters or
/// a single decoded escape sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fragment<'a> {
    Literal(&'a str),
    Escaped(char),
}

fn parse_escaped_char(input: &str) -> IResult<&str, char> {
    preceded(
        char('\\'),
        alt((
            value('\n', char('n')),
            value('\r', char('r')),
            value('\t', char('t')),
            value('\\', char('\\')),
            value('"', char('"')),
        )),
    )(input)
}

fn parse_literal(input: &str) -> IResult<&str, &str> {
    verify(is_not("\"\\"), |s: &str| !s.is_empty())(input)
}

fn parse_fragment(input: &str) -> IResult<&str, Fragment> {
    alt((
        map(parse_literal, Fragment::Literal),
        map(parse_escaped_char, Fragment::Escaped),
    ))(input)
}

/// Parses a quoted string, decoding escape sequences as it goes.
pub fn parse_string(input: &str) -> IResult<&str, String> {
    let build_string = fold_many0(parse_fragment, String::new, |mut string, fragment| {
        match fragment {
            Fragment::Literal(s) => string.push_str(s),
            Fragment::Escaped(c) => string.push(c),
        }
        string
    });

    delimited(char('"'), build_string, char('"'))(input)
}
