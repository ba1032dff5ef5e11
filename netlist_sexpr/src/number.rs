use nom::{
    bytes::complete::tag,
    character::complete::satisfy,
    combinator::{opt, recognize},
    multi::many1,
    sequence::tuple,
    IResult,
};

fn digits(input: &str) -> IResult<&str, &str> {
    recognize(many1(satisfy(|c: char| c.is_ascii_digit())))(input)
}

/// Parses a signed decimal number with an optional fractional part.
pub fn parse_number(input: &str) -> IResult<&str, f32> {
    let (input, text) = recognize(tuple((
        opt(tag("-")),
        digits,
        opt(tuple((tag("."), digits))),
    )))(input)?;

    Ok((
        input,
        text.parse()
            .unwrap_or_else(|_| panic!("Failed to parse number {text}!")),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("123"), Ok(("", 123.0)));
        assert_eq!(parse_number("-123"), Ok(("", -123.0)));
        assert_eq!(parse_number("123.456"), Ok(("", 123.456)));
        assert_eq!(parse_number("-123.456"), Ok(("", -123.456)));
        assert_eq!(parse_number("5.0mm"), Ok(("mm", 5.0)));
    }
}
