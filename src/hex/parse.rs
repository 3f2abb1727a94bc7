//! Facilities for parsing HEX files.

use super::lex::{Token, TokenLexer, TokenValue};
use super::types::{ParseError, SrcLoc};
use super::{Record, RecordKind};
use byteorder::{BigEndian, ByteOrder};
use chumsky::{self, IterParser, Parser};

//===========================================================================//

/// The error type used for `chumsky::Parser`s in this module.
type PError<'a> = chumsky::extra::Err<chumsky::error::Rich<'a, Token>>;

//===========================================================================//

fn symbol<'a>(
    value: TokenValue,
) -> impl Parser<'a, &'a [Token], Token, PError<'a>> + Clone {
    let name = value.name();
    chumsky::prelude::any()
        .filter(move |token: &Token| token.value == value)
        .labelled(name)
}

fn linebreak<'a>() -> impl Parser<'a, &'a [Token], (), PError<'a>> + Clone {
    symbol(TokenValue::Linebreak).repeated().at_least(1)
}

fn hex_digits<'a>() -> impl Parser<'a, &'a [Token], Token, PError<'a>> + Clone
{
    chumsky::prelude::any()
        .filter(|token: &Token| {
            matches!(token.value, TokenValue::HexDigits(_))
        })
        .labelled("hex digits")
}

/// Parses one record line, producing the token holding the record's digits.
fn record<'a>() -> impl Parser<'a, &'a [Token], Token, PError<'a>> + Clone {
    symbol(TokenValue::Colon)
        .ignore_then(hex_digits())
        .then_ignore(linebreak().or(chumsky::prelude::end()))
}

//===========================================================================//

/// Decodes the hex digits that follow a record's start code.
fn decode_record(digits: &str) -> Result<Record, String> {
    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits ({})", digits.len()));
    }
    let bytes: Vec<u8> = digits
        .as_bytes()
        .chunks(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair).map_err(|e| e.to_string())?;
            u8::from_str_radix(pair, 16).map_err(|e| e.to_string())
        })
        .collect::<Result<_, _>>()?;
    if bytes.len() < 5 {
        return Err(format!("record is too short ({} bytes)", bytes.len()));
    }
    let count = usize::from(bytes[0]);
    if bytes.len() != count + 5 {
        return Err(format!(
            "byte count is {}, but record holds {} data bytes",
            count,
            bytes.len() - 5
        ));
    }
    let sum = bytes.iter().fold(0u8, |sum, &byte| sum.wrapping_add(byte));
    if sum != 0 {
        let found = bytes[bytes.len() - 1];
        let expected = found.wrapping_sub(sum);
        return Err(format!(
            "checksum mismatch: expected {expected:02X}, found {found:02X}"
        ));
    }
    let kind = RecordKind::from_code(bytes[3])
        .ok_or_else(|| format!("unknown record type {:02X}", bytes[3]))?;
    if let Some(expected) = kind.data_len() {
        if count != expected {
            return Err(format!(
                "{} record must hold {} data bytes, not {}",
                kind.name(),
                expected,
                count
            ));
        }
    }
    let addr = BigEndian::read_u16(&bytes[1..3]);
    Ok(Record::new(kind, addr, bytes[4..4 + count].to_vec()))
}

//===========================================================================//

/// Parses the text of a HEX file into its records, in file order.
///
/// Blank lines are allowed between records; every record must be intact
/// (consistent byte count, zero-sum checksum, known record type).  Hex digits
/// may be in either case.
pub fn parse_records(source: &str) -> Result<Vec<Record>, Vec<ParseError>> {
    let mut lexer = TokenLexer::new(source);
    let tokens: Vec<Token> = (&mut lexer)
        .collect::<Result<_, _>>()
        .map_err(|error| vec![error])?;
    let end = lexer.end_location();
    let lines: Vec<Token> = symbol(TokenValue::Linebreak)
        .repeated()
        .ignore_then(record().repeated().collect::<Vec<_>>())
        .then_ignore(chumsky::prelude::end())
        .parse(&tokens)
        .into_result()
        .map_err(|errors| {
            errors
                .into_iter()
                .map(|error| {
                    let index = error.span().start;
                    let location = token_location(&tokens, index, end);
                    let message = match error.found() {
                        Some(token) => {
                            format!("unexpected {}", token.value.name())
                        }
                        None => "unexpected end of file".to_string(),
                    };
                    ParseError { location, message }
                })
                .collect::<Vec<_>>()
        })?;
    let mut records = Vec::with_capacity(lines.len());
    let mut errors = Vec::new();
    for token in lines {
        if let TokenValue::HexDigits(digits) = &token.value {
            match decode_record(digits) {
                Ok(record) => records.push(record),
                Err(message) => {
                    errors.push(ParseError { location: token.start, message })
                }
            }
        }
    }
    if errors.is_empty() { Ok(records) } else { Err(errors) }
}

fn token_location(tokens: &[Token], index: usize, end: SrcLoc) -> SrcLoc {
    match tokens.get(index) {
        Some(token) => token.start,
        None => end,
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::parse_records;
    use crate::hex::{ParseError, Record, RecordKind, SrcLoc};

    fn expect_error(source: &str) -> ParseError {
        let mut errors = parse_records(source).unwrap_err();
        assert!(!errors.is_empty());
        errors.remove(0)
    }

    #[test]
    fn empty_file() {
        assert_eq!(parse_records("").unwrap(), vec![]);
        assert_eq!(parse_records("\n\n").unwrap(), vec![]);
    }

    #[test]
    fn data_and_end_records() {
        let source = ":10000000000102030405060708090A0B0C0D0E0F78\r\n\
                      :00000001FF\r\n";
        let records = parse_records(source).unwrap();
        let data: Vec<u8> = (0..16).collect();
        assert_eq!(
            records,
            vec![Record::data(0x0000, &data), Record::end_of_file()]
        );
    }

    #[test]
    fn lowercase_and_missing_final_linebreak() {
        let records = parse_records(":0200100012ab31\n:00000001ff").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind(), RecordKind::Data);
        assert_eq!(records[0].addr(), 0x0010);
        assert_eq!(records[0].bytes(), &[0x12, 0xab]);
        assert_eq!(records[1], Record::end_of_file());
    }

    #[test]
    fn blank_lines_between_records() {
        let records =
            parse_records("\n:0100000055AA\n\n\n:00000001FF\n\n").unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn extended_linear_address() {
        let records = parse_records(":020000040001F9\n").unwrap();
        assert_eq!(records, vec![Record::extended_linear_address(0x0001)]);
    }

    #[test]
    fn bad_checksum() {
        assert_eq!(
            expect_error(":00000001FE\n"),
            ParseError::new(
                SrcLoc { line: 1, column: 1 },
                "checksum mismatch: expected FF, found FE"
            )
        );
    }

    #[test]
    fn bad_byte_count() {
        assert_eq!(
            expect_error(":00000001FF\n:0300000055AA\n"),
            ParseError::new(
                SrcLoc { line: 2, column: 1 },
                "byte count is 3, but record holds 1 data bytes"
            )
        );
    }

    #[test]
    fn odd_digit_count() {
        let error = expect_error(":00000001F\n");
        assert_eq!(error.message, "odd number of hex digits (9)");
    }

    #[test]
    fn too_short() {
        let error = expect_error(":000001\n");
        assert_eq!(error.message, "record is too short (3 bytes)");
    }

    #[test]
    fn unknown_record_type() {
        let error = expect_error(":00000009F7\n");
        assert_eq!(error.message, "unknown record type 09");
    }

    #[test]
    fn wrong_address_record_length() {
        let error = expect_error(":0100000401FA\n");
        assert_eq!(
            error.message,
            "extended linear address record must hold 2 data bytes, not 1"
        );
    }

    #[test]
    fn missing_start_code() {
        let error = expect_error("00000001FF\n");
        assert_eq!(error.location, SrcLoc { line: 1, column: 0 });
        assert_eq!(error.message, "unexpected hex digits");
    }

    #[test]
    fn two_records_on_one_line() {
        let error = expect_error(":00000001FF:00000001FF\n");
        assert_eq!(error.location, SrcLoc { line: 1, column: 11 });
    }

    #[test]
    fn invalid_character() {
        let error = expect_error(":00000001FF\n# comment\n");
        assert_eq!(error.location, SrcLoc { line: 2, column: 0 });
        assert_eq!(error.message, "invalid character: #");
    }
}

//===========================================================================//
