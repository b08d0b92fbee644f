use crate::num::{parse_f64_fast, parse_i64_fast};
use crate::symbol_table::SymbolTable;
use tidepool_events::SymbolId;

/// Fields extracted from a successfully parsed trade frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedFrame {
    pub symbol_id: SymbolId,
    pub price: f64,
    pub size: f64,
    /// `None` when the frame had no parseable `ts` field; the caller
    /// substitutes the current wall clock in that case.
    pub exchange_ts_ms: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),
    #[error("non-positive price or size")]
    NonPositive,
    #[error("malformed numeric field: {0}")]
    Malformed(&'static str),
}

struct RawFields<'a> {
    inst_id: Option<&'a str>,
    px: Option<&'a str>,
    sz: Option<&'a str>,
    ts: Option<&'a str>,
}

/// Single-pass scan for `"key":"value"` / `"key":value` fragments,
/// generalized from a single-character key to the multi-character keys
/// this wire format uses (`instId`, `px`, `sz`, `ts`), in any order and
/// interleaved with fields the scanner doesn't recognize and skips.
///
/// Like the bookTicker scanner this is modeled on, it does not handle
/// escaped quotes inside string values or nested objects/arrays — the
/// four fields it cares about are always flat string or bare-numeric
/// values in this feed.
fn scan_fields(input: &str) -> RawFields<'_> {
    let b = input.as_bytes();
    let len = b.len();
    let mut i = 0usize;
    let mut fields = RawFields {
        inst_id: None,
        px: None,
        sz: None,
        ts: None,
    };

    while i < len {
        if b[i] != b'"' {
            i += 1;
            continue;
        }

        let key_start = i + 1;
        let mut j = key_start;
        while j < len && b[j] != b'"' {
            j += 1;
        }
        if j >= len {
            break;
        }
        let key = &input[key_start..j];

        let mut k = j + 1;
        while k < len && b[k].is_ascii_whitespace() {
            k += 1;
        }
        if k >= len || b[k] != b':' {
            i = j + 1;
            continue;
        }
        k += 1;
        while k < len && b[k].is_ascii_whitespace() {
            k += 1;
        }
        if k >= len {
            break;
        }

        let (value, next) = if b[k] == b'"' {
            let value_start = k + 1;
            let mut m = value_start;
            while m < len && b[m] != b'"' {
                m += 1;
            }
            if m >= len {
                break;
            }
            (&input[value_start..m], m + 1)
        } else {
            let value_start = k;
            let mut m = value_start;
            while m < len {
                let c = b[m];
                if c == b',' || c == b'}' || c == b']' || c.is_ascii_whitespace() {
                    break;
                }
                m += 1;
            }
            (&input[value_start..m], m)
        };

        match key {
            "instId" if fields.inst_id.is_none() => fields.inst_id = Some(value),
            "px" if fields.px.is_none() => fields.px = Some(value),
            "sz" if fields.sz.is_none() => fields.sz = Some(value),
            "ts" if fields.ts.is_none() => fields.ts = Some(value),
            _ => {}
        }

        i = next;
    }

    fields
}

/// Parses a trade frame per the taxonomy in the processor stage: an
/// unknown symbol, a missing price/size, or a non-positive price/size are
/// all reported as `Err`; a missing or unparseable `ts` is not a parse
/// failure by itself (`exchange_ts_ms` comes back `None`).
pub fn parse_frame(input: &str, symbols: &SymbolTable) -> Result<ParsedFrame, ParseError> {
    let fields = scan_fields(input);

    let inst_id = fields.inst_id.ok_or(ParseError::MissingField("instId"))?;
    let symbol_id = symbols
        .resolve(inst_id)
        .ok_or_else(|| ParseError::UnknownSymbol(inst_id.to_string()))?;

    let px = fields.px.ok_or(ParseError::MissingField("px"))?;
    let price = parse_f64_fast(px).ok_or(ParseError::Malformed("px"))?;

    let sz = fields.sz.ok_or(ParseError::MissingField("sz"))?;
    let size = parse_f64_fast(sz).ok_or(ParseError::Malformed("sz"))?;

    if price <= 0.0 || size <= 0.0 {
        return Err(ParseError::NonPositive);
    }

    let exchange_ts_ms = fields.ts.and_then(parse_i64_fast);

    Ok(ParsedFrame {
        symbol_id,
        price,
        size,
        exchange_ts_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols() -> SymbolTable {
        SymbolTable::new(std::array::from_fn(|i| format!("SYM{i}")))
    }

    #[test]
    fn parses_standard_frame() {
        let frame = r#"{"instId":"SYM2","px":"123.45","sz":"0.5","ts":"1690000000000"}"#;
        let parsed = parse_frame(frame, &symbols()).unwrap();
        assert_eq!(parsed.symbol_id.0, 2);
        assert_eq!(parsed.price, 123.45);
        assert_eq!(parsed.size, 0.5);
        assert_eq!(parsed.exchange_ts_ms, Some(1_690_000_000_000));
    }

    #[test]
    fn parses_fields_in_any_order_with_bare_numeric_ts() {
        let frame = r#"{"ts":1690000000000,"sz":"2.0","instId":"SYM0","extra":"ignored","px":"10.0"}"#;
        let parsed = parse_frame(frame, &symbols()).unwrap();
        assert_eq!(parsed.symbol_id.0, 0);
        assert_eq!(parsed.price, 10.0);
        assert_eq!(parsed.size, 2.0);
        assert_eq!(parsed.exchange_ts_ms, Some(1_690_000_000_000));
    }

    #[test]
    fn missing_ts_is_not_a_parse_failure() {
        let frame = r#"{"instId":"SYM1","px":"1.0","sz":"1.0"}"#;
        let parsed = parse_frame(frame, &symbols()).unwrap();
        assert_eq!(parsed.exchange_ts_ms, None);
    }

    #[test]
    fn unknown_symbol_is_rejected() {
        let frame = r#"{"instId":"NOPE","px":"1.0","sz":"1.0"}"#;
        assert_eq!(
            parse_frame(frame, &symbols()),
            Err(ParseError::UnknownSymbol("NOPE".to_string()))
        );
    }

    #[test]
    fn non_positive_price_is_rejected() {
        let frame = r#"{"instId":"SYM0","px":"0","sz":"1.0"}"#;
        assert_eq!(
            parse_frame(frame, &symbols()),
            Err(ParseError::NonPositive)
        );
    }

    #[test]
    fn missing_price_is_rejected() {
        let frame = r#"{"instId":"SYM0","sz":"1.0"}"#;
        assert_eq!(
            parse_frame(frame, &symbols()),
            Err(ParseError::MissingField("px"))
        );
    }
}
