//! Numeric literals of the card format.
//!
//! Besides ordinary decimals the format accepts Fortran `d` exponents and an
//! implicit exponent where a sign directly following a digit or a decimal
//! point starts the exponent (`1.5-2` is `1.5e-2`). Numeric data lists may
//! also contain the repeat (`nR`), interpolate (`nI`) and multiply (`xM`)
//! shortcuts.

/// A numeric field that could not be read, with its 0-based position.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: usize,
    pub details: String,
}

impl FieldError {
    fn new(field: usize, details: impl Into<String>) -> Self {
        Self {
            field,
            details: details.into(),
        }
    }
}

/// Parses a floating point literal, including implicit-exponent forms.
pub fn parse_float(token: &str) -> Option<f64> {
    let t = token.trim();
    if t.is_empty()
        || !t.bytes().all(|b| {
            b.is_ascii_digit() || matches!(b, b'.' | b'+' | b'-' | b'e' | b'E' | b'd' | b'D')
        })
    {
        return None;
    }

    let mut normalized = String::with_capacity(t.len() + 1);
    let mut prev: Option<char> = None;
    for c in t.chars() {
        match c {
            'd' | 'D' => normalized.push('e'),
            '+' | '-' if prev.is_some_and(|p| p.is_ascii_digit() || p == '.') => {
                normalized.push('e');
                normalized.push(c);
            }
            _ => normalized.push(c),
        }
        prev = Some(c);
    }

    normalized.parse::<f64>().ok()
}

/// Parses a signed integer literal.
pub fn parse_int(token: &str) -> Option<i64> {
    token.trim().parse::<i64>().ok()
}

/// Parses an unsigned id.
pub fn parse_id(token: &str) -> Option<u32> {
    parse_int(token)
        .filter(|&v| v > 0)
        .and_then(|v| u32::try_from(v).ok())
}

/// Reads a list of numeric entries, expanding `nR`, `nI` and `xM`.
pub fn expand(tokens: &[String]) -> Result<Vec<f64>, FieldError> {
    let mut values: Vec<f64> = Vec::with_capacity(tokens.len());
    let mut pending_interp: Option<(usize, usize)> = None;

    for (idx, raw) in tokens.iter().enumerate() {
        let tok = raw.to_ascii_lowercase();

        if let Some(v) = parse_float(&tok) {
            if let Some((count, _)) = pending_interp.take() {
                let start = *values
                    .last()
                    .ok_or_else(|| FieldError::new(idx, "interpolation needs a preceding value"))?;
                let step = (v - start) / (count as f64 + 1.0);
                values.extend((1..=count).map(|k| start + step * k as f64));
            }
            values.push(v);
            continue;
        }

        if pending_interp.is_some() {
            return Err(FieldError::new(
                idx,
                format!("interpolation must be followed by a number, found '{}'", raw),
            ));
        }

        let Some(suffix) = tok.chars().last() else {
            return Err(FieldError::new(idx, "empty numeric entry"));
        };
        let prefix = &tok[..tok.len() - suffix.len_utf8()];
        let last = values.last().copied();

        match suffix {
            'r' => {
                let count = shortcut_count(prefix, idx, raw)?;
                let v = last.ok_or_else(|| {
                    FieldError::new(idx, format!("'{}' has no preceding value to repeat", raw))
                })?;
                values.extend(std::iter::repeat_n(v, count));
            }
            'i' => {
                let count = shortcut_count(prefix, idx, raw)?;
                if last.is_none() {
                    return Err(FieldError::new(
                        idx,
                        format!("'{}' has no preceding value to interpolate from", raw),
                    ));
                }
                pending_interp = Some((count, idx));
            }
            'm' => {
                let factor = parse_float(prefix).ok_or_else(|| {
                    FieldError::new(idx, format!("invalid multiplier in '{}'", raw))
                })?;
                let v = last.ok_or_else(|| {
                    FieldError::new(idx, format!("'{}' has no preceding value to multiply", raw))
                })?;
                values.push(v * factor);
            }
            'j' => {
                return Err(FieldError::new(
                    idx,
                    "jump entries are not allowed in this list",
                ));
            }
            _ => {
                return Err(FieldError::new(
                    idx,
                    format!("'{}' is not a valid number", raw),
                ));
            }
        }
    }

    if let Some((_, idx)) = pending_interp {
        return Err(FieldError::new(
            idx,
            "interpolation at the end of a list has no closing value",
        ));
    }

    Ok(values)
}

fn shortcut_count(prefix: &str, idx: usize, raw: &str) -> Result<usize, FieldError> {
    if prefix.is_empty() {
        return Ok(1);
    }
    prefix
        .parse::<usize>()
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| FieldError::new(idx, format!("invalid repeat count in '{}'", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn parses_plain_and_exponent_literals() {
        assert_eq!(parse_float("10"), Some(10.0));
        assert_eq!(parse_float("-2.5"), Some(-2.5));
        assert_eq!(parse_float(".5"), Some(0.5));
        assert_eq!(parse_float("1e3"), Some(1000.0));
        assert_eq!(parse_float("1.0E-2"), Some(0.01));
        assert_eq!(parse_float("2d2"), Some(200.0));
    }

    #[test]
    fn parses_implicit_exponent() {
        assert!(approx_eq(parse_float("1.5-2").unwrap(), 1.5e-2, 1e-15));
        assert!(approx_eq(parse_float("3+4").unwrap(), 3e4, 1e-9));
        assert!(approx_eq(parse_float("-7.-1").unwrap(), -0.7, 1e-15));
        assert!(approx_eq(parse_float("+2.0+1").unwrap(), 20.0, 1e-12));
    }

    #[test]
    fn rejects_non_numbers() {
        assert_eq!(parse_float(""), None);
        assert_eq!(parse_float("inf"), None);
        assert_eq!(parse_float("nan"), None);
        assert_eq!(parse_float("1-2-3"), None);
        assert_eq!(parse_float("1001.70c"), None);
        assert_eq!(parse_float("--1"), None);
    }

    #[test]
    fn parses_ids() {
        assert_eq!(parse_id("12"), Some(12));
        assert_eq!(parse_id("0"), None);
        assert_eq!(parse_id("-3"), None);
        assert_eq!(parse_int("-3"), Some(-3));
    }

    #[test]
    fn expands_repeat() {
        assert_eq!(expand(&toks("1 2r 3")).unwrap(), vec![1.0, 1.0, 1.0, 3.0]);
        assert_eq!(expand(&toks("4 r")).unwrap(), vec![4.0, 4.0]);
    }

    #[test]
    fn expands_interpolate() {
        assert_eq!(
            expand(&toks("0 3i 4")).unwrap(),
            vec![0.0, 1.0, 2.0, 3.0, 4.0]
        );
    }

    #[test]
    fn expands_multiply() {
        assert_eq!(expand(&toks("2 3m 0.5m")).unwrap(), vec![2.0, 6.0, 3.0]);
    }

    #[test]
    fn reports_failing_field() {
        let err = expand(&toks("1 2 abc")).unwrap_err();
        assert_eq!(err.field, 2);
        let err = expand(&toks("2r")).unwrap_err();
        assert_eq!(err.field, 0);
        let err = expand(&toks("1 2i")).unwrap_err();
        assert_eq!(err.field, 1);
        let err = expand(&toks("1 j")).unwrap_err();
        assert!(err.details.contains("jump"));
    }
}
