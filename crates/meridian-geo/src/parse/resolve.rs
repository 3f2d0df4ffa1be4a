//! Numeric resolution of degree, minute and second fields.

/// Number of digits before the decimal point, sign excluded.
pub fn integer_digits(text: &str) -> usize {
    unsigned(text).chars().take_while(|c| c.is_ascii_digit()).count()
}

/// Position of the decimal point in the raw text, counting an explicit sign.
/// A number without a fractional part reports its full length.
pub fn decimal_index(text: &str) -> usize {
    text.find('.').unwrap_or(text.len())
}

pub fn is_negative(text: &str) -> bool {
    text.starts_with('-')
}

pub fn has_sign(text: &str) -> bool {
    text.starts_with('-') || text.starts_with('+')
}

pub fn has_fraction(text: &str) -> bool {
    text.contains('.')
}

fn unsigned(text: &str) -> &str {
    text.trim_start_matches(['-', '+'])
}

/// Fields recovered from a number with no delimiters between them.
#[derive(Debug, Clone, PartialEq)]
pub struct Concatenated {
    pub degrees: String,
    pub minutes: String,
    pub seconds: Option<String>,
}

/// Split `DDDMM.mmm` or `DDDMMSS.sss` into fields by counting digits back
/// from the decimal point. Minutes and seconds take exactly two integer
/// digits each; whatever precedes them is degrees, which must have between
/// one and `degree_width` digits.
pub fn split_concatenated(text: &str, degree_width: usize, with_seconds: bool) -> Option<Concatenated> {
    let sign = if is_negative(text) { "-" } else { "" };
    let body = unsigned(text);
    let (int_part, frac_part) = match body.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (body, None),
    };

    let trailing = if with_seconds { 4 } else { 2 };
    let degree_digits = int_part.len().checked_sub(trailing)?;
    if degree_digits == 0 || degree_digits > degree_width {
        return None;
    }

    let degrees = format!("{}{}", sign, &int_part[..degree_digits]);
    let with_fraction = |digits: &str| match frac_part {
        Some(frac) if !frac.is_empty() => format!("{}.{}", digits, frac),
        _ => digits.to_string(),
    };

    if with_seconds {
        Some(Concatenated {
            degrees,
            minutes: int_part[degree_digits..degree_digits + 2].to_string(),
            seconds: Some(with_fraction(&int_part[degree_digits + 2..])),
        })
    } else {
        Some(Concatenated {
            degrees,
            minutes: with_fraction(&int_part[degree_digits..]),
            seconds: None,
        })
    }
}

/// Combine fields into decimal degrees. The sign is taken from the degrees
/// text so that `-0 30` resolves to -0.5. Minutes and seconds must lie in
/// `[0, 60)`.
pub fn to_decimal(degrees: &str, minutes: Option<&str>, seconds: Option<&str>) -> Option<f64> {
    let deg: f64 = degrees.parse().ok()?;
    let min = match minutes {
        Some(text) => sexagesimal_field(text)?,
        None => 0.0,
    };
    let sec = match seconds {
        Some(text) => sexagesimal_field(text)?,
        None => 0.0,
    };

    let magnitude = deg.abs() + min / 60.0 + sec / 3600.0;
    if !magnitude.is_finite() {
        return None;
    }
    Some(if is_negative(degrees) { -magnitude } else { magnitude })
}

fn sexagesimal_field(text: &str) -> Option<f64> {
    if has_sign(text) {
        return None;
    }
    let value: f64 = text.parse().ok()?;
    (0.0..60.0).contains(&value).then_some(value)
}
