//! Lexical fragments of coordinate text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Hemisphere marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

/// Which half of a coordinate pair a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Latitude,
    Longitude,
}

impl Kind {
    /// Maximum number of integer digits the degrees field may have.
    pub fn degree_width(&self) -> usize {
        match self {
            Kind::Latitude => 2,
            Kind::Longitude => 3,
        }
    }

    pub fn max_degrees(&self) -> f64 {
        match self {
            Kind::Latitude => 90.0,
            Kind::Longitude => 180.0,
        }
    }
}

impl Direction {
    fn from_letter(s: &str) -> Option<Self> {
        match s {
            "N" => Some(Direction::North),
            "S" => Some(Direction::South),
            "E" => Some(Direction::East),
            "W" => Some(Direction::West),
            _ => None,
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Direction::North | Direction::South => Kind::Latitude,
            Direction::East | Direction::West => Kind::Longitude,
        }
    }

    pub fn sign(&self) -> f64 {
        match self {
            Direction::North | Direction::East => 1.0,
            Direction::South | Direction::West => -1.0,
        }
    }
}

/// Unit symbol trailing a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Degree,
    Minute,
    Second,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Raw numeric text, sign included.
    Number(String),
    Direction(Direction),
    Unit(Unit),
    /// Whitespace or colon between the components of one coordinate.
    Delimiter,
    /// Comma, semicolon or slash between the two coordinates of a pair.
    Separator,
}

// `''` must be tried before `'` so that two primes read as seconds.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?x)
          (?P<num>[+-]?(?:\d+(?:\.\d*)?|\.\d+))
        | (?P<dir>[NSEW])
        | (?P<sec>''|["″”])
        | (?P<deg>[°º˚])
        | (?P<min>['′’])
        | (?P<sep>[,;/])
        | (?P<delim>[\s:]+)
        "#,
    )
    .expect("Invalid coordinate token regex")
});

/// Split text into tokens. Any character outside the grammar rejects the
/// whole input.
pub fn tokenize(text: &str) -> Option<Vec<Token>> {
    let upper = text.trim().to_uppercase();
    if upper.is_empty() {
        return None;
    }

    let mut tokens = Vec::new();
    let mut cursor = 0;
    for caps in TOKEN_RE.captures_iter(&upper) {
        let whole = caps.get(0)?;
        if whole.start() != cursor {
            return None;
        }
        cursor = whole.end();

        let token = if let Some(num) = caps.name("num") {
            Token::Number(num.as_str().to_string())
        } else if let Some(dir) = caps.name("dir") {
            Token::Direction(Direction::from_letter(dir.as_str())?)
        } else if caps.name("sec").is_some() {
            Token::Unit(Unit::Second)
        } else if caps.name("deg").is_some() {
            Token::Unit(Unit::Degree)
        } else if caps.name("min").is_some() {
            Token::Unit(Unit::Minute)
        } else if caps.name("sep").is_some() {
            Token::Separator
        } else {
            Token::Delimiter
        };
        tokens.push(token);
    }

    if cursor != upper.len() {
        return None;
    }
    Some(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_dms_symbols() {
        let tokens = tokenize("40°30'15.5\"n").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Number("40".to_string()),
                Token::Unit(Unit::Degree),
                Token::Number("30".to_string()),
                Token::Unit(Unit::Minute),
                Token::Number("15.5".to_string()),
                Token::Unit(Unit::Second),
                Token::Direction(Direction::North),
            ]
        );
    }

    #[test]
    fn test_tokenize_double_prime_is_seconds() {
        let tokens = tokenize("10''").unwrap();
        assert_eq!(tokens[1], Token::Unit(Unit::Second));
    }

    #[test]
    fn test_tokenize_signs_and_separators() {
        let tokens = tokenize(" -40.5, +105 ").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Number("-40.5".to_string()),
                Token::Separator,
                Token::Delimiter,
                Token::Number("+105".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_rejects_garbage() {
        assert!(tokenize("40N 105X").is_none());
        assert!(tokenize("abc").is_none());
        assert!(tokenize("   ").is_none());
        assert!(tokenize("40 - 105").is_none());
    }
}
