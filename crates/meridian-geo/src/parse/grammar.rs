//! Grouping tokens into the two halves of a pair and reading each half in
//! one of the supported formats.

use super::resolve;
use super::token::{Direction, Kind, Token, Unit};
use super::{CoordinateFormat, CoordinateOrder};

/// One number and the unit symbol that followed it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub text: String,
    pub unit: Option<Unit>,
}

/// The numbers of a single coordinate and its optional hemisphere letter.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub components: Vec<Component>,
    pub direction: Option<Direction>,
}

/// A format tried against a pair, with the kind assumed for each half.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseConfig {
    pub format: CoordinateFormat,
    pub first: Kind,
    pub second: Kind,
}

const fn config(format: CoordinateFormat, first: Kind, second: Kind) -> ParseConfig {
    ParseConfig { format, first, second }
}

const LAT_FIRST: [ParseConfig; 3] = [
    config(CoordinateFormat::DD, Kind::Latitude, Kind::Longitude),
    config(CoordinateFormat::DDM, Kind::Latitude, Kind::Longitude),
    config(CoordinateFormat::DMS, Kind::Latitude, Kind::Longitude),
];

const LON_FIRST: [ParseConfig; 3] = [
    config(CoordinateFormat::DD, Kind::Longitude, Kind::Latitude),
    config(CoordinateFormat::DDM, Kind::Longitude, Kind::Latitude),
    config(CoordinateFormat::DMS, Kind::Longitude, Kind::Latitude),
];

/// Configs in priority order for an assumed ordering. The first that reads
/// both halves wins.
pub fn configs(order: CoordinateOrder) -> &'static [ParseConfig] {
    match order {
        CoordinateOrder::LatFirst => &LAT_FIRST,
        CoordinateOrder::LonFirst => &LON_FIRST,
    }
}

#[derive(Debug, Clone)]
enum Item {
    Number(Component),
    Direction(Direction),
}

fn items(tokens: &[Token]) -> Option<Vec<Item>> {
    let mut items = Vec::new();
    for token in tokens {
        match token {
            Token::Number(text) => {
                items.push(Item::Number(Component { text: text.clone(), unit: None }))
            }
            Token::Unit(unit) => match items.last_mut() {
                Some(Item::Number(component)) if component.unit.is_none() => {
                    component.unit = Some(*unit)
                }
                _ => return None,
            },
            Token::Direction(direction) => items.push(Item::Direction(*direction)),
            Token::Delimiter => {}
            Token::Separator => return None,
        }
    }
    Some(items)
}

/// Build a group; its single direction letter, if any, must lead or trail.
fn group(items: &[Item]) -> Option<Group> {
    let mut components = Vec::new();
    let mut direction = None;
    let last = items.len().checked_sub(1)?;
    for (i, item) in items.iter().enumerate() {
        match item {
            Item::Number(component) => components.push(component.clone()),
            Item::Direction(d) => {
                if direction.is_some() || (i != 0 && i != last) {
                    return None;
                }
                direction = Some(*d);
            }
        }
    }
    if components.is_empty() || components.len() > 3 {
        return None;
    }
    Some(Group { components, direction })
}

/// Parse tokens of a lone latitude or longitude.
pub fn single_group(tokens: &[Token]) -> Option<Group> {
    group(&items(tokens)?)
}

/// Split tokens into the two halves of a pair.
///
/// A comma, semicolon or slash splits explicitly. Otherwise the split is
/// found from hemisphere letters, from degree symbols, or by halving the
/// numbers.
pub fn split_pair(tokens: &[Token]) -> Option<(Group, Group)> {
    let separators: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| matches!(t, Token::Separator))
        .map(|(i, _)| i)
        .collect();

    match separators.as_slice() {
        [] => split_items(&items(tokens)?),
        [at] => {
            let first = group(&items(&tokens[..*at])?)?;
            let second = group(&items(&tokens[at + 1..])?)?;
            Some((first, second))
        }
        _ => None,
    }
}

fn split_items(items: &[Item]) -> Option<(Group, Group)> {
    let directions: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| matches!(item, Item::Direction(_)))
        .map(|(i, _)| i)
        .collect();

    match directions.as_slice() {
        [] => split_numbers(items),
        [d1, d2] => split_at_directions(items, *d1, *d2),
        _ => None,
    }
}

fn split_at_directions(items: &[Item], d1: usize, d2: usize) -> Option<(Group, Group)> {
    let last = items.len() - 1;
    match (d1 == 0, d2 == last) {
        // N 40 W 105
        (true, false) => Some((group(&items[..d2])?, group(&items[d2..])?)),
        // 40 N 105 W
        (false, true) => Some((group(&items[..=d1])?, group(&items[d1 + 1..])?)),
        // N 40 105 W
        (true, true) => {
            let (first, second) = split_numbers(&items[1..d2])?;
            let direction = |item: &Item| match item {
                Item::Direction(d) => Some(*d),
                Item::Number(_) => None,
            };
            Some((
                Group { direction: direction(&items[0]), ..first },
                Group { direction: direction(&items[last]), ..second },
            ))
        }
        // 40 N W 105
        (false, false) if d2 == d1 + 1 => Some((group(&items[..=d1])?, group(&items[d2..])?)),
        (false, false) => None,
    }
}

/// Split a run of bare numbers: before the second degree-marked number if
/// there is one, else down the middle.
fn split_numbers(items: &[Item]) -> Option<(Group, Group)> {
    let components: Vec<Component> = items
        .iter()
        .map(|item| match item {
            Item::Number(component) => Some(component.clone()),
            Item::Direction(_) => None,
        })
        .collect::<Option<_>>()?;

    let marked: Vec<usize> = components
        .iter()
        .enumerate()
        .filter(|(_, c)| c.unit == Some(Unit::Degree))
        .map(|(i, _)| i)
        .collect();

    let at = match marked.as_slice() {
        [0, second] => *second,
        _ if components.len() % 2 == 0 => components.len() / 2,
        _ => return None,
    };
    if at == 0 || at >= components.len() {
        return None;
    }

    let (first, second) = components.split_at(at);
    if first.len() > 3 || second.len() > 3 {
        return None;
    }
    Some((
        Group { components: first.to_vec(), direction: None },
        Group { components: second.to_vec(), direction: None },
    ))
}

fn unit_allowed(component: &Component, allowed: Unit) -> bool {
    component.unit.is_none() || component.unit == Some(allowed)
}

/// Read a group as `format` assuming it holds a coordinate of `kind`.
///
/// The result carries the sign of the text or, when present, of the
/// hemisphere letter. Degrees may reach 180 for either kind; range checks
/// belong to the caller.
pub fn read_group(group: &Group, format: CoordinateFormat, kind: Kind) -> Option<f64> {
    if let Some(direction) = group.direction {
        if direction.kind() != kind {
            return None;
        }
    }

    let value = match format {
        CoordinateFormat::DD => read_dd(&group.components)?,
        CoordinateFormat::DDM => read_ddm(&group.components, kind)?,
        CoordinateFormat::DMS => read_dms(&group.components, kind)?,
    };

    if value.abs() > 180.0 {
        return None;
    }
    Some(match group.direction {
        Some(direction) => value.abs() * direction.sign(),
        None => value,
    })
}

fn read_dd(components: &[Component]) -> Option<f64> {
    let [deg] = components else {
        return None;
    };
    if !unit_allowed(deg, Unit::Degree) || resolve::integer_digits(&deg.text) > 3 {
        return None;
    }
    deg.text.parse().ok()
}

fn read_ddm(components: &[Component], kind: Kind) -> Option<f64> {
    match components {
        [packed] if packed.unit.is_none() => {
            let parts = resolve::split_concatenated(&packed.text, kind.degree_width(), false)?;
            resolve::to_decimal(&parts.degrees, Some(&parts.minutes), None)
        }
        [deg, min] => {
            if !unit_allowed(deg, Unit::Degree)
                || !unit_allowed(min, Unit::Minute)
                || resolve::has_fraction(&deg.text)
            {
                return None;
            }
            resolve::to_decimal(&deg.text, Some(&min.text), None)
        }
        _ => None,
    }
}

fn read_dms(components: &[Component], kind: Kind) -> Option<f64> {
    match components {
        [packed] if packed.unit.is_none() => {
            let parts = resolve::split_concatenated(&packed.text, kind.degree_width(), true)?;
            resolve::to_decimal(&parts.degrees, Some(&parts.minutes), parts.seconds.as_deref())
        }
        [deg, min, sec] => {
            if !unit_allowed(deg, Unit::Degree)
                || !unit_allowed(min, Unit::Minute)
                || !unit_allowed(sec, Unit::Second)
                || resolve::has_fraction(&deg.text)
                || resolve::has_fraction(&min.text)
            {
                return None;
            }
            resolve::to_decimal(&deg.text, Some(&min.text), Some(&sec.text))
        }
        _ => None,
    }
}
