//! Text notation for orders.
//!
//! An order is written as its unit, a location and an action:
//!
//! ```text
//! A par H            F lon S F wal - eng      A par B
//! A par - bur        A tyr S A ven            F tri D
//! A lon - bre via    F eng C A lon - bre      W
//! ```
//!
//! Territories are three-letter lowercase abbreviations and unit types are
//! uppercase `A`/`F`. A fleet on a split coast is written `stp/sc`. Retreats
//! use the same `-` arrow as moves; `R` is accepted as an alias.
//!
//! Orders carry a power, which the bare notation leaves out. Lines of the
//! form `england: F lon - eng` name it explicitly.

use thiserror::Error;

use crate::board::adjacency::{borders, Subregion};
use crate::board::order::{Action, Order};
use crate::board::territory::{Coast, Power, Territory};
use crate::board::unit::{Unit, UnitType};

/// Errors that can occur when parsing order notation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotationError {
    #[error("empty input")]
    EmptyInput,

    #[error("unknown unit type '{0}'")]
    UnknownUnitType(String),

    #[error("unknown territory '{0}'")]
    UnknownTerritory(String),

    #[error("unknown coast '{0}'")]
    UnknownCoast(String),

    #[error("unknown power '{0}'")]
    UnknownPower(String),

    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("'{0}' is not a place a unit of that type can stand")]
    NoSuchSubregion(String),

    #[error("'{0}' needs a coast")]
    AmbiguousCoast(String),

    #[error("unexpected end of input, expected {0}")]
    UnexpectedEnd(String),

    #[error("unexpected token '{found}', expected {expected}")]
    UnexpectedToken { expected: String, found: String },
}

/// Cursor over whitespace-separated tokens.
struct Tokens<'a> {
    tokens: Vec<&'a str>,
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(s: &'a str) -> Self {
        Tokens {
            tokens: s.split_whitespace().collect(),
            pos: 0,
        }
    }

    fn next(&mut self, expected: &str) -> Result<&'a str, NotationError> {
        let token = self
            .tokens
            .get(self.pos)
            .copied()
            .ok_or_else(|| NotationError::UnexpectedEnd(expected.to_string()))?;
        self.pos += 1;
        Ok(token)
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn expect(&mut self, want: &str) -> Result<(), NotationError> {
        match self.next(want)? {
            found if found.eq_ignore_ascii_case(want) => Ok(()),
            found => Err(NotationError::UnexpectedToken {
                expected: want.to_string(),
                found: found.to_string(),
            }),
        }
    }

    fn finish(&self) -> Result<(), NotationError> {
        match self.peek() {
            None => Ok(()),
            Some(found) => Err(NotationError::UnexpectedToken {
                expected: "end of order".to_string(),
                found: found.to_string(),
            }),
        }
    }
}

fn parse_unit_type(token: &str) -> Result<UnitType, NotationError> {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => UnitType::from_letter(c),
        _ => None,
    }
    .ok_or_else(|| NotationError::UnknownUnitType(token.to_string()))
}

/// Splits `stp/sc` into its territory and coast.
fn parse_location(token: &str) -> Result<(Territory, Coast), NotationError> {
    let (terr, coast) = match token.split_once('/') {
        Some((t, c)) if !c.is_empty() => (t, c),
        Some(_) => return Err(NotationError::UnknownCoast(token.to_string())),
        None => (token, ""),
    };
    let territory =
        Territory::from_abbr(terr).ok_or_else(|| NotationError::UnknownTerritory(terr.to_string()))?;
    let coast = Coast::from_abbr(coast).ok_or_else(|| NotationError::UnknownCoast(coast.to_string()))?;
    Ok((territory, coast))
}

/// Resolves a written location to a subregion for the given unit type.
///
/// A fleet heading for a split-coast territory without naming a coast gets
/// the only coast reachable from `from`, when there is exactly one.
fn subregion(
    unit_type: UnitType,
    token: &str,
    from: Option<Subregion>,
) -> Result<Subregion, NotationError> {
    let (territory, coast) = parse_location(token)?;
    if unit_type == UnitType::Army && coast != Coast::None {
        return Err(NotationError::NoSuchSubregion(token.to_string()));
    }
    let sr = Subregion::for_unit(unit_type, territory, coast);
    if sr.exists() {
        return Ok(sr);
    }
    if unit_type == UnitType::Fleet && coast == Coast::None && !territory.coasts().is_empty() {
        let reachable: Vec<Subregion> = from
            .map(|f| borders(f).iter().copied().filter(|b| b.territory == territory).collect())
            .unwrap_or_default();
        return match reachable.as_slice() {
            [only] => Ok(*only),
            _ => Err(NotationError::AmbiguousCoast(token.to_string())),
        };
    }
    Err(NotationError::NoSuchSubregion(token.to_string()))
}

fn read_unit(tokens: &mut Tokens<'_>) -> Result<Subregion, NotationError> {
    let unit_type = parse_unit_type(tokens.next("unit type (A or F)")?)?;
    subregion(unit_type, tokens.next("location")?, None)
}

/// Parses a unit such as `F stp/sc` into an undislodged unit of `power`.
pub fn parse_unit(power: Power, s: &str) -> Result<Unit, NotationError> {
    let mut tokens = Tokens::new(s);
    if tokens.peek().is_none() {
        return Err(NotationError::EmptyInput);
    }
    let sr = read_unit(&mut tokens)?;
    tokens.finish()?;
    Ok(Unit::new(power, sr))
}

/// Parses a single order for `power`.
pub fn parse_order(power: Power, s: &str) -> Result<Order, NotationError> {
    let mut tokens = Tokens::new(s);
    match tokens.peek() {
        None => return Err(NotationError::EmptyInput),
        Some("W") | Some("w") => {
            tokens.pos += 1;
            tokens.finish()?;
            return Ok(Order::waive(power));
        }
        Some(_) => {}
    }

    let actor = read_unit(&mut tokens)?;
    let order = match tokens.next("action (H, -, R, S, C, B or D)")? {
        "H" | "h" => Order::hold(power, actor),
        "-" | "R" | "r" => {
            let target = subregion(actor.unit_type(), tokens.next("destination")?, Some(actor))?;
            let order = Order::movement(power, actor, target);
            if tokens.peek().is_some_and(|t| t.eq_ignore_ascii_case("via")) {
                tokens.pos += 1;
                order.via_convoy()
            } else {
                order
            }
        }
        "S" | "s" => {
            let assist = read_unit(&mut tokens)?;
            match tokens.peek() {
                None => Order::support_hold(power, actor, assist),
                Some("H") | Some("h") => {
                    tokens.pos += 1;
                    Order::support_hold(power, actor, assist)
                }
                Some(_) => {
                    tokens.expect("-")?;
                    let target =
                        subregion(assist.unit_type(), tokens.next("supported destination")?, Some(assist))?;
                    Order::support_move(power, actor, assist, target)
                }
            }
        }
        "C" | "c" => {
            let army_type = tokens.next("A (convoyed army)")?;
            if parse_unit_type(army_type)? != UnitType::Army {
                return Err(NotationError::UnexpectedToken {
                    expected: "A (convoyed army)".to_string(),
                    found: army_type.to_string(),
                });
            }
            let army = subregion(UnitType::Army, tokens.next("convoyed army location")?, None)?;
            tokens.expect("-")?;
            let target = subregion(UnitType::Army, tokens.next("convoy destination")?, None)?;
            Order::convoy(power, actor, army, target)
        }
        "B" | "b" => Order::build(power, actor),
        "D" | "d" => Order::disband(power, actor),
        other => return Err(NotationError::UnknownAction(other.to_string())),
    };
    tokens.finish()?;
    Ok(order)
}

/// Parses `<power>: <order>`.
pub fn parse_line(s: &str) -> Result<Order, NotationError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(NotationError::EmptyInput);
    }
    let (power, order) = s
        .split_once(':')
        .ok_or_else(|| NotationError::UnexpectedEnd("':' after the power".to_string()))?;
    let power = power.trim();
    let power = Power::from_name(power).ok_or_else(|| NotationError::UnknownPower(power.to_string()))?;
    parse_order(power, order)
}

/// Parses one `<power>: <order>` per line. Blank lines and text after `#`
/// are ignored.
pub fn parse_orders(s: &str) -> Result<Vec<Order>, NotationError> {
    s.lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
        .map(parse_line)
        .collect()
}

fn format_location(sr: Subregion) -> String {
    match sr.coast {
        Coast::None => sr.territory.abbr().to_string(),
        coast => format!("{}/{}", sr.territory.abbr(), coast.abbr()),
    }
}

fn format_unit(sr: Subregion) -> String {
    format!("{} {}", sr.unit_type().letter(), format_location(sr))
}

/// Formats an order in notation, without its power.
///
/// Orders missing a slot their action needs are written with `?` in its
/// place.
pub fn format_order(order: &Order) -> String {
    if order.action == Action::Waive {
        return "W".to_string();
    }
    let unit = order.actor.map_or_else(|| "?".to_string(), format_unit);
    let target = || order.target.map_or_else(|| "?".to_string(), format_location);
    match order.action {
        Action::Hold => format!("{} H", unit),
        Action::Move if order.via_convoy => format!("{} - {} via", unit, target()),
        Action::Move => format!("{} - {}", unit, target()),
        Action::Support => {
            let assist = order.assist.map_or_else(|| "?".to_string(), format_unit);
            match order.target {
                Some(_) => format!("{} S {} - {}", unit, assist, target()),
                None => format!("{} S {}", unit, assist),
            }
        }
        Action::Convoy => {
            let army = order.assist.map_or_else(|| "?".to_string(), format_location);
            format!("{} C A {} - {}", unit, army, target())
        }
        Action::Build => format!("{} B", unit),
        Action::Disband => format!("{} D", unit),
        Action::Waive => "W".to_string(),
    }
}

/// Formats an order as `<power>: <order>`.
pub fn format_line(order: &Order) -> String {
    format!("{}: {}", order.power, format_order(order))
}

/// Formats orders one per line, the inverse of [`parse_orders`].
pub fn format_orders(orders: &[Order]) -> String {
    orders.iter().map(format_line).collect::<Vec<_>>().join("\n")
}
