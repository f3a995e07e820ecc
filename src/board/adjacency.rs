//! Subregions and the border graph of the standard map.
//!
//! Every land-capable territory has one land subregion. Every water-capable
//! territory has one sea subregion, or one per coast when its coastline is split
//! (Bulgaria, Spain, St. Petersburg). Armies stand on land subregions, fleets on
//! sea subregions, and a unit moves along the borders of the subregion it
//! occupies.
//!
//! The border tables below list each undirected edge once. They are expanded into
//! a symmetric per-subregion index on first access.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use thiserror::Error;

use super::territory::{Coast, Territory, ALL_TERRITORIES};
use super::unit::UnitType;

/// Whether a subregion holds armies or fleets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubregionKind {
    Land,
    Sea,
}

/// A slot inside a territory that a single unit can occupy.
///
/// Ordering is by territory first, so sorted collections of subregions follow
/// territory order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Subregion {
    pub territory: Territory,
    pub kind: SubregionKind,
    pub coast: Coast,
}

impl Subregion {
    /// The land subregion of a territory.
    pub const fn land(territory: Territory) -> Self {
        Subregion {
            territory,
            kind: SubregionKind::Land,
            coast: Coast::None,
        }
    }

    /// The single sea subregion of a territory without split coasts.
    pub const fn sea(territory: Territory) -> Self {
        Subregion::coast(territory, Coast::None)
    }

    /// A sea subregion on a named coast.
    pub const fn coast(territory: Territory, coast: Coast) -> Self {
        Subregion {
            territory,
            kind: SubregionKind::Sea,
            coast,
        }
    }

    /// The subregion a unit of the given type would occupy in `territory`.
    pub const fn for_unit(unit_type: UnitType, territory: Territory, coast: Coast) -> Self {
        match unit_type {
            UnitType::Army => Subregion::land(territory),
            UnitType::Fleet => Subregion::coast(territory, coast),
        }
    }

    #[inline]
    pub fn is_land(self) -> bool {
        self.kind == SubregionKind::Land
    }

    #[inline]
    pub fn is_sea(self) -> bool {
        self.kind == SubregionKind::Sea
    }

    /// The type of unit that can stand here.
    pub fn unit_type(self) -> UnitType {
        match self.kind {
            SubregionKind::Land => UnitType::Army,
            SubregionKind::Sea => UnitType::Fleet,
        }
    }

    /// True if this subregion exists on the standard map.
    pub fn exists(self) -> bool {
        territory_parts(self.territory).contains(&self)
    }

    /// Subregions a unit standing here can move to in one step.
    pub fn borders(self) -> &'static [Subregion] {
        borders(self)
    }
}

impl fmt::Display for Subregion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            SubregionKind::Land => 'l',
            SubregionKind::Sea => 's',
        };
        match self.coast {
            Coast::None => write!(f, "{}.{}", self.territory, kind),
            coast => write!(f, "{}.{}.{}", self.territory, coast.abbr(), kind),
        }
    }
}

/// Error returned when a subregion token cannot be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubregionParseError {
    #[error("malformed subregion token '{0}'")]
    Malformed(String),
    #[error("unknown territory in subregion token '{0}'")]
    UnknownTerritory(String),
    #[error("subregion '{0}' does not exist on the map")]
    NoSuchSubregion(String),
}

/// Parses tokens of the form `lon.l`, `eng.s` or `stp.sc.s`.
impl FromStr for Subregion {
    type Err = SubregionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || SubregionParseError::Malformed(s.to_string());
        let parts: Vec<&str> = s.split('.').collect();
        let (terr, coast, kind) = match parts.as_slice() {
            [t, k] => (*t, Coast::None, *k),
            [t, c, k] => (*t, Coast::from_abbr(c).ok_or_else(malformed)?, *k),
            _ => return Err(malformed()),
        };
        let territory = Territory::from_abbr(terr)
            .ok_or_else(|| SubregionParseError::UnknownTerritory(s.to_string()))?;
        let sr = match kind {
            "l" | "L" if coast == Coast::None => Subregion::land(territory),
            "s" | "S" => Subregion::coast(territory, coast),
            _ => return Err(malformed()),
        };
        if !sr.exists() {
            return Err(SubregionParseError::NoSuchSubregion(s.to_string()));
        }
        Ok(sr)
    }
}

impl TryFrom<String> for Subregion {
    type Error = SubregionParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Subregion> for String {
    fn from(sr: Subregion) -> String {
        sr.to_string()
    }
}

impl serde::Serialize for Subregion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Subregion {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        token.parse().map_err(serde::de::Error::custom)
    }
}

const N: Coast = Coast::None;
const NC: Coast = Coast::North;
const SC: Coast = Coast::South;
const EC: Coast = Coast::East;

/// Army borders between land subregions, one entry per undirected edge.
#[rustfmt::skip]
static LAND_BORDERS: &[(Territory, Territory)] = {
    use Territory::*;
    &[
        (Alb, Gre), (Alb, Ser), (Alb, Tri),
        (Ank, Arm), (Ank, Con), (Ank, Smy),
        (Apu, Nap), (Apu, Rom), (Apu, Ven),
        (Arm, Sev), (Arm, Smy), (Arm, Syr),
        (Bel, Bur), (Bel, Hol), (Bel, Pic), (Bel, Ruh),
        (Ber, Kie), (Ber, Mun), (Ber, Pru), (Ber, Sil),
        (Boh, Gal), (Boh, Mun), (Boh, Sil), (Boh, Tyr), (Boh, Vie),
        (Bre, Gas), (Bre, Par), (Bre, Pic),
        (Bud, Gal), (Bud, Rum), (Bud, Ser), (Bud, Tri), (Bud, Vie),
        (Bul, Con), (Bul, Gre), (Bul, Rum), (Bul, Ser),
        (Bur, Gas), (Bur, Mar), (Bur, Mun), (Bur, Par), (Bur, Pic), (Bur, Ruh),
        (Cly, Edi), (Cly, Lvp),
        (Con, Smy),
        (Den, Kie), (Den, Swe),
        (Edi, Lvp), (Edi, Yor),
        (Fin, Nwy), (Fin, Stp), (Fin, Swe),
        (Gal, Rum), (Gal, Sil), (Gal, Ukr), (Gal, Vie), (Gal, War),
        (Gas, Mar), (Gas, Par), (Gas, Spa),
        (Gre, Ser),
        (Hol, Kie), (Hol, Ruh),
        (Kie, Mun), (Kie, Ruh),
        (Lvp, Wal), (Lvp, Yor),
        (Lvn, Mos), (Lvn, Pru), (Lvn, Stp), (Lvn, War),
        (Lon, Wal), (Lon, Yor),
        (Mar, Pie), (Mar, Spa),
        (Mos, Sev), (Mos, Stp), (Mos, Ukr), (Mos, War),
        (Mun, Ruh), (Mun, Sil), (Mun, Tyr),
        (Nap, Rom),
        (Naf, Tun),
        (Nwy, Stp), (Nwy, Swe),
        (Par, Pic),
        (Pie, Tus), (Pie, Tyr), (Pie, Ven),
        (Por, Spa),
        (Pru, Sil), (Pru, War),
        (Rom, Tus), (Rom, Ven),
        (Rum, Ser), (Rum, Sev), (Rum, Ukr),
        (Ser, Tri),
        (Sev, Ukr),
        (Sil, War),
        (Smy, Syr),
        (Tri, Tyr), (Tri, Ven), (Tri, Vie),
        (Tus, Ven),
        (Tyr, Ven), (Tyr, Vie),
        (Ukr, War),
        (Wal, Yor),
    ]
};

/// Fleet borders between sea subregions, one entry per undirected edge.
#[rustfmt::skip]
static SEA_BORDERS: &[(Territory, Coast, Territory, Coast)] = {
    use Territory::*;
    &[
        (Adr, N, Alb, N), (Adr, N, Apu, N), (Adr, N, Ion, N), (Adr, N, Tri, N), (Adr, N, Ven, N),
        (Aeg, N, Bul, SC), (Aeg, N, Con, N), (Aeg, N, Eas, N), (Aeg, N, Gre, N), (Aeg, N, Ion, N),
        (Aeg, N, Smy, N),
        (Alb, N, Gre, N), (Alb, N, Ion, N), (Alb, N, Tri, N),
        (Ank, N, Arm, N), (Ank, N, Bla, N), (Ank, N, Con, N),
        (Apu, N, Ion, N), (Apu, N, Nap, N), (Apu, N, Ven, N),
        (Arm, N, Bla, N), (Arm, N, Sev, N),
        (Bal, N, Ber, N), (Bal, N, Den, N), (Bal, N, Bot, N), (Bal, N, Kie, N), (Bal, N, Lvn, N),
        (Bal, N, Pru, N), (Bal, N, Swe, N),
        (Bar, N, Nwy, N), (Bar, N, Nrg, N), (Bar, N, Stp, NC),
        (Bel, N, Eng, N), (Bel, N, Hol, N), (Bel, N, Nth, N), (Bel, N, Pic, N),
        (Ber, N, Kie, N), (Ber, N, Pru, N),
        (Bla, N, Bul, EC), (Bla, N, Con, N), (Bla, N, Rum, N), (Bla, N, Sev, N),
        (Bre, N, Eng, N), (Bre, N, Gas, N), (Bre, N, Mao, N), (Bre, N, Pic, N),
        (Bul, EC, Con, N), (Bul, EC, Rum, N), (Bul, SC, Con, N), (Bul, SC, Gre, N),
        (Cly, N, Edi, N), (Cly, N, Lvp, N), (Cly, N, Nao, N), (Cly, N, Nrg, N),
        (Con, N, Smy, N),
        (Den, N, Hel, N), (Den, N, Kie, N), (Den, N, Nth, N), (Den, N, Ska, N), (Den, N, Swe, N),
        (Eas, N, Ion, N), (Eas, N, Smy, N), (Eas, N, Syr, N),
        (Edi, N, Nth, N), (Edi, N, Nrg, N), (Edi, N, Yor, N),
        (Eng, N, Iri, N), (Eng, N, Lon, N), (Eng, N, Mao, N), (Eng, N, Nth, N), (Eng, N, Pic, N),
        (Eng, N, Wal, N),
        (Fin, N, Bot, N), (Fin, N, Stp, SC), (Fin, N, Swe, N),
        (Gas, N, Mao, N), (Gas, N, Spa, NC),
        (Gre, N, Ion, N),
        (Bot, N, Lvn, N), (Bot, N, Stp, SC), (Bot, N, Swe, N),
        (Gol, N, Mar, N), (Gol, N, Pie, N), (Gol, N, Spa, SC), (Gol, N, Tus, N), (Gol, N, Tys, N),
        (Gol, N, Wes, N),
        (Hel, N, Hol, N), (Hel, N, Kie, N), (Hel, N, Nth, N),
        (Hol, N, Kie, N), (Hol, N, Nth, N),
        (Ion, N, Nap, N), (Ion, N, Tun, N), (Ion, N, Tys, N),
        (Iri, N, Lvp, N), (Iri, N, Mao, N), (Iri, N, Nao, N), (Iri, N, Wal, N),
        (Lvp, N, Nao, N), (Lvp, N, Wal, N),
        (Lvn, N, Pru, N), (Lvn, N, Stp, SC),
        (Lon, N, Nth, N), (Lon, N, Wal, N), (Lon, N, Yor, N),
        (Mar, N, Pie, N), (Mar, N, Spa, SC),
        (Mao, N, Naf, N), (Mao, N, Nao, N), (Mao, N, Por, N), (Mao, N, Spa, NC), (Mao, N, Spa, SC),
        (Mao, N, Wes, N),
        (Nap, N, Rom, N), (Nap, N, Tys, N),
        (Naf, N, Tun, N), (Naf, N, Wes, N),
        (Nao, N, Nrg, N),
        (Nth, N, Nwy, N), (Nth, N, Nrg, N), (Nth, N, Ska, N), (Nth, N, Yor, N),
        (Nwy, N, Nrg, N), (Nwy, N, Ska, N), (Nwy, N, Stp, NC), (Nwy, N, Swe, N),
        (Pie, N, Tus, N),
        (Por, N, Spa, NC), (Por, N, Spa, SC),
        (Rom, N, Tus, N), (Rom, N, Tys, N),
        (Rum, N, Sev, N),
        (Ska, N, Swe, N),
        (Smy, N, Syr, N),
        (Spa, SC, Wes, N),
        (Tri, N, Ven, N),
        (Tun, N, Tys, N), (Tun, N, Wes, N),
        (Tus, N, Tys, N),
        (Tys, N, Wes, N),
    ]
};

struct MapGraph {
    parts: Vec<Vec<Subregion>>,
    borders: BTreeMap<Subregion, Vec<Subregion>>,
}

static GRAPH: LazyLock<MapGraph> = LazyLock::new(|| {
    let parts: Vec<Vec<Subregion>> = ALL_TERRITORIES
        .iter()
        .map(|&t| {
            let mut srs = Vec::new();
            if t.has_land() {
                srs.push(Subregion::land(t));
            }
            if t.has_sea() {
                if t.coasts().is_empty() {
                    srs.push(Subregion::sea(t));
                } else {
                    srs.extend(t.coasts().iter().map(|&c| Subregion::coast(t, c)));
                }
            }
            srs
        })
        .collect();

    let mut borders: BTreeMap<Subregion, Vec<Subregion>> = parts
        .iter()
        .flatten()
        .map(|&sr| (sr, Vec::new()))
        .collect();
    let mut link = |a: Subregion, b: Subregion| {
        for (from, to) in [(a, b), (b, a)] {
            if let Some(list) = borders.get_mut(&from) {
                list.push(to);
            }
        }
    };
    for &(a, b) in LAND_BORDERS {
        link(Subregion::land(a), Subregion::land(b));
    }
    for &(a, ac, b, bc) in SEA_BORDERS {
        link(Subregion::coast(a, ac), Subregion::coast(b, bc));
    }
    for list in borders.values_mut() {
        list.sort();
        list.dedup();
    }

    MapGraph { parts, borders }
});

/// Returns every subregion of a territory, land first.
pub fn territory_parts(territory: Territory) -> &'static [Subregion] {
    &GRAPH.parts[territory.index()]
}

/// Returns the subregions bordering `sr`, sorted. Unknown subregions have none.
pub fn borders(sr: Subregion) -> &'static [Subregion] {
    GRAPH.borders.get(&sr).map(Vec::as_slice).unwrap_or(&[])
}

/// True if a unit at `from` can move to `to` in one step.
pub fn is_adjacent(from: Subregion, to: Subregion) -> bool {
    borders(from).binary_search(&to).is_ok()
}

/// Returns every subregion of every territory that borders `sr`, sorted.
///
/// A unit can only influence territories it borders, so this is the area a
/// support or a retreat-blocking order can reach.
pub fn bordering_parts(sr: Subregion) -> Vec<Subregion> {
    let mut out: Vec<Subregion> = borders(sr)
        .iter()
        .flat_map(|b| territory_parts(b.territory).iter().copied())
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Iterates over every subregion on the map in territory order.
pub fn all_subregions() -> impl Iterator<Item = Subregion> {
    GRAPH.parts.iter().flatten().copied()
}
