//! Territories of the standard map and the factions that contest them.
//!
//! The 75 territories are declared in order of display name. That order is the
//! stable iteration order of every map and set keyed by territory, and it is the
//! alphabetical order used when auto-disband has to break a tie.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The number of territories on the standard map.
pub const TERRITORY_COUNT: usize = 75;

/// The number of supply centers on the standard map.
pub const SUPPLY_CENTER_COUNT: usize = 34;

/// A territory of the standard map, named by its three-letter abbreviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[repr(u8)]
pub enum Territory {
    Adr = 0, // Adriatic Sea
    Aeg = 1, // Aegean Sea
    Alb = 2, // Albania
    Ank = 3, // Ankara
    Apu = 4, // Apulia
    Arm = 5, // Armenia
    Bal = 6, // Baltic Sea
    Bar = 7, // Barents Sea
    Bel = 8, // Belgium
    Ber = 9, // Berlin
    Bla = 10, // Black Sea
    Boh = 11, // Bohemia
    Bre = 12, // Brest
    Bud = 13, // Budapest
    Bul = 14, // Bulgaria
    Bur = 15, // Burgundy
    Cly = 16, // Clyde
    Con = 17, // Constantinople
    Den = 18, // Denmark
    Eas = 19, // Eastern Mediterranean
    Edi = 20, // Edinburgh
    Eng = 21, // English Channel
    Fin = 22, // Finland
    Gal = 23, // Galicia
    Gas = 24, // Gascony
    Gre = 25, // Greece
    Bot = 26, // Gulf of Bothnia
    Gol = 27, // Gulf of Lyon
    Hel = 28, // Heligoland Bight
    Hol = 29, // Holland
    Ion = 30, // Ionian Sea
    Iri = 31, // Irish Sea
    Kie = 32, // Kiel
    Lvp = 33, // Liverpool
    Lvn = 34, // Livonia
    Lon = 35, // London
    Mar = 36, // Marseilles
    Mao = 37, // Mid-Atlantic Ocean
    Mos = 38, // Moscow
    Mun = 39, // Munich
    Nap = 40, // Naples
    Naf = 41, // North Africa
    Nao = 42, // North Atlantic Ocean
    Nth = 43, // North Sea
    Nwy = 44, // Norway
    Nrg = 45, // Norwegian Sea
    Par = 46, // Paris
    Pic = 47, // Picardy
    Pie = 48, // Piedmont
    Por = 49, // Portugal
    Pru = 50, // Prussia
    Rom = 51, // Rome
    Ruh = 52, // Ruhr
    Rum = 53, // Rumania
    Ser = 54, // Serbia
    Sev = 55, // Sevastopol
    Sil = 56, // Silesia
    Ska = 57, // Skagerrak
    Smy = 58, // Smyrna
    Spa = 59, // Spain
    Stp = 60, // St. Petersburg
    Swe = 61, // Sweden
    Syr = 62, // Syria
    Tri = 63, // Trieste
    Tun = 64, // Tunisia
    Tus = 65, // Tuscany
    Tyr = 66, // Tyrolia
    Tys = 67, // Tyrrhenian Sea
    Ukr = 68, // Ukraine
    Ven = 69, // Venice
    Vie = 70, // Vienna
    Wal = 71, // Wales
    War = 72, // Warsaw
    Wes = 73, // Western Mediterranean
    Yor = 74, // Yorkshire
}

/// Every territory in declaration order.
pub const ALL_TERRITORIES: [Territory; TERRITORY_COUNT] = {
    use Territory::*;
    [
        Adr, Aeg, Alb, Ank, Apu, Arm, Bal, Bar, Bel, Ber,
        Bla, Boh, Bre, Bud, Bul, Bur, Cly, Con, Den, Eas,
        Edi, Eng, Fin, Gal, Gas, Gre, Bot, Gol, Hel, Hol,
        Ion, Iri, Kie, Lvp, Lvn, Lon, Mar, Mao, Mos, Mun,
        Nap, Naf, Nao, Nth, Nwy, Nrg, Par, Pic, Pie, Por,
        Pru, Rom, Ruh, Rum, Ser, Sev, Sil, Ska, Smy, Spa,
        Stp, Swe, Syr, Tri, Tun, Tus, Tyr, Tys, Ukr, Ven,
        Vie, Wal, War, Wes, Yor,
    ]
};

impl Territory {
    /// Returns the position of this territory in declaration order.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    fn info(self) -> &'static TerritoryInfo {
        &TERRITORIES[self as usize]
    }

    /// Returns the lowercase three-letter abbreviation.
    pub fn abbr(self) -> &'static str {
        self.info().abbr
    }

    /// Returns the display name.
    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn terrain(self) -> Terrain {
        self.info().terrain
    }

    pub fn is_supply_center(self) -> bool {
        self.info().supply_center
    }

    /// Returns the faction that owns this territory at the start of a game.
    ///
    /// Home territories that are not supply centers (Apulia, Ruhr, ...) still
    /// carry a home faction.
    pub fn home(self) -> Option<Power> {
        self.info().home
    }

    /// Returns the named coasts of a split-coast territory, empty otherwise.
    pub fn coasts(self) -> &'static [Coast] {
        self.info().coasts
    }

    /// True if an army can stand here.
    pub fn has_land(self) -> bool {
        !matches!(self.info().terrain, Terrain::Sea)
    }

    /// True if a fleet can stand here.
    pub fn has_sea(self) -> bool {
        !matches!(self.info().terrain, Terrain::Inland)
    }

    /// Looks a territory up by its abbreviation, ignoring ASCII case.
    pub fn from_abbr(abbr: &str) -> Option<Territory> {
        ALL_TERRITORIES
            .iter()
            .copied()
            .find(|t| t.abbr().eq_ignore_ascii_case(abbr))
    }
}

impl fmt::Display for Territory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbr())
    }
}

/// Returned when a string names no territory or power.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UnknownName {
    #[error("unknown territory '{0}'")]
    Territory(String),
    #[error("unknown power '{0}'")]
    Power(String),
}

impl FromStr for Territory {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Territory::from_abbr(s).ok_or_else(|| UnknownName::Territory(s.to_string()))
    }
}

impl TryFrom<String> for Territory {
    type Error = UnknownName;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Territory> for String {
    fn from(t: Territory) -> String {
        t.abbr().to_string()
    }
}

/// Coast label of a subregion. Only split-coast territories use a named coast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Coast {
    None,
    North,
    South,
    East,
}

impl Coast {
    /// Returns the two-letter abbreviation, empty for `Coast::None`.
    pub const fn abbr(self) -> &'static str {
        match self {
            Coast::None => "",
            Coast::North => "nc",
            Coast::South => "sc",
            Coast::East => "ec",
        }
    }

    pub fn from_abbr(s: &str) -> Option<Coast> {
        match s.to_ascii_lowercase().as_str() {
            "" => Some(Coast::None),
            "nc" => Some(Coast::North),
            "sc" => Some(Coast::South),
            "ec" => Some(Coast::East),
            _ => Option::None,
        }
    }
}

/// Terrain of a territory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terrain {
    /// Land without a coastline: armies only.
    Inland,
    /// Open water: fleets only.
    Sea,
    /// Land with at least one coastline: armies and fleets.
    Coastal,
}

/// One of the seven great powers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Power {
    Austria,
    England,
    France,
    Germany,
    Italy,
    Russia,
    Turkey,
}

/// All seven powers in standard order.
pub const ALL_POWERS: [Power; 7] = [
    Power::Austria,
    Power::England,
    Power::France,
    Power::Germany,
    Power::Italy,
    Power::Russia,
    Power::Turkey,
];

impl Power {
    /// Returns the lowercase name used in snapshots and logs.
    pub const fn name(self) -> &'static str {
        match self {
            Power::Austria => "austria",
            Power::England => "england",
            Power::France => "france",
            Power::Germany => "germany",
            Power::Italy => "italy",
            Power::Russia => "russia",
            Power::Turkey => "turkey",
        }
    }

    /// Parses a power from its name. "Austria-Hungary" is accepted as an alias.
    pub fn from_name(name: &str) -> Option<Power> {
        match name.to_ascii_lowercase().as_str() {
            "austria" | "austria-hungary" => Some(Power::Austria),
            "england" => Some(Power::England),
            "france" => Some(Power::France),
            "germany" => Some(Power::Germany),
            "italy" => Some(Power::Italy),
            "russia" => Some(Power::Russia),
            "turkey" => Some(Power::Turkey),
            _ => Option::None,
        }
    }
}

impl fmt::Display for Power {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Power {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Power::from_name(s).ok_or_else(|| UnknownName::Power(s.to_string()))
    }
}

/// Static metadata for a territory.
#[derive(Debug)]
pub struct TerritoryInfo {
    pub abbr: &'static str,
    pub name: &'static str,
    pub terrain: Terrain,
    pub supply_center: bool,
    pub home: Option<Power>,
    pub coasts: &'static [Coast],
}

const fn entry(abbr: &'static str, name: &'static str, terrain: Terrain) -> TerritoryInfo {
    TerritoryInfo {
        abbr,
        name,
        terrain,
        supply_center: false,
        home: None,
        coasts: &[],
    }
}

const fn inland(abbr: &'static str, name: &'static str) -> TerritoryInfo {
    entry(abbr, name, Terrain::Inland)
}

const fn sea(abbr: &'static str, name: &'static str) -> TerritoryInfo {
    entry(abbr, name, Terrain::Sea)
}

const fn coastal(abbr: &'static str, name: &'static str) -> TerritoryInfo {
    entry(abbr, name, Terrain::Coastal)
}

impl TerritoryInfo {
    const fn home(mut self, power: Power) -> Self {
        self.home = Some(power);
        self
    }

    const fn center(mut self) -> Self {
        self.supply_center = true;
        self
    }

    const fn split(mut self, coasts: &'static [Coast]) -> Self {
        self.coasts = coasts;
        self
    }
}

/// Territory metadata, indexed by `Territory as usize`.
pub static TERRITORIES: [TerritoryInfo; TERRITORY_COUNT] = {
    use Power::*;
    [
        sea("adr", "Adriatic Sea"),
        sea("aeg", "Aegean Sea"),
        coastal("alb", "Albania"),
        coastal("ank", "Ankara").home(Turkey).center(),
        coastal("apu", "Apulia").home(Italy),
        coastal("arm", "Armenia").home(Turkey),
        sea("bal", "Baltic Sea"),
        sea("bar", "Barents Sea"),
        coastal("bel", "Belgium").center(),
        coastal("ber", "Berlin").home(Germany).center(),
        sea("bla", "Black Sea"),
        inland("boh", "Bohemia").home(Austria),
        coastal("bre", "Brest").home(France).center(),
        inland("bud", "Budapest").home(Austria).center(),
        coastal("bul", "Bulgaria").center().split(&[Coast::East, Coast::South]),
        inland("bur", "Burgundy").home(France),
        coastal("cly", "Clyde").home(England),
        coastal("con", "Constantinople").home(Turkey).center(),
        coastal("den", "Denmark").center(),
        sea("eas", "Eastern Mediterranean"),
        coastal("edi", "Edinburgh").home(England).center(),
        sea("eng", "English Channel"),
        coastal("fin", "Finland").home(Russia),
        inland("gal", "Galicia").home(Austria),
        coastal("gas", "Gascony").home(France),
        coastal("gre", "Greece").center(),
        sea("bot", "Gulf of Bothnia"),
        sea("gol", "Gulf of Lyon"),
        sea("hel", "Heligoland Bight"),
        coastal("hol", "Holland").center(),
        sea("ion", "Ionian Sea"),
        sea("iri", "Irish Sea"),
        coastal("kie", "Kiel").home(Germany).center(),
        coastal("lvp", "Liverpool").home(England).center(),
        coastal("lvn", "Livonia").home(Russia),
        coastal("lon", "London").home(England).center(),
        coastal("mar", "Marseilles").home(France).center(),
        sea("mao", "Mid-Atlantic Ocean"),
        inland("mos", "Moscow").home(Russia).center(),
        inland("mun", "Munich").home(Germany).center(),
        coastal("nap", "Naples").home(Italy).center(),
        coastal("naf", "North Africa"),
        sea("nao", "North Atlantic Ocean"),
        sea("nth", "North Sea"),
        coastal("nwy", "Norway").center(),
        sea("nrg", "Norwegian Sea"),
        inland("par", "Paris").home(France).center(),
        coastal("pic", "Picardy").home(France),
        coastal("pie", "Piedmont").home(Italy),
        coastal("por", "Portugal").center(),
        coastal("pru", "Prussia").home(Germany),
        coastal("rom", "Rome").home(Italy).center(),
        inland("ruh", "Ruhr").home(Germany),
        coastal("rum", "Rumania").center(),
        inland("ser", "Serbia").center(),
        coastal("sev", "Sevastopol").home(Russia).center(),
        inland("sil", "Silesia").home(Germany),
        sea("ska", "Skagerrak"),
        coastal("smy", "Smyrna").home(Turkey).center(),
        coastal("spa", "Spain").center().split(&[Coast::North, Coast::South]),
        coastal("stp", "St. Petersburg").home(Russia).center().split(&[Coast::North, Coast::South]),
        coastal("swe", "Sweden").center(),
        coastal("syr", "Syria").home(Turkey),
        coastal("tri", "Trieste").home(Austria).center(),
        coastal("tun", "Tunisia").center(),
        coastal("tus", "Tuscany").home(Italy),
        inland("tyr", "Tyrolia").home(Austria),
        sea("tys", "Tyrrhenian Sea"),
        inland("ukr", "Ukraine").home(Russia),
        coastal("ven", "Venice").home(Italy).center(),
        inland("vie", "Vienna").home(Austria).center(),
        coastal("wal", "Wales").home(England),
        inland("war", "Warsaw").home(Russia).center(),
        sea("wes", "Western Mediterranean"),
        coastal("yor", "Yorkshire").home(England),
    ]
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_order_matches_indices() {
        for (i, t) in ALL_TERRITORIES.iter().enumerate() {
            assert_eq!(t.index(), i, "{:?} is out of place", t);
        }
    }

    #[test]
    fn territories_sorted_by_display_name() {
        for pair in ALL_TERRITORIES.windows(2) {
            assert!(
                pair[0].name() < pair[1].name(),
                "{} should sort before {}",
                pair[0].name(),
                pair[1].name()
            );
        }
    }

    #[test]
    fn supply_center_count() {
        let count = ALL_TERRITORIES.iter().filter(|t| t.is_supply_center()).count();
        assert_eq!(count, SUPPLY_CENTER_COUNT);
    }

    #[test]
    fn terrain_counts() {
        let count = |terrain: Terrain| ALL_TERRITORIES.iter().filter(|t| t.terrain() == terrain).count();
        assert_eq!(count(Terrain::Inland), 14);
        assert_eq!(count(Terrain::Sea), 19);
        assert_eq!(count(Terrain::Coastal), 42);
    }

    #[test]
    fn home_centers_per_power() {
        let centers = |power: Power| {
            ALL_TERRITORIES
                .iter()
                .filter(|t| t.is_supply_center() && t.home() == Some(power))
                .count()
        };
        for power in ALL_POWERS {
            let expected = if power == Power::Russia { 4 } else { 3 };
            assert_eq!(centers(power), expected, "{power}");
        }
    }

    #[test]
    fn non_center_home_territories() {
        assert_eq!(Territory::Apu.home(), Some(Power::Italy));
        assert_eq!(Territory::Ruh.home(), Some(Power::Germany));
        assert!(!Territory::Apu.is_supply_center());
        assert_eq!(Territory::Bel.home(), None);
    }

    #[test]
    fn split_coasts() {
        assert_eq!(Territory::Bul.coasts(), &[Coast::East, Coast::South]);
        assert_eq!(Territory::Spa.coasts(), &[Coast::North, Coast::South]);
        assert_eq!(Territory::Stp.coasts(), &[Coast::North, Coast::South]);
        assert!(Territory::Por.coasts().is_empty());
    }

    #[test]
    fn abbreviation_lookup() {
        assert_eq!(Territory::from_abbr("lon"), Some(Territory::Lon));
        assert_eq!(Territory::from_abbr("STP"), Some(Territory::Stp));
        assert_eq!(Territory::from_abbr("xyz"), None);
        assert_eq!("mao".parse::<Territory>(), Ok(Territory::Mao));
        assert_eq!(
            "atl".parse::<Territory>(),
            Err(UnknownName::Territory("atl".to_string()))
        );
    }

    #[test]
    fn land_and_sea_parts() {
        assert!(Territory::Mun.has_land() && !Territory::Mun.has_sea());
        assert!(!Territory::Nth.has_land() && Territory::Nth.has_sea());
        assert!(Territory::Lon.has_land() && Territory::Lon.has_sea());
    }

    #[test]
    fn power_names() {
        for power in ALL_POWERS {
            assert_eq!(Power::from_name(power.name()), Some(power));
        }
        assert_eq!(Power::from_name("Austria-Hungary"), Some(Power::Austria));
        assert_eq!(serde_json::to_string(&Power::Turkey).unwrap(), "\"turkey\"");
    }

    #[test]
    fn territory_serializes_as_abbreviation() {
        assert_eq!(serde_json::to_string(&Territory::Eng).unwrap(), "\"eng\"");
        let parsed: Territory = serde_json::from_str("\"hel\"").unwrap();
        assert_eq!(parsed, Territory::Hel);
    }
}
