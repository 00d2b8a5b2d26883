use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Number of drivers on the entry list.
pub const DRIVER_COUNT: usize = DriverCode::ALL.len();

/// Constructor entered in the championship.
///
/// Declaration order doubles as the tie-break order when two teams share
/// the top of the team standings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Team {
    RedBullRacing,
    Mercedes,
    Ferrari,
    McLaren,
    AstonMartin,
    Alpine,
    Williams,
    KickSauber,
    Haas,
    RacingBulls,
}

impl Team {
    pub const ALL: [Team; 10] = [
        Team::RedBullRacing,
        Team::Mercedes,
        Team::Ferrari,
        Team::McLaren,
        Team::AstonMartin,
        Team::Alpine,
        Team::Williams,
        Team::KickSauber,
        Team::Haas,
        Team::RacingBulls,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Team::RedBullRacing => "Red Bull Racing",
            Team::Mercedes => "Mercedes",
            Team::Ferrari => "Ferrari",
            Team::McLaren => "McLaren",
            Team::AstonMartin => "Aston Martin",
            Team::Alpine => "Alpine",
            Team::Williams => "Williams",
            Team::KickSauber => "Kick Sauber",
            Team::Haas => "Haas",
            Team::RacingBulls => "Racing Bulls",
        }
    }

    /// Drivers racing for this team, in entry-list order.
    pub fn drivers(self) -> impl Iterator<Item = DriverCode> {
        DriverCode::ALL.into_iter().filter(move |d| d.team() == self)
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Team {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize(s);
        if let Some(team) = Team::ALL.into_iter().find(|t| normalize(t.name()) == key) {
            return Ok(team);
        }
        match key.as_str() {
            "redbull" | "rbr" => Ok(Team::RedBullRacing),
            "aston" => Ok(Team::AstonMartin),
            "sauber" | "stake" | "kick" => Ok(Team::KickSauber),
            "rb" | "vcarb" | "visacashapprb" => Ok(Team::RacingBulls),
            _ => Err(GameError::validation(format!("unknown team '{}'", s.trim()))),
        }
    }
}

impl TryFrom<String> for Team {
    type Error = GameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Team> for String {
    fn from(team: Team) -> Self {
        team.name().to_string()
    }
}

/// Three-letter timing code of a driver on the entry list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DriverCode {
    Ver,
    Law,
    Ham,
    Rus,
    Lec,
    Sai,
    Nor,
    Pia,
    Alo,
    Str,
    Oco,
    Gas,
    Alb,
    Bor,
    Had,
    Bea,
    Ant,
    Hul,
    Tsu,
    Col,
}

impl DriverCode {
    pub const ALL: [DriverCode; 20] = [
        DriverCode::Ver,
        DriverCode::Law,
        DriverCode::Ham,
        DriverCode::Rus,
        DriverCode::Lec,
        DriverCode::Sai,
        DriverCode::Nor,
        DriverCode::Pia,
        DriverCode::Alo,
        DriverCode::Str,
        DriverCode::Oco,
        DriverCode::Gas,
        DriverCode::Alb,
        DriverCode::Bor,
        DriverCode::Had,
        DriverCode::Bea,
        DriverCode::Ant,
        DriverCode::Hul,
        DriverCode::Tsu,
        DriverCode::Col,
    ];

    pub fn code(self) -> &'static str {
        match self {
            DriverCode::Ver => "VER",
            DriverCode::Law => "LAW",
            DriverCode::Ham => "HAM",
            DriverCode::Rus => "RUS",
            DriverCode::Lec => "LEC",
            DriverCode::Sai => "SAI",
            DriverCode::Nor => "NOR",
            DriverCode::Pia => "PIA",
            DriverCode::Alo => "ALO",
            DriverCode::Str => "STR",
            DriverCode::Oco => "OCO",
            DriverCode::Gas => "GAS",
            DriverCode::Alb => "ALB",
            DriverCode::Bor => "BOR",
            DriverCode::Had => "HAD",
            DriverCode::Bea => "BEA",
            DriverCode::Ant => "ANT",
            DriverCode::Hul => "HUL",
            DriverCode::Tsu => "TSU",
            DriverCode::Col => "COL",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DriverCode::Ver => "Max Verstappen",
            DriverCode::Law => "Liam Lawson",
            DriverCode::Ham => "Lewis Hamilton",
            DriverCode::Rus => "George Russell",
            DriverCode::Lec => "Charles Leclerc",
            DriverCode::Sai => "Carlos Sainz",
            DriverCode::Nor => "Lando Norris",
            DriverCode::Pia => "Oscar Piastri",
            DriverCode::Alo => "Fernando Alonso",
            DriverCode::Str => "Lance Stroll",
            DriverCode::Oco => "Esteban Ocon",
            DriverCode::Gas => "Pierre Gasly",
            DriverCode::Alb => "Alexander Albon",
            DriverCode::Bor => "Gabriel Bortoleto",
            DriverCode::Had => "Isack Hadjar",
            DriverCode::Bea => "Oliver Bearman",
            DriverCode::Ant => "Kimi Antonelli",
            DriverCode::Hul => "Nico Hulkenberg",
            DriverCode::Tsu => "Yuki Tsunoda",
            DriverCode::Col => "Franco Colapinto",
        }
    }

    pub fn team(self) -> Team {
        match self {
            DriverCode::Ver | DriverCode::Law => Team::RedBullRacing,
            DriverCode::Ham | DriverCode::Rus | DriverCode::Ant => Team::Mercedes,
            DriverCode::Lec | DriverCode::Sai => Team::Ferrari,
            DriverCode::Nor | DriverCode::Pia => Team::McLaren,
            DriverCode::Alo | DriverCode::Str => Team::AstonMartin,
            DriverCode::Oco | DriverCode::Gas => Team::Alpine,
            DriverCode::Alb | DriverCode::Col => Team::Williams,
            DriverCode::Bor => Team::KickSauber,
            DriverCode::Had | DriverCode::Tsu => Team::RacingBulls,
            DriverCode::Bea | DriverCode::Hul => Team::Haas,
        }
    }
}

impl fmt::Display for DriverCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for DriverCode {
    type Err = GameError;

    /// Accepts the timing code or the full name, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        DriverCode::ALL
            .into_iter()
            .find(|d| {
                d.code().eq_ignore_ascii_case(trimmed) || d.name().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| GameError::validation(format!("unknown driver '{trimmed}'")))
    }
}

impl TryFrom<String> for DriverCode {
    type Error = GameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DriverCode> for String {
    fn from(driver: DriverCode) -> Self {
        driver.code().to_string()
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn entry_list_has_twenty_unique_codes() {
        assert_eq!(DRIVER_COUNT, 20);
        let codes: HashSet<_> = DriverCode::ALL.iter().map(|d| d.code()).collect();
        assert_eq!(codes.len(), 20);
    }

    #[test]
    fn every_team_fields_a_driver() {
        for team in Team::ALL {
            assert!(team.drivers().count() >= 1, "{team} has no drivers");
        }
        let total: usize = Team::ALL.iter().map(|t| t.drivers().count()).sum();
        assert_eq!(total, DRIVER_COUNT);
    }

    #[test]
    fn driver_parses_from_code_or_name() {
        assert_eq!("VER".parse::<DriverCode>().unwrap(), DriverCode::Ver);
        assert_eq!("ham".parse::<DriverCode>().unwrap(), DriverCode::Ham);
        assert_eq!(
            " Charles Leclerc ".parse::<DriverCode>().unwrap(),
            DriverCode::Lec
        );
        assert!(matches!(
            "XYZ".parse::<DriverCode>(),
            Err(GameError::Validation(_))
        ));
    }

    #[test]
    fn team_parses_names_and_aliases() {
        assert_eq!("Ferrari".parse::<Team>().unwrap(), Team::Ferrari);
        assert_eq!("red bull racing".parse::<Team>().unwrap(), Team::RedBullRacing);
        assert_eq!("Red Bull".parse::<Team>().unwrap(), Team::RedBullRacing);
        assert_eq!("Aston Martin".parse::<Team>().unwrap(), Team::AstonMartin);
        assert_eq!("Sauber".parse::<Team>().unwrap(), Team::KickSauber);
        assert!("Brabham".parse::<Team>().is_err());
    }

    #[test]
    fn serde_uses_display_strings() {
        let json = serde_json::to_string(&(DriverCode::Nor, Team::McLaren)).unwrap();
        assert_eq!(json, r#"["NOR","McLaren"]"#);
        let back: (DriverCode, Team) = serde_json::from_str(&json).unwrap();
        assert_eq!(back, (DriverCode::Nor, Team::McLaren));
        assert!(serde_json::from_str::<Team>(r#""Lotus""#).is_err());
    }
}
