//! Offline race results: a CSV with loosely named columns that yields a
//! starting grid and a final snapshot.

use std::collections::{BTreeMap, BTreeSet};

use crate::csv::parse_rows;
use crate::driver::{DriverCode, Team};
use crate::error::GameError;
use crate::snapshot::{RaceSnapshot, points_for_position};

const DRIVER_ALIASES: &[&str] = &["driver", "name", "drivername", "code"];
const TEAM_ALIASES: &[&str] = &["team", "constructor"];
const START_ALIASES: &[&str] = &["startposition", "startingposition", "grid", "start"];
const FINISH_ALIASES: &[&str] = &["finishposition", "position", "pos", "finish"];
const POINTS_ALIASES: &[&str] = &["points", "pts"];
const STATUS_ALIASES: &[&str] = &["status"];

/// Finish cells that mean the driver was not classified.
const UNCLASSIFIED: &[&str] = &["", "DNF", "DNS", "DSQ"];

/// Parsed results file.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsUpload {
    pub starting_grid: Option<RaceSnapshot>,
    pub final_snapshot: RaceSnapshot,
    /// Rows that were skipped or only partly understood.
    pub warnings: Vec<GameError>,
}

struct Columns {
    driver: usize,
    team: Option<usize>,
    start: Option<usize>,
    finish: Option<usize>,
    points: Option<usize>,
    status: Option<usize>,
}

fn normalize(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn find_column(headers: &[String], aliases: &[&str]) -> Option<usize> {
    let normalized: Vec<String> = headers.iter().map(|h| normalize(h)).collect();
    aliases
        .iter()
        .find_map(|alias| normalized.iter().position(|h| h == alias))
}

impl Columns {
    fn locate(headers: &[String]) -> Result<Self, GameError> {
        let driver = find_column(headers, DRIVER_ALIASES)
            .ok_or_else(|| GameError::validation("results file has no driver column"))?;
        Ok(Self {
            driver,
            team: find_column(headers, TEAM_ALIASES),
            start: find_column(headers, START_ALIASES),
            finish: find_column(headers, FINISH_ALIASES),
            points: find_column(headers, POINTS_ALIASES),
            status: find_column(headers, STATUS_ALIASES),
        })
    }
}

fn cell(row: &[String], index: Option<usize>) -> Option<&str> {
    index.map(|i| row.get(i).map(|s| s.trim()).unwrap_or(""))
}

/// Parse an uploaded results file.
///
/// A driver retired when the status mentions `dnf` or `retired`, or when a
/// finish column exists and its cell is empty or one of `DNF`, `DNS`,
/// `DSQ`. Team points come from a points column when present, otherwise
/// from the championship table applied to finish positions.
pub fn parse_results(text: &str) -> Result<ResultsUpload, GameError> {
    let mut rows = parse_rows(text).into_iter();
    let headers = rows
        .next()
        .ok_or_else(|| GameError::validation("results file is empty"))?;
    let columns = Columns::locate(&headers)?;

    let mut warnings = Vec::new();
    let mut seen = BTreeSet::new();
    let mut grid = BTreeMap::new();
    let mut finish = BTreeMap::new();
    let mut dnf = BTreeSet::new();
    let mut team_points: BTreeMap<Team, f64> = BTreeMap::new();

    for (line, row) in rows.enumerate() {
        let line = line + 2;
        let raw_driver = cell(&row, Some(columns.driver)).unwrap_or("");
        let driver: DriverCode = match raw_driver.parse() {
            Ok(d) => d,
            Err(_) => {
                warnings.push(GameError::data_incomplete(format!(
                    "line {line}: unknown driver '{raw_driver}' skipped"
                )));
                continue;
            },
        };
        if !seen.insert(driver) {
            warnings.push(GameError::data_incomplete(format!(
                "line {line}: {driver} listed twice; later row ignored"
            )));
            continue;
        }

        let status = cell(&row, columns.status).unwrap_or("").to_ascii_lowercase();
        let finish_cell = cell(&row, columns.finish);
        let retired = status.contains("dnf")
            || status.contains("retired")
            || finish_cell.is_some_and(|f| UNCLASSIFIED.contains(&f.to_ascii_uppercase().as_str()));

        if let Some(start) = cell(&row, columns.start).and_then(|s| s.parse::<u32>().ok())
            && start > 0
        {
            grid.insert(driver, start);
        }

        let position = if retired {
            dnf.insert(driver);
            None
        } else {
            match finish_cell.map(|f| f.parse::<u32>()) {
                Some(Ok(p)) if p > 0 => {
                    finish.insert(driver, p);
                    Some(p)
                },
                Some(_) => {
                    warnings.push(GameError::data_incomplete(format!(
                        "line {line}: {driver} has unreadable finish position"
                    )));
                    None
                },
                None => None,
            }
        };

        let team = match cell(&row, columns.team).filter(|t| !t.is_empty()) {
            Some(name) => match name.parse::<Team>() {
                Ok(t) => t,
                Err(_) => {
                    warnings.push(GameError::data_incomplete(format!(
                        "line {line}: unknown team '{name}', using {driver}'s entry team"
                    )));
                    driver.team()
                },
            },
            None => driver.team(),
        };
        let points = match cell(&row, columns.points) {
            Some(raw) if !raw.is_empty() => raw.parse::<f64>().map_err(|_| {
                GameError::validation(format!("line {line}: invalid points '{raw}'"))
            })?,
            Some(_) => 0.0,
            None => position.map(points_for_position).unwrap_or(0.0),
        };
        *team_points.entry(team).or_insert(0.0) += points;
    }

    if seen.is_empty() {
        return Err(GameError::validation("results file lists no known drivers"));
    }

    let final_snapshot = RaceSnapshot::new(finish, dnf, team_points)?;
    let starting_grid = if grid.is_empty() {
        None
    } else {
        Some(RaceSnapshot::new(grid, BTreeSet::new(), BTreeMap::new())?)
    };
    Ok(ResultsUpload {
        starting_grid,
        final_snapshot,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Driver,Team,StartPosition,FinishPosition,Points,Status
VER,Red Bull Racing,1,3,15,Finished
Lewis Hamilton,Ferrari,2,1,25,Finished
LEC,Ferrari,3,DNF,0,Retired
NOR,McLaren,4,2,18,
";

    #[test]
    fn parses_grid_finish_and_dnf() {
        let upload = parse_results(SAMPLE).unwrap();
        let fin = &upload.final_snapshot;
        assert_eq!(fin.position(DriverCode::Ham), Some(1));
        assert_eq!(fin.position(DriverCode::Ver), Some(3));
        assert!(fin.is_dnf(DriverCode::Lec));
        assert_eq!(fin.points_for(Team::Ferrari), 25.0);
        assert_eq!(fin.points_for(Team::McLaren), 18.0);
        let grid = upload.starting_grid.unwrap();
        assert_eq!(grid.position(DriverCode::Lec), Some(3));
        assert!(upload.warnings.is_empty());
    }

    #[test]
    fn header_aliases_and_status_text() {
        let text = "name,constructor,Grid,Position,status\n\
                    PIA,McLaren,5,1,\n\
                    GAS,Alpine,6,,\n\
                    OCO,Alpine,7,4,dnf (engine)\n";
        let upload = parse_results(text).unwrap();
        let fin = &upload.final_snapshot;
        assert_eq!(fin.position(DriverCode::Pia), Some(1));
        assert!(fin.is_dnf(DriverCode::Gas));
        assert!(fin.is_dnf(DriverCode::Oco));
        // No points column: the table applies to finish positions.
        assert_eq!(fin.points_for(Team::McLaren), 25.0);
        assert_eq!(fin.points_for(Team::Alpine), 0.0);
    }

    #[test]
    fn missing_finish_column_does_not_retire() {
        let text = "Driver,Grid\nVER,1\nHAM,2\n";
        let upload = parse_results(text).unwrap();
        assert_eq!(upload.final_snapshot.dnf_count(), 0);
        assert!(upload.final_snapshot.positions().is_empty());
        assert!(upload.starting_grid.is_some());
    }

    #[test]
    fn unknown_rows_become_warnings() {
        let text = "Driver,Team,Position\nXXX,Ferrari,1\nVER,Brabham,2\nVER,Red Bull,3\n";
        let upload = parse_results(text).unwrap();
        assert_eq!(upload.warnings.len(), 3);
        assert!(
            upload
                .warnings
                .iter()
                .all(|w| matches!(w, GameError::DataIncomplete(_)))
        );
        assert_eq!(upload.final_snapshot.points_for(Team::RedBullRacing), 18.0);
    }

    #[test]
    fn rejects_files_without_driver_column_or_rows() {
        assert!(parse_results("").is_err());
        assert!(parse_results("Team,Points\nFerrari,10\n").is_err());
        assert!(parse_results("Driver\n").is_err());
    }

    #[test]
    fn duplicate_finish_positions_rejected() {
        let text = "Driver,Position\nVER,1\nHAM,1\n";
        assert!(matches!(
            parse_results(text),
            Err(GameError::Validation(_))
        ));
    }
}
