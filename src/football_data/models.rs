use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scheduled or played match, reduced to what opponent derivation needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: i64,
    pub home_team: String,
    pub away_team: String,
    pub utc_date: Option<DateTime<Utc>>,
    /// football-data status, e.g. "SCHEDULED", "TIMED", "IN_PLAY", "FINISHED"
    pub status: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMatch {
    id: i64,
    utc_date: Option<DateTime<Utc>>,
    status: Option<String>,
    home_team: RawTeam,
    away_team: RawTeam,
}

#[derive(Deserialize)]
struct RawTeam {
    name: Option<String>,
}

impl Fixture {
    /// Parse one entry of a football-data `matches` array. Entries without
    /// both team names (e.g. undecided knockout slots) yield `None`.
    pub fn from_value(value: &serde_json::Value) -> Option<Fixture> {
        let raw: RawMatch = serde_json::from_value(value.clone()).ok()?;
        Some(Fixture {
            id: raw.id,
            home_team: raw.home_team.name?,
            away_team: raw.away_team.name?,
            utc_date: raw.utc_date,
            status: raw.status.unwrap_or_default(),
        })
    }
}

/// Parse every usable fixture out of a raw match list.
pub fn parse_fixtures(matches: &[serde_json::Value]) -> Vec<Fixture> {
    matches.iter().filter_map(Fixture::from_value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_football_data_match() {
        let v = json!({
            "id": 327117,
            "utcDate": "2025-10-26T15:15:00Z",
            "status": "TIMED",
            "homeTeam": { "id": 86, "name": "Real Madrid CF" },
            "awayTeam": { "id": 81, "name": "FC Barcelona" }
        });
        let f = Fixture::from_value(&v).unwrap();
        assert_eq!(f.id, 327117);
        assert_eq!(f.home_team, "Real Madrid CF");
        assert_eq!(f.away_team, "FC Barcelona");
        assert_eq!(f.status, "TIMED");
        assert!(f.utc_date.is_some());
    }

    #[test]
    fn test_undecided_slot_skipped() {
        let matches = vec![
            json!({ "id": 1, "homeTeam": { "name": null }, "awayTeam": { "name": "Inter" } }),
            json!({ "id": 2, "homeTeam": { "name": "Milan" }, "awayTeam": { "name": "Inter" } }),
            json!({ "unexpected": true }),
        ];
        let fixtures = parse_fixtures(&matches);
        assert_eq!(fixtures.len(), 1);
        assert_eq!(fixtures[0].id, 2);
    }
}
