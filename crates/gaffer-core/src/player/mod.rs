// Player model: the scored, normalized record both subsystems consume.

pub mod pool;
pub mod position;

use serde::{Deserialize, Serialize};

pub use position::Position;

/// Fallback cost when the upstream value is missing or non-numeric.
pub const DEFAULT_COST: f64 = 5.0;

/// Fallback predicted score when the upstream value is missing or non-numeric.
pub const DEFAULT_PREDICTED_SCORE: f64 = 0.0;

/// A player with a point prediction attached, ready for selection or
/// simulation.
///
/// Values are already coerced: `cost >= 0`, `predicted_score >= 0` and
/// `attacking_involvement >= 0`, all finite. Build these through
/// [`pool::normalize`] when the source data is untrusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub team: String,
    pub position: Position,
    pub cost: f64,
    pub predicted_score: f64,
    /// Expected goal involvement proxy; drives captaincy volatility.
    pub attacking_involvement: f64,
}

impl Player {
    /// Construct a player from already-clean values. The display name
    /// defaults to `player-{id}`.
    pub fn new(
        id: impl Into<String>,
        team: impl Into<String>,
        position: Position,
        cost: f64,
        predicted_score: f64,
    ) -> Self {
        let id = id.into();
        Player {
            name: format!("player-{id}"),
            id,
            team: team.into(),
            position,
            cost,
            predicted_score,
            attacking_involvement: 0.0,
        }
    }

    /// Builder-style setter for the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder-style setter for attacking involvement.
    pub fn with_attacking_involvement(mut self, xgi: f64) -> Self {
        self.attacking_involvement = xgi;
        self
    }
}

// ---------------------------------------------------------------------------
// Raw boundary record
// ---------------------------------------------------------------------------

/// A loosely-typed cell: upstream feeds mix numbers and numeric strings
/// (and occasionally junk like "n/a", booleans or nested values).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Loose {
    Number(f64),
    Text(String),
    /// Anything else; treated as neither numeric nor text.
    Other(serde::de::IgnoredAny),
}

impl Loose {
    /// Numeric value, if the cell holds one (or a string that parses as one).
    /// Non-finite values count as non-numeric.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            Loose::Number(n) => *n,
            Loose::Text(s) => s.trim().parse::<f64>().ok()?,
            Loose::Other(_) => return None,
        };
        v.is_finite().then_some(v)
    }

    /// Text form of the cell. Integral numbers render without a fraction so
    /// numeric ids and team codes stay stable (`7.0` -> `"7"`).
    pub fn as_text(&self) -> Option<String> {
        match self {
            // f64's Display drops a zero fraction and never saturates.
            Loose::Number(n) if n.is_finite() => Some(n.to_string()),
            Loose::Number(_) | Loose::Other(_) => None,
            Loose::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        }
    }
}

/// One player row as delivered by the data/prediction collaborators, before
/// coercion.
///
/// Upstream column names (`web_name`, `element_type`, `now_cost`, `xGI`) are
/// separate fields, so a file may carry both spellings of a column. The
/// plain name wins when it holds a usable value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerRecord {
    #[serde(default)]
    pub id: Option<Loose>,
    #[serde(default)]
    pub name: Option<Loose>,
    #[serde(default)]
    pub web_name: Option<Loose>,
    #[serde(default)]
    pub team: Option<Loose>,
    #[serde(default)]
    pub position: Option<Loose>,
    #[serde(default)]
    pub element_type: Option<Loose>,
    #[serde(default)]
    pub cost: Option<Loose>,
    #[serde(default)]
    pub now_cost: Option<Loose>,
    #[serde(default)]
    pub predicted_score: Option<Loose>,
    #[serde(default)]
    pub attacking_involvement: Option<Loose>,
    #[serde(default, rename = "xGI", alias = "xgi")]
    pub xgi: Option<Loose>,
}

/// First usable value among a column and its upstream spelling.
fn either<T>(
    primary: &Option<Loose>,
    upstream: &Option<Loose>,
    read: impl Fn(&Loose) -> Option<T>,
) -> Option<T> {
    primary
        .as_ref()
        .and_then(&read)
        .or_else(|| upstream.as_ref().and_then(&read))
}

/// Why a single record was rejected. Rejection never aborts the batch.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidRecord {
    #[error("record has no id")]
    MissingId,

    #[error("player {id}: missing team")]
    MissingTeam { id: String },

    #[error("player {id}: unknown position {value:?}")]
    UnknownPosition { id: String, value: String },

    #[error("player {id}: negative cost {cost}")]
    NegativeCost { id: String, cost: f64 },

    #[error("record {row}: malformed ({message})")]
    Malformed { row: usize, message: String },
}

impl InvalidRecord {
    /// The offending record's id, when it had one.
    pub fn player_id(&self) -> Option<&str> {
        match self {
            InvalidRecord::MissingId | InvalidRecord::Malformed { .. } => None,
            InvalidRecord::MissingTeam { id }
            | InvalidRecord::UnknownPosition { id, .. }
            | InvalidRecord::NegativeCost { id, .. } => Some(id),
        }
    }
}

impl TryFrom<PlayerRecord> for Player {
    type Error = InvalidRecord;

    /// Coerce a raw record:
    /// - cost: missing/non-numeric -> 5.0; negative -> rejected
    /// - predicted score: missing/non-numeric -> 0.0; negative -> 0.0
    /// - attacking involvement: missing/non-numeric/negative -> 0.0
    fn try_from(raw: PlayerRecord) -> Result<Self, Self::Error> {
        let id = raw
            .id
            .as_ref()
            .and_then(Loose::as_text)
            .ok_or(InvalidRecord::MissingId)?;

        let team = raw
            .team
            .as_ref()
            .and_then(Loose::as_text)
            .ok_or_else(|| InvalidRecord::MissingTeam { id: id.clone() })?;

        let position_text =
            either(&raw.position, &raw.element_type, Loose::as_text).unwrap_or_default();
        let position =
            Position::from_str_pos(&position_text).ok_or_else(|| InvalidRecord::UnknownPosition {
                id: id.clone(),
                value: position_text.clone(),
            })?;

        let cost = either(&raw.cost, &raw.now_cost, Loose::as_f64).unwrap_or(DEFAULT_COST);
        if cost < 0.0 {
            return Err(InvalidRecord::NegativeCost { id, cost });
        }

        let predicted_score = raw
            .predicted_score
            .as_ref()
            .and_then(Loose::as_f64)
            .unwrap_or(DEFAULT_PREDICTED_SCORE)
            .max(0.0);

        let attacking_involvement = either(&raw.attacking_involvement, &raw.xgi, Loose::as_f64)
            .unwrap_or(0.0)
            .max(0.0);

        let name = either(&raw.name, &raw.web_name, Loose::as_text)
            .unwrap_or_else(|| format!("player-{id}"));

        Ok(Player {
            id,
            name,
            team,
            position,
            cost,
            predicted_score,
            attacking_involvement,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Option<Loose> {
        Some(Loose::Text(s.to_string()))
    }

    fn num(n: f64) -> Option<Loose> {
        Some(Loose::Number(n))
    }

    fn full_record() -> PlayerRecord {
        PlayerRecord {
            id: num(302.0),
            name: text("Saka"),
            team: num(1.0),
            position: text("MID"),
            cost: text("10.1"),
            predicted_score: num(6.4),
            attacking_involvement: text("0.71"),
            ..PlayerRecord::default()
        }
    }

    #[test]
    fn clean_record_converts() {
        let p = Player::try_from(full_record()).unwrap();
        assert_eq!(p.id, "302");
        assert_eq!(p.name, "Saka");
        assert_eq!(p.team, "1");
        assert_eq!(p.position, Position::MID);
        assert!((p.cost - 10.1).abs() < f64::EPSILON);
        assert!((p.predicted_score - 6.4).abs() < f64::EPSILON);
        assert!((p.attacking_involvement - 0.71).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_cost_defaults_to_five() {
        let mut raw = full_record();
        raw.cost = None;
        let p = Player::try_from(raw).unwrap();
        assert!((p.cost - DEFAULT_COST).abs() < f64::EPSILON);
    }

    #[test]
    fn non_numeric_cost_defaults_to_five() {
        let mut raw = full_record();
        raw.cost = text("n/a");
        let p = Player::try_from(raw).unwrap();
        assert!((p.cost - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_prediction_defaults_to_zero() {
        let mut raw = full_record();
        raw.predicted_score = text("");
        let p = Player::try_from(raw).unwrap();
        assert_eq!(p.predicted_score, 0.0);
    }

    #[test]
    fn negative_prediction_is_floored() {
        let mut raw = full_record();
        raw.predicted_score = num(-0.6);
        let p = Player::try_from(raw).unwrap();
        assert_eq!(p.predicted_score, 0.0);
    }

    #[test]
    fn negative_cost_rejects_record() {
        let mut raw = full_record();
        raw.cost = num(-1.5);
        let err = Player::try_from(raw).unwrap_err();
        assert_eq!(
            err,
            InvalidRecord::NegativeCost {
                id: "302".into(),
                cost: -1.5
            }
        );
        assert_eq!(err.player_id(), Some("302"));
    }

    #[test]
    fn unknown_position_rejects_record() {
        let mut raw = full_record();
        raw.position = text("SP");
        match Player::try_from(raw).unwrap_err() {
            InvalidRecord::UnknownPosition { value, .. } => assert_eq!(value, "SP"),
            other => panic!("expected UnknownPosition, got: {other}"),
        }
    }

    #[test]
    fn element_type_code_is_accepted() {
        let mut raw = full_record();
        raw.position = num(4.0);
        assert_eq!(Player::try_from(raw).unwrap().position, Position::FWD);
    }

    #[test]
    fn missing_id_and_team_reject() {
        let mut raw = full_record();
        raw.id = None;
        assert_eq!(Player::try_from(raw).unwrap_err(), InvalidRecord::MissingId);

        let mut raw = full_record();
        raw.team = text("  ");
        assert!(matches!(
            Player::try_from(raw).unwrap_err(),
            InvalidRecord::MissingTeam { .. }
        ));
    }

    #[test]
    fn missing_name_falls_back_to_id() {
        let mut raw = full_record();
        raw.name = None;
        assert_eq!(Player::try_from(raw).unwrap().name, "player-302");
    }

    #[test]
    fn loose_text_of_fractional_number_is_preserved() {
        assert_eq!(Loose::Number(2.5).as_text().as_deref(), Some("2.5"));
        assert_eq!(Loose::Number(f64::NAN).as_f64(), None);
        assert_eq!(Loose::Text("inf".into()).as_f64(), None);
    }

    #[test]
    fn plain_column_wins_over_upstream_spelling() {
        let raw = PlayerRecord {
            name: text("Bukayo Saka"),
            web_name: text("Saka"),
            position: text(""),
            element_type: num(3.0),
            cost: text("n/a"),
            now_cost: num(10.1),
            xgi: num(0.5),
            ..full_record()
        };
        let p = Player::try_from(raw).unwrap();
        assert_eq!(p.name, "Bukayo Saka");
        assert_eq!(p.position, Position::MID);
        assert!((p.cost - 10.1).abs() < f64::EPSILON);
        assert!((p.attacking_involvement - 0.71).abs() < f64::EPSILON);
    }

    #[test]
    fn other_cells_are_non_numeric() {
        let mut raw = full_record();
        raw.cost = Some(Loose::Other(serde::de::IgnoredAny));
        raw.name = Some(Loose::Other(serde::de::IgnoredAny));
        let p = Player::try_from(raw).unwrap();
        assert!((p.cost - DEFAULT_COST).abs() < f64::EPSILON);
        assert_eq!(p.name, "player-302");
    }

    #[test]
    fn huge_integral_ids_do_not_saturate() {
        let text = Loose::Number(1e19).as_text().unwrap();
        assert_eq!(text, "10000000000000000000");
        assert_ne!(text, i64::MAX.to_string());
        assert_eq!(Loose::Number(-7.0).as_text().as_deref(), Some("-7"));
    }

    #[test]
    fn malformed_record_has_no_id() {
        let err = InvalidRecord::Malformed {
            row: 3,
            message: "bad".into(),
        };
        assert_eq!(err.player_id(), None);
        assert!(err.to_string().contains("record 3"));
    }
}
