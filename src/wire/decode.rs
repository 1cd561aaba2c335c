//! Move log normalizer
//!
//! Turns a [`RawFightRecord`] into a typed [`FightRecord`]. Decoding is all or
//! nothing: the first malformed field fails the whole record.

use crate::game::{FightRecord, Move, MoveType, MAX_SHIPS};

use super::protocol::{RawFightRecord, RawMove, WireBytes, WireInt};

/// Characters dropped from numeric strings before parsing
const SEPARATORS: [char; 3] = [',', '.', '_'];

/// Parse a JSON fight record
pub fn decode_fight_record(json: &str) -> Result<FightRecord, DecodeError> {
    let raw: RawFightRecord = serde_json::from_str(json)?;
    normalize(&raw)
}

/// Convert a raw record into typed form
pub fn normalize(raw: &RawFightRecord) -> Result<FightRecord, DecodeError> {
    Ok(FightRecord {
        seed: parse_unsigned("seed", &raw.seed)?,
        selection_lhs: decode_byte_array("selection_lhs", &raw.selection_lhs)?,
        selection_rhs: decode_byte_array("selection_rhs", &raw.selection_rhs)?,
        variants_lhs: decode_byte_array("variants_lhs", &raw.variants_lhs)?,
        variants_rhs: decode_byte_array("variants_rhs", &raw.variants_rhs)?,
        commander_lhs: parse_unsigned("commander_lhs", &raw.commander_lhs)?,
        commander_rhs: parse_unsigned("commander_rhs", &raw.commander_rhs)?,
        rounds: parse_unsigned("rounds", &raw.rounds)?,
        lhs_moves: normalize_moves("lhs_moves", &raw.lhs_moves)?,
        rhs_moves: normalize_moves("rhs_moves", &raw.rhs_moves)?,
        lhs_dead: raw.lhs_dead,
        rhs_dead: raw.rhs_dead,
        ships_lost_lhs: raw
            .ships_lost_lhs
            .as_ref()
            .map(|b| decode_byte_array("ships_lost_lhs", b))
            .transpose()?,
        ships_lost_rhs: raw
            .ships_lost_rhs
            .as_ref()
            .map(|b| decode_byte_array("ships_lost_rhs", b))
            .transpose()?,
    })
}

fn normalize_moves(field: &str, moves: &[RawMove]) -> Result<Vec<Move>, DecodeError> {
    moves
        .iter()
        .enumerate()
        .map(|(i, raw)| normalize_move(&format!("{field}[{i}]"), raw))
        .collect()
}

fn normalize_move(field: &str, raw: &RawMove) -> Result<Move, DecodeError> {
    let code: u8 = parse_unsigned(&format!("{field}.move_type"), &raw.move_type)?;
    let move_type = MoveType::from_code(code).ok_or(DecodeError::UnknownMoveType { value: code })?;

    let position = parse_integer(&format!("{field}.target_position"), &raw.target_position)?;
    let target_position = i32::try_from(position).map_err(|_| DecodeError::OutOfRange {
        field: format!("{field}.target_position"),
        value: position,
    })?;

    Ok(Move {
        round: parse_unsigned(&format!("{field}.round"), &raw.round)?,
        move_type,
        source: parse_unsigned(&format!("{field}.source"), &raw.source)?,
        target: parse_unsigned(&format!("{field}.target"), &raw.target)?,
        target_position,
        damage: parse_unsigned(&format!("{field}.damage"), &raw.damage)?,
    })
}

/// Decode a per-type array of exactly `MAX_SHIPS` non-negative entries
pub fn decode_byte_array(field: &str, bytes: &WireBytes) -> Result<[u32; MAX_SHIPS], DecodeError> {
    let values: Vec<u32> = match bytes {
        WireBytes::Hex(text) => {
            let digits = text
                .strip_prefix("0x")
                .or_else(|| text.strip_prefix("0X"))
                .unwrap_or(text);
            hex::decode(digits)
                .map_err(|source| DecodeError::InvalidHex {
                    field: field.to_string(),
                    source,
                })?
                .into_iter()
                .map(u32::from)
                .collect()
        }
        WireBytes::List(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| parse_unsigned(&format!("{field}[{i}]"), item))
            .collect::<Result<_, _>>()?,
    };

    let found = values.len();
    values.try_into().map_err(|_| DecodeError::LengthMismatch {
        field: field.to_string(),
        expected: MAX_SHIPS,
        found,
    })
}

/// Parse a possibly formatted integer. Separators and whitespace are stripped first.
pub fn parse_integer(field: &str, value: &WireInt) -> Result<i128, DecodeError> {
    match value {
        WireInt::Unsigned(n) => Ok(i128::from(*n)),
        WireInt::Signed(n) => Ok(i128::from(*n)),
        WireInt::Text(text) => {
            let cleaned: String = text
                .chars()
                .filter(|c| !c.is_whitespace() && !SEPARATORS.contains(c))
                .collect();
            cleaned.parse().map_err(|_| DecodeError::InvalidInteger {
                field: field.to_string(),
                text: text.clone(),
            })
        }
    }
}

/// Parse a non-negative integer that fits in `T`
pub fn parse_unsigned<T: TryFrom<i128>>(field: &str, value: &WireInt) -> Result<T, DecodeError> {
    let parsed = parse_integer(field, value)?;
    if parsed < 0 {
        return Err(DecodeError::Negative {
            field: field.to_string(),
            value: parsed,
        });
    }
    T::try_from(parsed).map_err(|_| DecodeError::OutOfRange {
        field: field.to_string(),
        value: parsed,
    })
}

/// Malformed wire data
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Malformed fight record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{field}: expected {expected} entries, found {found}")]
    LengthMismatch {
        field: String,
        expected: usize,
        found: usize,
    },

    #[error("{field}: negative value {value}")]
    Negative { field: String, value: i128 },

    #[error("{field}: {text:?} is not an integer")]
    InvalidInteger { field: String, text: String },

    #[error("{field}: invalid hex: {source}")]
    InvalidHex {
        field: String,
        source: hex::FromHexError,
    },

    #[error("{field}: value {value} out of range")]
    OutOfRange { field: String, value: i128 },

    #[error("Unknown move type {value}")]
    UnknownMoveType { value: u8 },
}
