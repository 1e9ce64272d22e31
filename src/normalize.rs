//! Entity normalizer: loosely-typed JSON racer objects into `RacerRecord`s.

use serde_json::{Map, Value};

use crate::constants::fields;
use crate::constants::normalize::DEFAULT_MEMBERSHIP;
use crate::data::RacerRecord;
use crate::utils::{coerce_string, safe_number};

/// Normalize one raw record. Never fails: absent or malformed fields default.
///
/// Non-object values normalize to an all-default record with an empty
/// username, which the indexer then skips.
pub fn normalize_record(raw: &Value) -> RacerRecord {
    let Some(object) = raw.as_object() else {
        return RacerRecord {
            membership: DEFAULT_MEMBERSHIP.to_string(),
            ..RacerRecord::default()
        };
    };
    let number = |aliases: &[&str]| safe_number(lookup(object, aliases), 0.0);
    let text = |aliases: &[&str]| coerce_string(lookup(object, aliases));

    let membership = text(fields::MEMBERSHIP);
    RacerRecord {
        username: text(fields::USERNAME).trim().to_string(),
        display_name: text(fields::DISPLAY_NAME),
        tag: text(fields::TAG),
        title: text(fields::TITLE),
        membership: if membership.trim().is_empty() {
            DEFAULT_MEMBERSHIP.to_string()
        } else {
            membership
        },
        join_date: text(fields::JOIN_DATE),
        profile_url: text(fields::PROFILE_URL),
        lifetime_races: number(fields::RACES),
        avg_speed: number(fields::AVG_SPEED),
        high_speed: number(fields::HIGH_SPEED),
        profile_views: number(fields::PROFILE_VIEWS),
        garage_cars: number(fields::GARAGE_CARS),
        nitros_used: lookup(object, fields::NITROS_USED).map(|value| safe_number(Some(value), 0.0)),
        longest_session: number(fields::LONGEST_SESSION),
        league_tier: number(fields::LEAGUE_TIER),
        typed: number(fields::TYPED),
        errs: number(fields::ERRS),
        played: number(fields::PLAYED),
    }
}

/// First alias whose value is present and not null.
fn lookup<'a>(object: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|alias| object.get(*alias))
        .find(|value| !value.is_null())
}
