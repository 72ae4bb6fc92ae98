use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::round::Round;

const CREATED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

#[derive(Debug, Serialize)]
pub struct SpecialRule {
    pub name: String,
    pub value: Option<serde_json::Value>,
}

/// What the QR code on each card carries. Key names are read by the companion app.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPayload<'a> {
    pub special_rules: BTreeMap<String, SpecialRule>,
    pub name: &'a str,
    pub ruleset: &'a str,
    pub strat: &'a str,
    pub deployment: &'a str,
    pub max_crew_size: u32,
    pub created_in: &'a str,
    pub created: String,
    pub scheme_pool: &'a [String],
}

pub fn singles_rule() -> BTreeMap<String, SpecialRule> {
    let mut rules = BTreeMap::new();
    rules.insert("Singles".to_string(), SpecialRule { name: "Singles".to_string(), value: None });
    rules
}

pub fn format_created(at: &DateTime<Local>) -> String {
    at.format(CREATED_FORMAT).to_string()
}

impl<'a> CardPayload<'a> {
    pub fn new(round: &'a Round, ruleset: &'a str, max_crew_size: u32, app_ver: &'a str, created: String) -> Self {
        CardPayload {
            special_rules: singles_rule(),
            name: &round.name,
            ruleset,
            strat: &round.strategy,
            deployment: &round.deployment,
            max_crew_size,
            created_in: app_ver,
            created,
            scheme_pool: &round.schemes,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
