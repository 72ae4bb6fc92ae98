use serde::Deserialize;
use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

use crate::round::{NO_REPEAT_WINDOW, SCHEMES_PER_ROUND};

/// Everything a round can be drawn from. Loaded once per run and never mutated.
///
/// Each list holds distinct names in file order; repeated entries are dropped on construction.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "PoolFile")]
pub struct GamePool {
    strategies: Vec<String>,
    deployments: Vec<String>,
    schemes: Vec<String>,
}

#[derive(Deserialize)]
struct PoolFile {
    strategies: Vec<String>,
    deployments: Vec<String>,
    schemes: Vec<String>,
}

impl From<PoolFile> for GamePool {
    fn from(file: PoolFile) -> Self {
        GamePool::new(file.strategies, file.deployments, file.schemes)
    }
}

fn distinct(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(names.len());
    names.into_iter().filter(|n| seen.insert(n.clone())).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolKind {
    Strategies,
    Deployments,
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolKind::Strategies => f.write_str("strategies"),
            PoolKind::Deployments => f.write_str("deployments"),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PoolError {
    #[error("{pool} pool exhausted while generating round {round}")]
    Exhausted { pool: PoolKind, round: usize },

    #[error("scheme pool too small: need {needed} schemes, got {available}")]
    InsufficientSchemes { needed: usize, available: usize },

    #[error("deployment pool too small: {rounds} rounds need {needed} unique deployments, got {available}")]
    InsufficientDeployments {
        rounds: usize,
        needed: usize,
        available: usize,
    },
}

impl GamePool {
    pub fn new(strategies: Vec<String>, deployments: Vec<String>, schemes: Vec<String>) -> Self {
        GamePool {
            strategies: distinct(strategies),
            deployments: distinct(deployments),
            schemes: distinct(schemes),
        }
    }

    pub fn strategies(&self) -> &[String] {
        &self.strategies
    }

    pub fn deployments(&self) -> &[String] {
        &self.deployments
    }

    pub fn schemes(&self) -> &[String] {
        &self.schemes
    }

    /// Checks up front that `rounds` rounds can be drawn without running dry.
    pub fn validate(&self, rounds: usize) -> Result<(), PoolError> {
        if self.strategies.is_empty() {
            return Err(PoolError::Exhausted { pool: PoolKind::Strategies, round: 1 });
        }
        if self.schemes.len() < SCHEMES_PER_ROUND {
            return Err(PoolError::InsufficientSchemes {
                needed: SCHEMES_PER_ROUND,
                available: self.schemes.len(),
            });
        }
        let needed = rounds.min(NO_REPEAT_WINDOW);
        let available = self.deployments.len();
        if available < needed.max(1) {
            return Err(PoolError::InsufficientDeployments { rounds, needed: needed.max(1), available });
        }
        Ok(())
    }
}

// The JSON file has the following structure:
// {
//    "strategies": ["..."], "deployments": ["..."], "schemes": ["..."]
// }
pub fn read_game_pool(path: &Path) -> Result<GamePool, Box<dyn Error>> {
    let file = File::open(path).map_err(|e| format!("cannot open {}: {e}", path.display()))?;
    let reader = BufReader::new(file);
    let pool = serde_json::from_reader(reader)
        .map_err(|e| format!("cannot parse {}: {e}", path.display()))?;
    Ok(pool)
}
