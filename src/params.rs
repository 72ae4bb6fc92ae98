use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Identifier of the pool file. Older params files carry it as a number, newer ones as a string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PoolId {
    Number(u64),
    Name(String),
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolId::Number(n) => write!(f, "{n}"),
            PoolId::Name(s) => f.write_str(s),
        }
    }
}

// The JSON file has the following structure:
// {
//    "rounds": 5, "gg": 4, "app_ver": "...", "max_crew_size": 10, "event_name": "...",
//    "font_path": "optional/path.ttf", "output_dir": "optional/dir"
// }
#[derive(Debug, Deserialize)]
pub struct EventParams {
    pub rounds: u32,
    pub gg: PoolId,
    pub app_ver: String,
    pub max_crew_size: u32,
    pub event_name: String,
    #[serde(default)]
    pub font_path: Option<PathBuf>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl EventParams {
    /// Pool files live next to the params file as `gg{id}.json`.
    pub fn pool_path(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(format!("gg{}.json", self.gg))
    }

    pub fn ruleset(&self) -> String {
        format!("GG Season {}", self.gg)
    }

    pub fn output_dir(&self, base_dir: &Path) -> PathBuf {
        match &self.output_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => base_dir.join(dir),
            None => base_dir.to_path_buf(),
        }
    }
}

pub fn read_params(path: &Path) -> Result<EventParams, Box<dyn Error>> {
    let file = File::open(path).map_err(|e| format!("cannot open {}: {e}", path.display()))?;
    let reader = BufReader::new(file);
    let params: EventParams = serde_json::from_reader(reader)
        .map_err(|e| format!("cannot parse {}: {e}", path.display()))?;
    if params.rounds == 0 {
        return Err(format!("{}: rounds must be at least 1", path.display()).into());
    }
    Ok(params)
}
