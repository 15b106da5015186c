//! Rubric loading for Podium

mod schema;

pub use schema::{
    ClarityRules, ContentRules, Criteria, CurveBand, EngagementRules, FlowRules, GrammarRules,
    KeywordRules, RateBand, RubricConfig, SalutationRules, SalutationTier, ScoreCurve,
    SentimentAggregate, SkipPolicy, SpeechRateRules, VocabularyRules, DEFAULT_TOTAL_WEIGHT,
};

use crate::ConfigError;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const RUBRIC_FILENAME: &str = ".podiumrc.json";

/// Find and load a rubric with extends resolution.
///
/// An explicit path wins; otherwise `.podiumrc.json` is searched for in `work_dir` and its
/// parents; otherwise the built-in rubric is used. The result is always validated.
pub fn load_rubric(work_dir: &Path, custom_path: Option<&Path>) -> Result<RubricConfig, ConfigError> {
    let path = match custom_path {
        Some(p) => {
            let path = if p.is_absolute() {
                p.to_path_buf()
            } else {
                work_dir.join(p)
            };
            if !path.exists() {
                return Err(ConfigError::NotFound(path));
            }
            Some(path)
        }
        None => find_rubric_in_parents(work_dir),
    };

    match path {
        Some(path) => load_rubric_file(&path),
        None => {
            tracing::debug!("no rubric file found, using built-in rubric");
            Ok(RubricConfig::default())
        }
    }
}

/// Load and validate one rubric file, resolving its extends chain
pub fn load_rubric_file(path: &Path) -> Result<RubricConfig, ConfigError> {
    let value = load_value_with_extends(path, &mut HashSet::new())?;
    let rubric = from_value(value, &path.display().to_string())?;
    tracing::debug!(path = %path.display(), "loaded rubric");
    Ok(rubric)
}

/// Parse and validate a rubric from JSON text. `extends` is not resolved here.
pub fn parse_rubric(json: &str) -> Result<RubricConfig, ConfigError> {
    let value: Value = serde_json::from_str(json).map_err(|source| ConfigError::Parse {
        origin: "<inline>".to_string(),
        source,
    })?;
    if value.get("extends").is_some() {
        return Err(ConfigError::invalid(
            "extends",
            "only supported for rubrics loaded from a file",
        ));
    }
    from_value(value, "<inline>")
}

/// The built-in rubric as pretty-printed JSON, as written by `podium init`
pub fn default_rubric_json(threshold: Option<u8>) -> Result<String, ConfigError> {
    let rubric = RubricConfig {
        threshold,
        ..RubricConfig::default()
    };
    serde_json::to_string_pretty(&rubric).map_err(|source| ConfigError::Parse {
        origin: "<built-in>".to_string(),
        source,
    })
}

fn from_value(mut value: Value, origin: &str) -> Result<RubricConfig, ConfigError> {
    if let Some(obj) = value.as_object_mut() {
        obj.remove("extends");
    }
    let rubric: RubricConfig = serde_json::from_value(value).map_err(|source| ConfigError::Parse {
        origin: origin.to_string(),
        source,
    })?;
    rubric.validate()?;
    Ok(rubric)
}

fn load_value_with_extends(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<Value, ConfigError> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical) {
        return Err(ConfigError::CircularExtends(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut value: Value = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        origin: path.display().to_string(),
        source,
    })?;

    let extends = match value.get("extends") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => return Err(ConfigError::invalid("extends", "must be a path string")),
    };

    if let Some(extends) = extends {
        let base_path = resolve_extends(path, &extends)?;
        tracing::debug!(rubric = %path.display(), base = %base_path.display(), "resolving extends");
        let mut base = load_value_with_extends(&base_path, visited)?;
        if let Some(obj) = value.as_object_mut() {
            obj.remove("extends");
        }
        merge_json(&mut base, value);
        value = base;
    }

    Ok(value)
}

fn resolve_extends(rubric_path: &Path, extends: &str) -> Result<PathBuf, ConfigError> {
    let rubric_dir = rubric_path.parent().unwrap_or(Path::new("."));
    let base = Path::new(extends);
    let base = if base.is_absolute() {
        base.to_path_buf()
    } else {
        rubric_dir.join(base)
    };
    let base = if base.extension().is_none() {
        base.with_extension("json")
    } else {
        base
    };

    if !base.exists() {
        return Err(ConfigError::NotFound(base));
    }
    Ok(base)
}

/// Overlay `child` onto `base`. Objects merge recursively with the child winning; arrays are
/// replaced, except `fillers`, which are unioned.
fn merge_json(base: &mut Value, child: Value) {
    match (base, child) {
        (Value::Object(base_map), Value::Object(child_map)) => {
            for (key, child_value) in child_map {
                match base_map.get_mut(&key) {
                    Some(base_value) if key == "fillers" => union_arrays(base_value, child_value),
                    Some(base_value) => merge_json(base_value, child_value),
                    None => {
                        base_map.insert(key, child_value);
                    }
                }
            }
        }
        (base, child) => *base = child,
    }
}

fn union_arrays(base: &mut Value, child: Value) {
    match (base, child) {
        (Value::Array(base_items), Value::Array(child_items)) => {
            for item in child_items {
                if !base_items.contains(&item) {
                    base_items.push(item);
                }
            }
        }
        (base, child) => *base = child,
    }
}

/// Search for .podiumrc.json in directory and its parents
fn find_rubric_in_parents(mut dir: &Path) -> Option<PathBuf> {
    loop {
        let candidate = dir.join(RUBRIC_FILENAME);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
}
