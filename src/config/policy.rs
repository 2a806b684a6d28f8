// src/config/policy.rs
//! Suitability policy: the denylist and quality floor applied to every
//! catalog result. Built once at startup and shared read-only.

use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

// --- env defaults & names ---
pub const DEFAULT_POLICY_CONFIG_PATH: &str = "config/policy.toml";
pub const DEFAULT_MIN_VOTE_AVERAGE: f64 = 6.0;

pub const ENV_POLICY_CONFIG_PATH: &str = "POLICY_CONFIG_PATH";
pub const ENV_POLICY_MIN_VOTE: &str = "POLICY_MIN_VOTE";

/// Terms the web client has always screened out of TV results.
const SEED_DENYLIST: &[&str] = &[
    "sex",
    "porn",
    "nude",
    "sadomasochistic",
    "pussy",
    "vagina",
    "erotic",
    "lust",
    "softcore",
    "hardcore",
];

#[derive(Debug, Clone, PartialEq)]
pub struct SuitabilityPolicy {
    /// Lower-cased, trimmed, non-empty.
    denylist: BTreeSet<String>,
    /// Ratings at or below this are rejected.
    min_vote_average: f64,
}

impl Default for SuitabilityPolicy {
    fn default() -> Self {
        Self::new(SEED_DENYLIST.iter().copied(), DEFAULT_MIN_VOTE_AVERAGE)
    }
}

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Deserialize)]
struct PolicyRoot {
    #[serde(default)]
    quality: QualitySection,
    #[serde(default)]
    denylist: DenylistSection,
}

#[derive(Debug, Deserialize)]
struct QualitySection {
    #[serde(default = "default_min_vote")]
    min_vote_average: f64,
}

impl Default for QualitySection {
    fn default() -> Self {
        Self {
            min_vote_average: DEFAULT_MIN_VOTE_AVERAGE,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DenylistSection {
    #[serde(default = "default_terms")]
    terms: Vec<String>,
}

impl Default for DenylistSection {
    fn default() -> Self {
        Self {
            terms: default_terms(),
        }
    }
}

fn default_min_vote() -> f64 {
    DEFAULT_MIN_VOTE_AVERAGE
}

fn default_terms() -> Vec<String> {
    SEED_DENYLIST.iter().map(|s| s.to_string()).collect()
}

// parse optional float env and clamp to <0.0..=10.0>
fn parse_min_vote_env(raw: Option<String>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 10.0))
}

impl SuitabilityPolicy {
    pub fn new<I, S>(terms: I, min_vote_average: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let denylist = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        let min_vote_average = if min_vote_average.is_finite() {
            min_vote_average.clamp(0.0, 10.0)
        } else {
            DEFAULT_MIN_VOTE_AVERAGE
        };
        Self {
            denylist,
            min_vote_average,
        }
    }

    pub fn denylist(&self) -> &BTreeSet<String> {
        &self.denylist
    }

    pub fn min_vote_average(&self) -> f64 {
        self.min_vote_average
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let root: PolicyRoot = toml::from_str(s).context("parsing policy toml")?;
        Ok(Self::new(root.denylist.terms, root.quality.min_vote_average))
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading policy from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Resolve the process policy:
    /// 1) $POLICY_CONFIG_PATH (must exist)
    /// 2) config/policy.toml
    /// 3) built-in seed
    ///
    /// then apply $POLICY_MIN_VOTE if set.
    pub fn load_default() -> anyhow::Result<Self> {
        let mut policy = if let Ok(p) = std::env::var(ENV_POLICY_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                anyhow::bail!("{ENV_POLICY_CONFIG_PATH} points to non-existent path");
            }
            Self::from_path(&pb)?
        } else {
            let default_path = PathBuf::from(DEFAULT_POLICY_CONFIG_PATH);
            if default_path.exists() {
                Self::from_path(&default_path)?
            } else {
                Self::default()
            }
        };

        if let Some(v) = parse_min_vote_env(std::env::var(ENV_POLICY_MIN_VOTE).ok()) {
            policy.min_vote_average = v;
        }

        tracing::info!(
            terms = policy.denylist.len(),
            min_vote_average = policy.min_vote_average,
            "suitability policy loaded"
        );
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn seed_matches_web_client_list() {
        let p = SuitabilityPolicy::default();
        assert_eq!(p.denylist().len(), 10);
        assert!(p.denylist().contains("erotic"));
        assert_eq!(p.min_vote_average(), 6.0);
    }

    #[test]
    fn toml_terms_are_cleaned() {
        let p = SuitabilityPolicy::from_toml_str(
            r#"
[quality]
min_vote_average = 7.5

[denylist]
terms = [" Gore ", "", "GORE", "slasher"]
"#,
        )
        .unwrap();
        let terms: Vec<&str> = p.denylist().iter().map(|s| s.as_str()).collect();
        assert_eq!(terms, vec!["gore", "slasher"]);
        assert_eq!(p.min_vote_average(), 7.5);
    }

    #[test]
    fn missing_sections_fall_back_to_seed() {
        let p = SuitabilityPolicy::from_toml_str("").unwrap();
        assert_eq!(p, SuitabilityPolicy::default());
    }

    #[test]
    fn threshold_env_parsing_clamps() {
        assert_eq!(parse_min_vote_env(Some("7".into())), Some(7.0));
        assert_eq!(parse_min_vote_env(Some("42".into())), Some(10.0));
        assert_eq!(parse_min_vote_env(Some("-1".into())), Some(0.0));
        assert_eq!(parse_min_vote_env(Some("NaN".into())), None);
        assert_eq!(parse_min_vote_env(Some("x".into())), None);
        assert_eq!(parse_min_vote_env(None), None);
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        // Isolate CWD so the repo's own config/ is not picked up.
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_POLICY_CONFIG_PATH);
        env::remove_var(ENV_POLICY_MIN_VOTE);

        // Nothing on disk -> seed
        let p = SuitabilityPolicy::load_default().unwrap();
        assert_eq!(p, SuitabilityPolicy::default());

        // Env path wins, threshold env applies on top
        let p_env = tmp.path().join("policy.toml");
        fs::write(&p_env, "[denylist]\nterms = [\"x\"]\n").unwrap();
        env::set_var(ENV_POLICY_CONFIG_PATH, p_env.display().to_string());
        env::set_var(ENV_POLICY_MIN_VOTE, "5");
        let p2 = SuitabilityPolicy::load_default().unwrap();
        assert_eq!(p2.denylist().len(), 1);
        assert_eq!(p2.min_vote_average(), 5.0);

        // Dangling env path is an error
        env::set_var(ENV_POLICY_CONFIG_PATH, tmp.path().join("nope.toml"));
        assert!(SuitabilityPolicy::load_default().is_err());

        env::remove_var(ENV_POLICY_CONFIG_PATH);
        env::remove_var(ENV_POLICY_MIN_VOTE);
        env::set_current_dir(&old).unwrap();
    }
}
