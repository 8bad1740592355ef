//! Candidate filtering and ranking.
//!
//! Candidates are first filtered by quality predicates (catalog order is
//! kept), then ranked by a [`RankingPolicy`]. Coverage of the AOI by each
//! candidate's footprint is always computed so every policy can report it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use stacchip_cloud::StacItem;
use stacchip_core::{coverage_ratio, AreaOfInterest};

/// Property flag that marks Landsat 7 scenes with scan-line artifacts.
pub const BANDING_FLAG: &str = "banding_issues";

// ---------------------------------------------------------------------------
// Quality predicates
// ---------------------------------------------------------------------------

/// Decides whether a candidate scene may be selected at all.
pub trait QualityPredicate: Send + Sync {
    fn is_eligible(&self, item: &StacItem) -> bool;
}

impl<F> QualityPredicate for F
where
    F: Fn(&StacItem) -> bool + Send + Sync,
{
    fn is_eligible(&self, item: &StacItem) -> bool {
        self(item)
    }
}

/// Rejects candidates whose property `flag` is explicitly `true`.
///
/// A missing flag, `false`, or a non-boolean value leaves the candidate
/// eligible.
#[derive(Debug, Clone)]
pub struct FlagPredicate {
    flag: String,
}

impl FlagPredicate {
    pub fn new(flag: impl Into<String>) -> Self {
        Self { flag: flag.into() }
    }
}

impl Default for FlagPredicate {
    fn default() -> Self {
        Self::new(BANDING_FLAG)
    }
}

impl QualityPredicate for FlagPredicate {
    fn is_eligible(&self, item: &StacItem) -> bool {
        !item.flag(&self.flag)
    }
}

/// Rejects candidates whose `eo:cloud_cover` exceeds a percentage.
///
/// Candidates that do not report cloud cover stay eligible.
#[derive(Debug, Clone, Copy)]
pub struct CloudCoverPredicate {
    pub max_cloud_cover: f64,
}

impl QualityPredicate for CloudCoverPredicate {
    fn is_eligible(&self, item: &StacItem) -> bool {
        item.cloud_cover()
            .map_or(true, |cc| cc <= self.max_cloud_cover)
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// How eligible candidates are ordered. Ties always keep catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RankingPolicy {
    /// First eligible candidate in catalog order.
    #[default]
    FirstEligible,
    /// Largest fraction of the AOI covered by the footprint.
    MaxCoverage,
    /// `coverage - cloud_weight * cloud_cover / 100`.
    Combined { cloud_weight: f64 },
}

impl RankingPolicy {
    fn score(&self, coverage: f64, item: &StacItem) -> f64 {
        match self {
            RankingPolicy::FirstEligible => 0.0,
            RankingPolicy::MaxCoverage => coverage,
            RankingPolicy::Combined { cloud_weight } => {
                let cloud = item.cloud_cover().unwrap_or(0.0) / 100.0;
                coverage - cloud_weight * cloud
            }
        }
    }
}

impl fmt::Display for RankingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankingPolicy::FirstEligible => write!(f, "first-eligible"),
            RankingPolicy::MaxCoverage => write!(f, "max-coverage"),
            RankingPolicy::Combined { cloud_weight } => write!(f, "combined:{cloud_weight}"),
        }
    }
}

impl FromStr for RankingPolicy {
    type Err = String;

    /// Parses `first-eligible`, `max-coverage`, `combined` or
    /// `combined:<cloud_weight>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let (name, arg) = match lower.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (lower.as_str(), None),
        };
        match (name, arg) {
            ("first-eligible" | "first", None) => Ok(RankingPolicy::FirstEligible),
            ("max-coverage" | "coverage", None) => Ok(RankingPolicy::MaxCoverage),
            ("combined", None) => Ok(RankingPolicy::Combined { cloud_weight: 1.0 }),
            ("combined", Some(w)) => w
                .parse::<f64>()
                .map(|cloud_weight| RankingPolicy::Combined { cloud_weight })
                .map_err(|_| format!("invalid cloud weight '{w}'")),
            _ => Err(format!(
                "unknown ranking policy '{s}'. Use first-eligible, max-coverage or combined[:weight]"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// An eligible candidate with its ranking inputs.
#[derive(Debug, Clone, Copy)]
pub struct ScoredCandidate<'a> {
    pub item: &'a StacItem,
    /// Position in the catalog's result order.
    pub index: usize,
    /// Fraction of the AOI covered by the footprint (0 when unknown).
    pub coverage: f64,
    pub score: f64,
    /// Whether `coverage` reaches the selector's threshold.
    pub meets_threshold: bool,
}

/// Outcome of candidate selection.
#[derive(Debug, Clone, Copy)]
pub enum Selection<'a> {
    Chosen(ScoredCandidate<'a>),
    /// Nothing passed the quality predicates. Not an error: the request ends
    /// here and no asset is retrieved.
    NoEligibleCandidate,
}

impl<'a> Selection<'a> {
    pub fn chosen(&self) -> Option<&ScoredCandidate<'a>> {
        match self {
            Selection::Chosen(c) => Some(c),
            Selection::NoEligibleCandidate => None,
        }
    }
}

/// Filters candidates by quality and picks one by policy.
pub struct Selector {
    predicates: Vec<Box<dyn QualityPredicate>>,
    policy: RankingPolicy,
    min_coverage: f64,
}

impl Default for Selector {
    /// Rejects banding-flagged scenes and picks the first eligible one.
    fn default() -> Self {
        Self::new().with_predicate(FlagPredicate::default())
    }
}

impl Selector {
    /// A selector with no predicates: every candidate is eligible.
    pub fn new() -> Self {
        Self {
            predicates: Vec::new(),
            policy: RankingPolicy::default(),
            min_coverage: 0.0,
        }
    }

    pub fn with_predicate(mut self, predicate: impl QualityPredicate + 'static) -> Self {
        self.predicates.push(Box::new(predicate));
        self
    }

    pub fn with_policy(mut self, policy: RankingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Candidates covering at least this fraction of the AOI rank ahead of
    /// the others. Never makes a candidate ineligible.
    pub fn with_min_coverage(mut self, min_coverage: f64) -> Self {
        self.min_coverage = min_coverage.clamp(0.0, 1.0);
        self
    }

    pub fn policy(&self) -> RankingPolicy {
        self.policy
    }

    pub fn is_eligible(&self, item: &StacItem) -> bool {
        self.predicates.iter().all(|p| p.is_eligible(item))
    }

    /// Eligible candidates, best first.
    pub fn rank<'a>(&self, candidates: &'a [StacItem], aoi: &AreaOfInterest) -> Vec<ScoredCandidate<'a>> {
        let reference = aoi.geometry();

        let mut ranked: Vec<ScoredCandidate<'a>> = candidates
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                let eligible = self.is_eligible(item);
                if !eligible {
                    debug!(id = %item.id, "candidate rejected by quality predicate");
                }
                eligible
            })
            .map(|(index, item)| {
                let coverage = match item.footprint() {
                    Some(Ok(footprint)) => coverage_ratio(&footprint, &reference),
                    Some(Err(e)) => {
                        debug!(id = %item.id, error = %e, "unreadable footprint");
                        0.0
                    }
                    None => 0.0,
                };
                let score = self.policy.score(coverage, item);
                debug!(id = %item.id, index, coverage, score, "scored candidate");
                ScoredCandidate {
                    item,
                    index,
                    coverage,
                    score,
                    meets_threshold: coverage >= self.min_coverage,
                }
            })
            .collect();

        // Stable sort: equal keys keep catalog order.
        ranked.sort_by(|a, b| {
            b.meets_threshold
                .cmp(&a.meets_threshold)
                .then_with(|| b.score.total_cmp(&a.score))
        });
        ranked
    }

    /// Pick one candidate, or report that none is eligible.
    pub fn select<'a>(&self, candidates: &'a [StacItem], aoi: &AreaOfInterest) -> Selection<'a> {
        match self.rank(candidates, aoi).into_iter().next() {
            Some(best) => Selection::Chosen(best),
            None => Selection::NoEligibleCandidate,
        }
    }
}
