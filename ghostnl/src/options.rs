use crate::Error;
use crate::bridge::IndexBase;
use crate::systems::GhostPadding;

/// Parameters controlling the construction of neighbor lists for one compute
/// call.
///
/// These are usually created from the requirements of the engine (see
/// [`crate::NeighborRequirements`]), but can also be read from JSON with
/// [`NeighborListOptions::from_json`].
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NeighborListOptions {
    /// Cutoff radius of each neighbor list. The order is significant: the
    /// engine identifies lists by their position in this array.
    pub cutoffs: Vec<f64>,
    /// How far from the real atoms should periodic images be created. This
    /// defaults to the largest cutoff, and can not be smaller than it.
    #[serde(default)]
    pub influence_distance: Option<f64>,
    /// Should neighbor lists also be computed for ghost atoms? If `false`, the
    /// lists of ghost atoms are left empty.
    #[serde(default)]
    pub ghost_neighbors: bool,
    /// Index convention used by the engine for particles and neighbors
    #[serde(default)]
    pub index_base: IndexBase,
    /// Strategy used to select which periodic images become ghost atoms
    #[serde(default)]
    pub padding: GhostPadding,
}

impl NeighborListOptions {
    /// Create options with the given cutoffs, and default values for
    /// everything else.
    pub fn new(cutoffs: Vec<f64>) -> NeighborListOptions {
        NeighborListOptions {
            cutoffs,
            influence_distance: None,
            ghost_neighbors: false,
            index_base: IndexBase::Zero,
            padding: GhostPadding::Minimal,
        }
    }

    /// Parse JSON formatted options and validate them
    pub fn from_json(json: &str) -> Result<NeighborListOptions, Error> {
        let options = serde_json::from_str::<NeighborListOptions>(json)?;
        options.validate()?;
        return Ok(options);
    }

    /// Check that the cutoffs and influence distance can be used to build
    /// neighbor lists
    pub fn validate(&self) -> Result<(), Error> {
        if self.cutoffs.is_empty() {
            return Err(Error::Configuration("the set of cutoffs is empty".into()));
        }

        for (i, &cutoff) in self.cutoffs.iter().enumerate() {
            if !(cutoff > 0.0 && cutoff.is_finite()) {
                return Err(Error::Configuration(format!(
                    "cutoff {} must be a positive finite number, got {}", i, cutoff
                )));
            }
        }

        if let Some(influence) = self.influence_distance {
            if !influence.is_finite() || influence < self.max_cutoff() {
                return Err(Error::Configuration(format!(
                    "influence distance ({}) must be finite and at least as large as the largest cutoff ({})",
                    influence, self.max_cutoff()
                )));
            }
        }

        Ok(())
    }

    /// Get the largest cutoff in the set
    pub fn max_cutoff(&self) -> f64 {
        self.cutoffs.iter().copied().fold(0.0, f64::max)
    }

    /// Get the distance up to which ghost atoms are generated
    pub fn influence_distance(&self) -> f64 {
        self.influence_distance.unwrap_or_else(|| self.max_cutoff())
    }
}
