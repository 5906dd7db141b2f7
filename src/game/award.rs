//! Award-Once Ledger
//!
//! Every one-time award in the game (puzzle bonus, memory pool, catch
//! final score, per-question rewards) goes through a single primitive:
//! apply the points only if the award key has not been seen before.

use std::collections::BTreeSet;
use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::game::state::QuestionId;

/// Identity of a one-time award.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AwardKey {
    /// Puzzle solved
    Stage1Complete,
    /// Quiz question answered correctly
    Stage2Question(QuestionId),
    /// Memory pool merged into the score
    Stage3Complete,
    /// Catch stage final score committed
    Stage4Final,
    /// Fill-blank template answered correctly
    Stage5Question(QuestionId),
}

impl AwardKey {
    /// Stable tag used when hashing.
    fn tag(&self) -> u8 {
        match self {
            AwardKey::Stage1Complete => 1,
            AwardKey::Stage2Question(_) => 2,
            AwardKey::Stage3Complete => 3,
            AwardKey::Stage4Final => 4,
            AwardKey::Stage5Question(_) => 5,
        }
    }
}

impl fmt::Display for AwardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AwardKey::Stage1Complete => f.write_str("stage1:complete"),
            AwardKey::Stage2Question(id) => write!(f, "stage2:{id}"),
            AwardKey::Stage3Complete => f.write_str("stage3:complete"),
            AwardKey::Stage4Final => f.write_str("stage4:final"),
            AwardKey::Stage5Question(id) => write!(f, "stage5:{id}"),
        }
    }
}

/// Set of award keys already granted in this playthrough.
///
/// BTreeSet keeps iteration (and therefore hashing) deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AwardLedger {
    granted: BTreeSet<AwardKey>,
}

impl AwardLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Has this award already been granted?
    pub fn is_granted(&self, key: &AwardKey) -> bool {
        self.granted.contains(key)
    }

    /// Mark an award as granted.
    ///
    /// Returns `true` only the first time a key is seen; the caller
    /// applies the points iff this returns `true`.
    pub fn grant(&mut self, key: AwardKey) -> bool {
        self.granted.insert(key)
    }

    /// Number of awards granted.
    pub fn len(&self) -> usize {
        self.granted.len()
    }

    /// No awards granted yet?
    pub fn is_empty(&self) -> bool {
        self.granted.is_empty()
    }

    /// Granted keys in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &AwardKey> {
        self.granted.iter()
    }

    /// Feed the ledger into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.len_prefix(self.granted.len());
        for key in &self.granted {
            hasher.field(&key.tag());
            if let AwardKey::Stage2Question(id) | AwardKey::Stage5Question(id) = key {
                hasher.field(id.as_str());
            }
        }
    }
}
