// Playback - turns a list of CIDs into a queue and feeds it to the external player
// Ordering policy lives here; the player itself is just a program that takes a CID.

pub mod dispatcher;

pub use dispatcher::{PlaybackHandle, PlayerCommand, PlayerEvent};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayMode {
    #[default]
    Sequential,
    Shuffle,
}

impl PlayMode {
    pub fn toggled(self) -> Self {
        match self {
            PlayMode::Sequential => PlayMode::Shuffle,
            PlayMode::Shuffle => PlayMode::Sequential,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlayMode::Sequential => "sequential",
            PlayMode::Shuffle => "shuffle",
        }
    }
}

/// Apply the play mode to a queue. Shuffle is a uniform permutation.
pub fn arrange<R: Rng + ?Sized>(mut cids: Vec<u64>, mode: PlayMode, rng: &mut R) -> Vec<u64> {
    if mode == PlayMode::Shuffle {
        cids.shuffle(rng);
    }
    cids
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn sequential_keeps_order() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(arrange(vec![3, 1, 2], PlayMode::Sequential, &mut rng), vec![3, 1, 2]);
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let original: Vec<u64> = (0..50).collect();
        let mut shuffled = arrange(original.clone(), PlayMode::Shuffle, &mut rng);
        assert_ne!(shuffled, original);
        shuffled.sort_unstable();
        assert_eq!(shuffled, original);
    }

    #[test]
    fn mode_toggles_and_parses() {
        assert_eq!(PlayMode::default(), PlayMode::Sequential);
        assert_eq!(PlayMode::Sequential.toggled(), PlayMode::Shuffle);
        assert_eq!(PlayMode::Shuffle.toggled().label(), "sequential");

        #[derive(Deserialize)]
        struct Wrapper {
            mode: PlayMode,
        }
        let parsed: Wrapper = toml::from_str("mode = \"shuffle\"").unwrap();
        assert_eq!(parsed.mode, PlayMode::Shuffle);
    }
}
