//! Help generation: audience vote, phone a friend, fifty-fifty.
//!
//! These are pure functions of the keys, the correct key and the caller's
//! rng. Storing results and enforcing one use per game is the session's job.

use std::collections::BTreeMap;

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::phrasebook::Phrasebook;
use crate::types::AnswerKey;

/// Everyone in the studio, so votes come out as percentages
pub const TOTAL_WATCHERS: u32 = 100;

/// Range of the raw vote weight for the correct key
pub const CORRECT_WEIGHT: (u32, u32) = (45, 90);
/// Range of the raw vote weight for every other key
pub const OTHER_WEIGHT: (u32, u32) = (1, 60);

/// Stand-in when the phrasebook has no friends
const DEFAULT_FRIEND: &str = "A friend";

/// Chance out of 10 that the friend names the correct key
pub const FRIEND_ACCURACY: u32 = 7;

/// Audience vote distribution over `keys`.
///
/// Raw weights are normalized with truncation, then the points lost to
/// truncation go to the keys with the largest remainders (earlier keys win
/// ties), so the result always sums to [`TOTAL_WATCHERS`].
pub fn audience_distribution<R: Rng + ?Sized>(
    rng: &mut R,
    keys: &[AnswerKey],
    correct: AnswerKey,
) -> BTreeMap<AnswerKey, u32> {
    let weights: Vec<u32> = keys
        .iter()
        .map(|key| {
            let (low, high) = if *key == correct {
                CORRECT_WEIGHT
            } else {
                OTHER_WEIGHT
            };
            rng.random_range(low..=high)
        })
        .collect();

    let shares = normalize(&weights, TOTAL_WATCHERS);
    keys.iter().copied().zip(shares).collect()
}

fn normalize(weights: &[u32], total: u32) -> Vec<u32> {
    let sum: u32 = weights.iter().sum();
    if sum == 0 {
        return vec![0; weights.len()];
    }

    let mut shares: Vec<u32> = weights.iter().map(|w| total * w / sum).collect();
    let mut remainders: Vec<(usize, u32)> = weights
        .iter()
        .enumerate()
        .map(|(i, w)| (i, total * w % sum))
        .collect();
    // stable sort keeps key order among equal remainders
    remainders.sort_by(|a, b| b.1.cmp(&a.1));

    let shortfall = total - shares.iter().sum::<u32>();
    for (i, _) in remainders.into_iter().take(shortfall as usize) {
        shares[i] += 1;
    }
    shares
}

/// The key the friend suggests. Right about 70% of the time, otherwise a
/// uniform pick among all keys (which can still land on the right one).
pub fn friend_guess<R: Rng + ?Sized>(
    rng: &mut R,
    keys: &[AnswerKey],
    correct: AnswerKey,
) -> AnswerKey {
    if rng.random_ratio(FRIEND_ACCURACY, 10) {
        correct
    } else {
        keys.choose(rng).copied().unwrap_or(correct)
    }
}

/// Friend call message built from a random persona and the friend's guess
pub fn friend_call<R: Rng + ?Sized>(
    rng: &mut R,
    phrasebook: &Phrasebook,
    keys: &[AnswerKey],
    correct: AnswerKey,
) -> String {
    let guess = friend_guess(rng, keys, correct);
    let name = phrasebook
        .friends()
        .choose(rng)
        .map(String::as_str)
        .unwrap_or(DEFAULT_FRIEND);
    phrasebook.friend_call(name, guess)
}

/// Correct key plus one random wrong key, in key order
pub fn fifty_fifty<R: Rng + ?Sized>(
    rng: &mut R,
    keys: &[AnswerKey],
    correct: AnswerKey,
) -> Vec<AnswerKey> {
    let wrong: Vec<AnswerKey> = keys.iter().copied().filter(|k| *k != correct).collect();
    let mut kept = vec![correct];
    kept.extend(wrong.choose(rng).copied());
    kept.sort();
    kept
}
