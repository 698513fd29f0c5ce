//! Static word-pair catalog.
//!
//! Each pair holds the word the majority receives and a near-miss decoy for
//! the impostor minority. The pairs are close enough that descriptions of one
//! plausibly fit the other.

use crate::types::WordPair;
use rand::seq::IndexedRandom;
use rand::Rng;

/// (majority_word, minority_word)
pub const WORD_PAIRS: &[(&str, &str)] = &[
    ("cat", "dog"),
    ("coffee", "tea"),
    ("beach", "desert"),
    ("pizza", "burger"),
    ("guitar", "violin"),
    ("winter", "autumn"),
    ("airplane", "helicopter"),
    ("library", "bookstore"),
    ("soccer", "basketball"),
    ("moon", "sun"),
    ("river", "lake"),
    ("painter", "sculptor"),
    ("train", "tram"),
    ("apple", "pear"),
    ("castle", "palace"),
    ("doctor", "nurse"),
    ("rain", "snow"),
    ("ship", "submarine"),
    ("chess", "checkers"),
    ("honey", "jam"),
    ("mountain", "hill"),
    ("letter", "postcard"),
    ("cinema", "theater"),
    ("spider", "ant"),
    ("bread", "cake"),
    ("piano", "organ"),
    ("island", "peninsula"),
    ("wizard", "witch"),
    ("mirror", "window"),
    ("firefighter", "police officer"),
    ("ocean", "aquarium"),
    ("camping", "picnic"),
    ("violet", "rose"),
    ("glasses", "contact lenses"),
    ("elevator", "escalator"),
    ("soup", "stew"),
    ("marathon", "sprint"),
    ("umbrella", "raincoat"),
    ("birthday", "wedding"),
    ("whale", "dolphin"),
];

/// Pick one pair uniformly at random from the catalog.
pub fn random_pair<R: Rng + ?Sized>(rng: &mut R) -> WordPair {
    // The catalog is a non-empty const table, so choose() cannot fail.
    let (majority, minority) = WORD_PAIRS.choose(rng).copied().unwrap_or(WORD_PAIRS[0]);
    WordPair {
        majority_word: majority.to_string(),
        minority_word: minority.to_string(),
    }
}
