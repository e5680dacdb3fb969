use std::collections::VecDeque;

use log::debug;
use rand::Rng;

use crate::clients::errors::{Error, Result};
use crate::library::Song;
use crate::shuffle::policy::{WeightConfig, WeightPolicy};

// Weigh every song, rejecting anything that is not a usable probability mass
fn weigh<'a, P>(
    songs: &'a [Song],
    policy: &P,
    config: &WeightConfig,
) -> Result<Vec<(&'a str, f64)>>
where
    P: WeightPolicy + ?Sized,
{
    songs
        .iter()
        .map(|song| {
            let weight = policy.weight(song, config);
            if weight.is_finite() && weight >= 0.0 {
                Ok((song.id.as_str(), weight))
            } else {
                Err(Error::InvalidWeight {
                    song_id: song.id.clone(),
                    weight,
                })
            }
        })
        .collect()
}

// Index of the first weight whose running sum exceeds `target`
fn pick_index(weights: &[(&str, f64)], target: f64) -> usize {
    let mut cumulative = 0.0;
    let mut last_positive = 0;
    for (index, (_, weight)) in weights.iter().enumerate() {
        if *weight > 0.0 {
            cumulative += weight;
            last_positive = index;
            if target < cumulative {
                return index;
            }
        }
    }
    // Rounding left target at the very top of the range
    last_positive
}

/// Orders every song by weighted sampling without replacement.
///
/// Each step draws one of the remaining songs with probability proportional
/// to its weight and removes it, so heavier songs tend to come first. When
/// the remaining weight is zero the draw is uniform. The result is always a
/// permutation of the input IDs.
pub fn weighted_shuffle<P, R>(
    songs: &[Song],
    policy: &P,
    config: &WeightConfig,
    rng: &mut R,
) -> Result<Vec<String>>
where
    P: WeightPolicy + ?Sized,
    R: Rng,
{
    let mut pool = weigh(songs, policy, config)?;
    if pool.len() <= 1 {
        return Ok(pool.into_iter().map(|(id, _)| id.to_string()).collect());
    }

    let mut order = Vec::with_capacity(pool.len());
    while !pool.is_empty() {
        let total: f64 = pool.iter().map(|(_, weight)| weight).sum();
        let index = if total > 0.0 {
            pick_index(&pool, rng.random::<f64>() * total)
        } else {
            rng.random_range(0..pool.len())
        };
        // Order of the pool does not matter, only membership
        let (id, _) = pool.swap_remove(index);
        order.push(id.to_string());
    }

    debug!("Weighted shuffle ordered {} songs", order.len());
    Ok(order)
}

/// Draws `length` songs with replacement, proportionally to their weight.
///
/// A draw is thrown away when the same song is among the last `not_last`
/// accepted ones, so the result can be shorter than `length`. `not_last = 0`
/// allows immediate repeats.
pub fn weighted_sample<P, R>(
    songs: &[Song],
    policy: &P,
    config: &WeightConfig,
    length: usize,
    not_last: usize,
    rng: &mut R,
) -> Result<Vec<String>>
where
    P: WeightPolicy + ?Sized,
    R: Rng,
{
    let weights = weigh(songs, policy, config)?;
    if weights.is_empty() {
        return Ok(Vec::new());
    }

    let mut cumulative = Vec::with_capacity(weights.len());
    let mut total = 0.0;
    for (_, weight) in &weights {
        total += weight;
        cumulative.push(total);
    }

    let mut selected: Vec<String> = Vec::with_capacity(length);
    let mut recent: VecDeque<&str> = VecDeque::with_capacity(not_last);
    let mut skipped = 0usize;

    for _ in 0..length {
        let index = if total > 0.0 {
            let target = rng.random::<f64>() * total;
            let index = cumulative.partition_point(|sum| *sum <= target);
            if index < weights.len() {
                index
            } else {
                // Rounding left target at the very top of the range
                weights
                    .iter()
                    .rposition(|(_, weight)| *weight > 0.0)
                    .unwrap_or(0)
            }
        } else {
            rng.random_range(0..weights.len())
        };
        let id = weights[index].0;

        if not_last > 0 {
            if recent.contains(&id) {
                skipped += 1;
                continue;
            }
            if recent.len() == not_last {
                recent.pop_front();
            }
            recent.push_back(id);
        }
        selected.push(id.to_string());
    }

    debug!(
        "Weighted sample kept {} of {length} draws ({skipped} recent repeats skipped)",
        selected.len()
    );
    Ok(selected)
}

/// How songs are drawn for a playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleMode {
    /// Every song exactly once, heavier songs earlier
    Permutation,
    /// Draws with replacement, no repeat within the last `not_last` picks
    WithReplacement {
        /// Size of the no-repeat window
        not_last: usize,
    },
}

/// Draws a playlist of at most `limit` track IDs from `songs`
pub fn build_playlist<P, R>(
    songs: &[Song],
    policy: &P,
    config: &WeightConfig,
    mode: SampleMode,
    limit: usize,
    rng: &mut R,
) -> Result<Vec<String>>
where
    P: WeightPolicy + ?Sized,
    R: Rng,
{
    let mut track_ids = match mode {
        SampleMode::Permutation => weighted_shuffle(songs, policy, config, rng)?,
        SampleMode::WithReplacement { not_last } => {
            weighted_sample(songs, policy, config, limit, not_last, rng)?
        }
    };
    track_ids.truncate(limit);
    Ok(track_ids)
}
