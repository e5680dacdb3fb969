use chrono::{Local, NaiveDate};

use crate::library::{DEFAULT_STARS, Song};

/// Parameters shared by every weight policy
#[derive(Debug, Clone, PartialEq)]
pub struct WeightConfig {
    /// Multiplier per star above 5 (divisor per star below)
    pub base: f64,
    /// Window in days during which unrated songs get a recency bonus
    pub days_back: i64,
    /// Bonus per day left in the recency window
    pub weight_day: f64,
    /// Weight lost per day since the song was liked (linear falloff)
    pub slope: f64,
    /// Lowest weight the linear falloff can reach
    pub floor: f64,
    /// Date ages are measured against
    pub reference_date: NaiveDate,
}

impl Default for WeightConfig {
    fn default() -> Self {
        WeightConfig {
            base: 2.0,
            days_back: 365,
            weight_day: 0.01,
            slope: 1.0 / 365.0,
            floor: 0.0,
            reference_date: Local::now().date_naive(),
        }
    }
}

/// Computes the unnormalized sampling weight of a song.
///
/// Any `Fn(&Song, &WeightConfig) -> f64` is a policy.
pub trait WeightPolicy {
    /// Non-negative, finite weight of `song`; larger means drawn earlier
    fn weight(&self, song: &Song, config: &WeightConfig) -> f64;
}

impl<F> WeightPolicy for F
where
    F: Fn(&Song, &WeightConfig) -> f64,
{
    fn weight(&self, song: &Song, config: &WeightConfig) -> f64 {
        self(song, config)
    }
}

/// Every song weighs the same
pub fn uniform(_song: &Song, _config: &WeightConfig) -> f64 {
    1.0
}

/// `base ^ (stars - 5)`: 5 stars weighs 1, each star above multiplies by `base`
pub fn exp_star(song: &Song, config: &WeightConfig) -> f64 {
    config.base.powi(song.stars - DEFAULT_STARS)
}

/// [`exp_star`] plus a bonus for unrated songs liked within `days_back` days.
///
/// The bonus shrinks by `weight_day` per day of age and is gone once the song
/// is `days_back` days old.
pub fn exp_star_recent(song: &Song, config: &WeightConfig) -> f64 {
    let base_weight = exp_star(song, config);
    let days = song.days_since_added(config.reference_date);
    if song.stars == DEFAULT_STARS && days < config.days_back {
        #[allow(clippy::cast_precision_loss)]
        let remaining = (config.days_back - days) as f64;
        base_weight + remaining * config.weight_day
    } else {
        base_weight
    }
}

/// `1 - slope * days_since_added`, never below `floor`
pub fn linear_falloff(song: &Song, config: &WeightConfig) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let days = song.days_since_added(config.reference_date) as f64;
    (1.0 - config.slope * days).max(config.floor)
}

/// Built-in policies, selectable by name on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Policy {
    /// Same weight for every song
    Uniform,
    /// `base ^ (stars - 5)`
    #[default]
    ExpStar,
    /// Star weight plus a bonus for recently liked unrated songs
    ExpStarRecent,
    /// Weight falling linearly with age, clamped at `floor`
    LinearFalloff,
}

impl WeightPolicy for Policy {
    fn weight(&self, song: &Song, config: &WeightConfig) -> f64 {
        match self {
            Policy::Uniform => uniform(song, config),
            Policy::ExpStar => exp_star(song, config),
            Policy::ExpStarRecent => exp_star_recent(song, config),
            Policy::LinearFalloff => linear_falloff(song, config),
        }
    }
}
