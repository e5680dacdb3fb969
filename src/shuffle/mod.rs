/// Weight policies and their configuration
pub mod policy;
/// Weighted permutation and weighted sampling
pub mod sampler;

pub use policy::{
    Policy, WeightConfig, WeightPolicy, exp_star, exp_star_recent, linear_falloff, uniform,
};
pub use sampler::{SampleMode, build_playlist, weighted_sample, weighted_shuffle};

/// Default maximum number of tracks in a generated playlist
pub const PLAYLIST_LIMIT: usize = 1000;
