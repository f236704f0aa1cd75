//! Audio effects engine.
//!
//! ```text
//! segment bytes ─▶ decode ─▶ reconcile ─▶ time-stretch ─▶ gain ─┐
//!                 (hound /   (rubato,      (WSOLA)              │
//!                  symphonia) channels)                         ▼
//!                               encode ◀─ normalize ◀─ concat + silence
//! ```
//!
//! The first decoded segment fixes the sample rate and channel layout for the
//! whole track. Normalization runs once on the concatenated track so gain
//! differences between profiles survive.

pub mod buffer;
pub mod codec;
pub mod effects;
pub mod resample;
pub mod stretch;

pub use buffer::{AudioBuffer, frames_for_ms};
pub use codec::{OutputFormat, decode, encode};
pub use effects::{
    AudioEffectsEngine, TARGET_PEAK_DBFS, apply_gain, db_to_linear, normalize_peak, pause_after,
};
pub use resample::{convert_channels, reconcile, resample};
pub use stretch::{stretched_len, time_stretch};
