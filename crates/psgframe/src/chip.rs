//! Sound-chip register models.
//!
//! Only the SN76489 family is supported; the model keeps the register
//! precision the frame format can carry rather than the full hardware state.
mod sn76489;

pub use sn76489::{
    Latch, MAX_ATTENUATION, NOISE_VOLUME, Sn76489Registers, Sn76489State, TONE_CHANNELS,
    VOLUME_CHANNELS,
};
