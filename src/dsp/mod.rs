//! # DSP (Digital Signal Processing) Primitives
//!
//! - **`delay_line`**: ring-buffer storage for one channel and the cursor
//!   arithmetic shared by every channel.
//! - **`delay`**: the feedback delay engine built on those rings.
//! - **`reverb`**: the reverb capability, its Freeverb implementation and
//!   the adapter that keeps it in sync with the parameters.

pub mod delay;
pub mod delay_line;
pub mod reverb;
