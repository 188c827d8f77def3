//! # photofit
//!
//! Fit a photo to a submission platform's requirements: pixel size, aspect
//! ratio, byte budget and file format. Everything runs locally on the bytes
//! you hand it.
//!
//! # Architecture: Conformance Pipeline
//!
//! ```text
//! bytes ─▶ decode ─▶ analyze ─▶ plan geometry ─▶ transform ─▶ compress ─▶ bytes
//!          (EXIF)    (5 checks)  (crop/resize)   (resample)   (size search)
//! ```
//!
//! Each stage is a plain function over explicit inputs. The only state lives
//! in [`session::SessionController`], which sequences the stages for one
//! uploaded image and discards results that a newer request has superseded.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Decode with EXIF orientation, geometry planning, resampling, encoding, size-targeting compression |
//! | [`analyze`] | Pass/fail checks of an image against a [`platforms::TargetSpec`] |
//! | [`pipeline`] | Orchestrates `load_and_analyze`, `fix_image`, `fix_image_with_crop_area` |
//! | [`session`] | Upload gate and the session state machine with a generation guard |
//! | [`platforms`] | `TargetSpec`, `Ratio`, and the built-in destination presets |
//! | [`config`] | `config.toml` loading, merging over stock defaults, validation |
//! | [`types`] | Shared records serialized by `--json` (`AnalysisResult`, `FixResult`) |
//! | [`naming`] | Byte/dimension/ratio labels and the output filename convention |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Orientation Is Applied Once, At Decode
//!
//! The EXIF orientation tag is read from the raw JPEG bytes and baked into
//! the pixels before anything else looks at them. Every later stage sees an
//! upright image and the written output carries no orientation tag, so no
//! viewer can rotate it a second time.
//!
//! ## Compression Is a Search, Not a Setting
//!
//! A byte budget cannot be hit by picking a quality up front. The compressor
//! binary-searches JPEG quality, then shrinks the image in steps when even
//! minimum quality is too large. When nothing fits it returns the smallest
//! candidate and flags it; callers report that rather than fail.
//!
//! ## Encoder Behind a Trait
//!
//! All encoding goes through [`imaging::Encoder`]. The production
//! implementation uses the `image` crate; tests use a mock with a synthetic
//! size model, so compressor behavior is asserted exactly and fast.

pub mod analyze;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod platforms;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
