//! # cbz-webp
//!
//! Turns a directory of comic pages into a comic book archive. Images are
//! re-encoded to lossy WebP (quality 80 by default), every other file is
//! copied byte for byte, and the directory layout is preserved inside the
//! archive.
//!
//! # Pipeline
//!
//! ```text
//! source dir ── walk (sorted) ── classify by extension
//!                                  ├─ image:  decode (JPEG → PNG → GIF → sniffed) → WebP → <stem>.webp
//!                                  └─ other:  stream verbatim
//!                                        ↓
//!                                   ZIP writer ── cbz: done
//!                                        └─ cbr / cb7z: <output>.temp.zip → rar / 7z → <output>
//! ```
//!
//! ZIP is produced natively. RAR and 7z are produced by running the external
//! `rar` / `7z` tools on a temporary ZIP, which is removed afterwards.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`classify`] | Image-vs-opaque decision by extension, archive entry naming |
//! | [`imaging`] | Decoding with format fallback, WebP encoding, quality |
//! | [`archive`] | Archive writer, directory packager, format adapter |
//! | [`batch`] | One archive per directory below a root, optional deletion of sources |
//! | [`progress`] | Progress reporter trait and the events it receives |
//! | [`config`] | `cbz-webp.toml` loading, merging and validation |
//! | [`types`] | Requests, results and entries shared across modules |
//! | [`output`] | CLI output formatting |
//!
//! # Failure Semantics
//!
//! By default a single undecodable image fails the whole archive, and the
//! partially written file is left without a ZIP central directory so it can
//! never be mistaken for a complete archive. `on_image_error = "skip"` leaves
//! such images out instead and reports them in the result.

pub mod archive;
pub mod batch;
pub mod classify;
pub mod config;
pub mod imaging;
pub mod output;
pub mod progress;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
