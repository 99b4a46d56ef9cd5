//! Pipeline stages shared by the Composer and the Stitcher.
//!
//! Each submodule implements exactly one step, so each is independently
//! testable and a backend (e.g. the rasteriser) can be swapped without
//! touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! Composer: probe ──▶ layout ──▶ encode ──▶ pdf ──▶ storage
//! Stitcher: input ──▶ render ──▶ plan ──▶ (image overlay) ──▶ storage
//! ```
//!
//! 1. [`input`]: canonicalise a PDF path or URL to a local file
//! 2. [`render`]: rasterise PDF pages; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`probe`]: read image dimensions without decoding pixels
//! 4. [`layout`]: fit an image on a page
//! 5. [`plan`]: numeric page order and vertical offsets for stitching
//! 6. [`encode`]: turn an image file into an XObject payload
//! 7. [`pdf`]: assemble pages with lopdf
//! 8. [`storage`]: artifact layout, atomic writes, public URLs

pub mod encode;
pub mod input;
pub mod layout;
pub mod pdf;
pub mod plan;
pub mod probe;
pub mod render;
pub mod storage;
