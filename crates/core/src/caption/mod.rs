//! Caption sidecar files.
//!
//! Every captioned video gets a `<stem>.txt` file next to it holding the
//! raw caption, optionally followed by a fixed METADATA footer.

mod sidecar;

pub use sidecar::{
    caption_preview, render_sidecar, sidecar_path, strip_metadata, write_sidecar,
    CaptionMetadata, CAPTION_EXTENSION, PREVIEW_MAX_CHARS,
};
