//! Image editing example - applies a natural-language edit to a photo.
//!
//! Run with: `cargo run --example edit_image -- <input_image.png> [instruction]`
//!
//! Requires `API_KEY` or `GOOGLE_API_KEY` environment variable.

use banana_edit::{encode, find_preset, GeminiEditor, ImageEditor, SourceImage};
use std::time::{SystemTime, UNIX_EPOCH};

#[tokio::main]
async fn main() -> banana_edit::Result<()> {
    let mut args = std::env::args().skip(1);
    let input_path = args
        .next()
        .expect("Usage: edit_image <input_image.png> [instruction]");
    let instruction = args.next().unwrap_or_else(|| {
        find_preset("cyberpunk-vibe")
            .map(|p| p.text.to_string())
            .unwrap_or_else(|| "Add neon cyberpunk lighting to this photo".to_string())
    });

    let source = SourceImage::open(&input_path).await?;
    let encoded = encode(&source).await?;

    let editor = GeminiEditor::builder().build()?;
    let edited = editor.request_edit(&encoded, &instruction).await?;

    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let output = edited.download_file_name(millis);
    let size = edited.save(&output)?;
    println!("Edited image saved to {output} ({size} bytes)");

    Ok(())
}
