//! `pwt images`: List images stored by the engine.

use clap::Args;
use podwright_runtime::image;

use super::Context;
use crate::output;

/// Arguments for the `images` command.
#[derive(Args, Debug)]
pub struct ImagesArgs {
    /// Print only repository tags, one per line.
    #[arg(short, long)]
    pub tags: bool,
}

/// Executes the `images` command.
///
/// # Errors
///
/// Returns an error if the session cannot be opened or listing fails.
pub fn execute(args: &ImagesArgs, ctx: &Context) -> anyhow::Result<()> {
    let session = ctx.session()?;
    let images = image::list_images(&session)?;

    if args.tags {
        for tag in image::repo_tags(&images) {
            println!("{tag}");
        }
        return Ok(());
    }

    if images.is_empty() {
        println!("No images found.");
        return Ok(());
    }

    println!("{:<14} {:<50} {:>10}", "IMAGE ID", "TAGS", "SIZE");
    for img in &images {
        let tags = if img.repo_tags.is_empty() {
            "<none>".to_string()
        } else {
            img.repo_tags.join(", ")
        };
        println!(
            "{:<14} {:<50} {:>10}",
            output::short_image_id(&img.id),
            tags,
            output::format_bytes(img.size_bytes)
        );
    }
    Ok(())
}
