//! File-to-file background removal

use crate::{error::Result, services::ImageIOService};
use std::path::Path;
use tracing::instrument;

/// Anything that turns encoded image bytes into encoded cutout bytes
pub trait BackgroundRemover {
    /// Remove the background from `image_bytes`, returning the encoded result
    ///
    /// # Errors
    /// - Decoding, inference or encoding failures
    fn remove(&mut self, image_bytes: &[u8]) -> Result<Vec<u8>>;
}

/// Read `input_path`, remove its background and write the result to `output_path`
///
/// The output file is only created once removal has succeeded. Its parent
/// directory must already exist.
///
/// # Errors
/// - Input cannot be read
/// - Removal fails
/// - Output cannot be written
#[instrument(
    skip_all,
    fields(
        input = %input_path.as_ref().display(),
        output = %output_path.as_ref().display()
    )
)]
pub fn remove_background_file<P, Q>(
    input_path: P,
    output_path: Q,
    remover: &mut dyn BackgroundRemover,
) -> Result<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let input_bytes = ImageIOService::read_input(&input_path)?;
    let output_bytes = remover.remove(&input_bytes)?;
    ImageIOService::write_output(&output_path, &output_bytes)?;

    log::info!(
        "Removed background: {} -> {}",
        input_path.as_ref().display(),
        output_path.as_ref().display()
    );
    Ok(())
}
