//! bgremove: remove the background from a single image
//!
//! `bgremove <input_path> <output_path>` writes a PNG cutout and prints
//! `SUCCESS` or an `ERROR:` line.

#[cfg(feature = "cli")]
use bgremove::cli;

#[cfg(feature = "cli")]
fn main() -> std::process::ExitCode {
    cli::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
