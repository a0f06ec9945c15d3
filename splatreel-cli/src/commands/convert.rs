// ============================================================================
// splatreel-cli/src/commands/convert.rs
// ============================================================================
//
// CONVERT COMMAND: Native PLY to Standard 3DGS PLY
//
// Converts a single predictor output file, e.g. one kept with
// `run --keep-native`, into the vertex-only layout standard viewers expect.
//
// AI-ASSISTANT-INFO: `splatreel convert` implementation

use crate::cli::ConvertArgs;
use crate::output::{print_info, print_status};

use anyhow::{Context, Result};
use log::info;
use splatreel_core::{StatusLevel, convert_native_to_standard, default_standard_path, format_bytes, rewrap_to_standard};

/// Executes `splatreel convert`.
pub fn convert_command(args: ConvertArgs) -> Result<()> {
    let output = args.output.unwrap_or_else(|| default_standard_path(&args.input));
    info!("Converting {} to {}", args.input.display(), output.display());

    let report = if args.keep_input {
        rewrap_to_standard(&args.input, &output)
    } else {
        convert_native_to_standard(&args.input, &output)
    }
    .with_context(|| format!("cannot convert {}", args.input.display()))?;

    print_status(
        StatusLevel::Success,
        &format!("Wrote {}", report.output_path.display()),
    );
    print_info("Gaussians", report.gaussian_count);
    print_info("Size", format_bytes(report.output_size));
    if !report.dropped_elements.is_empty() {
        print_info("Dropped", report.dropped_elements.join(", "));
    }
    if let Some(reason) = &report.native_removal_error {
        print_status(
            StatusLevel::Warning,
            &format!("could not delete {}: {}", args.input.display(), reason),
        );
    }
    Ok(())
}
