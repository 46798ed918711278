//! Auto-cuts parameter metadata.

use crate::ParamsArgs;
use anyhow::Result;
use sky_cuts::AutoCutsKind;

/// Prints the tunables of one or all auto-cuts algorithms.
pub fn run(args: ParamsArgs, verbose: bool) -> Result<()> {
    let kinds = match &args.algorithm {
        Some(name) => vec![AutoCutsKind::from_name(name)?],
        None => AutoCutsKind::ALL.to_vec(),
    };
    for (i, kind) in kinds.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{kind}");
        let specs = kind.param_specs();
        if specs.is_empty() {
            println!("  (no parameters)");
        }
        for spec in specs {
            let range = spec
                .range
                .map(|(lo, hi)| format!("[{lo}, {hi}]"))
                .unwrap_or_default();
            let ty = format!("{:?}", spec.kind).to_lowercase();
            println!(
                "  {:<12} {:<6} {:>8}  {:<16} {}",
                spec.name,
                ty,
                spec.default.to_string(),
                range,
                spec.description
            );
        }
        if verbose {
            println!("  default: {:?}", kind.default_algorithm());
        }
    }
    Ok(())
}
