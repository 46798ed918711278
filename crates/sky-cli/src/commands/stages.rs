//! Stage type listing.

use anyhow::Result;
use sky_pipeline::StageParams;

/// Prints every stage type with a description; with `verbose`, also its
/// default parameters.
pub fn run(verbose: bool) -> Result<()> {
    for name in StageParams::NAMES {
        println!("{:<14} {}", name, StageParams::describe(name).unwrap_or_default());
        if !verbose {
            continue;
        }
        if let Some(params) = StageParams::default_for(name) {
            let yaml = serde_yaml::to_string(&params)?;
            for line in yaml.lines().filter(|l| !l.starts_with("type:")) {
                println!("{:<14}   {}", "", line);
            }
        }
    }
    Ok(())
}
