//! Pipeline document validation.

use crate::CheckArgs;
use anyhow::Result;
use sky_icc::ProfileRegistry;
use sky_pipeline::StageParams;

/// Loads a document, lists its stages and reports likely mistakes.
///
/// Hard errors (unknown stage type, invalid parameters) fail the load;
/// everything else is printed as a warning.
pub fn run(args: CheckArgs, verbose: bool) -> Result<()> {
    let doc = super::load_doc(&args.pipeline)?;
    println!("{}", args.pipeline.display());
    println!("  Name:   {}", if doc.name.is_empty() { "(unnamed)" } else { &doc.name });
    println!("  Stages: {}", doc.stages.len());

    // standard profile names only; files are registered at render time
    let profiles = ProfileRegistry::new();
    let mut warnings = Vec::new();
    if doc.stages.is_empty() {
        warnings.push("pipeline has no stages".to_string());
    }

    for (i, stage) in doc.stages.iter().enumerate() {
        let flag = if stage.bypass { "  [bypass]" } else { "" };
        println!("  {:>3}  {}{}", i, stage.params.kind(), flag);
        if verbose {
            let yaml = serde_yaml::to_string(&stage.params)?;
            for line in yaml.lines().filter(|l| !l.starts_with("type:")) {
                println!("         {line}");
            }
        }

        match &stage.params {
            StageParams::Input if i > 0 => {
                warnings.push(format!("stage {i}: input stage is not first and will fail"));
            }
            StageParams::IccProf(p) => {
                let names = [&p.input_profile, &p.output_profile, &p.proof_profile];
                for name in names.into_iter().flatten() {
                    if !profiles.contains(name) {
                        warnings.push(format!(
                            "stage {i}: profile '{name}' is not built in; register it with --icc"
                        ));
                    }
                }
                if p.input_profile.is_none() || p.output_profile.is_none() {
                    warnings.push(format!("stage {i}: iccprof without input/output profile passes through"));
                }
            }
            _ => {}
        }
    }

    for w in &warnings {
        println!("  warning: {w}");
    }
    println!("  OK{}", if warnings.is_empty() { String::new() } else { format!(" ({} warnings)", warnings.len()) });
    Ok(())
}
