//! Default viewer pipeline.

use crate::DefaultPipelineArgs;
use anyhow::{Context, Result};
use sky_pipeline::PipelineDoc;

/// Prints the default viewer pipeline as YAML or writes it to a file.
pub fn run(args: DefaultPipelineArgs) -> Result<()> {
    let doc = PipelineDoc::default_viewer();
    match &args.output {
        Some(path) => {
            doc.save_file(path)
                .with_context(|| format!("Failed to save: {}", path.display()))?;
            println!("Wrote {} ({} stages)", path.display(), doc.stages.len());
        }
        None => print!("{}", doc.to_yaml()?),
    }
    Ok(())
}
