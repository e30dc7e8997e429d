//! `dryrun init`: write a starter options file.

use anyhow::bail;
use clap::Args;
use colored::Colorize;
use dryrun::SiteOptions;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Web project name (`<name>/<name>.csproj`)
    pub project: String,

    /// Overwrite an existing options file
    #[arg(long)]
    pub force: bool,
}

pub fn execute(args: InitArgs, options_file: &Path) -> anyhow::Result<()> {
    if options_file.exists() && !args.force {
        bail!(
            "{} already exists, use --force to overwrite it",
            options_file.display()
        );
    }

    SiteOptions::for_project(&args.project).save(options_file)?;
    println!(
        "{} Wrote {} for project {}",
        "✓".green(),
        options_file.display(),
        args.project.bold()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_options() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("dryrun.toml");

        execute(
            InitArgs {
                project: "Sample".to_string(),
                force: false,
            },
            &file,
        )
        .unwrap();

        let options = SiteOptions::load(&file).unwrap();
        assert_eq!(options.deployer.project_file_name, "Sample.csproj");
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("dryrun.toml");
        std::fs::write(&file, "").unwrap();

        let args = |force| InitArgs {
            project: "Sample".to_string(),
            force,
        };
        assert!(execute(args(false), &file).is_err());
        assert!(execute(args(true), &file).is_ok());
    }
}
