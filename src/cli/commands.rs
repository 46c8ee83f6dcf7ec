//! Command handlers: one per subcommand

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, instrument, warn};

use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, TagArgs};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::Settings;
use crate::diagnostics::Diagnostics;
use crate::domain::{Library, Tag};
use crate::infrastructure::di::ServiceContainer;

/// Run the command, printing data records to stdout.
pub fn execute_command(cli: &Cli, diagnostics: &Diagnostics) -> CliResult<()> {
    let stdout = io::stdout();
    execute_command_with(cli, diagnostics, &mut stdout.lock())
}

/// Run the command, writing data records (tags, paths, completions) to `out`.
pub fn execute_command_with(
    cli: &Cli,
    diagnostics: &Diagnostics,
    out: &mut dyn Write,
) -> CliResult<()> {
    debug!(
        "execute_command: {:?} (log threshold {})",
        cli.command,
        diagnostics.max_level()
    );
    let container = ServiceContainer::new();

    match &cli.command {
        Commands::Init { root } => cmd_init(&container, root.as_deref().or(cli.root.as_deref())),
        Commands::Completion { shell } => cmd_completion(*shell, out),
        Commands::Tag(args) => cmd_tag(&container, &open_library(&container, cli)?, args),
        Commands::Untag(args) => cmd_untag(&container, &open_library(&container, cli)?, args),
        Commands::Tags { file } => cmd_tags(&container, &open_library(&container, cli)?, file, out),
        Commands::Find { tags } => cmd_find(&container, &open_library(&container, cli)?, tags, out),
        Commands::Rm { files } => {
            let library = open_library(&container, cli)?;
            files
                .iter()
                .try_for_each(|file| cmd_rm(&container, &library, file))
        }
        Commands::Rename { file, new } => {
            cmd_rename(&container, &open_library(&container, cli)?, file, new)
        }
        Commands::Convert { dirs } => {
            let library = open_library(&container, cli)?;
            dirs.iter()
                .try_for_each(|dir| cmd_convert(&container, &library, dir))
        }
        Commands::Fix => cmd_fix(&container, &open_library(&container, cli)?),
        Commands::Clean => cmd_clean(&container, &open_library(&container, cli)?),
    }
}

/// Library from `--root`, else the one containing cwd, else the configured one.
///
/// Settings are only read when the first two come up empty.
fn open_library(container: &ServiceContainer, cli: &Cli) -> CliResult<Library> {
    if let Some(root) = &cli.root {
        return Ok(container.library.open(root)?);
    }
    let cwd = current_dir()?;
    if let Some(library) = container.library.discover(&cwd)? {
        return Ok(library);
    }
    if let Some(root) = Settings::load()?.root {
        return Ok(container.library.open(&root)?);
    }
    Err(ApplicationError::NotALibrary(cwd).into())
}

fn current_dir() -> CliResult<PathBuf> {
    std::env::current_dir().map_err(|e| {
        ApplicationError::OperationFailed {
            context: "read current directory".to_string(),
            source: Box::new(e),
        }
        .into()
    })
}

fn write_failed(e: io::Error) -> CliError {
    ApplicationError::OperationFailed {
        context: "write output".to_string(),
        source: Box::new(e),
    }
    .into()
}

fn parse_tag(s: &str) -> CliResult<Tag> {
    Tag::parse(s).map_err(|e| CliError::InvalidArgs(e.to_string()))
}

#[instrument(skip(container))]
fn cmd_init(container: &ServiceContainer, root: Option<&Path>) -> CliResult<()> {
    let root = match root {
        Some(root) => root.to_path_buf(),
        None => current_dir()?,
    };
    let library = container.library.init(&root)?;
    output::action("Initialized", &library.root.display());
    Ok(())
}

fn cmd_completion(shell: Shell, out: &mut dyn Write) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, out);
    Ok(())
}

#[instrument(skip(container))]
fn cmd_tag(container: &ServiceContainer, library: &Library, args: &TagArgs) -> CliResult<()> {
    for (file, tag) in args.pairs() {
        let tag = parse_tag(tag)?;
        match container.library.tag(library, Path::new(file), &tag) {
            Ok(_) => {}
            Err(ApplicationError::IsADirectory(path)) => {
                warn!("skipped {}; convert it first", path.display());
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_untag(container: &ServiceContainer, library: &Library, args: &TagArgs) -> CliResult<()> {
    for (file, tag) in args.pairs() {
        let tag = parse_tag(tag)?;
        container.library.untag(library, Path::new(file), &tag)?;
    }
    Ok(())
}

#[instrument(skip(container, out))]
fn cmd_tags(
    container: &ServiceContainer,
    library: &Library,
    file: &Path,
    out: &mut dyn Write,
) -> CliResult<()> {
    for tag in container.library.list_tags(library, file)? {
        output::record(out, &tag).map_err(write_failed)?;
    }
    Ok(())
}

#[instrument(skip(container, out))]
fn cmd_find(
    container: &ServiceContainer,
    library: &Library,
    tags: &[String],
    out: &mut dyn Write,
) -> CliResult<()> {
    let tags = tags
        .iter()
        .map(|t| parse_tag(t))
        .collect::<CliResult<Vec<_>>>()?;
    for path in container.library.find(library, &tags)? {
        output::record(out, &path.display()).map_err(write_failed)?;
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_rm(container: &ServiceContainer, library: &Library, file: &Path) -> CliResult<()> {
    container.library.rm(library, file)?;
    Ok(())
}

#[instrument(skip(container))]
fn cmd_rename(container: &ServiceContainer, library: &Library, file: &Path, new: &str) -> CliResult<()> {
    container.library.rename(library, file, new)?;
    Ok(())
}

#[instrument(skip(container))]
fn cmd_convert(container: &ServiceContainer, library: &Library, dir: &Path) -> CliResult<()> {
    match container.library.convert(library, dir) {
        Ok(_) => Ok(()),
        Err(ApplicationError::NotADirectory(path)) => {
            warn!("{} is not a directory; skipping", path.display());
            Ok(())
        }
        Err(ApplicationError::NameConflict(path)) => {
            warn!("name conflict {}; skipping", path.display());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(container))]
fn cmd_fix(container: &ServiceContainer, library: &Library) -> CliResult<()> {
    let fixed = container.library.fix(library)?;
    if fixed > 0 {
        output::action("Fixed", &format!("{} symlink groups", fixed));
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_clean(container: &ServiceContainer, library: &Library) -> CliResult<()> {
    for dir in container.library.clean_dirs(library)? {
        output::action("Removed", &dir.display());
    }
    Ok(())
}
