//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

/// Tag files with hard links: directories are tags, links are tag assignments
#[derive(Parser, Debug)]
#[command(name = "dantalian")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Also write a debug log to this file
    #[arg(long, global = true, env = "DANTALIAN_LOG", value_hint = ValueHint::FilePath)]
    pub log: Option<PathBuf>,

    /// Library root (default: library containing cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a library (default: cwd)
    Init {
        /// Library root
        #[arg(value_hint = ValueHint::DirPath)]
        root: Option<PathBuf>,
    },

    /// Tag files: hard-link them into the tag directory
    Tag(TagArgs),

    /// Remove tags from files
    Untag(TagArgs),

    /// List the tags of a file
    Tags {
        /// File
        file: PathBuf,
    },

    /// List files having all of the given tags
    Find {
        /// Tags, e.g. /music /jazz
        #[arg(required = true)]
        tags: Vec<String>,
    },

    /// Remove files: delete every link in the library
    Rm {
        /// Files to remove
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Rename every link of a file
    Rename {
        /// File
        file: PathBuf,
        /// New name
        new: String,
    },

    /// Convert directories so they can be tagged
    Convert {
        /// Directories to convert
        #[arg(required = true, value_hint = ValueHint::DirPath)]
        dirs: Vec<PathBuf>,
    },

    /// Fix converted-directory symlinks after the library moved
    Fix,

    /// Delete converted directories that are no longer linked
    Clean,

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Arguments shared by `tag` and `untag`.
#[derive(Args, Debug)]
pub struct TagArgs {
    /// Single-file mode: FIRST is a file and REST are tags
    #[arg(short = 's')]
    pub single: bool,

    /// Tag (or file with -s)
    pub first: String,

    /// Files (or tags with -s)
    #[arg(required = true)]
    pub rest: Vec<String>,
}

impl TagArgs {
    /// (file, tag) pairs in argument order.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.rest
            .iter()
            .map(|item| {
                if self.single {
                    (self.first.as_str(), item.as_str())
                } else {
                    (item.as_str(), self.first.as_str())
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    // https://docs.rs/clap/latest/clap/_derive/_tutorial/index.html#testing
    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_tag_pairs_default_mode() {
        let cli = Cli::try_parse_from(["dantalian", "tag", "/music", "a.mp3", "b.mp3"]).unwrap();
        let Commands::Tag(args) = cli.command else {
            panic!("expected tag");
        };
        assert_eq!(args.pairs(), vec![("a.mp3", "/music"), ("b.mp3", "/music")]);
    }

    #[test]
    fn test_tag_pairs_single_file_mode() {
        let cli = Cli::try_parse_from(["dantalian", "tag", "-s", "a.mp3", "/music", "/jazz"]).unwrap();
        let Commands::Tag(args) = cli.command else {
            panic!("expected tag");
        };
        assert_eq!(args.pairs(), vec![("a.mp3", "/music"), ("a.mp3", "/jazz")]);
    }

    #[test]
    fn test_log_flag_is_global() {
        let cli = Cli::try_parse_from(["dantalian", "fix", "--log", "/tmp/d.log"]).unwrap();
        assert_eq!(cli.log, Some(PathBuf::from("/tmp/d.log")));
    }

    #[test]
    fn test_find_requires_a_tag() {
        assert!(Cli::try_parse_from(["dantalian", "find"]).is_err());
    }
}
