use std::io;
use std::path::PathBuf;

use clap::builder::Styles;
use clap::builder::styling::AnsiColor::{BrightBlue, White, Yellow};
use clap::{Parser, ValueEnum};
use clap_complete::Generator;
use clap_complete::shells::{Bash, Elvish, Fish, PowerShell, Zsh};
use clap_complete_nushell::Nushell;
use modgrab_component::ModQuery;
use modgrab_target::platform::{GameVersion, Loader};

/// Styling for [`clap`]'s CLI interface.
const STYLES: Styles = Styles::styled()
    .usage(Yellow.on_default().bold())
    .literal(BrightBlue.on_default().bold())
    .placeholder(White.on_default().bold())
    .header(Yellow.on_default().bold());

#[derive(Parser, Debug)]
#[command(version, author, about, styles(STYLES))]
pub struct Options {
    #[command(subcommand)]
    pub subcommand: Subcommand,

    /// How to print the results.
    #[arg(short, long, global = true, value_enum, default_value_t)]
    pub output_format: OutputFormat,
}

#[derive(clap::Subcommand, Debug)]
pub enum Subcommand {
    /// Resolve and download mods into the destination directory.
    #[clap(visible_alias("get"))]
    Fetch(FetchArguments),

    /// Generate shell completions for this tool.
    Completions {
        /// Which shell to generate completions for.
        #[arg(short, long, value_enum)]
        shell: Shell,
    },
}

#[derive(clap::Args, Debug)]
pub struct FetchArguments {
    /// Display names of mods to fetch, as you'd type them into a search bar.
    ///
    /// These are added after the ones from the manifest and `--mods-file`.
    pub mods: Vec<ModQuery>,

    /// Read the run configuration from this file instead of `modgrab.yml`.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Where to put downloaded mods. Created if it doesn't exist.
    #[arg(short, long)]
    pub destination: Option<PathBuf>,

    /// Which modloader to fetch mods for.
    #[arg(short, long)]
    pub loader: Option<Loader>,

    /// Which game version to fetch mods for, exactly as the registry spells
    /// it (`1.21.11`, `25w14a`).
    #[arg(short, long)]
    pub game_version: Option<GameVersion>,

    /// A plain text file with one mod name per line.
    #[arg(short, long)]
    pub mods_file: Option<PathBuf>,

    /// Seconds to wait for each registry request.
    #[arg(long, value_name = "SECONDS")]
    pub metadata_timeout: Option<u64>,

    /// Seconds to wait for each artifact download.
    #[arg(long, value_name = "SECONDS")]
    pub download_timeout: Option<u64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Human,
    Yaml,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
#[expect(clippy::enum_variant_names, reason = "PowerShell")]
pub enum Shell {
    Bash,
    Elvish,
    Fish,
    PowerShell,
    Zsh,
    Nushell,
}

impl Generator for Shell {
    fn file_name(&self, name: &str) -> String {
        match self {
            Self::Bash => Bash.file_name(name),
            Self::Elvish => Elvish.file_name(name),
            Self::Fish => Fish.file_name(name),
            Self::PowerShell => PowerShell.file_name(name),
            Self::Zsh => Zsh.file_name(name),
            Self::Nushell => Nushell.file_name(name),
        }
    }

    fn generate(&self, cmd: &clap::Command, buf: &mut dyn io::Write) {
        match self {
            Self::Bash => Bash.generate(cmd, buf),
            Self::Elvish => Elvish.generate(cmd, buf),
            Self::Fish => Fish.generate(cmd, buf),
            Self::PowerShell => PowerShell.generate(cmd, buf),
            Self::Zsh => Zsh.generate(cmd, buf),
            Self::Nushell => Nushell.generate(cmd, buf),
        }
    }
}
