//! CLI definition using clap derive.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use mosaic_core::{Layout, ProgressConfig, Theme};

#[derive(Parser, Debug)]
#[command(name = "mosaic", about = "Live multiplexed deploy console", version)]
pub struct Cli {
    /// JSON-lines event file (default: stdin)
    #[arg(long, short = 'i', value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Spinner tick interval in milliseconds
    #[arg(long, env = "MOSAIC_TICK_MS", default_value = "100")]
    pub tick_ms: u64,

    /// Disable colors (also set by a non-empty NO_COLOR)
    #[arg(long)]
    pub no_color: bool,

    /// NO_COLOR as found at startup; any non-empty value disables color.
    #[arg(skip = std::env::var_os("NO_COLOR"))]
    pub no_color_env: Option<OsString>,

    /// Resource type hidden from the footer; repeatable, replaces the defaults
    #[arg(long = "ignore-type", value_name = "TYPE")]
    pub ignore_types: Vec<String>,

    /// Sidebar width in columns, border included
    #[arg(long, default_value = "24")]
    pub sidebar_width: u16,

    /// Write logs here instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn theme(&self) -> Theme {
        let env_set = self.no_color_env.as_ref().is_some_and(|v| !v.is_empty());
        Theme {
            color: !(self.no_color || env_set),
        }
    }

    pub fn progress_config(&self) -> ProgressConfig {
        if self.ignore_types.is_empty() {
            ProgressConfig::default()
        } else {
            ProgressConfig {
                ignored_types: self.ignore_types.clone(),
            }
        }
    }

    pub fn layout(&self) -> Layout {
        Layout {
            sidebar_width: self.sidebar_width,
            ..Layout::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["mosaic"]).unwrap();
        assert!(cli.input.is_none());
        assert!(!cli.no_color);
        assert_eq!(cli.layout(), Layout::default());
        assert_eq!(cli.progress_config(), ProgressConfig::default());
    }

    #[test]
    fn any_non_empty_no_color_disables_color() {
        let mut cli = Cli::try_parse_from(["mosaic"]).unwrap();
        for value in ["1", "0", "false", "yes"] {
            cli.no_color_env = Some(value.into());
            assert!(!cli.theme().color, "NO_COLOR={value}");
        }
        cli.no_color_env = Some("".into());
        assert!(cli.theme().color);
        cli.no_color_env = None;
        assert!(cli.theme().color);
    }

    #[test]
    fn ignore_types_replace_defaults() {
        let cli = Cli::try_parse_from([
            "mosaic",
            "--ignore-type",
            "pulumi:providers:gcp",
            "--ignore-type",
            "sst:sst:Version",
        ])
        .unwrap();
        assert_eq!(
            cli.progress_config().ignored_types,
            vec!["pulumi:providers:gcp", "sst:sst:Version"]
        );
    }

    #[test]
    fn flags() {
        let cli = Cli::try_parse_from([
            "mosaic",
            "--input",
            "events.jsonl",
            "--no-color",
            "--sidebar-width",
            "30",
            "--tick-ms",
            "250",
        ])
        .unwrap();
        assert_eq!(cli.input.as_deref(), Some(std::path::Path::new("events.jsonl")));
        assert!(!cli.theme().color);
        assert_eq!(cli.layout().sidebar_width, 30);
        assert_eq!(cli.tick_ms, 250);
    }
}
