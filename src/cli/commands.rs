use clap::Parser;
use std::path::PathBuf;

/// Consolidated media-query stylesheet generation for breakpoint utility classes
#[derive(Parser, Debug)]
#[command(
    name = "breakwind",
    about = "Consolidated media-query stylesheet generation for breakpoint utility classes",
    version,
    long_about = "breakwind scans the files matched by your CSS engine configuration's \
                  `content` globs for breakpoint tokens such as `media-max-768:hidden`, \
                  resolves each utility class through the CSS engine, and writes one \
                  consolidated stylesheet of media-query rules. With --watch it \
                  regenerates on every file change."
)]
pub struct CliArgs {
    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        default_value = "./dynamic-breakpoints.css",
        help = "Output stylesheet path"
    )]
    pub output: PathBuf,

    #[arg(
        short = 'c',
        long,
        value_name = "FILE",
        default_value = "tailwind.config.js",
        help = "Path to the CSS engine configuration providing content globs"
    )]
    pub config: PathBuf,

    #[arg(short = 'w', long, help = "Watch the content globs and regenerate on change")]
    pub watch: bool,

    #[arg(
        short = 'p',
        long,
        value_name = "COMMAND",
        help = "Shell command to run after each successful generation"
    )]
    pub post_command: Option<String>,

    #[arg(long, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, help = "Verbose output (debug logging)")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_args_verify() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = CliArgs::parse_from(["breakwind"]);
        assert_eq!(args.output, PathBuf::from("./dynamic-breakpoints.css"));
        assert_eq!(args.config, PathBuf::from("tailwind.config.js"));
        assert!(!args.watch);
        assert!(args.post_command.is_none());
        assert!(!args.verbose);
        assert!(!args.quiet);
    }

    #[test]
    fn test_short_flags() {
        let args = CliArgs::parse_from([
            "breakwind",
            "-o",
            "dist/breakpoints.css",
            "-c",
            "tailwind.config.json",
            "-w",
            "-p",
            "echo done",
        ]);
        assert_eq!(args.output, PathBuf::from("dist/breakpoints.css"));
        assert_eq!(args.config, PathBuf::from("tailwind.config.json"));
        assert!(args.watch);
        assert_eq!(args.post_command, Some("echo done".to_string()));
    }

    #[test]
    fn test_long_flags() {
        let args = CliArgs::parse_from([
            "breakwind",
            "--output",
            "out.css",
            "--config",
            "config.toml",
            "--watch",
            "--post-command",
            "touch .done",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.output, PathBuf::from("out.css"));
        assert_eq!(args.config, PathBuf::from("config.toml"));
        assert!(args.watch);
        assert_eq!(args.post_command, Some("touch .done".to_string()));
        assert_eq!(args.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        let result = CliArgs::try_parse_from(["breakwind", "-v", "-q"]);
        assert!(result.is_err());
    }
}
