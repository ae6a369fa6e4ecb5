//! Command-line argument parsing for the news reader.

use std::env;
use std::path::PathBuf;

/// What to start playing once the UI is up
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Autoplay {
    None,
    All,
    /// Zero-based article index
    Article(usize),
}

/// Parsed command-line arguments.
#[derive(Debug)]
pub struct CliArgs {
    /// JSON article file
    pub articles_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub log_file: PathBuf,
    pub autoplay: Autoplay,
    /// Volume override in percent
    pub volume_percent: Option<u8>,
    pub no_ambient: bool,
    pub show_help: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            articles_path: None,
            config_path: None,
            log_file: env::temp_dir().join("news-reader.log"),
            autoplay: Autoplay::None,
            volume_percent: None,
            no_ambient: false,
            show_help: false,
        }
    }
}

impl CliArgs {
    /// Parse arguments from command line.
    pub fn parse() -> Self {
        Self::parse_from(env::args().skip(1))
    }

    pub fn parse_from<I>(argv: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = Self::default();
        let mut iter = argv.into_iter();

        while let Some(arg) = iter.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) if arg.starts_with("--") => (flag.to_string(), Some(value.to_string())),
                _ => (arg.clone(), None),
            };

            match flag.as_str() {
                "--help" | "-h" => {
                    args.show_help = true;
                }
                "--play-all" => {
                    args.autoplay = Autoplay::All;
                }
                "--no-ambient" => {
                    args.no_ambient = true;
                }
                "--article" | "--config" | "--volume" | "--log-file" => {
                    let Some(value) = inline.or_else(|| iter.next()) else {
                        eprintln!("{flag} requires an argument");
                        args.show_help = true;
                        continue;
                    };
                    args.apply_value(&flag, &value);
                }
                _ if arg.starts_with('-') => {
                    eprintln!("Unknown flag: {}", arg);
                    args.show_help = true;
                }
                _ => {
                    args.articles_path = Some(PathBuf::from(arg));
                }
            }
        }

        args
    }

    fn apply_value(&mut self, flag: &str, value: &str) {
        match flag {
            "--article" => match value.parse::<usize>() {
                Ok(n) if n >= 1 => self.autoplay = Autoplay::Article(n - 1),
                _ => {
                    eprintln!("--article expects a 1-based number, got {value}");
                    self.show_help = true;
                }
            },
            "--volume" => match value.parse::<u8>() {
                Ok(v) if v <= 100 => self.volume_percent = Some(v),
                _ => {
                    eprintln!("--volume expects 0-100, got {value}");
                    self.show_help = true;
                }
            },
            "--config" => self.config_path = Some(PathBuf::from(value)),
            "--log-file" => self.log_file = PathBuf::from(value),
            _ => {}
        }
    }

    /// Print help text to stderr.
    pub fn print_help() {
        eprintln!(
            "Usage:\n  news-reader [options] <articles.json>\n\n\
             Options:\n\
             \x20 --play-all           Start reading every article immediately\n\
             \x20 --article <n>        Start reading article n (1-based)\n\
             \x20 --volume <0-100>     Initial volume (default from config, 80)\n\
             \x20 --no-ambient         Disable the background tone\n\
             \x20 --config <file>      JSON configuration file\n\
             \x20 --log-file <file>    Log destination (default: <tmp>/news-reader.log)\n\
             \x20 -h, --help           Show this help\n\n\
             Article file:\n\
             \x20 A JSON array of {{\"title\": ..., \"body\": ...}} objects, or {{\"articles\": [...]}}.\n\n\
             Keys:\n\
             \x20 Up/Down select   Enter play   a play all   Space pause/resume\n\
             \x20 Esc stop   Left/Right previous/next   +/- volume   q quit\n\n\
             Speech requires espeak-ng on PATH. Set RUST_LOG to change log verbosity.\n"
        );
    }
}
