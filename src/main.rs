use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use stset::words::{self, DEFAULT_DICTIONARY_CAPACITY, Dictionary, WordCounts, WordsError};

mod bench;
mod hashers;

const DEFAULT_DICTIONARY: &str = "./sorted.bin";

const USAGE: &str = "\
Usage: stset [-v...] [-q] words <text-file> [dictionary-file]
       stset [-v...] [-q] bench

words  print every distinct word of <text-file> missing from the NUL-separated
       dictionary (default ./sorted.bin), then word counts
bench  time unique-counting against other set implementations";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Words { text: PathBuf, dictionary: PathBuf },
    Bench,
}

#[derive(Debug, PartialEq, Eq)]
struct Options {
    verbosity: usize,
    quiet: bool,
    command: Command,
}

impl Options {
    fn parse(args: &[String]) -> Option<Self> {
        let mut verbosity = 0;
        let mut quiet = false;
        let mut positional = Vec::new();
        for arg in args {
            match arg.as_str() {
                "-q" | "--quiet" => quiet = true,
                flag if is_verbose_flag(flag) => verbosity += flag.len() - 1,
                _ => positional.push(arg.as_str()),
            }
        }
        let command = match positional.as_slice() {
            ["words", text] => Command::Words {
                text: PathBuf::from(*text),
                dictionary: PathBuf::from(DEFAULT_DICTIONARY),
            },
            ["words", text, dictionary] => Command::Words {
                text: PathBuf::from(*text),
                dictionary: PathBuf::from(*dictionary),
            },
            ["bench"] => Command::Bench,
            _ => return None,
        };
        Some(Self {
            verbosity,
            quiet,
            command,
        })
    }
}

/// `-v`, `-vv`, ...
fn is_verbose_flag(arg: &str) -> bool {
    arg.len() > 1 && arg.starts_with('-') && arg[1..].bytes().all(|b| b == b'v')
}

fn run_words(text_path: &Path, dictionary_path: &Path) -> Result<WordCounts, WordsError> {
    let dictionary_buf = words::read_file(dictionary_path)?;
    let mut text = words::read_file(text_path)?;
    words::lowercase(&mut text);

    let dictionary = Dictionary::from_nul_separated(&dictionary_buf, DEFAULT_DICTIONARY_CAPACITY);

    let mut out = BufWriter::new(io::stdout().lock());
    let mut written: io::Result<()> = Ok(());
    let counts = words::report(&text, &dictionary, |word| {
        if written.is_ok() {
            written = out.write_all(word).and_then(|()| out.write_all(b"\n"));
        }
    });
    written.map_err(WordsError::Write)?;

    writeln!(out, "\nTotal words: {}", counts.total)
        .and_then(|()| writeln!(out, "Unique words: {}", counts.unique))
        .and_then(|()| writeln!(out, "Number of non-english words: {}", counts.unknown))
        .and_then(|()| out.flush())
        .map_err(WordsError::Write)?;
    Ok(counts)
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(options) = Options::parse(&args) else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };

    if let Err(err) = stderrlog::new()
        .module("stset")
        .quiet(options.quiet)
        .verbosity(options.verbosity + 1)
        .init()
    {
        eprintln!("warning: logger already initialized: {err}");
    }

    // Bind the probe engine before any work starts.
    log::debug!("group alignment: {}", stset::get_alignment());
    log::debug!("cpu features: {}", stset::dispatch::dispatch().features());

    match options.command {
        Command::Words { text, dictionary } => match run_words(&text, &dictionary) {
            Ok(counts) => {
                log::info!("{counts:?}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                log::error!("{err}");
                eprintln!("{err}");
                ExitCode::FAILURE
            }
        },
        Command::Bench => {
            bench::run();
            ExitCode::SUCCESS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Option<Options> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        Options::parse(&args)
    }

    #[test]
    fn parses_words_with_default_dictionary() {
        let options = parse(&["words", "book.txt"]).unwrap();
        assert_eq!(
            options.command,
            Command::Words {
                text: PathBuf::from("book.txt"),
                dictionary: PathBuf::from(DEFAULT_DICTIONARY),
            }
        );
        assert_eq!(options.verbosity, 0);
        assert!(!options.quiet);
    }

    #[test]
    fn parses_flags_anywhere() {
        let options = parse(&["-vv", "words", "-v", "a.txt", "dict.bin", "-q"]).unwrap();
        assert_eq!(options.verbosity, 3);
        assert!(options.quiet);
        assert_eq!(
            options.command,
            Command::Words {
                text: PathBuf::from("a.txt"),
                dictionary: PathBuf::from("dict.bin"),
            }
        );
    }

    #[test]
    fn rejects_bad_usage() {
        assert_eq!(parse(&[]), None);
        assert_eq!(parse(&["words"]), None);
        assert_eq!(parse(&["bench", "extra"]), None);
        assert_eq!(parse(&["frobnicate"]), None);
        assert_eq!(parse(&["bench"]).map(|o| o.command), Some(Command::Bench));
    }

    #[test]
    fn words_end_to_end() {
        let dir = std::env::temp_dir().join(format!("stset-words-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let text = dir.join("text.txt");
        let dictionary = dir.join("dict.bin");
        std::fs::write(&text, b"Hello hello World, blorp!").unwrap();
        std::fs::write(&dictionary, b"hello\0world\0").unwrap();

        let counts = run_words(&text, &dictionary).unwrap();
        assert_eq!(
            counts,
            WordCounts {
                total: 4,
                unique: 3,
                unknown: 1,
            }
        );

        let missing = run_words(&dir.join("nope.txt"), &dictionary).unwrap_err();
        assert!(matches!(missing, WordsError::Read { .. }));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
