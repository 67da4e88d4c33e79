//! Entrypoint for CLI
use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
    string::FromUtf8Error,
};

use cd20::{
    prelude::*,
    scan::{Lexer, TokenKind},
    IMPL_VERSION,
};
use log::{error, info, warn};
use serde::Deserialize;

static USAGE: &str = r#"
usage: cd20c [--conf FILE] CMD FILE

commands:
    build   Compile the target CD20 source into an SM20 module
    lex     Print the tokens of the target CD20 source

options:
    --conf  YAML configuration file (default: cd20.yaml, when present)

examples:
    cd20c build sums.cd
    cd20c --conf debug.yaml build sums.cd
    cd20c lex sums.cd
"#;

static DEFAULT_CONF: &str = "cd20.yaml";

/// Command line configuration, loaded from YAML.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct CliConf {
    /// Write a program listing next to the source.
    listing: bool,
    listing_extension: String,
    module_extension: String,
    compile: CompileConf,
}

impl Default for CliConf {
    fn default() -> Self {
        Self {
            listing: true,
            listing_extension: "lst".to_string(),
            module_extension: "mod".to_string(),
            compile: CompileConf::default(),
        }
    }
}

impl CliConf {
    fn from_file(filepath: impl AsRef<Path>) -> Result<Self, CliError> {
        let file = fs::File::open(filepath.as_ref())?;
        let conf: CliConf = serde_yaml::from_reader(file)?;
        log::debug!("loaded configuration: {:#?}", conf);
        Ok(conf)
    }
}

#[derive(Debug)]
enum CliError {
    Cd20(Cd20Error),
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Utf8(FromUtf8Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cd20(err) => write!(f, "{}", err),
            Self::Io(err) => write!(f, "io error: {}", err),
            Self::Yaml(err) => write!(f, "configuration error: {}", err),
            Self::Utf8(err) => write!(f, "source is not valid utf-8: {}", err),
        }
    }
}

impl std::error::Error for CliError {}

impl From<Cd20Error> for CliError {
    fn from(err: Cd20Error) -> Self {
        CliError::Cd20(err)
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io(err)
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        CliError::Yaml(err)
    }
}

impl From<FromUtf8Error> for CliError {
    fn from(err: FromUtf8Error) -> Self {
        CliError::Utf8(err)
    }
}

fn read_source(filepath: impl AsRef<Path>) -> Result<String, CliError> {
    let file_bytes = fs::read(filepath.as_ref())?;
    Ok(String::from_utf8(file_bytes)?)
}

/// Compiles the source file, writing the listing and module next to it.
///
/// Returns whether the compile succeeded.
fn run_build(filepath: impl AsRef<Path>, conf: &CliConf) -> Result<bool, CliError> {
    let filepath = filepath.as_ref();
    info!("compiling {}", filepath.display());

    let source_code = read_source(filepath)?;

    let (module, annotations) = match compile_str(&source_code, &conf.compile) {
        Ok(compilation) => (Some(compilation.module), compilation.annotations),
        Err(Cd20Error::Compile(annotations)) => (None, annotations),
        Err(err) => return Err(err.into()),
    };

    for annotation in &annotations {
        match annotation.severity {
            Severity::Error => error!("{}", annotation),
            Severity::Warning => warn!("{}", annotation),
        }
    }

    if conf.listing {
        let listing_path = filepath.with_extension(&conf.listing_extension);
        fs::write(&listing_path, Listing::new(&source_code, &annotations).to_string())?;
        info!("wrote listing {}", listing_path.display());
    }

    match module {
        Some(module) => {
            let module_path = filepath.with_extension(&conf.module_extension);
            fs::write(&module_path, module)?;
            info!("wrote module {}", module_path.display());
            Ok(true)
        }
        None => {
            error!("compilation failed, no module written");
            Ok(false)
        }
    }
}

fn run_lexer(filepath: impl AsRef<Path>) -> Result<(), CliError> {
    info!("running lexer");

    let source_code = read_source(filepath)?;
    let mut lexer = Lexer::new(source_code.as_str());

    println!(" line:col  | token                | lexeme ");
    loop {
        let token = lexer.next_token();

        let line = token.line;
        let column = token.column;
        let kind = format!("{:?}", token.kind); // cannot format debug print {:?} into columns
        match &token.lexeme {
            Some(lexeme) => println!("{line:5}:{column: <4} {kind: <22} \"{lexeme}\""),
            None => println!("{line:5}:{column: <4} {kind: <22}"),
        }

        if matches!(token.kind, TokenKind::Eof) {
            break;
        }
    }

    Ok(())
}

fn main() -> Result<(), CliError> {
    if let Err(err) = simple_logger::SimpleLogger::new().env().init() {
        eprintln!("failed to initialise logger: {err}");
    }

    let Args { conf, cmd } = match parse_args() {
        Some(args) => args,
        None => {
            print_usage();
            // FreeBSD EX_USAGE (64)
            std::process::exit(64)
        }
    };

    let conf = match conf {
        Some(filepath) => CliConf::from_file(filepath)?,
        None if Path::new(DEFAULT_CONF).exists() => CliConf::from_file(DEFAULT_CONF)?,
        None => CliConf::default(),
    };

    match cmd {
        Cmd::Build { filepath } => {
            if !run_build(filepath, &conf)? {
                std::process::exit(1)
            }
        }
        Cmd::Lex { filepath } => run_lexer(filepath)?,
    }

    Ok(())
}

fn parse_args() -> Option<Args> {
    let mut args = env::args().skip(1).peekable();

    let conf = match args.peek().map(String::as_str) {
        Some("--conf") => {
            args.next();
            Some(PathBuf::from(consume_arg(&mut args)?))
        }
        _ => None,
    };

    let cmd = match args.next()?.as_str() {
        "build" => Cmd::Build {
            filepath: consume_arg(&mut args)?,
        },
        "lex" => Cmd::Lex {
            filepath: consume_arg(&mut args)?,
        },
        unknown => {
            eprintln!("unknown command '{unknown}'");
            return None;
        }
    };

    Some(Args { conf, cmd })
}

/// Consumes the next argument, if it exists.
fn consume_arg(mut args: impl Iterator<Item = String>) -> Option<String> {
    args.next()
}

fn print_usage() {
    println!("CD20 compiler v{IMPL_VERSION}");
    println!("{USAGE}");
}

struct Args {
    conf: Option<PathBuf>,
    cmd: Cmd,
}

enum Cmd {
    /// Compile file
    Build { filepath: String },
    /// Print tokens
    Lex { filepath: String },
}
