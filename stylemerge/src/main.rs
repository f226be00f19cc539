use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::fs;
use std::process::ExitCode;
use stylemerge_lib::dom::dom_tree::ElementNode;
use stylemerge_lib::generate::{self, Outcome};
use stylemerge_lib::{NamingOptions, Options};

const STYLEMERGE_INTRO: &str = r#"
       _        _
   ___| |_ _  _| |___ _ __  ___ _ _ __ _ ___
  (_-<|  _| || | / -_) '  \/ -_) '_/ _` / -_)
  /__/ \__|\_, |_\___|_|_|_\___|_| \__, \___|
           |__/                    |___/

    Merge, condense and obfuscate stylesheets without breaking markup.
"#;

#[derive(Parser)]
#[command(name = "stylemerge")]
#[command(about = "Merge, condense and obfuscate stylesheets")]
struct Args {
    /// More output on stderr (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Validate stylesheets with a full CSS parser and fail on syntax errors.
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct MarkupArgs {
    /// Markup file to rewrite with the resulting renames.
    #[arg(long)]
    markup: Option<String>,

    /// Where to write the rewritten markup (stdout when omitted).
    #[arg(long, requires = "markup")]
    markup_out: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Fold INCOMING into BASE, renaming colliding selectors.
    Merge {
        base: String,
        incoming: String,
        /// Placed between a name and its generated suffix.
        #[arg(long, default_value = "_")]
        separator: String,
        #[command(flatten)]
        markup: MarkupArgs,
    },
    /// Combine rules that carry identical styles.
    Condense {
        css: String,
        /// Keep one selector per combined rule and rename the others onto it.
        #[arg(long)]
        rename: bool,
        #[command(flatten)]
        markup: MarkupArgs,
    },
    /// Replace class and id names with short random ones.
    Obfuscate {
        css: String,
        #[arg(long)]
        seed: Option<u64>,
        /// Names to keep, e.g. `.active,#app`.
        #[arg(long, value_delimiter = ',')]
        ignore: Vec<String>,
        #[command(flatten)]
        markup: MarkupArgs,
    },
    /// Print the styles an element would receive.
    Styles {
        css: String,
        #[arg(long)]
        tag: String,
        #[arg(long)]
        id: Option<String>,
        #[arg(long = "class")]
        classes: Vec<String>,
    },
}

fn read(path: &str) -> stylemerge_lib::Result<String> {
    log::debug!("reading {}", path);
    Ok(fs::read_to_string(path)?)
}

fn read_markup(args: &MarkupArgs) -> stylemerge_lib::Result<Option<String>> {
    args.markup.as_deref().map(read).transpose()
}

fn emit(outcome: Outcome, args: &MarkupArgs) -> stylemerge_lib::Result<()> {
    print!("{}", outcome.css);
    for (from, to) in &outcome.renames {
        eprintln!("{} -> {}", from, to);
    }
    if let Some(markup) = outcome.markup {
        match &args.markup_out {
            Some(path) => fs::write(path, markup)?,
            None => println!("{}", markup),
        }
    }
    Ok(())
}

fn run(args: Args) -> stylemerge_lib::Result<()> {
    let mut options = Options {
        strict: args.strict,
        ..Options::default()
    };

    match args.command {
        Command::Merge {
            base,
            incoming,
            separator,
            markup,
        } => {
            options.naming = NamingOptions {
                separator,
                ..NamingOptions::default()
            };
            let markup_text = read_markup(&markup)?;
            let outcome = generate::merge(
                &read(&base)?,
                &read(&incoming)?,
                markup_text.as_deref(),
                &options,
            )?;
            emit(outcome, &markup)
        }
        Command::Condense {
            css,
            rename,
            markup,
        } => {
            let markup_text = read_markup(&markup)?;
            let outcome = generate::condense(&read(&css)?, markup_text.as_deref(), rename, &options)?;
            emit(outcome, &markup)
        }
        Command::Obfuscate {
            css,
            seed,
            ignore,
            markup,
        } => {
            options.seed = seed;
            let ignore: HashSet<String> = ignore.into_iter().collect();
            let markup_text = read_markup(&markup)?;
            let outcome =
                generate::obfuscate(&read(&css)?, markup_text.as_deref(), &ignore, &options)?;
            emit(outcome, &markup)
        }
        Command::Styles {
            css,
            tag,
            id,
            classes,
        } => {
            let mut element = ElementNode::new(&tag);
            if let Some(id) = id {
                element = element.with_attribute("id", &id);
            }
            if !classes.is_empty() {
                element = element.with_attribute("class", &classes.join(" "));
            }
            let styles = generate::styles_for(&read(&css)?, &element, &options)?;
            println!("{}", styles.style_attribute());
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    // parse the args given in terminal
    let args: Args = Args::parse();

    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    if args.verbose > 0 {
        eprintln!("{}", STYLEMERGE_INTRO);
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
