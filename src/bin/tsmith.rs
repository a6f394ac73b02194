use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use textsmith::{
    CleanOptions, CleanOutput, Engine, FormatOptions, Indent, JsMinifyOptions, MinifyOptions,
};

/// Transform JSON and JavaScript snippets from the terminal.
///
/// tsmith reads text from stdin or a file and writes the transformed result
/// to stdout or a file. Large inputs are handed to a background worker
/// automatically.
#[derive(Parser, Debug)]
#[command(name = "tsmith")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct IoArgs {
    /// Input file. If not specified, reads from stdin.
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Output file. If not specified, writes to stdout.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pretty-print JSON.
    Format {
        /// Spaces per indentation level.
        #[arg(short, long, default_value = "2")]
        indent: usize,
        /// Indent with tabs instead of spaces.
        #[arg(short, long)]
        tabs: bool,
        /// Sort object keys lexicographically at every level.
        #[arg(short, long)]
        sort_keys: bool,
        #[command(flatten)]
        io: IoArgs,
    },
    /// Compact JSON.
    Minify {
        /// Keep a minimal one-space indent instead of fully compacting.
        #[arg(long)]
        keep_spaces: bool,
        /// Sort object keys lexicographically at every level.
        #[arg(short, long)]
        sort_keys: bool,
        #[command(flatten)]
        io: IoArgs,
    },
    /// Remove null/empty values from JSON.
    Clean {
        /// Keep null values.
        #[arg(long)]
        keep_nulls: bool,
        /// Keep "undefined" string sentinels.
        #[arg(long)]
        keep_undefined: bool,
        /// Keep empty strings.
        #[arg(long)]
        keep_empty_strings: bool,
        /// Also remove arrays that are or become empty.
        #[arg(long)]
        remove_empty_arrays: bool,
        /// Also remove objects that are or become empty.
        #[arg(long)]
        remove_empty_objects: bool,
        /// Minify the cleaned output instead of formatting it.
        #[arg(short, long)]
        minify: bool,
        #[command(flatten)]
        io: IoArgs,
    },
    /// Evaluate a JSONPath expression.
    Path {
        /// JSONPath expression, e.g. '$.users[*].name'.
        #[arg(short, long, value_name = "EXPR")]
        query: String,
        #[command(flatten)]
        io: IoArgs,
    },
    /// Re-indent JavaScript.
    JsFormat {
        /// Spaces per indentation level.
        #[arg(short, long, default_value = "2")]
        indent: usize,
        #[command(flatten)]
        io: IoArgs,
    },
    /// Minify JavaScript.
    JsMinify {
        /// Keep comments.
        #[arg(long)]
        keep_comments: bool,
        /// Keep whitespace.
        #[arg(long)]
        keep_spaces: bool,
        #[command(flatten)]
        io: IoArgs,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("tsmith: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let engine = Engine::new();

    let (io, output) = match cli.command {
        Command::Format { indent, tabs, sort_keys, io } => {
            let input = read_input(&io)?;
            let options = FormatOptions {
                indent: if tabs { Indent::Tab } else { Indent::Spaces(indent) },
                sort_keys,
                auto_copy: false,
            };
            let out = engine.format_json(&input, &options)?;
            (io, out)
        }
        Command::Minify { keep_spaces, sort_keys, io } => {
            let input = read_input(&io)?;
            let options = MinifyOptions {
                remove_spaces: !keep_spaces,
                sort_keys,
                auto_copy: false,
            };
            let out = engine.minify_json(&input, &options)?;
            (io, out)
        }
        Command::Clean {
            keep_nulls,
            keep_undefined,
            keep_empty_strings,
            remove_empty_arrays,
            remove_empty_objects,
            minify,
            io,
        } => {
            let input = read_input(&io)?;
            let options = CleanOptions {
                remove_null: !keep_nulls,
                remove_undefined: !keep_undefined,
                remove_empty_string: !keep_empty_strings,
                remove_empty_array: remove_empty_arrays,
                remove_empty_object: remove_empty_objects,
                output: if minify { CleanOutput::Minify } else { CleanOutput::Format },
                auto_copy: false,
            };
            let out = engine.clean_json(&input, &options)?;
            (io, out)
        }
        Command::Path { query, io } => {
            let input = read_input(&io)?;
            let out = engine.json_path(&input, &query)?;
            (io, out)
        }
        Command::JsFormat { indent, io } => {
            let input = read_input(&io)?;
            let out = engine.js_format(&input, indent)?;
            (io, out)
        }
        Command::JsMinify { keep_comments, keep_spaces, io } => {
            let input = read_input(&io)?;
            let options = JsMinifyOptions {
                remove_comments: !keep_comments,
                remove_spaces: !keep_spaces,
            };
            let out = engine.js_minify(&input, &options)?;
            (io, out)
        }
    };

    write_output(&io, &output)
}

fn read_input(io_args: &IoArgs) -> Result<String, Box<dyn std::error::Error>> {
    match &io_args.file {
        Some(path) => Ok(fs::read_to_string(path)
            .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn write_output(io_args: &IoArgs, output: &str) -> Result<(), Box<dyn std::error::Error>> {
    match &io_args.output {
        Some(path) => fs::write(path, output)
            .map_err(|e| format!("cannot write '{}': {}", path.display(), e))?,
        None => {
            let mut stdout = io::stdout();
            stdout.write_all(output.as_bytes())?;
            if !output.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}
