use std::io::{self, Read};

use rulemark::{parse, to_elements, to_html};

fn main() {
    env_logger::init();

    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let rendered = match config.format {
        Format::Html => to_html(&config.input).map_err(|err| err.to_string()),
        Format::Elements => to_elements(&config.input)
            .map_err(|err| err.to_string())
            .and_then(|tree| serde_json::to_string_pretty(&tree).map_err(|err| err.to_string())),
        Format::Ast => parse(&config.input).map(|ast| format!("{ast:#?}")).map_err(|err| err.to_string()),
    };

    match rendered {
        Ok(text) => println!("{text}"),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

enum Format {
    Html,
    Elements,
    Ast,
}

struct CliConfig {
    input: String,
    format: Format,
}

fn parse_format(value: &str) -> Result<Format, String> {
    match value {
        "html" => Ok(Format::Html),
        "elements" => Ok(Format::Elements),
        "ast" => Ok(Format::Ast),
        other => Err(format!("error: unknown format '{other}' (expected html, elements or ast)")),
    }
}

fn parse_args() -> Result<CliConfig, String> {
    let mut input: Option<String> = None;
    let mut format = Format::Html;
    let mut args = std::env::args().skip(1).peekable();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("rulemark {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--format" | "-f" => {
                let value = args.next().ok_or_else(|| "error: --format expects a value".to_string())?;
                format = parse_format(&value)?;
            }
            "--input" | "-i" => {
                let value = args.next().ok_or_else(|| "error: --input expects a value".to_string())?;
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(value);
            }
            "--" => {
                let rest = args.collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    if input.is_some() {
                        return Err("error: input provided multiple times".to_string());
                    }
                    input = Some(rest);
                }
                break;
            }
            _ if arg.starts_with("--format=") => {
                format = parse_format(arg.trim_start_matches("--format="))?;
            }
            _ if arg.starts_with("--input=") => {
                let value = arg.trim_start_matches("--input=");
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(value.to_string());
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                let rest = std::iter::once(arg).chain(args).collect::<Vec<_>>().join(" ");
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(rest);
                break;
            }
        }
    }

    let input = match input {
        Some(value) => value,
        None => read_stdin_input()?,
    };

    if input.trim().is_empty() {
        return Err(format!("error: no input provided\n\n{}", help_text()));
    }

    Ok(CliConfig { input, format })
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "rulemark {version}

Rule-driven Markdown parser and renderer CLI.

Usage:
  rulemark [OPTIONS] [--] <input...>
  rulemark [OPTIONS] --input <text>

Options:
  -i, --input <text>      Markdown to render. If omitted, reads remaining args
                          or stdin when no args are provided.
  -f, --format <format>   Output format: html (default), elements (JSON
                          element tree), or ast (parsed node tree).
  -h, --help              Show this help message.
  -V, --version           Print version information.

Exit codes:
  0  Success.
  1  Parse or render error.
  2  Invalid arguments or missing input.
",
        version = env!("CARGO_PKG_VERSION"),
    )
}
