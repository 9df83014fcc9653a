//! wueste-gen CLI
//!
//! Commands:
//!   generate - Generate builders and factories from schema files
//!   schema   - Print the JSON schema of the config file
//!   version  - Print the version

use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wueste_gen::*;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    let result = match args[1].as_str() {
        "generate" => cmd_generate(&args[2..]),
        "schema" => cmd_schema(),
        "version" | "--version" | "-v" => {
            println!("wueste-gen {}", VERSION);
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            Err("Unknown command".into())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"
wueste-gen - Generate entity builders from JSON schemas

USAGE:
    wueste-gen <COMMAND> [OPTIONS]

COMMANDS:
    generate [OPTIONS]               Generate code for the given schema files
    schema                           Print JSON schema of the config file
    version                          Print version

GENERATE OPTIONS:
    --config <file.yaml>             Read settings from a YAML file (flags override it)
    --input-file <file>              Root schema file (repeatable)
    --include-dir <dir>              Extra directory searched for file:// refs (repeatable)
    --output-dir <dir>               Output directory (default: ./)
    --write-test-schema              Write the built-in SimpleType schema and generate it
    --eg-language <ts|go>            Target language (default: ts)
    --eg-indent <text>               Indentation step (default: two spaces)
    --eg-package <name>              Go package name
    --eg-from-wueste <path>          TypeScript import path of the wueste runtime
    --eg-from-result <path>          TypeScript import path of the Result type
    --provenance                     Head files with source, schema hash and timestamp
    --verbose                        Debug logging (RUST_LOG overrides)

EXAMPLES:
    wueste-gen generate --input-file schema/base.schema.json --output-dir src/generated
    wueste-gen generate --eg-language go --eg-package entity --input-file user.schema.json
    wueste-gen generate --write-test-schema --output-dir /tmp/out
"#
    );
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (tests, embedding) is not an error worth failing on.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}

fn cmd_generate(args: &[String]) -> Result<()> {
    init_logging(args.iter().any(|a| a == "--verbose"));

    let mut config = match flag_value(args, "--config")? {
        Some(path) => GeneratorConfig::from_yaml_file(&PathBuf::from(path))?,
        None => GeneratorConfig::default(),
    };
    apply_flags(&mut config, args)?;

    let written = render::run(&config)?;
    tracing::info!(files = written.len(), "done");
    Ok(())
}

fn apply_flags(config: &mut GeneratorConfig, args: &[String]) -> Result<()> {
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--write-test-schema" => config.write_test_schema = true,
            "--provenance" => config.entity.provenance = true,
            "--verbose" => {}
            _ => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| Error::Config(format!("{} expects a value", flag)))?
                    .clone();
                match flag {
                    "--config" => {}
                    "--input-file" => config.input_files.push(PathBuf::from(value)),
                    "--include-dir" => config.include_dirs.push(PathBuf::from(value)),
                    "--output-dir" => config.output_dir = PathBuf::from(value),
                    "--eg-language" => {
                        config.entity.language = Language::parse(&value).ok_or_else(|| {
                            Error::Config(format!("unknown language: {}", value))
                        })?
                    }
                    "--eg-indent" => config.entity.indent = value,
                    "--eg-package" => config.entity.package_name = value,
                    "--eg-from-wueste" => config.entity.from_wueste = value,
                    "--eg-from-result" => config.entity.from_result = value,
                    _ => return Err(Error::Config(format!("unknown option: {}", flag))),
                }
                i += 1;
            }
        }
        i += 1;
    }
    Ok(())
}

fn flag_value(args: &[String], flag: &str) -> Result<Option<String>> {
    match args.iter().position(|a| a == flag) {
        Some(i) => args
            .get(i + 1)
            .cloned()
            .map(Some)
            .ok_or_else(|| Error::Config(format!("{} expects a value", flag))),
        None => Ok(None),
    }
}

fn cmd_schema() -> Result<()> {
    println!("{}", GeneratorConfig::json_schema()?);
    Ok(())
}
