use std::{
    path::{Path, PathBuf},
    process::exit,
};

use anyhow::{Context, Result};
use log::{error, info};
use serde::Serialize;
use wsctl::{
    config::get_default_control_file, read_from_control, set_filename, ControlError,
    ControlFile,
};

#[derive(Debug, PartialEq)]
struct CommandArgs {
    control_file: Option<PathBuf>,
    positional: Vec<String>,
}

#[derive(Serialize)]
struct Dump<'a> {
    control_file: String,
    settings: Vec<Setting<'a>>,
}

#[derive(Serialize)]
struct Setting<'a> {
    key: &'a str,
    value: &'a str,
}

fn main() -> Result<()> {
    colog::init();
    let args = std::env::args().collect::<Vec<String>>();

    for arg in &args {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--version" | "-v" => {
                println!("{}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            _ => {} // Positional, or handled by parse_command_args
        }
    }

    let Some(command) = args.get(1) else {
        error!("Not enough arguments!");
        print_help();
        exit(exitcode::USAGE);
    };

    let cmd_args = match parse_command_args(&args[2..]) {
        Ok(x) => x,
        Err(e) => {
            error!("{}", e);
            exit(exitcode::USAGE);
        }
    };
    let control_file = cmd_args
        .control_file
        .clone()
        .unwrap_or_else(get_default_control_file);
    info!("Using control file {}", control_file.display());

    if let Err(e) = check_arity(command, &cmd_args) {
        error!("{}", e);
        print_help();
        exit(exitcode::USAGE);
    }

    let res = match command.as_str() {
        "get" => get(&control_file, &cmd_args.positional),
        "path" => path(&control_file, &cmd_args.positional),
        "list" => ControlFile::load(&control_file)
            .map_err(anyhow::Error::from)
            .map(|file| print!("{}", render_list(&file))),
        "dump" => ControlFile::load(&control_file)
            .map_err(anyhow::Error::from)
            .and_then(|file| render_dump(&control_file, &file))
            .map(|out| println!("{}", out)),
        cmd => {
            error!("Unknown command {}!", cmd);
            exit(exitcode::USAGE);
        }
    };

    if let Err(e) = res {
        error!("{:#}", e);
        exit(exit_code_for(&e));
    }
    Ok(())
}

fn get(control_file: &Path, settings: &[String]) -> Result<()> {
    for setting in settings {
        let value = read_from_control(control_file, setting)
            .context(format!("In reading setting {}", setting))?;
        println!("{}", value);
    }
    Ok(())
}

fn path(control_file: &Path, settings: &[String]) -> Result<()> {
    for setting in settings {
        let path = set_filename(control_file, setting)
            .context(format!("In resolving the filename for {}", setting))?;
        println!("{}", path.display());
    }
    Ok(())
}

fn render_list(file: &ControlFile) -> String {
    file.settings()
        .map(|(key, value)| format!("{} | {}\n", key, value))
        .collect()
}

fn render_dump(control_file: &Path, file: &ControlFile) -> Result<String> {
    let dump = Dump {
        control_file: control_file.display().to_string(),
        settings: file
            .settings()
            .map(|(key, value)| Setting { key, value })
            .collect(),
    };
    ron::ser::to_string_pretty(&dump, ron::ser::PrettyConfig::default())
        .context("In serializing the control file")
}

/// Splits `-c`/`--control <file>` from the remaining positional arguments.
fn parse_command_args(args: &[String]) -> Result<CommandArgs> {
    let mut control_file = None;
    let mut positional = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-c" | "--control" => {
                let file = iter
                    .next()
                    .ok_or(anyhow::anyhow!("{} needs a control file argument!", arg))?;
                control_file = Some(PathBuf::from(file));
            }
            _ => positional.push(arg.clone()),
        }
    }
    Ok(CommandArgs {
        control_file,
        positional,
    })
}

/// `get` and `path` need at least one setting, `list` and `dump` take none.
fn check_arity(command: &str, args: &CommandArgs) -> Result<()> {
    match command {
        "get" | "path" if args.positional.is_empty() => {
            anyhow::bail!("Not enough arguments!")
        }
        "get" | "path" => Ok(()),
        "list" | "dump" if !args.positional.is_empty() => anyhow::bail!(
            "{} takes no arguments, got {:?} (use -c to pick the control file)",
            command,
            args.positional
        ),
        "list" | "dump" => Ok(()),
        cmd => anyhow::bail!("Unknown command {}!", cmd),
    }
}

fn exit_code_for(e: &anyhow::Error) -> exitcode::ExitCode {
    match e.downcast_ref::<ControlError>() {
        Some(ControlError::FileNotFound { .. }) => exitcode::NOINPUT,
        Some(ControlError::Io { .. }) => exitcode::IOERR,
        Some(ControlError::SettingNotFound { .. })
        | Some(ControlError::MalformedLine { .. }) => exitcode::DATAERR,
        None => exitcode::SOFTWARE,
    }
}

fn print_help() {
    println!(
        "Usage: wsctl command [-c control_file] [settings...]
       wsctl get refraster basin_gru_shp -c control_bow.txt

Reads settings from a watershed control file.

Commands:
    get <setting>...    Prints the value of each setting
    path <setting>...   Prints the resolved filename for each setting
    list                Prints every setting in the control file
    dump                Prints the control file's settings as RON

Options:
    -c, --control       Control file to read, for every command (default: /etc/wsctl/control,
                        or control_active.txt)"
    );
}
