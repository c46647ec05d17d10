// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Quill CLI: inspect species layouts, generated shapes and accessor
//! capabilities, and pregenerate holder units.

mod commands;
mod help;
mod logging;
mod output;

use std::env;
use std::process;

use commands::{modes, pregen, shape, species};

fn main() {
    output::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let verbose = take_flag(&mut args, "-v") | take_flag(&mut args, "--verbose");
    logging::init(verbose);

    let Some(command) = args.first().cloned() else {
        help::print_usage();
        return;
    };
    let rest = &args[1..];
    tracing::debug!(command = %command, args = rest.len(), "dispatching");

    let result = match command.as_str() {
        "species" => species::run(rest),
        "shape" => shape::run(rest),
        "pregen" => pregen::run(rest),
        "modes" => modes::run(rest),
        "help" | "--help" | "-h" => {
            help::print_usage();
            Ok(())
        }
        "version" | "--version" | "-V" => {
            println!("quill {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            eprintln!("{}: unknown command `{}`", output::error_label(), other);
            help::print_usage();
            process::exit(1);
        }
    };

    if let Err(msg) = result {
        eprintln!("{}: {}", output::error_label(), msg);
        process::exit(1);
    }
}

/// Removes every occurrence of `flag`, reporting whether there was one.
pub(crate) fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    let before = args.len();
    args.retain(|a| a != flag);
    args.len() != before
}

/// Removes `option` and its value.
pub(crate) fn take_option(args: &mut Vec<String>, option: &str) -> Result<Option<String>, String> {
    let Some(pos) = args.iter().position(|a| a == option) else {
        return Ok(None);
    };
    if pos + 1 >= args.len() {
        return Err(format!("{} needs a value", option));
    }
    let value = args.remove(pos + 1);
    args.remove(pos);
    Ok(Some(value))
}

/// The single positional argument left after options are taken.
pub(crate) fn positional<'a>(args: &'a [String], usage: &str) -> Result<&'a str, String> {
    match args {
        [one] if !one.starts_with("--") => Ok(one),
        _ => Err(format!("usage: {}", usage)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn flags_and_options_are_removed() {
        let mut a = args(&["species", "LI", "--json", "--emit", "out.quil"]);
        assert!(take_flag(&mut a, "--json"));
        assert!(!take_flag(&mut a, "--json"));
        assert_eq!(take_option(&mut a, "--emit").unwrap(), Some("out.quil".to_string()));
        assert_eq!(a, args(&["species", "LI"]));
    }

    #[test]
    fn option_without_value_is_an_error() {
        let mut a = args(&["II_I", "--mode"]);
        assert!(take_option(&mut a, "--mode").is_err());
    }

    #[test]
    fn positional_rejects_leftovers() {
        assert_eq!(positional(&args(&["LI"]), "x").unwrap(), "LI");
        assert!(positional(&args(&["LI", "extra"]), "x").is_err());
        assert!(positional(&args(&["--bogus"]), "x").is_err());
        assert!(positional(&[], "x").is_err());
    }
}
