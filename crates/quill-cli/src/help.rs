// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Help text for CLI commands.

use crate::output;

pub fn print_usage() {
    println!(
        "{} {} - form synthesis and accessor runtime tools",
        output::title("Quill"),
        output::version(env!("CARGO_PKG_VERSION"))
    );
    println!();
    println!(
        "{}: {} {} {}",
        output::section_header("Usage"),
        output::command("quill"),
        output::arg("<command>"),
        output::arg("[args]")
    );
    println!();
    println!("{}", output::section_header("Commands:"));
    println!(
        "  {} {} {}   Show the layout of a species",
        output::command("species"),
        output::arg("<key>"),
        output::arg("[--json] [--emit FILE]")
    );
    println!(
        "  {} {} {}      Print the form and code for a shape",
        output::command("shape"),
        output::arg("<sig> <kind>"),
        output::arg("[--mode MODE]")
    );
    println!("  {} {}                Write a holder unit of common shapes", output::command("pregen"), output::arg("<file>"));
    println!(
        "  {} {} {} List access modes for a value type",
        output::command("modes"),
        output::arg("<type>"),
        output::arg("[--memory] [--read-only] [--unaligned]")
    );
    println!("  {}                         Show this help", output::command("help"));
    println!("  {}                      Show version", output::command("version"));
    println!();
    println!("{}", output::section_header("Options:"));
    println!("  {}          Log at debug level to stderr", output::arg("-v, --verbose"));
    println!();
    println!("{}", output::section_header("Environment:"));
    println!("  {}                 Log filter (default: warn)", output::arg("QUILL_LOG"));
    println!("  {}  Calls before a form is compiled (default: 30)", output::arg("QUILL_COMPILE_THRESHOLD"));
    println!("  {}  Trace interpreted forms", output::arg("QUILL_TRACE_INTERPRETER"));
    println!("  {}              Pregenerated holder unit to load", output::arg("QUILL_HOLDER"));
}
