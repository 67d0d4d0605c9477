//! # Telesync CLI
//!
//! Command-line utilities for testing topic filters and payload decoding.

use anyhow::{Context, Result};
use std::env;
use telesync_core::{Payload, TopicFilter};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "match" => {
            if args.len() < 4 {
                eprintln!("Usage: telesync match <pattern> <topic>");
                std::process::exit(1);
            }
            let filter = TopicFilter::parse(&args[2]).context("Invalid topic filter")?;
            if filter.matches(&args[3]) {
                println!("match");
            } else {
                println!("no match");
                std::process::exit(1);
            }
        }
        "decode" => {
            if args.len() < 3 {
                eprintln!("Usage: telesync decode <payload>");
                std::process::exit(1);
            }
            match Payload::from_text(&args[2]) {
                Payload::Json(value) => println!("json: {value}"),
                Payload::Text(text) => println!("text: {text}"),
            }
        }
        "help" | "--help" | "-h" => {
            print_help();
        }
        cmd => {
            eprintln!("Unknown command: {cmd}");
            print_help();
            std::process::exit(1);
        }
    }

    Ok(())
}

fn print_help() {
    println!(
        r#"Telesync CLI

USAGE:
    telesync <COMMAND> [OPTIONS]

COMMANDS:
    match <pattern> <topic>  Test whether a subscription pattern matches a topic
    decode <payload>         Show how a raw payload string decodes
    help                     Show this help message

EXAMPLES:
    telesync match "home/tele/room/+/temp" "home/tele/room/living/temp"
    telesync decode '{{"power": 120}}'
"#
    );
}
