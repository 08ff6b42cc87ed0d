use std::fs;
use std::io::{self, Read};

use anyhow::{Context, Result, bail};
use j2py::{Options, translate};

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let mut options = Options::default();
    let mut input_path: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--warn" | "-w" => options.fatal = false,
            "--private" | "-p" => options.private = true,
            "--plain-eq" => options.plain_eq = true,
            _ => {
                input_path = Some(arg);
                if args.next().is_some() {
                    bail!("Only one input file is supported");
                }
                break;
            }
        }
    }

    let source = if let Some(path) = input_path {
        fs::read_to_string(&path).with_context(|| format!("Reading {path}"))?
    } else {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Reading stdin")?;
        buffer
    };

    let output = translate(&source, &options)?;
    print!("{output}");
    Ok(())
}
