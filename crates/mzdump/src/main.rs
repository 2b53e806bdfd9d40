/*
    mzdasm
    Copyright 2024-2025 mzdasm contributors

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.
*/

//! mzdump: print the reachable instructions of an MZ executable.

use clap::Parser;
use mzdasm::prelude::*;
use std::{error::Error, fs::File, path::PathBuf, process::ExitCode};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The MZ executable to disassemble
    exe: PathBuf,

    /// Overlay file to splice into the image before walking
    #[arg(short, long)]
    overlay: Option<PathBuf>,

    /// Print the MZ header before the listing
    #[arg(long)]
    header: bool,

    /// Render mnemonics in uppercase
    #[arg(long)]
    uppercase: bool,
}

fn run(args: &Args) -> Result<ExitCode, Box<dyn Error>> {
    let mut exe = File::open(&args.exe)?;
    let header = MzHeader::read(&mut exe)?;
    if args.header {
        println!("{}", header);
    }

    let relocations = read_relocation_table(&mut exe, &header)?;
    if !relocations.is_empty() {
        // The image loads at segment zero, so the table needs no applying.
        log::debug!("{} relocation entries (unused at load segment zero)", relocations.len());
    }

    let mut program = load_program(&mut exe, &header)?;

    if let Some(overlay_path) = &args.overlay {
        let mut source = File::open(overlay_path)?;
        overlay(&mut program, &mut source)?;
    }

    let opts = FormatOptions {
        uppercase_mnemonic: args.uppercase,
        ..Default::default()
    };

    for item in program.instructions() {
        match item {
            Ok((address, instruction)) => {
                println!("{} {}", address, format_instruction(&instruction, &opts));
            }
            Err(e) => {
                eprintln!("{}", e);
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("mzdump: {}", e);
            ExitCode::FAILURE
        }
    }
}
