//! Burrow VM demo driver
//!
//! Small command-line front end for poking the machine: an echo loopback
//! through the TTY device and a dump of the hardware RNG.

use bvm::constants::DEFAULT_BANK_SIZE;
use bvm::machine::mmio::{RNG, RNG_SEED};
use bvm::machine::Machine;
use bvm::rt;
use bvm_common::{BankId, FatPtr, MachineError};
use clap::{Parser, Subcommand};
use std::io::{self, Read, Write};

#[derive(Parser)]
#[command(name = "bvm")]
#[command(about = "Burrow VM banked-memory runtime demo")]
#[command(version = "0.1.0")]
struct Cli {
    /// Words per memory bank
    #[arg(long, default_value_t = DEFAULT_BANK_SIZE)]
    bank_size: u16,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Echo bytes through the TTY device (getchar/putchar loopback)
    Echo {
        /// Bytes to queue; reads stdin to EOF when omitted
        #[arg(short, long)]
        input: Option<String>,
    },

    /// Read words from the hardware RNG
    Rand {
        /// How many words to read
        #[arg(short, long, default_value_t = 8)]
        count: usize,

        /// Seed written to the RNG_SEED register first
        #[arg(short, long)]
        seed: Option<u16>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Echo { input } => run_echo(cli.bank_size, input),
        Commands::Rand { count, seed } => run_rand(cli.bank_size, count, seed),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run_echo(bank_size: u16, input: Option<String>) -> Result<(), MachineError> {
    let mut machine = Machine::new(bank_size);

    let pending = match input {
        Some(s) => {
            machine.push_input_str(&s);
            s.len()
        }
        None => {
            let mut buf = Vec::new();
            let _ = io::stdin().read_to_end(&mut buf);
            for &byte in &buf {
                machine.push_input(byte);
            }
            buf.len()
        }
    };

    for _ in 0..pending {
        let c = rt::getchar(&mut machine)?;
        rt::putchar(&mut machine, c)?;
    }

    let out = machine.take_output();
    let _ = io::stdout().write_all(&out);
    let _ = io::stdout().flush();
    Ok(())
}

fn run_rand(bank_size: u16, count: usize, seed: Option<u16>) -> Result<(), MachineError> {
    let mut machine = Machine::new(bank_size);

    if let Some(seed) = seed {
        machine.store(FatPtr::new(BankId::MMIO, RNG_SEED), seed)?;
    }

    let rng = FatPtr::new(BankId::MMIO, RNG);
    for _ in 0..count {
        let word = machine.load(rng)?;
        println!("{word:#06x}");
    }
    Ok(())
}
