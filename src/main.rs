// Entry point: configure logging, start the ledger and discovery services,
// then hand stdin to the interactive loop
use clap::Parser;
use log::{error, LevelFilter};
use peerpay::{BalanceLedger, Keyboard, Opt, PartialConfig, PeerDirectory};
use std::io;
use std::process;

fn main() {
    let opt = Opt::parse();

    if let Err(e) = run(opt) {
        error!("Error: {e}");
        eprintln!("{e}");
        process::exit(1);
    }
}

fn run(opt: Opt) -> Result<(), Box<dyn std::error::Error>> {
    // file < environment < flags
    let mut layers = PartialConfig::default();
    if let Some(path) = &opt.config {
        layers = PartialConfig::from_file(path)?;
    }
    let (config, settings) = layers
        .merge(PartialConfig::from_env())
        .merge(PartialConfig::from_flags(opt.name, opt.addr, opt.debug))
        .build()?;

    let level = if config.debug() {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::builder().filter_level(level).init();

    // the ledger binds first: a bad address must stop startup
    let ledger = BalanceLedger::new(config.addr())?;
    let directory = PeerDirectory::with_settings(config.name(), config.addr(), settings)?;

    println!("Welcome to your peering relationship!");
    let keyboard = Keyboard::new(&ledger, &directory);
    keyboard.run(io::stdin().lock(), io::stdout())?;
    Ok(())
}
