use std::{env, process};

use backing_store::FileStore;
use log::debug;
use memory::PhysicalMemory;
use mmu::{parse_address, read_address_lines, Translation, Translator};

const DEFAULT_MEMORY_IMAGE: &str = "data/data_memory.txt";
const DEFAULT_BACKING_STORE: &str = "data/backing_store.txt";

struct Config {
    input: String,
    memory_image: String,
    backing_store: String,
}

fn print_help(program: &str) {
    eprintln!("Simulates virtual-to-physical address translation.");
    eprintln!();
    eprintln!(
        "Usage: {} <address | address-file.txt> [memory_image] [backing_store]",
        program
    );
    eprintln!();
    eprintln!("An argument ending in .txt is read as a list of addresses,");
    eprintln!("one per line; anything else is a single decimal or 0x-hex");
    eprintln!("address. The memory image defaults to {} and", DEFAULT_MEMORY_IMAGE);
    eprintln!("the backing store to {}.", DEFAULT_BACKING_STORE);
}

fn parse_args() -> Result<Config, String> {
    let args: Vec<String> = env::args().collect();
    let program = &args[0];

    let mut positional = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help(program);
                process::exit(0);
            }
            _ if arg.starts_with('-') => {
                return Err(format!("unknown option: {}", arg));
            }
            _ => positional.push(arg.clone()),
        }
    }

    if positional.is_empty() || positional.len() > 3 {
        print_help(program);
        return Err(format!("expected 1 to 3 arguments, got {}", positional.len()));
    }

    let mut positional = positional.into_iter();
    Ok(Config {
        input: positional.next().unwrap_or_default(),
        memory_image: positional
            .next()
            .unwrap_or_else(|| DEFAULT_MEMORY_IMAGE.to_string()),
        backing_store: positional
            .next()
            .unwrap_or_else(|| DEFAULT_BACKING_STORE.to_string()),
    })
}

fn main() {
    env_logger::init();

    let config = match parse_args() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(&config) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileStore::new(&config.backing_store);
    store.ensure_exists()?;
    let memory = PhysicalMemory::from_file(&config.memory_image)?;
    debug!("loaded memory image of {} words", memory.len());

    let mut translator = Translator::new(memory, store);

    let inputs = if config.input.ends_with(".txt") {
        read_address_lines(&config.input)?
    } else {
        vec![config.input.clone()]
    };

    // each address is translated and reported on its own; a failure
    // never aborts the rest of the batch
    for text in &inputs {
        println!();
        match parse_address(text) {
            Ok(address) => {
                println!("virtual address: {} ({:#x})", address, address);
                match translator.translate(address) {
                    Ok(translation) => report(&translation),
                    Err(e) => println!("error: {}", e),
                }
            }
            Err(e) => println!("error: {}", e),
        }
    }
    Ok(())
}

fn report(translation: &Translation) {
    match translation {
        Translation::Bit16(t) => {
            println!("page: {} | offset: {}", t.page, t.offset);
            report_flags(t.tlb_hit, t.page_hit, t.loaded_from_store);
            println!("value: {}", t.value);
        }
        Translation::Bit32(t) => {
            println!(
                "directory: {} | table: {} | offset: {}",
                t.directory, t.table, t.offset
            );
            report_flags(t.tlb_hit, t.page_hit, t.loaded_from_store);
            println!("value: {}", t.value);
        }
    }
}

fn report_flags(tlb_hit: bool, page_hit: bool, loaded_from_store: bool) {
    println!(
        "tlb {} | page {}{}",
        if tlb_hit { "hit" } else { "miss" },
        if page_hit { "hit" } else { "fault" },
        if loaded_from_store {
            " | loaded from backing store"
        } else {
            ""
        },
    );
}
