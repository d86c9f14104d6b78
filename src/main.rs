use std::env;
use std::error::Error;
use std::process;

use paged_memory::io::{read_trace, run_trace, write_results};
use paged_memory::translation::MemoryLayout;
use paged_memory::vm_manager::VmManager;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <trace_file> <output_file>", args[0]);
        process::exit(1);
    }

    if let Err(e) = run(&args[1], &args[2]) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(trace_file: &str, output_file: &str) -> Result<(), Box<dyn Error>> {
    let ops = read_trace(trace_file)?;
    let mut vm = VmManager::new(MemoryLayout::default());
    let results = run_trace(&mut vm, &ops)?;
    write_results(output_file, &results)?;
    Ok(())
}
