use std::io::Write;
use std::process;

use clap::Parser;
use env_logger::Builder;
use rand::prelude::*;
use rand_pcg::Pcg64;

use washsim_laundromat::{LaundromatSimulation, Scenario, StudentSpec};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to a scenario file (YAML); a random scenario is generated if omitted
    #[clap(long)]
    scenario: Option<String>,

    /// Number of students in the generated scenario
    #[clap(long, default_value_t = 10)]
    students: u32,

    /// Number of washing machines in the generated scenario
    #[clap(long, default_value_t = 3)]
    machines: u32,

    /// Random seed
    #[clap(long, default_value_t = 123)]
    seed: u64,

    /// Dump the simulation trace to this file (JSON)
    #[clap(long)]
    trace_out: Option<String>,
}

fn generate_scenario(student_count: u32, machine_count: u32, seed: u64) -> Scenario {
    let mut rand = Pcg64::seed_from_u64(seed);
    let students = (0..student_count)
        .map(|_| StudentSpec {
            arrival_time: rand.gen_range(0..=30),
            wash_time: rand.gen_range(1..=10),
            patience: rand.gen_range(0..=10),
        })
        .collect();
    Scenario {
        machine_count,
        students,
    }
}

fn main() {
    let args = Args::parse();

    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let scenario = match &args.scenario {
        Some(path) => match Scenario::from_yaml_file(path) {
            Ok(scenario) => scenario,
            Err(e) => {
                eprintln!("laundromat: {}", e);
                process::exit(1);
            }
        },
        None => generate_scenario(args.students, args.machines, args.seed),
    };

    let mut sim = match LaundromatSimulation::new(&scenario, args.seed) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("laundromat: {}", e);
            process::exit(1);
        }
    };
    let stats = sim.run();

    if let Some(path) = &args.trace_out {
        let json = sim
            .journal()
            .borrow()
            .to_json()
            .expect("failed to serialize trace");
        if let Err(e) = std::fs::write(path, json) {
            eprintln!("laundromat: failed to write trace to {}: {}", path, e);
            process::exit(1);
        }
    }

    println!("{}", stats.abandoned);
    println!("{}", if stats.needs_more_machines { "Yes" } else { "No" });
}
