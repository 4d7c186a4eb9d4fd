use clap::Parser;
use simple_logger::SimpleLogger;

use espprc::error::SolveError;
use espprc::explorer::IterationBudget;
use espprc::instance::Instance;
use espprc::lower_bound::{CachingOracle, KnapsackOracle};

/// Solves an ESPPRC instance with the bidirectional labeling search.
#[derive(Parser, Debug)]
struct Args {
    /// Path to a JSON instance file (mutually exclusive with --random).
    instance: Option<String>,

    /// Generate a random instance with this many nodes instead of loading one.
    #[arg(long)]
    random: Option<usize>,

    /// Number of resources for --random (ignored otherwise).
    #[arg(long, default_value_t = 1)]
    resources: usize,

    /// Seed for --random.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Cap on explorer iterations before giving up and returning the best
    /// tour found so far.
    #[arg(long)]
    max_iterations: Option<usize>,
}

fn main() {
    SimpleLogger::new().init().unwrap();
    let args = Args::parse();

    let instance = match (&args.instance, args.random) {
        (Some(path), _) => Instance::load(path).unwrap_or_else(|e| {
            eprintln!("failed to load {}: {}", path, e);
            std::process::exit(2);
        }),
        (None, Some(n)) => Instance::random(n, args.resources, args.seed),
        (None, None) => {
            eprintln!("usage: espprc-solve <instance.json> | --random N [--resources K] [--seed S]");
            std::process::exit(2);
        }
    };

    let graph = instance.build_graph().unwrap_or_else(|e| {
        eprintln!("invalid instance: {}", e);
        std::process::exit(2);
    });

    let oracle = CachingOracle::new(KnapsackOracle, 0.5);
    let budget = match args.max_iterations {
        Some(n) => IterationBudget::max_iterations(n),
        None => IterationBudget::unbounded(),
    };

    match espprc::solve(&graph, &oracle, budget) {
        Ok(solution) => {
            println!(
                "path: {:?}\ncost: {}\noptimal: {}",
                solution.path, solution.cost, solution.optimal
            );
        }
        Err(SolveError::Infeasible) => {
            eprintln!("no elementary path from 0 to 0 respects all resource bounds");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("solve failed: {}", e);
            std::process::exit(2);
        }
    }
}
