use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{bail, eyre, WrapErr};

use decomp_rs::assignment::Assignment;
use decomp_rs::config::SolverConfig;
use decomp_rs::formula::Formula;
use decomp_rs::manager::ComponentManager;
use decomp_rs::types::Lit;

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Input CNF in DIMACS format.
    #[arg(value_name = "FILE")]
    path: PathBuf,

    /// Literals assumed true before decomposing (DIMACS notation).
    #[clap(long, value_name = "LIT", allow_negative_numbers = true, value_delimiter = ',')]
    assume: Vec<i32>,

    /// Disable component caching.
    #[clap(long)]
    no_cache: bool,

    /// Cache table size (in bits, so the actual size is `2^bits` buckets).
    #[clap(long, value_name = "INT", default_value = "16")]
    cache_bits: usize,

    /// Log level.
    #[clap(long, value_name = "LEVEL", default_value = "info")]
    log: simplelog::LevelFilter,
}

/// Reads `p cnf <vars> <clauses>` followed by zero-terminated clauses.
fn parse_dimacs(text: &str) -> color_eyre::Result<Formula> {
    let mut formula: Option<Formula> = None;
    let mut clause: Vec<i32> = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('c') || line.starts_with('%') {
            continue;
        }
        if line.starts_with('p') {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() != 4 || parts[1] != "cnf" {
                bail!("line {}: malformed header '{}'", lineno + 1, line);
            }
            let num_vars: u32 = parts[2]
                .parse()
                .wrap_err_with(|| format!("line {}: bad variable count", lineno + 1))?;
            formula = Some(Formula::new(num_vars));
            continue;
        }
        let f = formula
            .as_mut()
            .ok_or_else(|| eyre!("line {}: clause before the 'p cnf' header", lineno + 1))?;
        for token in line.split_whitespace() {
            let lit: i32 = token
                .parse()
                .wrap_err_with(|| format!("line {}: bad literal '{}'", lineno + 1, token))?;
            if lit == 0 {
                f.add_clause(&clause)
                    .wrap_err_with(|| format!("line {}: bad clause {:?}", lineno + 1, clause))?;
                clause.clear();
            } else {
                clause.push(lit);
            }
        }
    }

    let mut formula = formula.ok_or_else(|| eyre!("missing 'p cnf' header"))?;
    if !clause.is_empty() {
        formula.add_clause(&clause)?;
    }
    Ok(formula)
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    simplelog::TermLogger::init(
        args.log,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    println!("args = {:?}", args);

    let time_total = std::time::Instant::now();

    let text = std::fs::read_to_string(&args.path).wrap_err_with(|| format!("reading {}", args.path.display()))?;
    let formula = parse_dimacs(&text)?;
    println!(
        "Formula: {} variables, {} long clauses, {} binary clauses, {} unit clauses",
        formula.num_variables(),
        formula.num_long_clauses(),
        formula.num_binary_clauses(),
        formula.unit_clauses().len()
    );

    let mut values = Assignment::new(formula.num_variables());
    for &lit in formula.unit_clauses().iter() {
        values.assign(lit);
    }
    for &a in &args.assume {
        let var = a.unsigned_abs();
        if a == 0 || var > formula.num_variables() {
            bail!("assumption {} is out of range", a);
        }
        values.assign(Lit::from_dimacs(a));
    }

    let config = SolverConfig::default()
        .with_caching(!args.no_cache)
        .with_cache_table_bits(args.cache_bits);
    let mut manager = ComponentManager::new(config);
    manager.initialize(&formula);

    let time_decompose = std::time::Instant::now();
    let mut top = manager.root_level();
    let found = manager.find_next_remaining_component_of(&mut top, &values);
    let elapsed = time_decompose.elapsed();

    if found {
        let ofs = top.remaining_components_ofs();
        println!("Found {} components:", manager.component_stack_size() - ofs);
        for index in ofs..manager.component_stack_size() {
            let comp = manager.component(index);
            let vars: Vec<u32> = comp.vars().map(|v| v.id()).collect();
            println!(
                "  [{}] {} variables, {} long clauses: {:?}",
                index,
                comp.num_variables(),
                comp.num_long_clauses(),
                vars
            );
        }
    } else if top.branch_found_unsat() {
        println!("Node is unsatisfiable");
    } else {
        println!("No components left");
    }
    println!("Multiplier so far: {}", top.branch_model_count(0));

    let cache = manager.cache();
    println!(
        "Cache: {} entries, {} lookups, {} hits, {} buckets",
        cache.num_entries(),
        cache.lookups(),
        cache.hits(),
        cache.table_size()
    );
    println!("Cache memory: {} bytes", manager.recompute_memory_usage());

    println!("Decomposition done in {:.3} ms", elapsed.as_secs_f64() * 1000.0);
    println!("All done in {:.3} s", time_total.elapsed().as_secs_f64());

    Ok(())
}
