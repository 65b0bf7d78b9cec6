//! duke-calc CLI - evaluate formulas and cell scripts

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use duke_calc::prelude::*;
use duke_calc::{parse_formula_with_options, tokenize, ParseOptions};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "duke-calc")]
#[command(author, version, about = "Spreadsheet formula engine tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the tokens of a formula
    Tokens {
        /// Formula text, e.g. "=SUM(A1:A3)*2"
        formula: String,
    },

    /// Print the parsed form of a formula, fully parenthesized
    Ast {
        /// Formula text
        formula: String,

        /// Maximum nesting depth
        #[arg(long, default_value_t = duke_calc::DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },

    /// Evaluate a formula that references no cells
    Eval {
        /// Formula text
        formula: String,
    },

    /// Run a cell script and print the resulting cells
    ///
    /// Each line assigns one cell, e.g. `A1: 5` or `B1: =A1+1`. Blank lines
    /// and lines starting with `#` are skipped.
    Run {
        /// Script file
        input: PathBuf,

        /// Report cells whose references loop back on themselves
        #[arg(long)]
        check_cycles: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Tokens { formula } => show_tokens(&formula),
        Commands::Ast { formula, max_depth } => show_ast(&formula, max_depth),
        Commands::Eval { formula } => eval_formula(&formula),
        Commands::Run {
            input,
            check_cycles,
        } => {
            let output = run_file(&input, check_cycles)?;
            print!("{}", output);
            Ok(())
        }
    }
}

fn show_tokens(formula: &str) -> Result<()> {
    for token in tokenize(formula) {
        println!("{:>4}  {:<12} {:?}", token.position, token.kind, token.text);
    }
    Ok(())
}

fn show_ast(formula: &str, max_depth: usize) -> Result<()> {
    let ast = parse_formula_with_options(formula, &ParseOptions { max_depth })
        .with_context(|| format!("Failed to parse '{}'", formula))?;
    println!("{}", ast);
    Ok(())
}

fn eval_formula(formula: &str) -> Result<()> {
    let engine = FormulaEngine::new();
    let value = engine
        .evaluate(formula)
        .with_context(|| format!("Failed to evaluate '{}'", formula))?;
    println!("{}", CellValue::from(value));
    Ok(())
}

/// One assignment from a cell script
#[derive(Debug, Clone, PartialEq)]
struct Assignment {
    cell: CellAddress,
    value: CellValue,
    formula: Option<String>,
}

fn run_file(path: &Path, check_cycles: bool) -> Result<String> {
    let script = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    let assignments =
        parse_script(&script).with_context(|| format!("Invalid script '{}'", path.display()))?;
    run_script(&assignments, check_cycles)
}

fn parse_script(script: &str) -> Result<Vec<Assignment>> {
    let mut assignments = Vec::new();

    for (index, line) in script.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((cell, content)) = line.split_once(':') else {
            bail!("line {}: expected 'CELL: value', got '{}'", index + 1, line);
        };
        let cell = CellAddress::parse(cell)
            .with_context(|| format!("line {}: bad cell address", index + 1))?;
        let content = content.trim();

        let assignment = if content.starts_with('=') {
            Assignment {
                cell,
                value: CellValue::default(),
                formula: Some(content.to_string()),
            }
        } else {
            Assignment {
                cell,
                value: parse_literal(content),
                formula: None,
            }
        };
        assignments.push(assignment);
    }

    Ok(assignments)
}

fn parse_literal(text: &str) -> CellValue {
    if let Some(inner) = text.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
        return CellValue::string(inner);
    }
    match text {
        "TRUE" => CellValue::Boolean(true),
        "FALSE" => CellValue::Boolean(false),
        _ => text
            .parse::<f64>()
            .map(CellValue::Number)
            .unwrap_or_else(|_| CellValue::string(text)),
    }
}

fn run_script(assignments: &[Assignment], check_cycles: bool) -> Result<String> {
    let mut engine = FormulaEngine::new();
    let mut total = CalculationStats::default();

    for assignment in assignments {
        let stats = engine.update_cell_data(
            assignment.cell,
            assignment.value.clone(),
            assignment.formula.as_deref(),
        );
        total.cells_calculated += stats.cells_calculated;
        total.errors += stats.errors;
    }

    let mut output = String::new();
    for (key, record) in engine.store().iter() {
        match &record.formula {
            Some(formula) => {
                writeln!(output, "{} = {}  ({})", key.address(), record.value, formula)?
            }
            None => writeln!(output, "{} = {}", key.address(), record.value)?,
        }
    }

    if check_cycles {
        for (key, record) in engine.store().iter() {
            if record.is_formula() && engine.check_circular_dependency(key) {
                writeln!(output, "circular: {}", key.address())?;
            }
        }
    }

    eprintln!(
        "Calculated {} formulas ({} errors)",
        total.cells_calculated, total.errors
    );

    Ok(output)
}
