//! varql shell - try the filter languages and the WHERE planner interactively
//!
//! Usage: varql [--catalog <file>] [-e <expr>]
//!
//! Commands:
//!   :help         - Show help
//!   :quit         - Exit
//!   :load FILE    - Load a study catalog
//!   :query ...    - Build a statement against a study

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use varql::repl::{InputResult, MetaCommand, ReplState};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const PROMPT: &str = "varql> ";
const CONTINUATION: &str = "....   ";

#[derive(Parser, Debug)]
#[command(name = "varql", version, about = "Variant filter language shell")]
struct Args {
    /// Study catalog (JSON) to load on startup
    #[arg(short, long)]
    catalog: Option<PathBuf>,

    /// Compile one expression, print it and exit
    #[arg(short, long)]
    expr: Option<String>,

    /// Column name used in emitted SQL
    #[arg(long, default_value = varql::repl::DEFAULT_COLUMN)]
    column: String,

    /// Log planner decisions (overridden by RUST_LOG)
    #[arg(short, long)]
    debug: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.debug);

    let mut state = match &args.catalog {
        Some(path) => match ReplState::with_catalog(path) {
            Ok(state) => state,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => ReplState::new(),
    };
    state.column = args.column;

    if let Some(expr) = &args.expr {
        return if handle_expression(&state, expr) {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    println!("varql v{} - variant filter shell", VERSION);
    println!("Type :help for help, :quit to exit\n");

    let config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<(), DefaultHistory> = match Editor::with_config(config) {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Error: failed to create editor: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let history_path = history_path();
    if let Some(ref path) = history_path {
        let _ = rl.load_history(path);
    }

    loop {
        let prompt = if state.input_buffer.is_empty() {
            PROMPT
        } else {
            CONTINUATION
        };

        match rl.readline(prompt) {
            Ok(line) => match state.process_line(&line) {
                InputResult::MetaCommand(cmd) => {
                    if !handle_command(&mut state, cmd) {
                        break;
                    }
                }
                InputResult::Expression(expr) => {
                    handle_expression(&state, &expr);
                }
                InputResult::Incomplete | InputResult::Empty => {}
            },
            Err(ReadlineError::Interrupted) => {
                if !state.input_buffer.is_empty() {
                    state.input_buffer.clear();
                    state.paren_depth = 0;
                    println!("^C");
                } else {
                    println!("Use :quit or Ctrl-D to exit");
                }
            }
            Err(ReadlineError::Eof) => {
                if let Some(expr) = state.force_submit() {
                    handle_expression(&state, &expr);
                } else {
                    println!("\nGoodbye!");
                    break;
                }
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    if let Some(ref path) = history_path {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let _ = rl.save_history(path);
    }
    ExitCode::SUCCESS
}

fn init_tracing(debug: bool) {
    let default = if debug { "varql=debug" } else { "varql=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Print the normalized form and the SQL of an attribute expression
fn handle_expression(state: &ReplState, expr: &str) -> bool {
    match state.evaluate(expr) {
        Ok(report) => {
            println!("  {}", report.normalized);
            println!("  {}", report.sql);
            true
        }
        Err(e) => {
            eprintln!("{}", e.render());
            false
        }
    }
}

/// Handle a meta-command. Returns false if we should exit.
fn handle_command(state: &mut ReplState, cmd: MetaCommand) -> bool {
    match cmd {
        MetaCommand::Help(topic) => print_help(topic.as_deref()),
        MetaCommand::Quit => {
            println!("Goodbye!");
            return false;
        }
        MetaCommand::Load(path) => match state.load_catalog(&path) {
            Ok(n) => println!("Loaded {} stud{} from {}", n, if n == 1 { "y" } else { "ies" }, path.display()),
            Err(e) => eprintln!("Error: {}", e),
        },
        MetaCommand::Column(name) => {
            println!("Column: {}", name);
            state.column = name;
        }
        MetaCommand::Dialect(dialect) => {
            state.dialect = dialect;
            println!("Dialect set");
        }
        MetaCommand::Bitwise { category, query } => print_result(state.bitwise(category, &query)),
        MetaCommand::Inheritance(query) => print_result(state.inheritance(&query)),
        MetaCommand::Match { query, values } => match state.match_values(&query, &values) {
            Ok(matched) => println!("  {}", matched),
            Err(e) => eprintln!("{}", e.render()),
        },
        MetaCommand::Studies => {
            let studies = state.studies();
            if studies.is_empty() {
                println!("No studies loaded. Use :load <catalog.json>");
            }
            for study in studies {
                println!(
                    "  {:<20} {} ({} columns, {} pedigree members)",
                    study.id, study.table, study.columns, study.members
                );
            }
        }
        MetaCommand::Query {
            study,
            kind,
            filters,
        } => print_result(state.build_query(&study, &kind, &filters)),
        MetaCommand::Unknown(msg) => {
            eprintln!("Error: {}", msg);
            eprintln!("Type :help for available commands");
        }
    }
    true
}

fn print_result(result: Result<String, varql::QueryError>) {
    match result {
        Ok(sql) => println!("  {}", sql),
        Err(e) => eprintln!("{}", e.render()),
    }
}

fn print_help(topic: Option<&str>) {
    match topic {
        None => {
            println!("varql Commands:");
            println!();
            println!("  :help [topic]              Show help (topics: syntax, inheritance, query)");
            println!("  :quit                      Exit");
            println!("  :column <name>             Column used in emitted SQL");
            println!("  :dialect impala|ansi       SQL dialect");
            println!();
            println!("Languages:");
            println!("  <expr>                     Normalize an attribute expression and compile it");
            println!("  :bitwise <category> <expr> Compile against a bitmask column");
            println!("                             (role, sex, status, variant_type)");
            println!("  :inheritance <expr>        Compile an inheritance expression");
            println!("  :match <expr> | v1, v2     Evaluate in memory against values");
            println!();
            println!("Catalog:");
            println!("  :load <file>               Load a study catalog");
            println!("  :studies                   List studies");
            println!("  :query <study> <kind> [json]  Build a statement");
        }
        Some("syntax") => {
            println!("Attribute expressions:");
            println!();
            println!("  missense                   value is present");
            println!("  any(a, b) / all(a, b)      any / all values present");
            println!("  eq(a, b)                   exactly this set");
            println!("  > 0.5, <= 3                numeric comparisons");
            println!("  not x, x and y, x or y     boolean structure");
            println!("  'quoted value'             values with spaces or symbols");
        }
        Some("inheritance") => {
            println!("Inheritance expressions:");
            println!();
            println!("  denovo                     flag set");
            println!("  not mendelian              flag not set");
            println!("  any(denovo, mendelian)     at least one flag set");
            println!("  all(denovo, possible_denovo)  every flag set");
            println!("  a and b, a or b            combine");
        }
        Some("query") => {
            println!("Statement kinds: family, summary, summary:<min families>, count");
            println!();
            println!("Filters are a JSON object, for example:");
            println!(r#"  :query s1 family {{"genes": ["CHD8"], "inheritance": ["denovo"], "limit": 10}}"#);
        }
        Some(other) => {
            println!("Unknown help topic: {}", other);
            println!("Available topics: syntax, inheritance, query");
        }
    }
}

fn history_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    let mut path = PathBuf::from(home);
    path.push(".config");
    path.push("varql");
    path.push("history");
    Some(path)
}
