//! Elm analyzer CLI entry point.

mod cli;

use std::path::Path;

use clap::Parser;
use cli::{Cli, Command};
use elm_analyzer::{AnalysisResult, Forest, ReparseHandler, definition_at};
use elm_syntax::{ExposingTable, ModuleIndex, module, position_from_offset};
use lsp_types::Position;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Command::Inspect { file, json } => inspect(&file, json),
        Command::Definition {
            root,
            file,
            line,
            character,
        } => definition(&root, &file, line, character),
    };
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

#[derive(Serialize)]
struct Inspection<'a> {
    file: &'a str,
    #[serde(flatten)]
    index: &'a ModuleIndex,
    exposed: Vec<ExposedSummary>,
    missing_signatures: Vec<String>,
}

#[derive(Serialize)]
struct ExposedSummary {
    name: String,
    kind: elm_analyzer::DefinitionKind,
    constructors: Vec<String>,
}

fn inspect(path: &Path, json: bool) -> AnalysisResult<()> {
    let mut forest = Forest::new();
    let file = ReparseHandler::new()?.load_file(&mut forest, path, true)?;
    let Some(entry) = forest.entry(&file) else {
        return Ok(());
    };
    let source = entry.source();
    let exposed = ExposingTable::build(source)
        .iter()
        .map(|exposed| ExposedSummary {
            name: exposed.name.clone(),
            kind: exposed.kind,
            constructors: exposed.constructors.iter().map(|c| c.name.clone()).collect(),
        })
        .collect();
    let missing_signatures = module::top_level_function_declarations_without_signature(source)
        .into_iter()
        .filter_map(module::function_name_node)
        .map(|name| source.text_of(name).into_owned())
        .collect();
    let inspection = Inspection {
        file: file.as_str(),
        index: entry.index(),
        exposed,
        missing_signatures,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&inspection)?);
        return Ok(());
    }

    println!("=== {} ===", inspection.file);
    println!("module: {}", inspection.index.name.as_deref().unwrap_or("<none>"));
    println!("imports:");
    for import in &inspection.index.imports {
        match &import.alias {
            Some(alias) => println!("  {} as {}", import.module_name, alias),
            None => println!("  {}", import.module_name),
        }
    }
    println!("exposed:");
    for exposed in &inspection.exposed {
        if exposed.constructors.is_empty() {
            println!("  {} ({})", exposed.name, exposed.kind);
        } else {
            println!("  {} ({}) {}", exposed.name, exposed.kind, exposed.constructors.join(" | "));
        }
    }
    if !inspection.missing_signatures.is_empty() {
        println!("missing type annotations: {}", inspection.missing_signatures.join(", "));
    }
    Ok(())
}

fn definition(root: &Path, path: &Path, line: u32, character: u32) -> AnalysisResult<()> {
    let mut forest = Forest::new();
    let mut handler = ReparseHandler::new()?;
    handler.load_directory(&mut forest, root, true);
    let file = handler.load_file(&mut forest, path, true)?;

    match definition_at(&forest, &file, Position::new(line, character)) {
        Some(found) => {
            let start = position_from_offset(found.source.text(), found.node.start_byte());
            println!(
                "{}:{}:{} {} {}",
                found.file(),
                start.line + 1,
                start.character + 1,
                found.kind,
                found.name().unwrap_or_default()
            );
        }
        None => println!("No definition found"),
    }
    Ok(())
}
