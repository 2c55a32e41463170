//! Minimal CLI: check / create / cast JSON documents against a schema file.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

use crate::cast;
use crate::check;
use crate::create;
use crate::path_de;
use crate::schema;
use crate::value::Value;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// validate, synthesize, or repair JSON documents against a schema
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// check each input document against the schema (exit 1 on any failure)
    Check(CheckCmd),
    /// synthesize a conforming document from the schema alone
    Create(CreateCmd),
    /// repair an input document toward the schema
    Cast(CastCmd),
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// schema file (a JSON schema-node document)
    #[arg(long, short)]
    schema: PathBuf,

    /// named reference schemas resolvable via $ref; each must carry an $id
    #[arg(long = "reference", short)]
    references: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct CheckCmd {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// one or more inputs; may be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug)]
struct CreateCmd {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CastCmd {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// input document to repair
    #[arg(long, short)]
    input: PathBuf,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaSettings {
    fn load(&self) -> Result<(Value, Vec<Value>)> {
        let root = load_json_value(&self.schema)?;
        if !schema::is_schema(&root) {
            bail!("{}: not a recognizable schema node", self.schema.display());
        }
        let mut references = Vec::with_capacity(self.references.len());
        for path in &self.references {
            let reference = load_json_value(path)?;
            if !schema::is_schema(&reference) {
                bail!("{}: not a recognizable schema node", path.display());
            }
            if schema::schema_id(&reference).is_none() {
                bail!("{}: reference schemas must carry an $id", path.display());
            }
            references.push(reference);
        }
        Ok((root, references))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Check(target) => run_check(target),
            Command::Create(target) => run_create(target),
            Command::Cast(target) => run_cast(target),
        }
    }
}

fn run_check(target: &CheckCmd) -> Result<()> {
    let (root, references) = target.schema_settings.load()?;
    let refs: Vec<&Value> = references.iter().collect();
    let paths = resolve_file_path_patterns(&target.input)?;

    // independent documents over one immutable schema tree: safe to fan out
    let verdicts = paths
        .par_iter()
        .map(|path| {
            let value = load_json_value(path)?;
            let valid = check::check(&root, &refs, &value)
                .with_context(|| format!("{}: schema could not be processed", path.display()))?;
            Ok((path, valid))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut failures = 0usize;
    for (path, valid) in &verdicts {
        if *valid {
            println!("{} {}", "✓".green(), path.display());
        } else {
            failures += 1;
            println!("{} {}", "✗".red(), path.display());
        }
    }
    if failures > 0 {
        eprintln!("{failures} of {} document(s) failed", verdicts.len());
        std::process::exit(1);
    }
    Ok(())
}

fn run_create(target: &CreateCmd) -> Result<()> {
    let (root, references) = target.schema_settings.load()?;
    let refs: Vec<&Value> = references.iter().collect();
    let value = create::create(&root, &refs)?;
    write_output(target.out.as_deref(), &value)
}

fn run_cast(target: &CastCmd) -> Result<()> {
    let (root, references) = target.schema_settings.load()?;
    let refs: Vec<&Value> = references.iter().collect();
    let input = load_json_value(&target.input)?;
    let value = cast::cast(&root, &refs, &input)?;
    write_output(target.out.as_deref(), &value)
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn load_json_value(path: &Path) -> Result<Value> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let json = path_de::from_str_with_path::<serde_json::Value>(&source)
        .map_err(|err| anyhow!("failed to parse {}: {err}", path.display()))?;
    Ok(Value::from_json(&json))
}

fn write_output(out: Option<&Path>, value: &Value) -> Result<()> {
    let rendered = serde_json::to_string_pretty(&value.to_json())?;
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, &rendered)
                .with_context(|| format!("failed to write {}", out.display()))?;
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();
    for raw in patterns {
        let pattern = raw.as_ref();
        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // explicitly a glob yet matched nothing -> surface as an error
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }
    Ok(out)
}
