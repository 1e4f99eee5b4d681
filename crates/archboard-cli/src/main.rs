//! archboard command-line tools.
//!
//! Works directly on a diagram database file, without a running server:
//! export a diagram as JSON or PNG, import a JSON file, and inspect
//! templates and environment variables. PNG export uses the same renderer
//! as the HTTP server's `export.png` endpoint.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use archboard_core::{export_document, parse_import, DiagramKind, ImportError, ProjectId};
use archboard_server::export::{render_png, ExportError};
use archboard_storage::{
    DiagramKey, DiagramStore, EnvConfigStore, SaveCondition, SqliteStore, StorageError,
    TemplateId, TemplateStore, UserId,
};

/// archboard diagram tools.
#[derive(Parser)]
#[command(name = "archboard", about = "archboard diagram tools")]
struct Cli {
    /// Path to the diagram database file.
    #[arg(short, long, global = true, default_value = "archboard.db")]
    db: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a diagram as JSON (default) or PNG.
    Export {
        project: String,

        /// architecture, database or frontend.
        kind: DiagramKind,

        /// Write a PNG image instead of JSON.
        #[arg(long)]
        png: bool,

        /// Output file (default: stdout for JSON, `<kind>-diagram.png` for PNG).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace a diagram with the contents of a JSON file.
    Import {
        project: String,

        kind: DiagramKind,

        /// File holding `nodes` and `edges` arrays.
        input: PathBuf,

        /// Overwrite even if the stored diagram changes while importing.
        #[arg(long)]
        force: bool,
    },
    /// Inspect or delete a user's templates.
    Templates {
        #[command(subcommand)]
        action: TemplateAction,
    },
    /// List a project's environment variables. Secret values are masked.
    Env { project: String },
}

#[derive(Subcommand)]
enum TemplateAction {
    List {
        #[arg(short, long)]
        user: String,

        /// Only this diagram kind (default: all kinds).
        #[arg(short, long)]
        kind: Option<DiagramKind>,
    },
    Delete {
        #[arg(short, long)]
        user: String,

        /// Template id.
        id: String,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Import(#[from] ImportError),

    #[error("{0}")]
    Export(#[from] ExportError),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// 1 = bad input, 2 = conflict or missing record, 3 = I/O or database error.
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Import(_) | CliError::Export(ExportError::TooLarge { .. }) => 1,
            CliError::Storage(
                StorageError::RevisionConflict { .. }
                | StorageError::TemplateNotFound(_)
                | StorageError::EnvVarNotFound(_),
            ) => 2,
            _ => 3,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let result = SqliteStore::new(&cli.db)
        .map_err(CliError::from)
        .and_then(|mut store| run(&mut store, cli.command));
    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(err.exit_code());
        }
    }
}

/// Runs one subcommand and returns what to print on stdout.
fn run(store: &mut SqliteStore, command: Commands) -> Result<String, CliError> {
    match command {
        Commands::Export {
            project,
            kind,
            png,
            output,
        } => {
            let key = DiagramKey::new(project, kind);
            let graph = store
                .load_diagram(&key)?
                .map(|stored| stored.graph)
                .unwrap_or_default();
            if png {
                let path = output.unwrap_or_else(|| PathBuf::from(format!("{}-diagram.png", kind)));
                write_file(&path, &render_png(&graph)?)?;
                return Ok(format!("wrote {}", path.display()));
            }
            let document = export_document(&key.project, kind, &graph, chrono::Utc::now());
            let json = serde_json::to_string_pretty(&document)?;
            match output {
                Some(path) => {
                    write_file(&path, json.as_bytes())?;
                    Ok(format!("wrote {}", path.display()))
                }
                None => Ok(json),
            }
        }
        Commands::Import {
            project,
            kind,
            input,
            force,
        } => {
            let bytes = fs::read(&input).map_err(|source| CliError::Io {
                path: input.clone(),
                source,
            })?;
            let graph = parse_import(&bytes)?;
            let key = DiagramKey::new(project, kind);
            let condition = if force {
                SaveCondition::Any
            } else {
                match store.load_diagram(&key)? {
                    Some(stored) => SaveCondition::Revision(stored.revision),
                    None => SaveCondition::Absent,
                }
            };
            let receipt = store.save_diagram(&key, &graph, condition)?;
            Ok(format!(
                "imported {} nodes and {} edges into {} (revision {})",
                graph.node_count(),
                graph.edge_count(),
                key,
                receipt.revision
            ))
        }
        Commands::Templates { action } => match action {
            TemplateAction::List { user, kind } => {
                let user = UserId(user);
                let kinds = match kind {
                    Some(kind) => vec![kind],
                    None => DiagramKind::ALL.to_vec(),
                };
                let mut templates = Vec::new();
                for kind in kinds {
                    templates.extend(store.list_templates(&user, kind)?);
                }
                Ok(templates
                    .iter()
                    .map(|t| {
                        format!(
                            "{}\t{}\t{}\t{} nodes\t{} edges\t{}",
                            t.id,
                            t.kind,
                            t.name,
                            t.node_count(),
                            t.edge_count(),
                            t.created_at.format("%Y-%m-%d %H:%M")
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
            TemplateAction::Delete { user, id } => {
                store.delete_template(&UserId(user), &TemplateId(id.clone()))?;
                Ok(format!("deleted template {}", id))
            }
        },
        Commands::Env { project } => {
            let variables = store.list_env(&ProjectId::from(project))?;
            Ok(variables
                .iter()
                .map(|v| {
                    let show = |value: &str| {
                        if v.is_secret && !value.is_empty() {
                            "********".to_string()
                        } else {
                            value.to_string()
                        }
                    };
                    format!(
                        "{}\tdev={}\tstaging={}\tprod={}",
                        v.name,
                        show(&v.development),
                        show(&v.staging),
                        show(&v.production)
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    fs::write(path, bytes).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use archboard_core::{DiagramGraph, NodeKind, Position};
    use archboard_storage::EnvDraft;

    fn sample_graph() -> DiagramGraph {
        let mut graph = DiagramGraph::new();
        let a = graph.add_node(NodeKind::Client, Position::new(0.0, 0.0));
        let b = graph.add_node(NodeKind::Server, Position::new(200.0, 0.0));
        graph
            .connect(&a, &b, None, None, DiagramKind::Architecture)
            .unwrap();
        graph
    }

    #[test]
    fn export_then_import_into_another_project() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SqliteStore::in_memory().unwrap();
        store
            .save_diagram(
                &DiagramKey::new("p1", DiagramKind::Architecture),
                &sample_graph(),
                SaveCondition::Any,
            )
            .unwrap();

        let file = dir.path().join("diagram.json");
        run(
            &mut store,
            Commands::Export {
                project: "p1".into(),
                kind: DiagramKind::Architecture,
                png: false,
                output: Some(file.clone()),
            },
        )
        .unwrap();

        let message = run(
            &mut store,
            Commands::Import {
                project: "p2".into(),
                kind: DiagramKind::Architecture,
                input: file,
                force: false,
            },
        )
        .unwrap();
        assert!(message.contains("2 nodes and 1 edges"));

        let load = |project: &str| {
            store
                .load_diagram(&DiagramKey::new(project, DiagramKind::Architecture))
                .unwrap()
                .unwrap()
                .graph
        };
        assert_eq!(load("p2"), load("p1"));
    }

    #[test]
    fn malformed_import_exits_with_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bad.json");
        fs::write(&file, br#"{"nodes": []}"#).unwrap();
        let mut store = SqliteStore::in_memory().unwrap();
        let err = run(
            &mut store,
            Commands::Import {
                project: "p1".into(),
                kind: DiagramKind::Database,
                input: file,
                force: false,
            },
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert!(store
            .load_diagram(&DiagramKey::new("p1", DiagramKind::Database))
            .unwrap()
            .is_none());
    }

    #[test]
    fn png_export_writes_an_image() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("out.png");
        let mut store = SqliteStore::in_memory().unwrap();
        run(
            &mut store,
            Commands::Export {
                project: "p1".into(),
                kind: DiagramKind::Frontend,
                png: true,
                output: Some(file.clone()),
            },
        )
        .unwrap();
        let bytes = fs::read(file).unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }

    #[test]
    fn deleting_unknown_template_is_not_found() {
        let mut store = SqliteStore::in_memory().unwrap();
        let err = run(
            &mut store,
            Commands::Templates {
                action: TemplateAction::Delete {
                    user: "u1".into(),
                    id: "nope".into(),
                },
            },
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn env_listing_masks_secrets() {
        let mut store = SqliteStore::in_memory().unwrap();
        let project = ProjectId::from("p1");
        store
            .insert_env(
                &project,
                EnvDraft {
                    name: "DB_PASSWORD".into(),
                    production: "hunter2".into(),
                    is_secret: true,
                    ..EnvDraft::default()
                },
            )
            .unwrap();
        let output = run(&mut store, Commands::Env { project: "p1".into() }).unwrap();
        assert!(output.contains("DB_PASSWORD"));
        assert!(output.contains("prod=********"));
        assert!(!output.contains("hunter2"));
        assert!(output.contains("dev=\t"));
    }

    #[test]
    fn arguments_follow_the_documented_shape() {
        let cli = Cli::try_parse_from(["archboard", "export", "p1", "database", "--png", "-o", "d.png"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Export { ref project, kind: DiagramKind::Database, png: true, output: Some(_) }
                if project == "p1"
        ));

        let cli = Cli::try_parse_from(["archboard", "--db", "x.db", "import", "p2", "frontend", "in.json"])
            .unwrap();
        assert_eq!(cli.db, "x.db");
        assert!(matches!(cli.command, Commands::Import { force: false, .. }));

        let cli = Cli::try_parse_from(["archboard", "templates", "list", "--user", "u1"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Templates { action: TemplateAction::List { kind: None, .. } }
        ));

        assert!(Cli::try_parse_from(["archboard", "export", "p1", "flowchart"]).is_err());
    }

    #[test]
    fn template_listing_covers_every_kind_unless_filtered() {
        let mut store = SqliteStore::in_memory().unwrap();
        let user = UserId("u1".into());
        store
            .insert_template(&user, "web", DiagramKind::Architecture, &sample_graph())
            .unwrap();
        store
            .insert_template(&user, "schema", DiagramKind::Database, &DiagramGraph::new())
            .unwrap();

        let list = |store: &mut SqliteStore, kind| {
            run(
                store,
                Commands::Templates {
                    action: TemplateAction::List {
                        user: "u1".into(),
                        kind,
                    },
                },
            )
            .unwrap()
        };
        let all = list(&mut store, None);
        assert_eq!(all.lines().count(), 2);
        assert!(all.contains("\tarchitecture\tweb\t2 nodes\t1 edges\t"));

        let database = list(&mut store, Some(DiagramKind::Database));
        assert_eq!(database.lines().count(), 1);
        assert!(database.contains("schema"));
    }
}
