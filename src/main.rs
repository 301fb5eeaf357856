//! ugit CLI - content-addressed version control

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use ugit::ops::{
    add, branch_name, branches, checkout, create_branch, create_commit, create_tag, log, merge,
    read_tree, reset, status, MergeOutcome,
};
use ugit::transport::{fetch, push};
use ugit::{diff, object, refs, worktree, Repository};

#[derive(Parser)]
#[command(name = "ugit")]
#[command(about = "content-addressed version control engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// initialize a new repository
    Init {
        /// path to create the repository at
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// store a file as a blob and print its id
    HashObject {
        /// file to hash
        file: PathBuf,
    },

    /// print the payload of an object
    CatFile {
        /// object name or id
        #[arg(default_value = "@")]
        object: String,
    },

    /// stage files into the index
    Add {
        /// files or directories to stage
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// write the current snapshot as a tree and print its id
    WriteTree,

    /// reproduce a tree in the working tree and index
    ReadTree {
        /// tree name or id
        tree: String,
    },

    /// record the current snapshot as a commit
    Commit {
        /// commit message
        #[arg(short, long)]
        message: String,
    },

    /// show commit history
    Log {
        /// commit to start from
        #[arg(default_value = "@")]
        oid: String,
    },

    /// check out a branch, tag or commit
    Checkout {
        /// name to check out
        name: String,
    },

    /// create a tag pointing at a commit
    Tag {
        /// tag name
        name: String,

        /// commit to tag
        #[arg(default_value = "@")]
        oid: String,
    },

    /// create a branch, or list branches
    Branch {
        /// branch name; lists branches when omitted
        name: Option<String>,

        /// commit the branch starts at
        #[arg(default_value = "@")]
        start: String,
    },

    /// show the current branch and changed files
    Status,

    /// move HEAD to a commit
    Reset {
        /// commit to reset to
        commit: String,
    },

    /// show a commit and its changes
    Show {
        /// commit to show
        #[arg(default_value = "@")]
        oid: String,
    },

    /// show changes between a commit and the working tree
    Diff {
        /// commit to compare against
        #[arg(default_value = "@")]
        commit: String,
    },

    /// merge another commit into HEAD
    Merge {
        /// commit to merge
        commit: String,
    },

    /// fetch branches and objects from a peer repository
    Fetch {
        /// path to the peer's working tree
        path: PathBuf,
    },

    /// push a ref to a peer repository
    Push {
        /// path to the peer's working tree
        path: PathBuf,

        /// ref to push (e.g. refs/heads/master)
        refname: String,
    },
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_repo() -> ugit::Result<Repository> {
    Repository::discover(Path::new("."))
}

fn run(cli: Cli) -> ugit::Result<()> {
    match cli.command {
        Commands::Init { path } => {
            Repository::init(&path)?;
            println!("initialized empty ugit repository in {}", path.join(ugit::DATA_DIR).display());
        }

        Commands::HashObject { file } => {
            let repo = open_repo()?;
            let content = std::fs::read(&file).map_err(|e| ugit::Error::Io {
                path: file.clone(),
                source: e,
            })?;
            let id = object::write_blob(&repo, &content)?;
            println!("{id}");
        }

        Commands::CatFile { object } => {
            let repo = open_repo()?;
            let id = refs::resolve_name(&repo, &object)?;
            let (_, payload) = object::read_object(&repo, &id, None)?;
            io::stdout().write_all(&payload).map_err(|e| ugit::Error::Io {
                path: "stdout".into(),
                source: e,
            })?;
        }

        Commands::Add { paths } => {
            let repo = open_repo()?;
            add(&repo, &paths)?;
        }

        Commands::WriteTree => {
            let repo = open_repo()?;
            let id = ugit::write_snapshot_tree(&repo)?;
            println!("{id}");
        }

        Commands::ReadTree { tree } => {
            let repo = open_repo()?;
            let id = refs::resolve_name(&repo, &tree)?;
            read_tree(&repo, &id)?;
        }

        Commands::Commit { message } => {
            let repo = open_repo()?;
            let id = create_commit(&repo, &message)?;
            println!("{id}");
        }

        Commands::Log { oid } => {
            let repo = open_repo()?;
            let from = refs::resolve_name(&repo, &oid)?;
            for entry in log(&repo, from)? {
                println!("{entry}");
            }
        }

        Commands::Checkout { name } => {
            let repo = open_repo()?;
            checkout(&repo, &name)?;
        }

        Commands::Tag { name, oid } => {
            let repo = open_repo()?;
            let id = refs::resolve_name(&repo, &oid)?;
            create_tag(&repo, &name, id)?;
        }

        Commands::Branch { name, start } => {
            let repo = open_repo()?;
            match name {
                Some(name) => {
                    let id = refs::resolve_name(&repo, &start)?;
                    create_branch(&repo, &name, id)?;
                    println!("branch {} created at {}", name, &id.to_hex()[..10]);
                }
                None => {
                    let current = branch_name(&repo)?;
                    for branch in branches(&repo)? {
                        let marker = if Some(&branch) == current.as_ref() {
                            "*"
                        } else {
                            " "
                        };
                        println!("{marker} {branch}");
                    }
                }
            }
        }

        Commands::Status => {
            let repo = open_repo()?;
            let report = status(&repo)?;

            match (&report.branch, report.head) {
                (Some(branch), _) => println!("on branch {branch}"),
                (None, Some(head)) => println!("HEAD detached at {}", &head.to_hex()[..10]),
                (None, None) => println!("no commits yet"),
            }

            if !report.changes.is_empty() {
                println!("\nchanges:");
                for (path, kind) in &report.changes {
                    println!("{kind:>12}: {path}");
                }
            }
        }

        Commands::Reset { commit } => {
            let repo = open_repo()?;
            let id = refs::resolve_name(&repo, &commit)?;
            reset(&repo, id)?;
        }

        Commands::Show { oid } => {
            let repo = open_repo()?;
            let id = refs::resolve_name(&repo, &oid)?;
            let commit = object::read_commit(&repo, &id)?;

            println!("commit {id}");
            println!();
            for line in commit.message.lines() {
                println!("    {line}");
            }
            println!();

            let parent_tree = match commit.parents.first() {
                Some(parent) => {
                    let parent_commit = object::read_commit(&repo, parent)?;
                    worktree::flatten(&repo, &parent_commit.tree)?
                }
                None => Default::default(),
            };
            let tree = worktree::flatten(&repo, &commit.tree)?;

            let output = diff::diff_trees(&repo, &parent_tree, &tree)?;
            io::stdout().write_all(&output).map_err(|e| ugit::Error::Io {
                path: "stdout".into(),
                source: e,
            })?;
        }

        Commands::Diff { commit } => {
            let repo = open_repo()?;
            let id = refs::resolve_name(&repo, &commit)?;
            let commit = object::read_commit(&repo, &id)?;

            let from = worktree::flatten(&repo, &commit.tree)?;
            let to = worktree::worktree_snapshot(&repo)?;

            let output = diff::diff_trees(&repo, &from, &to)?;
            io::stdout().write_all(&output).map_err(|e| ugit::Error::Io {
                path: "stdout".into(),
                source: e,
            })?;
        }

        Commands::Merge { commit } => {
            let repo = open_repo()?;
            let id = refs::resolve_name(&repo, &commit)?;
            match merge(&repo, id)? {
                MergeOutcome::FastForward(id) => println!("fast-forwarded to {id}"),
                MergeOutcome::Merged => {
                    println!("merged into working tree; commit to conclude the merge")
                }
            }
        }

        Commands::Fetch { path } => {
            let repo = open_repo()?;
            let stats = fetch(&repo, &path)?;
            println!(
                "fetched: {} copied, {} skipped, {} bytes",
                stats.copied, stats.skipped, stats.bytes_transferred
            );
        }

        Commands::Push { path, refname } => {
            let repo = open_repo()?;
            let stats = push(&repo, &path, &refname)?;
            println!(
                "pushed {}: {} copied, {} skipped, {} bytes",
                refname, stats.copied, stats.skipped, stats.bytes_transferred
            );
        }
    }

    Ok(())
}
