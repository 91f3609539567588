//! collapsible-sections: fold a rendered document tree and show what stays visible.
#![allow(clippy::multiple_crate_versions)]

use clap::Parser;
use collapsible_sections::dom::{Document, HostTree, Modifiers, NodeDesc};
use collapsible_sections::{config, outline, ActivationOutcome, Collapsible, FileStore};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "collapsible-sections")]
#[command(about = "Collapsible heading sections for rendered documents", long_about = None)]
struct Args {
    /// JSON array of elements making up the rendered document body
    #[arg(value_name = "TREE")]
    tree: PathBuf,

    /// Directory holding persisted section state
    #[arg(long, value_name = "DIR")]
    state_dir: Option<PathBuf>,

    /// Toggle the section with this key, e.g. "h2:Methods"
    #[arg(long, short = 't', value_name = "KEY")]
    toggle: Vec<String>,

    /// Toggle sections together with everything nested inside them
    #[arg(long, short = 'r')]
    recursive: bool,

    /// Collapse every section
    #[arg(long, conflicts_with = "expand_all")]
    collapse_all: bool,

    /// Expand every section
    #[arg(long)]
    expand_all: bool,

    /// Append more elements afterwards, as a live preview would
    #[arg(long, value_name = "TREE")]
    append: Option<PathBuf>,
}

fn read_nodes(path: &Path) -> io::Result<Vec<NodeDesc>> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn main() -> io::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let cfg = config::Config::load();

    let mut doc = Document::from_nodes(&read_nodes(&args.tree)?);
    let state_dir = args
        .state_dir
        .unwrap_or_else(|| PathBuf::from(&cfg.state_dir));
    let mut ctx = Collapsible::new(cfg, FileStore::new(state_dir));
    ctx.install(&mut doc);

    if ctx.registry().is_empty() {
        eprintln!("No collapsible sections found");
    }

    let modifiers = Modifiers {
        ctrl: args.recursive,
        ..Modifiers::default()
    };
    for key in &args.toggle {
        let Some(heading) = ctx.section_for_key(&doc, key).map(|s| s.heading) else {
            eprintln!("No section with key {key:?}");
            continue;
        };
        let Some(activation) = doc.dispatch_activation(heading, modifiers) else {
            continue;
        };
        match ctx.handle_activation(&mut doc, &activation) {
            ActivationOutcome::Toggled { key, collapsed } => {
                eprintln!("{key}: {}", if collapsed { "collapsed" } else { "expanded" });
            }
            ActivationOutcome::ToggledSubtree { collapsed, sections } => {
                let verb = if collapsed { "collapsed" } else { "expanded" };
                eprintln!("{key}: {verb} {sections} section(s)");
            }
            ActivationOutcome::Ignored => {}
        }
    }

    if args.collapse_all {
        ctx.set_all(&mut doc, true);
    } else if args.expand_all {
        ctx.set_all(&mut doc, false);
    }

    if let Some(path) = args.append {
        let root = doc.root();
        doc.append_nodes(root, &read_nodes(&path)?);
        ctx.on_mutations(&mut doc, Instant::now());
        if let Some(deadline) = ctx.pending_rescan() {
            std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
            ctx.poll(&mut doc, Instant::now());
        }
    }

    print!("{}", outline::render(&doc, ctx.registry()));
    Ok(())
}
