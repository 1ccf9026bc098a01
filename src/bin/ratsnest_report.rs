//! CLI tool for inspecting the ratsnest of a board description
//!
//! Usage:
//!   cargo run --release --bin ratsnest_report -- <board.json> [options]
//!
//! Options:
//!   --net <code>         Only report one net
//!   --settings <file>    Load engine settings from JSON
//!   --json               Print the report as JSON
//!   --summary            Show counts only
//!   --verbose            Enable debug logging

use std::env;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::Level;

use pcb_ratsnest::board::{Board, ItemTypes, Point};
use pcb_ratsnest::ratsnest::{RatsnestData, RatsnestSettings};

#[derive(Serialize)]
struct NetReport {
    net: u32,
    items: usize,
    nodes: usize,
    unconnected: usize,
    lines: Vec<(Point, Point)>,
}

#[derive(Serialize)]
struct BoardReport {
    nets: Vec<NetReport>,
    unconnected: usize,
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <board.json> [options]", args[0]);
        eprintln!();
        eprintln!("Options:");
        eprintln!("  --net <code>          Only report one net");
        eprintln!("  --settings <file>     Load engine settings from JSON");
        eprintln!("  --json                Print the report as JSON");
        eprintln!("  --summary             Show counts only");
        eprintln!("  --verbose             Enable debug logging");
        return Ok(());
    }

    let board_path = Path::new(&args[1]);

    let mut net_filter: Option<u32> = None;
    let mut settings_path: Option<String> = None;
    let mut as_json = false;
    let mut summary_only = false;
    let mut verbose = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--net" => {
                i += 1;
                let Some(code) = args.get(i) else {
                    bail!("--net needs a net code");
                };
                net_filter = Some(code.parse().with_context(|| format!("Invalid net code: {}", code))?);
            }
            "--settings" => {
                i += 1;
                settings_path = args.get(i).cloned();
                if settings_path.is_none() {
                    bail!("--settings needs a file");
                }
            }
            "--json" => as_json = true,
            "--summary" => summary_only = true,
            "--verbose" => verbose = true,
            other => {
                eprintln!("Unknown option: {}", other);
            }
        }
        i += 1;
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let settings: RatsnestSettings = match &settings_path {
        Some(path) => load_json(Path::new(path))?,
        None => RatsnestSettings::default(),
    };
    let board: Board = load_json(board_path)?;

    let start = std::time::Instant::now();
    let mut data = RatsnestData::new(settings);
    data.process_board(&board);
    let elapsed = start.elapsed();

    let codes: Vec<u32> = match net_filter {
        Some(code) => vec![code],
        None => (1..data.net_count() as u32).collect(),
    };

    let mut nets = Vec::new();
    for code in codes {
        let Some(net) = data.net(code) else {
            continue;
        };
        let items = net.get_all_items(ItemTypes::ALL).len();
        if items == 0 && net_filter.is_none() {
            continue;
        }
        let lines = net.ratsnest_lines();
        nets.push(NetReport {
            net: code,
            items,
            nodes: net.nodes().len(),
            unconnected: lines.len(),
            lines,
        });
    }

    let report = BoardReport {
        unconnected: nets.iter().map(|n| n.unconnected).sum(),
        nets,
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Board: {}", board_path.display());
    println!("Nets with items: {}", report.nets.len());
    println!("Unconnected: {}", report.unconnected);
    println!("Solved in {:?}", elapsed);

    if summary_only {
        return Ok(());
    }

    for net in &report.nets {
        println!();
        println!(
            "Net {}: {} items, {} nodes, {} unconnected",
            net.net, net.items, net.nodes, net.unconnected
        );
        for (a, b) in &net.lines {
            println!("  ({}, {}) -> ({}, {})", a.x, a.y, b.x, b.y);
        }
    }

    Ok(())
}
