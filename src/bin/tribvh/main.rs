//! tribvh CLI - Build, inspect and check BVH hierarchy files.

use std::env;
use std::path::Path;
use std::process;

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use tribvh::prelude::*;

#[cfg(feature = "chrome-trace")]
type TraceGuard = tracing_chrome::FlushGuard;
#[cfg(not(feature = "chrome-trace"))]
type TraceGuard = ();

/// Console logging on stderr. `RUST_LOG` overrides the flag-derived level.
fn init_tracing(level: &str) -> Option<TraceGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter).with(fmt_layer);

    #[cfg(feature = "chrome-trace")]
    {
        if env::var("TRIBVH_TRACE").ok().as_deref() == Some("1") {
            let (chrome_layer, guard) = tracing_chrome::ChromeLayerBuilder::new()
                .file("trace.json")
                .build();
            return registry.with(chrome_layer).try_init().ok().map(|_| guard);
        }
    }

    let _ = registry.try_init();
    None
}

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "info";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "warn",
            _ => filtered_args.push(arg),
        }
    }

    let _guard = init_tracing(level);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let result = match filtered_args[0] {
        "info" | "i" => match filtered_args.get(1) {
            Some(file) => {
                let json_mode = filtered_args.iter().any(|&s| s == "--json" || s == "-j");
                cmd_info(file, json_mode)
            }
            None => usage("tribvh-cli info <file.bvh> [--json]"),
        },
        "check" | "c" => match filtered_args.get(1) {
            Some(file) => cmd_check(file),
            None => usage("tribvh-cli check <file.bvh>"),
        },
        "dump" | "d" => match filtered_args.get(1) {
            Some(file) => {
                let json_mode = filtered_args.iter().any(|&s| s == "--json" || s == "-j");
                cmd_dump(file, json_mode)
            }
            None => usage("tribvh-cli dump <file.bvh> [--json]"),
        },
        "demo" => cmd_demo(&filtered_args[1..]),
        "help" | "h" | "-h" | "--help" => {
            print_help();
            Ok(())
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_help();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn usage(text: &str) -> Result<()> {
    eprintln!("Error: missing argument");
    eprintln!("Usage: {}", text);
    process::exit(1);
}

fn print_help() {
    println!("tribvh-cli - BVH hierarchy toolkit");
    println!();
    println!("USAGE:");
    println!("    tribvh-cli [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info  <file> [--json]            Show hierarchy summary");
    println!("    c, check <file>                     Validate a hierarchy file");
    println!("    d, dump  <file> [--json]            Print every node");
    println!("    demo <count> [mode] [--out <file>]  Build over a row of cubes");
    println!("    h, help                             Show this help");
    println!();
    println!("MODES:");
    println!("    sah (0), object-median (1), spatial-median (2)");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Only warnings and errors");
    println!();
    println!("EXAMPLES:");
    println!("    tribvh-cli demo 20 sah --out cubes.bvh  # Build and cache");
    println!("    tribvh-cli info cubes.bvh               # Quick overview");
    println!("    tribvh-cli dump cubes.bvh --json        # Nodes as JSON");
}

fn cmd_info(path: &str, json_mode: bool) -> Result<()> {
    tracing::debug!(path, "importing hierarchy");
    let bvh = Bvh::import(path)?;
    let bounds = bvh.scene_bounds();

    if json_mode {
        let doc = serde_json::json!({
            "file": path,
            "triangles": bvh.triangle_count(),
            "bounds": { "min": bounds.min, "max": bounds.max },
            "world_radius": bvh.world_radius(),
            "gpu_bytes": bvh.node_bytes().len(),
            "summary": bvh.summary(),
        });
        println!("{}", serde_json::to_string_pretty(&doc).unwrap_or_default());
        return Ok(());
    }

    println!("Hierarchy: {}", path);
    println!("Triangles: {}", bvh.triangle_count());
    println!("Bounds:    {:?} .. {:?}", bounds.min, bounds.max);
    println!("Radius:    {:.3}", bvh.world_radius());
    println!("GPU size:  {} bytes", bvh.node_bytes().len());
    println!();
    println!("{}", bvh.summary());
    Ok(())
}

fn cmd_check(path: &str) -> Result<()> {
    let bvh = Bvh::import(path)?;
    let summary = bvh.summary();
    println!(
        "{}: OK ({} nodes, {} leaves, largest leaf {})",
        path, summary.nodes, summary.leaves, summary.largest_leaf
    );
    Ok(())
}

fn cmd_dump(path: &str, json_mode: bool) -> Result<()> {
    let bvh = Bvh::import(path)?;

    if json_mode {
        let nodes: Vec<_> = bvh
            .build_nodes()
            .iter()
            .zip(bvh.nodes())
            .enumerate()
            .map(|(p, (node, compact))| {
                serde_json::json!({
                    "index": p,
                    "min": node.aabb.min,
                    "max": node.aabb.max,
                    "start": node.start,
                    "end": node.end,
                    "right_child": node.right_child,
                    "prim_count": compact.prim_count,
                })
            })
            .collect();
        let doc = serde_json::json!({
            "file": path,
            "indices": bvh.indices(),
            "summary": bvh.summary(),
            "nodes": nodes,
        });
        println!("{}", serde_json::to_string_pretty(&doc).unwrap_or_default());
        return Ok(());
    }

    for (p, node) in bvh.build_nodes().iter().enumerate() {
        match node.right_child {
            Some(right) => println!(
                "[{:>5}] inner [{}, {}] left={} right={} {:?}",
                p,
                node.start,
                node.end,
                p + 1,
                right,
                node.aabb
            ),
            None => println!(
                "[{:>5}] leaf  [{}, {}] tris={:?}",
                p,
                node.start,
                node.end,
                &bvh.indices()[node.start as usize..=node.end as usize]
            ),
        }
    }
    Ok(())
}

fn parse_mode(s: &str) -> Result<SplitMode> {
    match s.parse::<u32>() {
        Ok(n) => SplitMode::try_from(n),
        Err(_) => s.parse(),
    }
}

fn cmd_demo(args: &[&str]) -> Result<()> {
    let mut count = 20usize;
    let mut mode = SplitMode::Sah;
    let mut out: Option<&str> = None;

    let mut positional = 0;
    let mut iter = args.iter();
    while let Some(&arg) = iter.next() {
        match arg {
            "--out" | "-o" => out = iter.next().copied(),
            _ if positional == 0 => {
                count = arg
                    .parse()
                    .map_err(|_| Error::InvalidConfig(format!("bad cube count: {}", arg)))?;
                positional += 1;
            }
            _ => {
                mode = parse_mode(arg)?;
                positional += 1;
            }
        }
    }

    let triangles: Vec<Triangle> = (0..count)
        .flat_map(|i| cube(Vec3::new(i as f32 * 10.0, 0.0, 0.0)))
        .collect();
    tracing::info!(cubes = count, triangles = triangles.len(), %mode, "building demo scene");

    let bvh = Bvh::build(&triangles, mode)?;
    if let Some(metrics) = bvh.metrics() {
        println!("{}", metrics.report(mode));
    }
    println!();
    println!("{}", bvh.summary());

    if let Some(path) = out {
        bvh.export(Path::new(path))?;
        println!();
        println!("Written: {}", path);
    }
    Ok(())
}

/// Unit cube as 12 triangles.
fn cube(center: Vec3) -> [Triangle; 12] {
    let c = |x: f32, y: f32, z: f32| center + Vec3::new(x, y, z) * 0.5;
    let p = [
        c(-1.0, -1.0, -1.0),
        c(1.0, -1.0, -1.0),
        c(1.0, 1.0, -1.0),
        c(-1.0, 1.0, -1.0),
        c(-1.0, -1.0, 1.0),
        c(1.0, -1.0, 1.0),
        c(1.0, 1.0, 1.0),
        c(-1.0, 1.0, 1.0),
    ];
    const FACES: [[usize; 4]; 6] = [
        [0, 3, 2, 1],
        [4, 5, 6, 7],
        [0, 1, 5, 4],
        [2, 3, 7, 6],
        [1, 2, 6, 5],
        [3, 0, 4, 7],
    ];
    let mut tris = [Triangle::new(Vec3::ZERO, Vec3::ZERO, Vec3::ZERO); 12];
    for (f, q) in FACES.iter().enumerate() {
        tris[2 * f] = Triangle::new(p[q[0]], p[q[1]], p[q[2]]);
        tris[2 * f + 1] = Triangle::new(p[q[0]], p[q[2]], p[q[3]]);
    }
    tris
}
