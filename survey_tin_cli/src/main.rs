use clap::{Parser, Subcommand, ValueEnum};
use survey_tin::{
    batter::{BatterConfig, Side, VertexFailurePolicy},
    dtm::Tin,
    geometry::{Point, Point3},
    io::{read_polyline_csv, read_tin_json, read_to_string},
    section::CrossSectionNode,
};

fn fail(msg: String) -> ! {
    eprintln!("{msg}");
    std::process::exit(1);
}

fn load_surface(path: &str) -> Tin {
    match read_tin_json(path) {
        Ok(tin) => tin,
        Err(e) => fail(format!("Error reading {}: {}", path, e)),
    }
}

fn load_polyline(path: &str) -> Vec<Point3> {
    match read_polyline_csv(path) {
        Ok(pts) => pts,
        Err(e) => fail(format!("Error reading {}: {}", path, e)),
    }
}

fn print_point3(p: Point3) {
    println!("{:.3},{:.3},{:.3}", p.x, p.y, p.z);
}

fn print_nodes(nodes: &[CrossSectionNode]) {
    for n in nodes {
        println!(
            "{:.3},{:.3},{:.3},{:.3}",
            n.distance, n.position.x, n.position.y, n.position.z
        );
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SideArg {
    Left,
    Right,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Left => Side::Left,
            SideArg::Right => Side::Right,
        }
    }
}

/// Command line tools for TIN surfaces stored as JSON.
#[derive(Parser)]
#[command(name = "survey_tin_cli", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print vertex and triangle counts and the surface extents.
    Info { surface: String },
    /// Find the triangle under a point.
    Locate {
        surface: String,
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },
    /// Interpolate the surface elevation at a point.
    Height {
        surface: String,
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },
    /// Cut a cross-section along a segment or a polyline CSV file.
    Section {
        surface: String,
        #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true, requires = "to")]
        from: Option<Vec<f64>>,
        #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true)]
        to: Option<Vec<f64>>,
        #[arg(long, conflicts_with_all = ["from", "to"])]
        polyline: Option<String>,
        /// Keep every edge crossing.
        #[arg(long)]
        no_merge: bool,
    },
    /// Print the averaged normal of every vertex.
    Normals { surface: String },
    /// Project cut/fill batter slopes from a design polyline CSV file.
    Batter {
        surface: String,
        design: String,
        #[arg(long, value_enum)]
        side: Option<SideArg>,
        #[arg(long)]
        width: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        cut: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        fill: Option<f64>,
        #[arg(long)]
        drape: bool,
        #[arg(long)]
        close: bool,
        #[arg(long)]
        cap_start: bool,
        #[arg(long)]
        cap_end: bool,
        /// Leave out vertices whose batter cannot be found.
        #[arg(long)]
        skip_failed: bool,
        /// JSON file with a full batter configuration.
        #[arg(long)]
        config: Option<String>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Info { surface } => {
            let tin = load_surface(&surface);
            println!("Vertices: {}", tin.vertex_count());
            println!("Triangles: {}", tin.triangle_count());
            let ext = tin.extents();
            if ext.is_valid() {
                println!(
                    "Extents: {:.3},{:.3},{:.3} - {:.3},{:.3},{:.3}",
                    ext.min.x, ext.min.y, ext.min.z, ext.max.x, ext.max.y, ext.max.z
                );
            }
            let active = tin.active_extents();
            if active.is_valid() {
                println!(
                    "Active extents: {:.3},{:.3},{:.3} - {:.3},{:.3},{:.3}",
                    active.min.x,
                    active.min.y,
                    active.min.z,
                    active.max.x,
                    active.max.y,
                    active.max.z
                );
            }
        }
        Commands::Locate { surface, x, y } => {
            let tin = load_surface(&surface);
            match tin.locate_xy(x, y) {
                Ok(t) => println!("Triangle: {}", t),
                Err(e) => fail(format!("Error locating {:.3},{:.3}: {}", x, y, e)),
            }
        }
        Commands::Height { surface, x, y } => {
            let tin = load_surface(&surface);
            match tin.height_at(x, y) {
                Ok(z) => println!("{:.3}", z),
                Err(e) => fail(format!("Error locating {:.3},{:.3}: {}", x, y, e)),
            }
        }
        Commands::Section {
            surface,
            from,
            to,
            polyline,
            no_merge,
        } => {
            let tin = load_surface(&surface);
            let options = survey_tin::SectionOptions {
                merge_collinear: !no_merge,
                ..Default::default()
            };
            let result = match (from, to, polyline) {
                (Some(a), Some(b), None) => tin.section_with(
                    Point::new(a[0], a[1]),
                    Point::new(b[0], b[1]),
                    &options,
                ),
                (None, None, Some(path)) => {
                    let pts: Vec<Point> = load_polyline(&path).iter().map(Point3::xy).collect();
                    tin.section_polyline_with(&pts, &options)
                }
                _ => fail("Section needs --from and --to, or --polyline".to_string()),
            };
            match result {
                Ok(nodes) => print_nodes(&nodes),
                Err(e) => fail(format!("Section failed: {}", e)),
            }
        }
        Commands::Normals { surface } => {
            let tin = load_surface(&surface);
            let mut progress = |fraction: f64, label: &str| {
                log::debug!("{label}: {:.0}%", fraction * 100.0);
            };
            for n in tin.compute_vertex_normals(Some(&mut progress)) {
                println!("{:.3},{:.3},{:.3}", n.x, n.y, n.z);
            }
        }
        Commands::Batter {
            surface,
            design,
            side,
            width,
            cut,
            fill,
            drape,
            close,
            cap_start,
            cap_end,
            skip_failed,
            config,
        } => {
            let tin = load_surface(&surface);
            let line = load_polyline(&design);
            let mut cfg = match config {
                Some(path) => match read_to_string(&path)
                    .map_err(|e| e.to_string())
                    .and_then(|s| serde_json::from_str::<BatterConfig>(&s).map_err(|e| e.to_string()))
                {
                    Ok(cfg) => cfg,
                    Err(e) => fail(format!("Error reading {}: {}", path, e)),
                },
                None => BatterConfig::default(),
            };
            if let Some(side) = side {
                cfg.side = side.into();
            }
            if let Some(width) = width {
                cfg.max_width = width;
            }
            if let Some(cut) = cut {
                cfg.cut_grade = cut;
            }
            if let Some(fill) = fill {
                cfg.fill_grade = fill;
            }
            cfg.drape |= drape;
            cfg.close |= close;
            cfg.cap_start |= cap_start;
            cfg.cap_end |= cap_end;
            if skip_failed {
                cfg.on_vertex_failure = VertexFailurePolicy::Skip;
            }
            match tin.batter(&line, &cfg) {
                Ok(points) => {
                    for p in points {
                        print_point3(p);
                    }
                }
                Err(e) => fail(format!("Batter failed: {}", e)),
            }
        }
    }
}
