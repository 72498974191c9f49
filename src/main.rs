use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use clap::Parser;
use obj::raw::object::Polygon;
use obj::raw::parse_obj;
use tri_bvh::bvh::{Bvh, QueryOptions};
use tri_bvh::ray::Ray;
use tri_bvh::triangle::Triangle;
use tri_bvh::{Point3, Real, Vector3};

/// Casts a single ray into a triangle mesh and prints every triangle it hits.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Mesh to load. Polygons are fanned into triangles. Without it, a two-triangle
    /// scene is used.
    #[arg(long)]
    obj: Option<PathBuf>,

    /// Ray origin as `x,y,z`.
    #[arg(long, value_delimiter = ',', num_args = 3, allow_negative_numbers = true,
          default_values_t = [1500.0, 3.0, 1000.0])]
    origin: Vec<Real>,

    /// Ray direction as `x,y,z`. Need not be normalized.
    #[arg(long, value_delimiter = ',', num_args = 3, allow_negative_numbers = true,
          default_values_t = [0.0, 0.0, -1.0])]
    direction: Vec<Real>,

    /// Maximum number of triangles per leaf.
    #[arg(long, default_value_t = 7)]
    leaf_size: usize,

    /// Only report the nearest hit.
    #[arg(long)]
    nearest: bool,

    /// Print the tree before casting the ray.
    #[arg(long)]
    print_tree: bool,
}

/// The scene of two triangles in the `z = 0` plane.
fn default_scene() -> Vec<Real> {
    vec![
        0.0, 0.0, 0.0, 1000.0, 0.0, 0.0, 1000.0, 1000.0, 0.0, //
        0.0, 0.0, 0.0, 2000.0, 0.0, 0.0, 2000.0, 1000.0, 0.0,
    ]
}

/// Loads the triangles of an OBJ file. Polygons with more than three corners are fanned
/// around their first corner.
fn load_obj_triangles(path: &Path) -> Result<Vec<Real>, Box<dyn Error>> {
    let raw = parse_obj(BufReader::new(File::open(path)?))?;
    let points = raw
        .positions
        .iter()
        .map(|&(x, y, z, _)| Point3::new(x.into(), y.into(), z.into()))
        .collect::<Vec<_>>();

    let mut vertices = Vec::new();
    for polygon in &raw.polygons {
        let corners = match polygon {
            Polygon::P(corners) => corners.clone(),
            Polygon::PT(corners) | Polygon::PN(corners) => {
                corners.iter().map(|corner| corner.0).collect()
            }
            Polygon::PTN(corners) => corners.iter().map(|corner| corner.0).collect(),
        };
        let corners = corners
            .iter()
            .map(|&index| {
                points
                    .get(index)
                    .copied()
                    .ok_or_else(|| format!("{}: no vertex with index {}", path.display(), index))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Some((&anchor, rest)) = corners.split_first() {
            for pair in rest.windows(2) {
                vertices.extend(Triangle::new(anchor, pair[0], pair[1]).to_array());
            }
        }
    }
    Ok(vertices)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let vertices = match &cli.obj {
        Some(path) => load_obj_triangles(path)?,
        None => default_scene(),
    };
    let bvh = Bvh::build(vertices, cli.leaf_size)?;

    let stats = bvh.stats();
    println!(
        "{} triangles, {} nodes, {} leaves, depth {}",
        stats.triangle_count, stats.node_count, stats.leaf_count, stats.max_depth
    );
    if cli.print_tree {
        print!("{}", bvh);
    }

    let origin = Point3::new(cli.origin[0], cli.origin[1], cli.origin[2]);
    let direction = Vector3::new(cli.direction[0], cli.direction[1], cli.direction[2]);
    let ray = Ray::new(origin, direction)?;
    let options = if cli.nearest {
        QueryOptions::nearest()
    } else {
        QueryOptions::all()
    };

    let hits = bvh.intersect_ray_with(&ray, &options)?;
    if hits.is_empty() {
        println!("no hits");
    }
    for hit in hits {
        println!(
            "triangle {} at t={} point={} uvw=({}, {}, {})",
            hit.triangle_index,
            hit.t,
            hit.point,
            hit.u,
            hit.v,
            hit.w()
        );
    }
    Ok(())
}
