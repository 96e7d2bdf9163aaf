use ghostnl::{GhostNeighborList, NeighborListOptions, NeighborQuery};
use ghostnl::{UnitCell, Vector3D};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let n_cells = std::env::args().nth(1)
        .map(|arg| arg.parse::<usize>())
        .transpose()?
        .unwrap_or(6);

    // enable collection of profiling data
    time_graph::enable_data_collection(true);
    // clear any existing collected data
    time_graph::clear_collected_data();

    let (positions, cell) = fcc_crystal(n_cells)?;

    // build the neighbor lists
    let neighbors = time_graph::spanned!("Full construction", {
        GhostNeighborList::new(&positions, &cell, NeighborListOptions::new(vec![3.0, 5.0]))
    })?;

    let system = neighbors.system();
    println!(
        "{} real atoms, {} ghost atoms, {} pairs in the largest list",
        system.n_real(), system.n_ghosts(), neighbors.lists()[1].n_pairs()
    );

    // get the call graph and display it
    let graph = time_graph::get_full_graph();
    // (this requires the "table" feature for the time_graph crate)
    println!("{}", graph.as_short_table());

    // also available for saving profiling data to the disk & future analysis
    // (this requires the "json" feature for the time_graph crate)
    println!("{}", graph.as_json());

    Ok(())
}

/// Face-centered cubic crystal with `n` conventional cells of size 3.6 in
/// each direction
fn fcc_crystal(n: usize) -> Result<(Vec<Vector3D>, UnitCell), ghostnl::Error> {
    let lattice = 3.6;
    let basis = [
        Vector3D::new(0.0, 0.0, 0.0),
        Vector3D::new(0.5, 0.5, 0.0),
        Vector3D::new(0.5, 0.0, 0.5),
        Vector3D::new(0.0, 0.5, 0.5),
    ];

    let mut positions = Vec::new();
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                let origin = Vector3D::new(i as f64, j as f64, k as f64);
                for &atom in &basis {
                    positions.push((origin + atom) * lattice);
                }
            }
        }
    }

    let cell = UnitCell::cubic(n as f64 * lattice)?;
    return Ok((positions, cell));
}
