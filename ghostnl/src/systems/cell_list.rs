use std::ops::ControlFlow;

use ndarray::Array3;

use crate::Vector3D;

/// Maximal number of cells, we need to use this to prevent having too many
/// cells with a sparse system and a small cutoff
const MAX_NUMBER_OF_CELLS: f64 = 1e5;

/// The cell list is used to sort points inside bins/cells, to find all points
/// within a given search radius of any other point without looking at every
/// pair of points.
///
/// The bins cover the bounding box of the points, and are at least as large as
/// the search radius (unless there would be too many of them). Candidate
/// neighbors of a point are taken from all the bins which intersect a cube of
/// side `2 * radius` centered on the point. There is no notion of periodicity
/// here, periodic images have to be added explicitly to the set of points.
#[derive(Debug, Clone)]
pub struct CellList {
    /// Lower corner of the bounding box of all points
    origin: Vector3D,
    /// Size of a single cell in each direction
    cell_size: [f64; 3],
    /// How many cells do we need to look at when searching neighbors to
    /// include all neighbors below the search radius
    n_search: [i32; 3],
    /// the cells themselves, containing indexes of the points
    cells: Array3<Vec<usize>>,
    /// the points in this cell list
    points: Vec<Vector3D>,
    /// search radius used to create this cell list
    radius: f64,
}

impl CellList {
    /// Create a new `CellList` containing all `points`, able to answer
    /// requests for neighbors up to `radius`.
    pub fn new(points: &[Vector3D], radius: f64) -> CellList {
        assert!(radius > 0.0 && radius.is_finite(), "search radius must be positive");

        let (origin, extent) = if points.is_empty() {
            (Vector3D::zero(), Vector3D::zero())
        } else {
            let mut min = points[0];
            let mut max = points[0];
            for &point in points {
                min = min.min(point);
                max = max.max(point);
            }
            (min, max - min)
        };

        let mut n_cells = [
            f64::clamp(f64::trunc(extent[0] / radius), 1.0, f64::INFINITY),
            f64::clamp(f64::trunc(extent[1] / radius), 1.0, f64::INFINITY),
            f64::clamp(f64::trunc(extent[2] / radius), 1.0, f64::INFINITY),
        ];

        // limit memory consumption by ensuring we have less than
        // `MAX_NUMBER_OF_CELLS` cells to look though
        let n_cells_total = n_cells[0] * n_cells[1] * n_cells[2];
        if n_cells_total > MAX_NUMBER_OF_CELLS {
            let factor = f64::cbrt(MAX_NUMBER_OF_CELLS / n_cells_total);
            for n in &mut n_cells {
                *n = f64::clamp(f64::trunc(*n * factor), 1.0, f64::INFINITY);
            }
        }

        let mut cell_size = [0.0; 3];
        let mut n_search = [0; 3];
        for xyz in 0..3 {
            if n_cells[xyz] == 1.0 {
                // everything is in the same cell along this direction
                cell_size[xyz] = f64::INFINITY;
                n_search[xyz] = 0;
            } else {
                cell_size[xyz] = extent[xyz] / n_cells[xyz];
                // one more cell than strictly required, to be robust against
                // rounding errors for points exactly at the search radius
                n_search[xyz] = f64::floor(radius / cell_size[xyz]) as i32 + 1;
            }
        }

        let shape = [n_cells[0] as usize, n_cells[1] as usize, n_cells[2] as usize];
        let mut cell_list = CellList {
            origin: origin,
            cell_size: cell_size,
            n_search: n_search,
            cells: Array3::from_elem(shape, Vec::new()),
            points: points.to_vec(),
            radius: radius,
        };

        for (index, &point) in points.iter().enumerate() {
            let cell_index = cell_list.clamped_cell_index(point);
            cell_list.cells[cell_index].push(index);
        }

        return cell_list;
    }

    /// Get the search radius used to create this cell list
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Get the number of points in this cell list
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Is this cell list empty?
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get the index of the cell containing `point`, which might be outside of
    /// the cell grid for points outside the bounding box.
    fn raw_cell_index(&self, point: Vector3D) -> [i64; 3] {
        let mut index = [0; 3];
        for xyz in 0..3 {
            if self.cell_size[xyz].is_finite() {
                index[xyz] = f64::floor((point[xyz] - self.origin[xyz]) / self.cell_size[xyz]) as i64;
            }
        }
        return index;
    }

    fn clamped_cell_index(&self, point: Vector3D) -> [usize; 3] {
        let shape = self.cells.shape();
        let raw = self.raw_cell_index(point);
        return [
            i64::clamp(raw[0], 0, shape[0] as i64 - 1) as usize,
            i64::clamp(raw[1], 0, shape[1] as i64 - 1) as usize,
            i64::clamp(raw[2], 0, shape[2] as i64 - 1) as usize,
        ];
    }

    /// Call `function` with the index and squared distance of all points in
    /// this cell list which are within the search radius of `center`
    /// (inclusive), in a deterministic order.
    ///
    /// `center` does not need to be one of the points in this cell list, nor
    /// to be inside their bounding box. If `center` is a point of this cell
    /// list, it will be passed to `function` as well, with a distance of 0.
    pub fn for_each_within(&self, center: Vector3D, mut function: impl FnMut(usize, f64)) {
        let _ = self.try_for_each_within(center, |index, distance2| {
            function(index, distance2);
            ControlFlow::Continue(())
        });
    }

    /// Same as [`CellList::for_each_within`], stopping the search as soon as
    /// `function` returns [`ControlFlow::Break`].
    pub fn try_for_each_within(
        &self,
        center: Vector3D,
        mut function: impl FnMut(usize, f64) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        if self.points.is_empty() {
            return ControlFlow::Continue(());
        }

        let shape = self.cells.shape();
        let raw = self.raw_cell_index(center);

        // points are stored in the clamped cell index, and clamping is
        // monotonic: clamping both ends of the search range gives all the
        // cells which can contain neighbors
        let mut ranges = [(0, 0); 3];
        for xyz in 0..3 {
            let n_search = self.n_search[xyz] as i64;
            let last = shape[xyz] as i64 - 1;
            let start = i64::clamp(raw[xyz] - n_search, 0, last);
            let stop = i64::clamp(raw[xyz] + n_search, 0, last);
            ranges[xyz] = (start as usize, stop as usize);
        }

        let radius2 = self.radius * self.radius;
        for cell_x in ranges[0].0..=ranges[0].1 {
            for cell_y in ranges[1].0..=ranges[1].1 {
                for cell_z in ranges[2].0..=ranges[2].1 {
                    for &index in &self.cells[[cell_x, cell_y, cell_z]] {
                        let distance2 = (self.points[index] - center).norm2();
                        if distance2 <= radius2 {
                            function(index, distance2)?;
                        }
                    }
                }
            }
        }

        return ControlFlow::Continue(());
    }

    /// Check if any point in this cell list is within the search radius of
    /// `center` (inclusive)
    pub fn any_within(&self, center: Vector3D) -> bool {
        return self.try_for_each_within(center, |_, _| ControlFlow::Break(())).is_break();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reference implementation looking at all points
    fn brute_force(points: &[Vector3D], center: Vector3D, radius: f64) -> Vec<usize> {
        let mut result = Vec::new();
        for (i, &point) in points.iter().enumerate() {
            if (point - center).norm2() <= radius * radius {
                result.push(i);
            }
        }
        return result;
    }

    fn search(cell_list: &CellList, center: Vector3D) -> Vec<usize> {
        let mut result = Vec::new();
        cell_list.for_each_within(center, |i, _| result.push(i));
        result.sort_unstable();
        return result;
    }

    fn grid(n: usize, spacing: f64) -> Vec<Vector3D> {
        let mut points = Vec::new();
        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    points.push(Vector3D::new(i as f64, j as f64, k as f64) * spacing);
                }
            }
        }
        return points;
    }

    #[test]
    fn empty() {
        let cell_list = CellList::new(&[], 2.0);
        assert!(cell_list.is_empty());
        assert!(!cell_list.any_within(Vector3D::zero()));
    }

    #[test]
    fn single_point() {
        let cell_list = CellList::new(&[Vector3D::new(1.0, 2.0, 3.0)], 2.0);
        assert_eq!(cell_list.len(), 1);
        assert_eq!(search(&cell_list, Vector3D::new(1.0, 2.0, 3.0)), [0]);
        assert_eq!(search(&cell_list, Vector3D::new(3.0, 2.0, 3.0)), [0]);
        assert!(search(&cell_list, Vector3D::new(3.1, 2.0, 3.0)).is_empty());
    }

    #[test]
    fn matches_brute_force() {
        let points = grid(6, 0.7);
        let cell_list = CellList::new(&points, 1.0);

        for &center in &points {
            assert_eq!(search(&cell_list, center), brute_force(&points, center, 1.0));
        }

        // points outside of the bounding box
        let outside = [
            Vector3D::new(-0.9, 0.0, 0.0),
            Vector3D::new(-1.5, -1.5, -1.5),
            Vector3D::new(4.3, 1.4, 2.1),
            Vector3D::new(3.5, 3.5, 4.4),
            Vector3D::new(40.0, 0.0, 0.0),
        ];
        for &center in &outside {
            assert_eq!(search(&cell_list, center), brute_force(&points, center, 1.0));
        }
    }

    #[test]
    fn inclusive_boundary() {
        let points = grid(5, 1.0);
        let cell_list = CellList::new(&points, 1.0);

        // 6 neighbors at exactly the search radius, plus the point itself
        let found = search(&cell_list, Vector3D::new(2.0, 2.0, 2.0));
        assert_eq!(found.len(), 7);
        assert_eq!(found, brute_force(&points, Vector3D::new(2.0, 2.0, 2.0), 1.0));
    }

    #[test]
    fn flat_system() {
        // all points in the z = 0 plane
        let points = (0..20).map(|i| Vector3D::new(i as f64 * 0.5, (i % 3) as f64, 0.0)).collect::<Vec<_>>();
        let cell_list = CellList::new(&points, 1.2);
        for &center in &points {
            assert_eq!(search(&cell_list, center), brute_force(&points, center, 1.2));
        }
    }

    #[test]
    fn sparse_system() {
        // very large bounding box compared to the radius, limited number of cells
        let points = [
            Vector3D::new(0.0, 0.0, 0.0),
            Vector3D::new(0.1, 0.0, 0.0),
            Vector3D::new(1000.0, 1000.0, 1000.0),
            Vector3D::new(1000.0, 1000.05, 1000.0),
        ];
        let cell_list = CellList::new(&points, 0.2);
        assert!(cell_list.cells.len() as f64 <= MAX_NUMBER_OF_CELLS);
        assert_eq!(search(&cell_list, points[0]), [0, 1]);
        assert_eq!(search(&cell_list, points[3]), [2, 3]);
        assert!(cell_list.any_within(Vector3D::new(999.9, 1000.0, 1000.0)));
        assert!(!cell_list.any_within(Vector3D::new(500.0, 500.0, 500.0)));
    }

    #[test]
    fn stop_search() {
        let points = grid(4, 0.5);
        let cell_list = CellList::new(&points, 1.0);

        let mut visited = 0;
        let result = cell_list.try_for_each_within(Vector3D::new(0.75, 0.75, 0.75), |_, _| {
            visited += 1;
            if visited == 3 { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
        });
        assert!(result.is_break());
        assert_eq!(visited, 3);

        let mut visited = 0;
        let result = cell_list.try_for_each_within(Vector3D::new(0.75, 0.75, 0.75), |_, _| {
            visited += 1;
            ControlFlow::Continue(())
        });
        assert!(result.is_continue());
        assert_eq!(visited, search(&cell_list, Vector3D::new(0.75, 0.75, 0.75)).len());

        assert!(cell_list.any_within(Vector3D::new(-0.9, 0.0, 0.0)));
        assert!(!cell_list.any_within(Vector3D::new(-1.1, 0.0, 0.0)));
    }
}
