use std::ops::AddAssign;

use crate::Error;

/// Fold per-point values computed over an extended system (real atoms
/// followed by ghost atoms) back onto the real atoms.
///
/// The value of each point `i` is added to the output at `image_of[i]`, which
/// must be smaller than `n_real`. The output contains exactly `n_real` values,
/// starting from `T::default()`. Values are accumulated in point order, making
/// the result deterministic.
pub fn reduce<T>(values: &[T], image_of: &[usize], n_real: usize) -> Result<Vec<T>, Error>
    where T: Copy + Default + AddAssign
{
    if values.len() != image_of.len() {
        return Err(Error::InvalidParameter(format!(
            "expected {} values to reduce, got {}", image_of.len(), values.len()
        )));
    }

    if n_real > image_of.len() {
        return Err(Error::InvalidParameter(format!(
            "the number of real atoms ({}) is larger than the number of points ({})",
            n_real, image_of.len()
        )));
    }

    let mut reduced = vec![T::default(); n_real];
    for (point, (&value, &image)) in values.iter().zip(image_of).enumerate() {
        if image >= n_real {
            return Err(Error::Index(format!(
                "point {} is an image of atom {}, but there are only {} real atoms",
                point, image, n_real
            )));
        }
        reduced[image] += value;
    }

    return Ok(reduced);
}
